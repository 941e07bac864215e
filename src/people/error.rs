use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

/// A non-fatal problem with one input entity. The entity is left out of the
/// population and the error is reported alongside the generated graph.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingError {
    #[error("entry {index} has no identity")]
    MissingIdentity { index: usize },

    #[error("entry {index} repeats identity {id:?}")]
    DuplicateIdentity { index: usize, id: String },

    #[error("entry {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
}

impl ProcessingError {
    /// Position of the offending entry in the list it was read from.
    pub fn index(&self) -> usize {
        match self {
            Self::MissingIdentity { index }
            | Self::DuplicateIdentity { index, .. }
            | Self::Malformed { index, .. } => *index,
        }
    }
}

/// Admits each identity once. Blank identities are never admitted.
#[derive(Debug, Default)]
pub struct IdentityCheck {
    seen: HashSet<String>,
}

impl IdentityCheck {
    pub fn admit(&mut self, index: usize, id: &str) -> Result<(), ProcessingError> {
        let id = id.trim();
        if id.is_empty() {
            Err(ProcessingError::MissingIdentity { index })
        } else if !self.seen.insert(id.to_owned()) {
            Err(ProcessingError::DuplicateIdentity {
                index,
                id: id.to_owned(),
            })
        } else {
            Ok(())
        }
    }
}
