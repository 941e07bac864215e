use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::error::{IdentityCheck, ProcessingError};
use super::model::Person;

#[derive(Clone, Debug, Default)]
pub struct Population {
    pub people: Vec<Person>,
    pub errors: Vec<ProcessingError>,
}

pub fn load_population(path: &Path) -> Result<Population> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read people from {}", path.display()))?;
    let population = parse_population(&raw)
        .with_context(|| format!("failed to parse people from {}", path.display()))?;

    info!(
        path = %path.display(),
        people = population.people.len(),
        skipped = population.errors.len(),
        "loaded population"
    );
    Ok(population)
}

/// Accepts either a bare JSON array of people or an object with a `people`
/// array. Entries that do not deserialize, or that lack or repeat an identity,
/// are skipped and recorded under their position in the array.
pub fn parse_population(raw: &str) -> Result<Population> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON document")?;
    let entries = match &parsed {
        Value::Array(entries) => entries,
        Value::Object(object) => object
            .get("people")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("expected a `people` array in the JSON object"))?,
        _ => return Err(anyhow!("expected a JSON array of people")),
    };

    let mut population = Population {
        people: Vec::with_capacity(entries.len()),
        errors: Vec::new(),
    };

    let mut identities = IdentityCheck::default();
    for (index, entry) in entries.iter().enumerate() {
        match Person::deserialize(entry) {
            Ok(person) => match identities.admit(index, &person.id) {
                Ok(()) => population.people.push(person),
                Err(error) => {
                    warn!(index, %error, "skipping entry");
                    population.errors.push(error);
                }
            },
            Err(error) => {
                warn!(index, %error, "skipping malformed entry");
                population.errors.push(ProcessingError::Malformed {
                    index,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(population)
}
