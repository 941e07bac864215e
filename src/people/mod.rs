mod error;
mod load;
mod model;

pub use error::{IdentityCheck, ProcessingError};
pub use load::{Population, load_population, parse_population};
pub use model::{EducationRecord, Person};
