pub mod qa;
pub mod vector;

pub use qa::QaEntry;
pub use vector::{UpsertResult, VectorEntry, VectorMatch};
