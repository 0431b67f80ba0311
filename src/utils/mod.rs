pub mod serialization;

pub use serialization::{OutputFormat, RdfSerializer};
