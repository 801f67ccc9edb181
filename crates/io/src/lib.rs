// File I/O operations

pub mod csv;
pub mod store;

pub use store::{MappingStore, DEFAULT_MAPPING_FILE};
