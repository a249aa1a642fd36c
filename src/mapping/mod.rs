pub mod resolve;
pub mod types;

pub use resolve::{KeyColumns, Mapping, PersonColumns, RECORD_FIELDS};
pub use types::ColumnMapping;
