// src/process/mod.rs
//! Row expansion and normalization: from raw sheet values to a flat,
//! deduplicated, sorted list of person records.

pub mod assemble;
pub mod column;
pub mod expand;
pub mod normalize;
pub mod records;

pub use assemble::{assemble_sheet, AssembledTable, DuplicateReport};
pub use records::{CellValue, PersonRecord};
