// src/report/mod.rs
//! Output side: worksheet grids, their presentation layout, and the xlsx
//! writer.

pub mod present;
pub mod sheet;
pub mod write;

pub use present::{present, SheetLayout};
pub use sheet::{sanitize_sheet_name, ReportSheet};
pub use write::write_workbook;
