//! Turns a household registration spreadsheet (one row per household, with
//! repeating member blocks) into a one-row-per-person xlsx report.

pub mod error;
pub mod fetch;
pub mod mapping;
pub mod pipeline;
pub mod process;
pub mod report;
