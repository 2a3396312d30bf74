//! gssrecode: Categorical Recoding Library
//!
//! Cleans a tabular survey extract: drops sparse columns and incomplete rows,
//! collapses, orders and prunes categorical labels, and bins survey years
//! into decades, producing a typed table for downstream charting.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
