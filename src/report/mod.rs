//! Report module - summarizing recoding results

pub mod audit_export;
pub mod summary;

pub use audit_export::*;
pub use summary::*;
