//! Pipeline module - loads, screens, filters and recodes the survey table

pub mod category;
pub mod decade;
pub mod error;
pub mod loader;
pub mod missing;
pub mod plan;
pub mod recode;
pub mod views;

pub use category::*;
pub use decade::*;
pub use error::*;
pub use loader::*;
pub use missing::*;
pub use plan::*;
pub use recode::*;
pub use views::*;
