pub mod convert;
pub mod detect;
pub mod excel;
pub mod generate;
pub mod parse;
pub mod project;

pub use crate::domain::model::{Record, RecordSet};
pub use convert::{convert, convert_tagged};
pub use detect::detect_format;
