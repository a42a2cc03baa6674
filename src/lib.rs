pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::CliConfig;
pub use core::{convert, convert_tagged, detect_format};
pub use domain::model::{
    Column, ColumnSchema, ColumnType, ConversionOutput, ConversionRequest, ConvertOptions,
    DetectedFormat, InputFormat, OutputFormat, Record, RecordSet,
};
pub use utils::error::{ConvertError, Result};
