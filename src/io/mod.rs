//! I/O module
//!
//! Handles script parsing and balance output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (operation conversion, amount scaling, output)
//! - `script_reader` - Streaming script reader with iterator interface

pub mod csv_format;
pub mod script_reader;

pub use csv_format::{
    convert_script_record, format_amount, scale_amount, write_balances_csv, Operation,
    ScriptRecord,
};
pub use script_reader::ScriptReader;
