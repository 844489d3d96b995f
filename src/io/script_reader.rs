//! Script reader with iterator interface
//!
//! Provides a streaming iterator over [`Operation`]s from a CSV script.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The ScriptReader uses csv::Reader to read and deserialize rows sequentially,
//! delegating conversion to the csv_format module. Rows are processed one at a
//! time without loading the whole script into memory.
//!
//! # Iterator Interface
//!
//! ScriptReader implements the Iterator trait, yielding
//! `Result<Operation, EngineError>` for each row:
//!
//! ```no_run
//! use rust_settlement_engine::io::ScriptReader;
//! use std::path::Path;
//!
//! let reader = ScriptReader::new(Path::new("script.csv"), 6).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Operation: {:?}", operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Row errors are yielded as `ParseError` items carrying the line number

use crate::io::csv_format::{convert_script_record, Operation, ScriptRecord};
use crate::types::EngineError;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming reader over a CSV operation script
#[derive(Debug)]
pub struct ScriptReader {
    reader: csv::Reader<File>,
    decimals: u32,
    line_num: u64,
}

impl ScriptReader {
    /// Open a script for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields and allows short rows,
    /// so trailing unused columns may be omitted.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV script
    /// * `decimals` - Decimal places used to scale human-unit amounts
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the script does not exist and `IoError` if it
    /// cannot be opened.
    pub fn new(path: &Path, decimals: u32) -> Result<Self, EngineError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => EngineError::from(e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            decimals,
            line_num: 1,
        })
    }
}

impl Iterator for ScriptReader {
    type Item = Result<Operation, EngineError>;

    /// Read and convert the next row
    ///
    /// Conversion errors are tagged with the row's line number (the header is
    /// line 1).
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<ScriptRecord>();
        let result = deserializer.next()?;
        self.line_num += 1;

        Some(match result {
            Ok(record) => {
                convert_script_record(record, self.decimals).map_err(|e| match e {
                    EngineError::ParseError { message, .. } => EngineError::ParseError {
                        line: Some(self.line_num),
                        message,
                    },
                    other => other,
                })
            }
            Err(e) => Err(EngineError::from(e)),
        })
    }
}
