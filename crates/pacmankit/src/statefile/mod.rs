//! The persisted state file.
//!
//! A pretty-printed JSON array of `{"packageName", "packageVersion"}`
//! objects, sorted by name and terminated by a newline.

pub mod parser;
pub mod writer;

pub use parser::{parse_file, parse_str};
pub use writer::{WriteMode, write_file, write_string};

/// Default location of the state file.
pub const DEFAULT_PATH: &str = "/var/lib/archnix/packages.json";
