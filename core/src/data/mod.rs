//! Structured data: the document tree and its text formats.
//!
//! - [`Value`] — named-tree document with typed readers and writers
//! - [`Format`] / [`encode`] / [`decode`] — JSON and RON text encodings
//! - [`load_file`] / [`save_file`] — the file collaborator used by loaders
//! - [`to_value`] / [`from_value`] — bridges to typed serde definitions

mod error;
mod format;
mod value;

pub use error::DataError;
pub use format::{decode, encode, load_file, save_file, Format};
pub use value::{from_value, to_value, Value};
