//! Front end for a small R implementation: a tokenizer and an
//! operator-precedence parser that build R's own node representation.
//!

pub mod data;

pub mod reader;

pub use reader::{parse_program, parse_str, ReadErr, ReadResult};

#[cfg(feature = "render")]
pub use data::render_tree;
