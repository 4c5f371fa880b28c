//! Section splitter for class-component files.
//!
//! Splits a component file into its template, script and style regions with
//! exact byte offsets. Splitting never fails: malformed markup yields
//! best-effort ranges plus [`ParseError`]s.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use error::{ErrorCode, ParseError};
pub use parser::split_sections;
