//! tidewire-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.twl` schema-definition files,
//!  2) A schema verifier (duplicate names, unknown types, recursive messages),
//!  3) Lowering of the parsed declarations into runtime
//!     [`MessageSchema`](tidewire_schema::MessageSchema)s plus a populated
//!     [`SchemaRegistry`](tidewire_schema::SchemaRegistry)
//!     (`compile_str` / `compile_file`),
//!  4) Error types (`CompilerError`).

pub mod compiler;
pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod types;
pub mod utils;
pub mod verifier;

pub use compiler::{compile_file, compile_str, CompiledSchemas};
pub use error::CompilerError;
