//! Core compiler for the ClearScript language.
//!
//! ClearScript is a small C-style language that compiles to StateScript,
//! a flat label-and-instruction listing run by an external goto/stack
//! machine. The pipeline is:
//!
//!   source .cst
//!     -> lexer         (tokens)
//!     -> parser        (AST)
//!     -> name_resolve  (symbols and scopes)
//!     -> codegen       (listing of instructions and labels)
//!     -> emit          (StateScript text)
//!
//! Front-ends (the CLI, editor tooling) should depend on this crate
//! rather than reimplementing the pipeline. The crate performs no I/O.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layer: scopes and name resolution
// ---------------------------------------------------------------------

pub mod builtins;
pub mod scope;
pub mod name_resolve;

// ---------------------------------------------------------------------
// Back-end: code generation, emission and orchestration
// ---------------------------------------------------------------------

pub mod listing;
pub mod codegen;
pub mod emit;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile, compile_artifact};
pub use diagnostic::{Diagnostic, Severity};
pub use error::CoreError;
