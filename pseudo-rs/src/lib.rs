//! Interpreter for a small educational pseudocode language.
//!
//! Programs use `IF`/`WHILE`/`FOR`/`REPEAT` blocks delimited by indentation
//! and closing keywords, `display` for output and `get` for input.  See
//! [`script`] for the language and [`host`] for how a running program talks
//! to its embedder.

pub mod cli;
pub mod config;
pub mod host;
pub mod script;
pub mod var;
