//! The pseudocode language.
//!
//! Programs are executed straight from their source lines; nothing is
//! compiled or parsed into a tree ahead of time.
//!
//! - [`token`]: splits expression text into tokens
//! - [`expand`]: substitutes variables into tokens
//! - [`expr`]: folds tokens into a single [`Value`] by operator precedence
//! - [`stmt`]: classifies a source line as a [`Statement`](stmt::Statement)
//! - [`frame`]: the stack of open blocks
//! - [`interp`]: the run loop and statement handlers
//!
//! # Quick start
//!
//! ```rust
//! use pseudo::host::ScriptedHost;
//! use pseudo::script::Interpreter;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut host = ScriptedHost::new();
//! let mut interp = Interpreter::new("x = 6\ndisplay x * 7");
//! interp.run(&mut host).await.unwrap();
//! assert_eq!(host.output, vec!["42"]);
//! # });
//! ```

pub mod expand;
pub mod expr;
pub mod frame;
pub mod interp;
pub mod stmt;
pub mod token;
pub mod value;

// Re-exports for convenience.
pub use expr::{EvalContext, EvalError};
pub use interp::{Interpreter, RunError};
pub use value::Value;
