//! Command dispatch and rendering for the flowsh shell.
//!
//! One line of operator input becomes at most one gateway call:
//!
//! 1. [`lex::lex_line`] splits the raw line into shell-like tokens
//! 2. [`dispatch::dispatch`] resolves the verb through a static table,
//!    validates identifiers, and invokes the gateway exactly once
//! 3. [`render::render`] turns the boolean or mapping result into styled
//!    console lines on an injected output sink
//!
//! Parse and usage errors are handled here and never reach the gateway;
//! transport failures propagate to the caller unmodified.

pub mod dispatch;
pub mod lex;
pub mod recovery;
pub mod render;
pub mod start;

pub use dispatch::{VERBS, VerbSpec, dispatch};
pub use lex::lex_line;
pub use render::{AnsiOutput, LineStyle, RecordingOutput, ShellOutput, render};
