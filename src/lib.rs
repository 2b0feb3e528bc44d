//! A faithful reimplementation of Weizenbaum's 1966 ELIZA: a script parser,
//! a SLIP-style segmented decomposition matcher, and the keyword-stack
//! response engine that drives a conversation from a loaded script.

pub mod engine;
pub mod error;
pub mod hollerith;
pub mod matcher;
pub mod parser;
pub mod rules;
pub mod script;
pub mod token;
pub mod trace;

pub use engine::Engine;
pub use error::{ScriptError, ScriptErrorKind};
pub use script::Script;
pub use trace::{CollectingTracer, LoggingTracer, NullTracer, Tracer};

/// Parses a script source into a [`Script`], or a [`ScriptError`] carrying
/// the offending line number.
pub fn load_script(source: &str) -> Result<Script, ScriptError> {
    parser::parse(source)
}
