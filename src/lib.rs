//! A lexer, recursive-descent parser, and tree-walking interpreter for
//! PHP-JS, a small dynamically-typed scripting language with sigil-prefixed
//! variables, C-style control flow, and dot-concatenation.
//!
//! The pipeline is `source -> tokens -> AST -> output string`; [`run`] wires
//! the three stages together.

pub mod ast;
pub mod globals;
pub mod interpreter;
pub mod parser;
pub mod scanner;

use log::{debug, warn};

use crate::{interpreter::Interpreter, parser::Parser, scanner::Scanner};

/// Executes a PHP-JS program and returns everything it echoed. A runtime
/// error ends the program and appears at the end of the returned output;
/// parse diagnostics are logged and the offending declarations skipped.
pub fn run(source: &str) -> String {
    let scanner = Scanner::new(source);
    let (statements, errors) = Parser::new(scanner).parse();
    for error in &errors {
        warn!("{error}");
    }
    debug!("parsed {} top-level statements", statements.len());
    Interpreter::new().interpret(&statements)
}
