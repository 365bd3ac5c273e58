pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

use fbsc_common::DiagnosticBag;

use crate::ast::Schema;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Lex and parse one schema source.
///
/// Returns the AST even when diagnostics were produced; callers decide
/// whether to continue based on `DiagnosticBag::has_errors`.
pub fn parse_source(source: &str, file: &str) -> (Schema, DiagnosticBag) {
    let (tokens, mut diagnostics) = Lexer::new(source, file).tokenize();
    let (schema, parse_diags) = Parser::new(tokens).parse();
    diagnostics.absorb(parse_diags);
    (schema, diagnostics)
}
