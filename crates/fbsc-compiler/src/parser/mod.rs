mod declarations;

use fbsc_common::{DiagnosticBag, Span};

use crate::ast::*;
use crate::lexer::token::{Token, TokenKind};

/// Recursive descent parser for `.fbs` schemas.
///
/// Parse errors are reported to the bag; the parser resynchronizes at the
/// next declaration keyword (or, inside a table, at the next `;`) so one run
/// reports as many problems as possible.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: DiagnosticBag,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span.clone()).unwrap_or_else(Span::dummy);
            tokens.push(Token::eof(span));
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Parse the entire token stream into a Schema.
    pub fn parse(mut self) -> (Schema, DiagnosticBag) {
        let mut declarations = Vec::new();
        let start = self.current_span();

        while !self.is_at_end() {
            match self.parse_declaration() {
                Some(decl) => declarations.push(decl),
                None => self.synchronize(),
            }
        }

        let span = start.merge(&self.current_span());
        (Schema { declarations, span }, self.diagnostics)
    }

    // ========================================================================
    // Token manipulation helpers
    // ========================================================================

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Consume a token of the expected kind, or report an error.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<&Token> {
        if self.peek() == kind {
            Some(self.advance())
        } else {
            self.error_expected(what);
            None
        }
    }

    /// Consume a name. Keywords are accepted as names since the schema
    /// language only reserves them at declaration starts.
    fn expect_name(&mut self, what: &str) -> Option<(String, Span)> {
        let kind = self.peek();
        if kind == TokenKind::Identifier || kind.is_keyword() {
            let token = self.advance();
            Some((token.lexeme.clone(), token.span.clone()))
        } else {
            self.error_expected(what);
            None
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek() == TokenKind::Eof
    }

    fn current_span(&self) -> Span {
        self.current().span.clone()
    }

    fn previous_span(&self) -> Span {
        self.previous().span.clone()
    }

    fn error_expected(&mut self, what: &str) {
        let token = self.current();
        let found = if token.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            format!("'{}'", token.lexeme)
        };
        let span = token.span.clone();
        self.diagnostics
            .error(format!("expected {}, found {}", what, found), span);
    }

    /// Skip tokens until the start of the next top-level declaration.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek() {
                TokenKind::Namespace
                | TokenKind::Include
                | TokenKind::Attribute
                | TokenKind::Table
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Union
                | TokenKind::RootType
                | TokenKind::FileIdentifier
                | TokenKind::FileExtension
                | TokenKind::RpcService => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip to just after the next `;`, stopping early at `}` or end of file.
    fn skip_past_semicolon(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
