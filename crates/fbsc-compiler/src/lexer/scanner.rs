use fbsc_common::{DiagnosticBag, Position};

use super::cursor::Cursor;
use super::token::{Token, TokenKind};

/// Hand-written lexer for `.fbs` schema files.
///
/// Unknown characters and unterminated literals are reported to the
/// diagnostics bag and scanning continues with the next character.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    diagnostics: DiagnosticBag,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file: impl Into<String>) -> Self {
        Self {
            cursor: Cursor::new(source, file),
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, DiagnosticBag) {
        let mut tokens = Vec::new();
        loop {
            match self.next_token() {
                Some(token) => {
                    let is_eof = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if is_eof {
                        break;
                    }
                }
                None => continue,
            }
        }
        (tokens, self.diagnostics)
    }

    /// Scan the next token. `None` means an invalid character was skipped.
    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        let start = self.cursor.position();
        let Some(ch) = self.cursor.advance() else {
            return Some(Token::eof(self.cursor.span_from(start)));
        };

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equal,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '.' if self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) => {
                return Some(self.scan_number(start, ch));
            }
            '.' => TokenKind::Dot,
            '"' => return Some(self.scan_string(start)),
            c if c.is_ascii_digit() => return Some(self.scan_number(start, c)),
            c if is_ident_start(c) => return Some(self.scan_identifier(start)),
            other => {
                let span = self.cursor.span_from(start);
                self.diagnostics
                    .error(format!("unexpected character '{}'", other), span);
                return None;
            }
        };
        Some(self.make_token(kind, start))
    }

    /// Skip whitespace, `//` and `///` line comments, and `/* */` block comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());

            if self.cursor.peek() != Some('/') {
                return;
            }
            match self.cursor.peek_second() {
                Some('/') => self.cursor.eat_while(|c| c != '\n'),
                Some('*') => {
                    let start = self.cursor.position();
                    self.cursor.advance();
                    self.cursor.advance();
                    self.skip_block_comment(start);
                }
                _ => return,
            }
        }
    }

    fn skip_block_comment(&mut self, start: Position) {
        loop {
            match self.cursor.advance() {
                Some('*') if self.cursor.eat('/') => return,
                Some(_) => {}
                None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics.error("unterminated block comment", span);
                    return;
                }
            }
        }
    }

    /// Scan a string literal after its opening quote.
    fn scan_string(&mut self, start: Position) -> Token {
        let mut value = String::new();
        loop {
            match self.cursor.advance() {
                Some('"') => break,
                Some('\\') => match self.cursor.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(c) => {
                        let span = self.cursor.span_from(start);
                        self.diagnostics
                            .error(format!("unknown escape sequence '\\{}'", c), span);
                        value.push(c);
                    }
                    None => {
                        let span = self.cursor.span_from(start);
                        self.diagnostics.error("unterminated string literal", span);
                        break;
                    }
                },
                Some('\n') | None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics.error("unterminated string literal", span);
                    break;
                }
                Some(c) => value.push(c),
            }
        }
        Token::new(TokenKind::StringLiteral, value, self.cursor.span_from(start))
    }

    /// Scan a numeric literal. `first` is the already-consumed first
    /// character (a digit, or `.` directly followed by a digit).
    fn scan_number(&mut self, start: Position, first: char) -> Token {
        if first == '0' && matches!(self.cursor.peek(), Some('x' | 'X')) {
            self.cursor.advance();
            let digits = self.cursor.position();
            self.cursor.eat_while(|c| c.is_ascii_hexdigit());
            if self.cursor.slice_from(digits).is_empty() {
                let span = self.cursor.span_from(start);
                self.diagnostics
                    .error("expected hex digits after '0x'", span);
            }
            return self.make_token(TokenKind::IntLiteral, start);
        }

        let mut is_float = first == '.';
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if !is_float
            && self.cursor.peek() == Some('.')
            && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.cursor.advance();
        }
        if is_float {
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let exponent_follows = match self.cursor.peek_second() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => true,
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some('+' | '-')) {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.make_token(kind, start)
    }

    fn scan_identifier(&mut self, start: Position) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let lexeme = self.cursor.slice_from(start);
        let kind = TokenKind::keyword_from_str(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    fn make_token(&self, kind: TokenKind, start: Position) -> Token {
        let lexeme = self.cursor.slice_from(start);
        Token::new(kind, lexeme, self.cursor.span_from(start))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
