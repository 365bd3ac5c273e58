use fbsc_common::{Position, Span};

/// Character reader over schema text.
///
/// Keeps the byte offset of the next unread character plus its line and
/// column so tokens can be given spans without a second pass.
pub struct Cursor<'src> {
    source: &'src str,
    file: String,
    pos: Position,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str, file: impl Into<String>) -> Self {
        Self {
            source,
            file: file.into(),
            pos: Position {
                line: 1,
                column: 1,
                offset: 0,
            },
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos.offset as usize..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos.offset += ch.len_utf8() as u32;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    /// Consume the next character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        let matched = self.peek() == Some(expected);
        if matched {
            self.advance();
        }
        matched
    }

    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.advance();
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos.offset as usize >= self.source.len()
    }

    /// Source text between `start` and the cursor.
    pub fn slice_from(&self, start: Position) -> &'src str {
        &self.source[start.offset as usize..self.pos.offset as usize]
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span::new(self.file.clone(), start, self.pos)
    }
}
