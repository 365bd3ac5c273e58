use fbsc_common::Span;
use std::fmt;

/// A single token produced by the lexer.
///
/// For string literals `lexeme` holds the unescaped content without quotes;
/// for every other kind it is the exact source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, "", span)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.lexeme)
    }
}

/// Token kinds of the schema language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Literals ===
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    Identifier,

    // === Keywords ===
    Namespace,
    Include,
    Attribute,
    Table,
    Struct,
    Enum,
    Union,
    RootType,
    FileIdentifier,
    FileExtension,
    RpcService,
    True,
    False,

    // === Punctuation ===
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Semicolon,    // ;
    Colon,        // :
    Equal,        // =
    Dot,          // .
    Plus,         // +
    Minus,        // -

    Eof,
}

impl TokenKind {
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "namespace" => Some(TokenKind::Namespace),
            "include" => Some(TokenKind::Include),
            "attribute" => Some(TokenKind::Attribute),
            "table" => Some(TokenKind::Table),
            "struct" => Some(TokenKind::Struct),
            "enum" => Some(TokenKind::Enum),
            "union" => Some(TokenKind::Union),
            "root_type" => Some(TokenKind::RootType),
            "file_identifier" => Some(TokenKind::FileIdentifier),
            "file_extension" => Some(TokenKind::FileExtension),
            "rpc_service" => Some(TokenKind::RpcService),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        }
    }

    /// Keywords that may still be used where the grammar expects a name,
    /// e.g. a field called `table` or an attribute key `union`.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
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
                | TokenKind::RpcService
                | TokenKind::True
                | TokenKind::False
        )
    }
}
