use fbsc_common::Span;

// ============================================================================
// Schema (top-level)
// ============================================================================

/// A complete `.fbs` schema file.
#[derive(Debug, Clone)]
pub struct Schema {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Include(StringDirective),
    Attribute(AttributeDecl),
    Table(TypeDecl),
    Struct(TypeDecl),
    Enum(EnumDecl),
    Union(EnumDecl),
    RootType(RootTypeDecl),
    FileIdentifier(StringDirective),
    FileExtension(StringDirective),
    RpcService(RpcServiceDecl),
}

/// `namespace A.B.C;`
#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub path: String,
    pub span: Span,
}

/// `include "x.fbs";`, `file_identifier "MONS";`, `file_extension "mon";`
#[derive(Debug, Clone)]
pub struct StringDirective {
    pub value: String,
    pub span: Span,
}

/// `attribute "priority";` declares a user attribute name.
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: String,
    pub span: Span,
}

/// `root_type Monster;`
#[derive(Debug, Clone)]
pub struct RootTypeDecl {
    pub name: String,
    pub span: Span,
}

/// `rpc_service Name { ... }`. Only the name is kept.
#[derive(Debug, Clone)]
pub struct RpcServiceDecl {
    pub name: String,
    pub span: Span,
}

// ============================================================================
// Metadata
// ============================================================================

/// Parenthesized attribute list, `(id: 1, deprecated, vectortype: "Array")`.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub entries: Vec<MetadataEntry>,
    pub span: Option<Span>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `key` or `key: value` entry.
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub key: String,
    pub value: Option<MetadataValue>,
    pub span: Span,
}

/// The raw value of a metadata entry. String values are unquoted.
#[derive(Debug, Clone)]
pub struct MetadataValue {
    pub text: String,
    pub span: Span,
}

// ============================================================================
// Tables and structs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Table,
    Struct,
}

/// ```fbs
/// table Monster (fs_serializer) {
///     hp: short = 100;
///     inventory: [ubyte] (id: 3, vectortype: "Memory");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub name: String,
    pub metadata: Metadata,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// A field declaration as written: `name: type = default (metadata);`
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub name_span: Span,
    /// Declared type text with whitespace removed, e.g. `[Weapon]`.
    pub type_text: String,
    pub type_span: Span,
    pub default: Option<DefaultValue>,
    pub metadata: Metadata,
    pub span: Span,
}

/// Raw default value text, e.g. `-5`, `1.5`, `Red`, `null`.
#[derive(Debug, Clone)]
pub struct DefaultValue {
    pub text: String,
    pub span: Span,
}

// ============================================================================
// Enums and unions
// ============================================================================

/// ```fbs
/// enum Color : byte { Red = 1, Green, Blue }
/// union Equipment { Weapon, Shield }
/// ```
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub underlying_type: Option<String>,
    pub metadata: Metadata,
    pub values: Vec<EnumValue>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub value: Option<String>,
    pub span: Span,
}
