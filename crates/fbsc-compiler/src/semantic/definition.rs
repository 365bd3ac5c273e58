use fbsc_common::Span;
use serde::Serialize;

/// A closed enumeration selectable by a case-insensitive keyword in schema
/// metadata.
pub trait Keyword: Copy + 'static {
    /// Every selectable variant, in the order choices are listed to users.
    const CHOICES: &'static [Self];

    fn keyword(self) -> &'static str;

    fn from_keyword(text: &str) -> Option<Self> {
        Self::CHOICES
            .iter()
            .copied()
            .find(|choice| choice.keyword().eq_ignore_ascii_case(text))
    }

    /// Comma separated list of every keyword, for diagnostics.
    fn choices() -> String {
        Self::CHOICES
            .iter()
            .map(|choice| choice.keyword())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Wire and in-memory representation of a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum VectorType {
    /// Not a vector.
    #[default]
    None,
    /// List-backed vector; the representation used when none is requested.
    #[serde(rename = "IList")]
    List,
    #[serde(rename = "IReadOnlyList")]
    ReadOnlyList,
    Array,
    Memory,
    ReadOnlyMemory,
    /// Vector of tables indexed by their key field.
    #[serde(rename = "IIndexedVector")]
    IndexedVector,
}

impl VectorType {
    pub const DEFAULT_VECTOR: VectorType = VectorType::List;

    pub fn is_vector(self) -> bool {
        self != VectorType::None
    }
}

impl Keyword for VectorType {
    // `None` is not selectable; a bracketed type is always a vector.
    const CHOICES: &'static [Self] = &[
        VectorType::List,
        VectorType::ReadOnlyList,
        VectorType::Array,
        VectorType::Memory,
        VectorType::ReadOnlyMemory,
        VectorType::IndexedVector,
    ];

    fn keyword(self) -> &'static str {
        match self {
            VectorType::None => "None",
            VectorType::List => "IList",
            VectorType::ReadOnlyList => "IReadOnlyList",
            VectorType::Array => "Array",
            VectorType::Memory => "Memory",
            VectorType::ReadOnlyMemory => "ReadOnlyMemory",
            VectorType::IndexedVector => "IIndexedVector",
        }
    }
}

/// Visibility of the generated property setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SetterKind {
    #[default]
    Public,
    PublicInit,
    Protected,
    ProtectedInit,
    ProtectedInternal,
    ProtectedInternalInit,
    /// No setter is generated.
    None,
}

impl Keyword for SetterKind {
    const CHOICES: &'static [Self] = &[
        SetterKind::Public,
        SetterKind::PublicInit,
        SetterKind::Protected,
        SetterKind::ProtectedInit,
        SetterKind::ProtectedInternal,
        SetterKind::ProtectedInternalInit,
        SetterKind::None,
    ];

    fn keyword(self) -> &'static str {
        match self {
            SetterKind::Public => "Public",
            SetterKind::PublicInit => "PublicInit",
            SetterKind::Protected => "Protected",
            SetterKind::ProtectedInit => "ProtectedInit",
            SetterKind::ProtectedInternal => "ProtectedInternal",
            SetterKind::ProtectedInternalInit => "ProtectedInternalInit",
            SetterKind::None => "None",
        }
    }
}

/// Validated model of one field declaration.
///
/// Always structurally complete, even when the declaration produced
/// diagnostics. `is_optional_scalar` and `default_value` are never both set,
/// and `vector_type` is not `None` exactly when the declared type was
/// bracketed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub fbs_field_type: String,
    pub vector_type: VectorType,
    pub is_optional_scalar: bool,
    pub default_value: Option<String>,
    pub deprecated: bool,
    pub is_key: bool,
    pub sorted_vector: bool,
    pub shared_string: bool,
    pub non_virtual: Option<bool>,
    pub index: Option<i32>,
    pub is_index_set_manually: bool,
    pub setter_kind: SetterKind,
    #[serde(skip)]
    pub span: Span,
}

impl FieldDefinition {
    /// A definition with every attribute at its zero value.
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            fbs_field_type: String::new(),
            vector_type: VectorType::None,
            is_optional_scalar: false,
            default_value: None,
            deprecated: false,
            is_key: false,
            sorted_vector: false,
            shared_string: false,
            non_virtual: None,
            index: None,
            is_index_set_manually: false,
            setter_kind: SetterKind::Public,
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Table,
    Struct,
}

/// A table or struct with its analyzed fields, in declaration order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: String,
    pub namespace: Option<String>,
    pub kind: TypeKind,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An enum or union, carried through by name only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDefinition {
    pub name: String,
    pub namespace: Option<String>,
    pub is_union: bool,
    pub underlying_type: Option<String>,
    pub values: Vec<String>,
}

/// Everything the front end hands to layout and code generation for one file.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub includes: Vec<String>,
    pub declared_attributes: Vec<String>,
    pub root_type: Option<String>,
    pub file_identifier: Option<String>,
    pub file_extension: Option<String>,
    pub types: Vec<TypeDefinition>,
    pub enums: Vec<EnumDefinition>,
}

impl SchemaDefinition {
    pub fn type_named(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
