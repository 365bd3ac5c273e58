pub mod attributes;
pub mod definition;
pub mod field;
pub mod table;

use fbsc_common::DiagnosticBag;

use crate::ast::Schema;

pub use attributes::{AttributeMap, AttributeValue, IntAttribute};
pub use definition::{
    EnumDefinition, FieldDefinition, Keyword, SchemaDefinition, SetterKind, TypeDefinition,
    TypeKind, VectorType,
};
pub use field::{analyze_field, FieldAnalyzer};

/// Analyze every table and struct of a parsed schema.
///
/// Fields are analyzed one at a time in source order, each inside a scope
/// named `Type.field`. The returned definition is complete even when the bag
/// holds errors; the caller decides whether to continue.
pub fn analyze(schema: &Schema) -> (SchemaDefinition, DiagnosticBag) {
    table::TableAggregator::new().aggregate(schema)
}
