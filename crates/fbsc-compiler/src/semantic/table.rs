use std::collections::HashMap;

use fbsc_common::{Diagnostic, DiagnosticBag, Span};
use tracing::debug;

use crate::ast::*;

use super::definition::{EnumDefinition, SchemaDefinition, TypeDefinition, TypeKind};
use super::field::FieldAnalyzer;

/// Walks a schema in source order, analyzes every field of every table and
/// struct, and runs the cross-field checks:
///  - field names are unique within a type;
///  - manual `id`s are unique within a table;
///  - `file_identifier` is exactly four characters.
///
/// It does not resolve type names and does not assign ids to fields
/// that have none.
pub struct TableAggregator {
    diagnostics: DiagnosticBag,
    namespace: Option<String>,
    definition: SchemaDefinition,
}

impl Default for TableAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TableAggregator {
    pub fn new() -> Self {
        Self {
            diagnostics: DiagnosticBag::new(),
            namespace: None,
            definition: SchemaDefinition::default(),
        }
    }

    pub fn aggregate(mut self, schema: &Schema) -> (SchemaDefinition, DiagnosticBag) {
        for decl in &schema.declarations {
            self.visit_declaration(decl);
        }
        (self.definition, self.diagnostics)
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Namespace(ns) => self.namespace = Some(ns.path.clone()),
            Declaration::Include(inc) => self.definition.includes.push(inc.value.clone()),
            Declaration::Attribute(attr) => {
                self.definition.declared_attributes.push(attr.name.clone())
            }
            Declaration::Table(t) => self.visit_type(t, TypeKind::Table),
            Declaration::Struct(s) => self.visit_type(s, TypeKind::Struct),
            Declaration::Enum(e) => self.visit_enum(e, false),
            Declaration::Union(u) => self.visit_enum(u, true),
            Declaration::RootType(root) => self.definition.root_type = Some(root.name.clone()),
            Declaration::FileIdentifier(id) => self.visit_file_identifier(id),
            Declaration::FileExtension(ext) => {
                self.definition.file_extension = Some(ext.value.clone())
            }
            Declaration::RpcService(_) => {}
        }
    }

    fn visit_type(&mut self, decl: &TypeDecl, kind: TypeKind) {
        debug!(name = %decl.name, fields = decl.fields.len(), "analyzing {:?}", kind);

        let mut scope = self.diagnostics.scope(decl.name.clone());
        let fields: Vec<_> = decl
            .fields
            .iter()
            .map(|field| FieldAnalyzer::new(field).analyze(&mut scope))
            .collect();

        let kind_name = match kind {
            TypeKind::Table => "table",
            TypeKind::Struct => "struct",
        };

        let mut seen_names: HashMap<&str, &Span> = HashMap::new();
        for field in &decl.fields {
            if let Some(first) = seen_names.get(field.name.as_str()) {
                scope.report(
                    Diagnostic::error(format!(
                        "duplicate field `{}` in {} `{}`",
                        field.name, kind_name, decl.name
                    ))
                    .with_span(field.name_span.clone())
                    .with_related((*first).clone(), "first declared here"),
                );
            } else {
                seen_names.insert(field.name.as_str(), &field.name_span);
            }
        }

        if kind == TypeKind::Table {
            let mut seen_ids: HashMap<i32, (&str, &Span)> = HashMap::new();
            for (def, field) in fields.iter().zip(&decl.fields) {
                let Some(index) = def.index.filter(|_| def.is_index_set_manually) else {
                    continue;
                };
                if let Some((owner, first)) = seen_ids.get(&index) {
                    scope.report(
                        Diagnostic::error(format!(
                            "field `{}` reuses id {} already assigned to `{}`",
                            field.name, index, owner
                        ))
                        .with_span(field.span.clone())
                        .with_related((*first).clone(), "id first assigned here"),
                    );
                } else {
                    seen_ids.insert(index, (field.name.as_str(), &field.span));
                }
            }
        }
        drop(scope);

        self.definition.types.push(TypeDefinition {
            name: decl.name.clone(),
            namespace: self.namespace.clone(),
            kind,
            fields,
        });
    }

    fn visit_enum(&mut self, decl: &EnumDecl, is_union: bool) {
        self.definition.enums.push(EnumDefinition {
            name: decl.name.clone(),
            namespace: self.namespace.clone(),
            is_union,
            underlying_type: decl.underlying_type.clone(),
            values: decl.values.iter().map(|v| v.name.clone()).collect(),
        });
    }

    fn visit_file_identifier(&mut self, id: &StringDirective) {
        if id.value.chars().count() != 4 {
            self.diagnostics.error(
                format!(
                    "file_identifier must be exactly 4 characters, found \"{}\"",
                    id.value
                ),
                id.span.clone(),
            );
        }
        self.definition.file_identifier = Some(id.value.clone());
    }
}
