//! Semantic analysis of a single field declaration.
//!
//! The analyzer turns the stringly-typed parts of a [`FieldDecl`] (type text,
//! default text, attribute list) into a [`FieldDefinition`]. It never fails:
//! every problem is reported to the [`DiagnosticBag`] under a scope named
//! after the field, and analysis carries on with the next attribute.
//!
//! Resolution is a fixed sequence of steps. Each step takes the partial
//! definition by value, reads the declaration and its attribute map, and
//! returns the updated definition, pushing any diagnostics to a step-local
//! list. Diagnostics therefore come out in step order.

use fbsc_common::{Diagnostic, DiagnosticBag, Span};
use tracing::{debug, trace};

use crate::ast::FieldDecl;

use super::attributes::{parse_bool, AttributeMap, IntAttribute};
use super::definition::{FieldDefinition, Keyword, SetterKind, VectorType};

/// FlatBuffers attributes this compiler rejects.
pub const UNSUPPORTED_ATTRIBUTES: [&str; 6] = [
    "required",
    "force_align",
    "bit_flags",
    "flexbuffer",
    "hash",
    "original_order",
];

const VECTOR_TYPE_ATTRIBUTE: &str = "vectortype";
const ID_ATTRIBUTE: &str = "id";

/// Inputs every resolution step reads.
struct FieldInput<'a> {
    decl: &'a FieldDecl,
    attributes: &'a AttributeMap,
}

impl FieldInput<'_> {
    /// Span of an attribute, or of the whole field when it was not written.
    fn span_of(&self, key: &str) -> Span {
        self.attributes
            .span_of(key)
            .cloned()
            .unwrap_or_else(|| self.decl.span.clone())
    }
}

type Step = fn(FieldDefinition, &FieldInput<'_>, &mut Vec<Diagnostic>) -> FieldDefinition;

const STEPS: [(&str, Step); 5] = [
    ("type", resolve_type),
    ("default", resolve_default),
    ("flags", resolve_flags),
    ("id", resolve_id),
    ("unsupported", reject_unsupported),
];

/// Analyzes one field declaration. Consumed by [`FieldAnalyzer::analyze`],
/// so a fresh analyzer is needed per field.
pub struct FieldAnalyzer<'a> {
    decl: &'a FieldDecl,
}

impl<'a> FieldAnalyzer<'a> {
    pub fn new(decl: &'a FieldDecl) -> Self {
        Self { decl }
    }

    /// Produce the field's definition, reporting problems to `bag` inside a
    /// scope named after the field. The scope is left before returning.
    pub fn analyze(self, bag: &mut DiagnosticBag) -> FieldDefinition {
        let name = self.decl.name.clone();
        let mut scope = bag.scope(name.clone());
        debug!(field = %name, type_text = %self.decl.type_text, "analyzing field");

        let (attributes, mut pending) = AttributeMap::build(&self.decl.metadata);
        let input = FieldInput {
            decl: self.decl,
            attributes: &attributes,
        };

        let start = FieldDefinition::new(name, self.decl.span.clone());
        let definition = STEPS.iter().fold(start, |definition, (label, step)| {
            let before = pending.len();
            let definition = step(definition, &input, &mut pending);
            trace!(step = label, diagnostics = pending.len() - before, "resolved");
            definition
        });

        for diagnostic in pending {
            scope.report(diagnostic);
        }
        definition
    }
}

/// Analyze one field; see [`FieldAnalyzer::analyze`].
pub fn analyze_field(decl: &FieldDecl, bag: &mut DiagnosticBag) -> FieldDefinition {
    FieldAnalyzer::new(decl).analyze(bag)
}

/// Split `[T]` into its element type and pick the vector representation.
fn resolve_type(
    mut def: FieldDefinition,
    input: &FieldInput<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> FieldDefinition {
    let type_text = input.decl.type_text.as_str();
    let requested = input.attributes.get(VECTOR_TYPE_ATTRIBUTE);

    let Some(inner) = type_text.strip_prefix('[') else {
        def.vector_type = VectorType::None;
        def.fbs_field_type = type_text.to_string();
        if requested.is_some() {
            diagnostics.push(
                Diagnostic::error(format!(
                    "non-vector field `{}` may not have the `vectortype` attribute",
                    def.name
                ))
                .with_span(input.span_of(VECTOR_TYPE_ATTRIBUTE)),
            );
        }
        return def;
    };

    def.fbs_field_type = inner.strip_suffix(']').unwrap_or(inner).to_string();
    def.vector_type = VectorType::DEFAULT_VECTOR;

    if let Some(attribute) = requested {
        let text = attribute.text().unwrap_or_default();
        match VectorType::from_keyword(text.trim()) {
            Some(vector_type) => def.vector_type = vector_type,
            None => diagnostics.push(
                Diagnostic::error(format!(
                    "unable to parse `{}` as a vector type; valid choices are: {}",
                    text,
                    VectorType::choices()
                ))
                .with_span(attribute.span.clone()),
            ),
        }
    }
    def
}

/// `null` marks an optional scalar; anything else non-empty is kept verbatim.
fn resolve_default(
    mut def: FieldDefinition,
    input: &FieldInput<'_>,
    _diagnostics: &mut Vec<Diagnostic>,
) -> FieldDefinition {
    match input.decl.default.as_ref().map(|d| d.text.as_str()) {
        Some("null") => def.is_optional_scalar = true,
        Some(text) if !text.is_empty() => def.default_value = Some(text.to_string()),
        _ => {}
    }
    def
}

fn resolve_flags(
    mut def: FieldDefinition,
    input: &FieldInput<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> FieldDefinition {
    let attrs = input.attributes;
    let flag = |key: &str, diagnostics: &mut Vec<Diagnostic>| {
        attrs.resolve(key, false, true, "`true` or `false`", parse_bool, diagnostics)
    };

    def.deprecated = flag("deprecated", diagnostics);
    def.is_key = flag("key", diagnostics);
    def.sorted_vector = flag("sortedvector", diagnostics);
    def.shared_string = flag("sharedstring", diagnostics);

    def.non_virtual = attrs.resolve(
        "nonVirtual",
        None,
        Some(true),
        "`true` or `false`",
        |text| parse_bool(text).map(Some),
        diagnostics,
    );

    let setter_choices = format!("one of: {}", SetterKind::choices());
    def.setter_kind = attrs.resolve(
        "setter",
        SetterKind::Public,
        SetterKind::Public,
        &setter_choices,
        |text| SetterKind::from_keyword(text.trim()),
        diagnostics,
    );
    def
}

/// A negative id is kept as the manual index but still reported.
fn resolve_id(
    mut def: FieldDefinition,
    input: &FieldInput<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> FieldDefinition {
    match input.attributes.integer(ID_ATTRIBUTE) {
        IntAttribute::Absent => {}
        IntAttribute::Invalid => diagnostics.push(
            Diagnostic::error("value of `id` attribute should be set if the attribute is present")
                .with_span(input.span_of(ID_ATTRIBUTE)),
        ),
        IntAttribute::Value(index) => {
            if index < 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "value of `id` attribute {} of field `{}` is negative",
                        index, def.name
                    ))
                    .with_span(input.span_of(ID_ATTRIBUTE)),
                );
            }
            def.index = Some(index);
            def.is_index_set_manually = true;
        }
    }
    def
}

fn reject_unsupported(
    def: FieldDefinition,
    input: &FieldInput<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> FieldDefinition {
    for attribute in UNSUPPORTED_ATTRIBUTES {
        if input.attributes.contains(attribute) {
            diagnostics.push(
                Diagnostic::error(format!("the `{}` attribute is not supported", attribute))
                    .with_span(input.span_of(attribute)),
            );
        }
    }
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DefaultValue, Metadata, MetadataEntry, MetadataValue};

    fn field(name: &str, type_text: &str, default: Option<&str>, attrs: &[(&str, Option<&str>)]) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            name_span: Span::dummy(),
            type_text: type_text.to_string(),
            type_span: Span::dummy(),
            default: default.map(|text| DefaultValue {
                text: text.to_string(),
                span: Span::dummy(),
            }),
            metadata: Metadata {
                entries: attrs
                    .iter()
                    .map(|(key, value)| MetadataEntry {
                        key: key.to_string(),
                        value: value.map(|v| MetadataValue {
                            text: v.to_string(),
                            span: Span::dummy(),
                        }),
                        span: Span::dummy(),
                    })
                    .collect(),
                span: None,
            },
            span: Span::dummy(),
        }
    }

    fn analyze(decl: &FieldDecl) -> (FieldDefinition, Vec<String>) {
        let mut bag = DiagnosticBag::new();
        let def = analyze_field(decl, &mut bag);
        let messages = bag
            .into_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        (def, messages)
    }

    // ===== id =====

    #[test]
    fn no_id_leaves_index_unset() {
        let (def, errs) = analyze(&field("hp", "short", None, &[]));
        assert_eq!(def.index, None);
        assert!(!def.is_index_set_manually);
        assert!(errs.is_empty(), "unexpected: {:?}", errs);
    }

    #[test]
    fn positive_id_is_manual_index() {
        let (def, errs) = analyze(&field("hp", "short", None, &[("id", Some("5"))]));
        assert_eq!(def.index, Some(5));
        assert!(def.is_index_set_manually);
        assert!(errs.is_empty(), "unexpected: {:?}", errs);
    }

    #[test]
    fn negative_id_is_kept_and_reported() {
        let (def, errs) = analyze(&field("hp", "short", None, &[("id", Some("-3"))]));
        assert_eq!(def.index, Some(-3));
        assert!(def.is_index_set_manually);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("negative"));
        assert!(errs[0].contains("-3"));
        assert!(errs[0].contains("`hp`"));
    }

    #[test]
    fn unparsable_id_is_reported_and_unset() {
        let (def, errs) = analyze(&field("hp", "short", None, &[("id", Some("abc"))]));
        assert_eq!(def.index, None);
        assert!(!def.is_index_set_manually);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("should be set"));
    }

    #[test]
    fn id_without_value_is_reported() {
        let (def, errs) = analyze(&field("hp", "short", None, &[("id", None)]));
        assert_eq!(def.index, None);
        assert!(!def.is_index_set_manually);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("should be set"));
    }

    // ===== type / vectortype =====

    #[test]
    fn vector_uses_default_representation() {
        let (def, errs) = analyze(&field("xs", "[int]", None, &[]));
        assert_eq!(def.vector_type, VectorType::List);
        assert_eq!(def.fbs_field_type, "int");
        assert!(errs.is_empty());
    }

    #[test]
    fn vectortype_selects_representation_case_insensitively() {
        let (def, errs) = analyze(&field("xs", "[int]", None, &[("vectortype", Some("ireadonlylist"))]));
        assert_eq!(def.vector_type, VectorType::ReadOnlyList);
        assert!(errs.is_empty());

        let (def, _) = analyze(&field("xs", "[ubyte]", None, &[("vectortype", Some("Memory"))]));
        assert_eq!(def.vector_type, VectorType::Memory);
        assert_eq!(def.fbs_field_type, "ubyte");
    }

    #[test]
    fn bad_vectortype_lists_choices_and_keeps_default() {
        let (def, errs) = analyze(&field("xs", "[int]", None, &[("vectortype", Some("badvalue"))]));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("badvalue"));
        assert!(errs[0].contains("valid choices are: IList, IReadOnlyList"));
        assert_eq!(def.fbs_field_type, "int");
        assert_eq!(def.vector_type, VectorType::List);
    }

    #[test]
    fn vectortype_none_is_rejected_on_vectors() {
        let (def, errs) = analyze(&field("xs", "[int]", None, &[("vectortype", Some("None"))]));
        assert_eq!(errs.len(), 1);
        assert_eq!(def.vector_type, VectorType::List);
    }

    #[test]
    fn vectortype_on_scalar_is_rejected() {
        let (def, errs) = analyze(&field("hp", "int", None, &[("vectortype", Some("anything"))]));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("non-vector field `hp`"));
        assert_eq!(def.fbs_field_type, "int");
        assert_eq!(def.vector_type, VectorType::None);
    }

    #[test]
    fn only_one_bracket_pair_is_stripped() {
        let (def, _) = analyze(&field("m", "[[int]]", None, &[]));
        assert_eq!(def.fbs_field_type, "[int]");
        let (def, _) = analyze(&field("a", "[float:3]", None, &[]));
        assert_eq!(def.fbs_field_type, "float:3");
    }

    // ===== defaults =====

    #[test]
    fn null_default_is_optional_scalar() {
        let (def, errs) = analyze(&field("hp", "int", Some("null"), &[]));
        assert!(def.is_optional_scalar);
        assert_eq!(def.default_value, None);
        assert!(errs.is_empty());
    }

    #[test]
    fn literal_default_is_kept_verbatim() {
        let (def, _) = analyze(&field("hp", "int", Some("7"), &[]));
        assert_eq!(def.default_value.as_deref(), Some("7"));
        assert!(!def.is_optional_scalar);

        let (def, _) = analyze(&field("c", "Color", Some("Red"), &[]));
        assert_eq!(def.default_value.as_deref(), Some("Red"));
    }

    #[test]
    fn no_default_leaves_both_unset() {
        let (def, _) = analyze(&field("hp", "int", None, &[]));
        assert!(!def.is_optional_scalar);
        assert_eq!(def.default_value, None);
        let (def, _) = analyze(&field("hp", "int", Some(""), &[]));
        assert_eq!(def.default_value, None);
    }

    // ===== flags =====

    #[test]
    fn flag_attributes() {
        let (def, errs) = analyze(&field(
            "name",
            "string",
            None,
            &[("deprecated", None), ("key", None), ("sharedstring", Some("false"))],
        ));
        assert!(def.deprecated);
        assert!(def.is_key);
        assert!(!def.shared_string);
        assert!(!def.sorted_vector);
        assert!(errs.is_empty());
    }

    #[test]
    fn unparsable_flag_falls_back_to_absent_default() {
        let (def, errs) = analyze(&field("xs", "[int]", None, &[("sortedvector", Some("yes"))]));
        assert!(!def.sorted_vector);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("`sortedvector`"));
    }

    #[test]
    fn non_virtual_is_tri_state() {
        let (def, _) = analyze(&field("a", "int", None, &[]));
        assert_eq!(def.non_virtual, None);
        let (def, _) = analyze(&field("a", "int", None, &[("nonVirtual", None)]));
        assert_eq!(def.non_virtual, Some(true));
        let (def, _) = analyze(&field("a", "int", None, &[("nonVirtual", Some("false"))]));
        assert_eq!(def.non_virtual, Some(false));
        let (def, errs) = analyze(&field("a", "int", None, &[("nonVirtual", Some("nah"))]));
        assert_eq!(def.non_virtual, None);
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn setter_kinds() {
        let (def, _) = analyze(&field("a", "int", None, &[]));
        assert_eq!(def.setter_kind, SetterKind::Public);
        let (def, _) = analyze(&field("a", "int", None, &[("setter", None)]));
        assert_eq!(def.setter_kind, SetterKind::Public);
        let (def, _) = analyze(&field("a", "int", None, &[("setter", Some("protectedinternal"))]));
        assert_eq!(def.setter_kind, SetterKind::ProtectedInternal);
    }

    #[test]
    fn invalid_setter_falls_back_to_public() {
        let (def, errs) = analyze(&field("a", "int", None, &[("setter", Some("Private"))]));
        assert_eq!(def.setter_kind, SetterKind::Public);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("`Private`"));
        assert!(errs[0].contains("ProtectedInternalInit"));
    }

    // ===== unsupported =====

    #[test]
    fn required_is_rejected_but_rest_is_processed() {
        let (def, errs) = analyze(&field(
            "name",
            "string",
            None,
            &[("required", None), ("id", Some("2")), ("deprecated", None)],
        ));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("`required`"));
        assert_eq!(def.index, Some(2));
        assert!(def.deprecated);
    }

    #[test]
    fn every_unsupported_attribute_is_reported() {
        let attrs: Vec<_> = UNSUPPORTED_ATTRIBUTES.iter().map(|a| (*a, None)).collect();
        let (_, errs) = analyze(&field("x", "int", None, &attrs));
        assert_eq!(errs.len(), UNSUPPORTED_ATTRIBUTES.len());
        for (attribute, message) in UNSUPPORTED_ATTRIBUTES.iter().zip(&errs) {
            assert!(message.contains(attribute), "{} not in {}", attribute, message);
        }
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let (_, errs) = analyze(&field("x", "int", None, &[("priority", Some("1"))]));
        assert!(errs.is_empty());
    }

    // ===== ordering and scoping =====

    #[test]
    fn diagnostics_follow_step_order() {
        let (_, errs) = analyze(&field(
            "x",
            "int",
            None,
            &[("hash", None), ("id", Some("-1")), ("vectortype", Some("Array")), ("key", Some("?"))],
        ));
        assert_eq!(errs.len(), 4);
        assert!(errs[0].contains("vectortype"));
        assert!(errs[1].contains("`key`"));
        assert!(errs[2].contains("negative"));
        assert!(errs[3].contains("`hash`"));
    }

    #[test]
    fn diagnostics_are_scoped_to_the_field_and_scope_is_left() {
        let decl = field("hp", "int", None, &[("required", None), ("id", Some("x"))]);
        let mut bag = DiagnosticBag::new();
        let def = bag.with_scope("Monster", |outer| analyze_field(&decl, outer));

        assert_eq!(def.name, "hp");
        assert!(bag.scopes().is_empty());
        assert_eq!(bag.len(), 2);
        for diag in bag.diagnostics() {
            assert_eq!(diag.scope, vec!["Monster", "hp"]);
        }
    }

    #[test]
    fn duplicate_attribute_warning_is_scoped() {
        let decl = field("hp", "int", None, &[("id", Some("1")), ("id", Some("2"))]);
        let mut bag = DiagnosticBag::new();
        let def = analyze_field(&decl, &mut bag);
        assert_eq!(def.index, Some(2));
        assert!(!bag.has_errors());
        assert_eq!(bag.diagnostics()[0].scope_path(), "hp");
    }
}
