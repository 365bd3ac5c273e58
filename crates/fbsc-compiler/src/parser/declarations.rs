use fbsc_common::Span;

use crate::ast::*;
use crate::lexer::token::TokenKind;

use super::Parser;

impl Parser {
    /// Parse a top-level declaration.
    pub(super) fn parse_declaration(&mut self) -> Option<Declaration> {
        match self.peek() {
            TokenKind::Namespace => self.parse_namespace_decl(),
            TokenKind::Include => self
                .parse_string_directive("include path")
                .map(Declaration::Include),
            TokenKind::Attribute => self.parse_attribute_decl(),
            TokenKind::Table => self.parse_type_decl(TypeDeclKind::Table),
            TokenKind::Struct => self.parse_type_decl(TypeDeclKind::Struct),
            TokenKind::Enum => self.parse_enum_decl().map(Declaration::Enum),
            TokenKind::Union => self.parse_enum_decl().map(Declaration::Union),
            TokenKind::RootType => self.parse_root_type_decl(),
            TokenKind::FileIdentifier => self
                .parse_string_directive("file identifier")
                .map(Declaration::FileIdentifier),
            TokenKind::FileExtension => self
                .parse_string_directive("file extension")
                .map(Declaration::FileExtension),
            TokenKind::RpcService => self.parse_rpc_service_decl(),
            _ => {
                self.error_expected("declaration");
                None
            }
        }
    }

    // ========================================================================
    // Directives
    // ========================================================================

    /// Parse `namespace A.B.C;`
    fn parse_namespace_decl(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance(); // consume 'namespace'
        let (path, _) = self.parse_dotted_name("namespace name")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        let span = start.merge(&self.previous_span());
        Some(Declaration::Namespace(NamespaceDecl { path, span }))
    }

    /// Parse `<keyword> "value";`
    fn parse_string_directive(&mut self, what: &str) -> Option<StringDirective> {
        let start = self.current_span();
        self.advance(); // consume keyword
        let value = self.expect(TokenKind::StringLiteral, what)?.lexeme.clone();
        self.expect(TokenKind::Semicolon, "';'")?;
        let span = start.merge(&self.previous_span());
        Some(StringDirective { value, span })
    }

    /// Parse `attribute "name";` (a bare identifier is accepted too).
    fn parse_attribute_decl(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance(); // consume 'attribute'
        let name = if self.peek() == TokenKind::StringLiteral {
            self.advance().lexeme.clone()
        } else {
            self.expect_name("attribute name")?.0
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        let span = start.merge(&self.previous_span());
        Some(Declaration::Attribute(AttributeDecl { name, span }))
    }

    /// Parse `root_type Name;`
    fn parse_root_type_decl(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance(); // consume 'root_type'
        let (name, _) = self.parse_dotted_name("root type name")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        let span = start.merge(&self.previous_span());
        Some(Declaration::RootType(RootTypeDecl { name, span }))
    }

    /// Parse `rpc_service Name { ... }`, keeping only the name.
    fn parse_rpc_service_decl(&mut self) -> Option<Declaration> {
        let start = self.current_span();
        self.advance(); // consume 'rpc_service'
        let (name, _) = self.expect_name("service name")?;
        self.expect(TokenKind::LeftBrace, "'{'")?;

        let mut depth = 1usize;
        while depth > 0 && !self.is_at_end() {
            match self.advance().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            self.error_expected("'}'");
            return None;
        }

        let span = start.merge(&self.previous_span());
        self.diagnostics.warning(
            format!("rpc_service `{}` is ignored", name),
            span.clone(),
        );
        Some(Declaration::RpcService(RpcServiceDecl { name, span }))
    }

    // ========================================================================
    // table / struct
    // ========================================================================

    /// Parse `table Name (metadata) { fields }` or the `struct` equivalent.
    fn parse_type_decl(&mut self, kind: TypeDeclKind) -> Option<Declaration> {
        let start = self.current_span();
        self.advance(); // consume 'table' / 'struct'

        let (name, _) = self.expect_name("type name")?;
        let metadata = self.parse_metadata()?;
        self.expect(TokenKind::LeftBrace, "'{'")?;

        let mut fields = Vec::new();
        while self.peek() != TokenKind::RightBrace && !self.is_at_end() {
            match self.parse_field_decl() {
                Some(field) => fields.push(field),
                None => self.skip_past_semicolon(),
            }
        }
        self.expect(TokenKind::RightBrace, "'}'")?;

        let span = start.merge(&self.previous_span());
        let decl = TypeDecl {
            kind,
            name,
            metadata,
            fields,
            span,
        };
        Some(match kind {
            TypeDeclKind::Table => Declaration::Table(decl),
            TypeDeclKind::Struct => Declaration::Struct(decl),
        })
    }

    /// Parse `name: type [= default] [(metadata)];`
    fn parse_field_decl(&mut self) -> Option<FieldDecl> {
        let start = self.current_span();
        let (name, name_span) = self.expect_name("field name")?;
        self.expect(TokenKind::Colon, "':'")?;
        let (type_text, type_span) = self.parse_type_text()?;

        let default = if self.eat(TokenKind::Equal) {
            let (text, span) = self.parse_scalar_text("default value", true)?;
            Some(DefaultValue { text, span })
        } else {
            None
        };

        let metadata = self.parse_metadata()?;
        self.expect(TokenKind::Semicolon, "';'")?;

        let span = start.merge(&self.previous_span());
        Some(FieldDecl {
            name,
            name_span,
            type_text,
            type_span,
            default,
            metadata,
            span,
        })
    }

    /// Parse a type and return its text without whitespace:
    /// `int`, `Game.Weapon`, `[ubyte]`, `[float:3]`.
    pub(super) fn parse_type_text(&mut self) -> Option<(String, Span)> {
        if self.peek() != TokenKind::LeftBracket {
            return self.parse_dotted_name("type");
        }

        let start = self.current_span();
        self.advance(); // consume '['
        let (element, _) = self.parse_type_text()?;
        let mut text = format!("[{}", element);
        if self.eat(TokenKind::Colon) {
            let length = self.expect(TokenKind::IntLiteral, "array length")?;
            text.push(':');
            text.push_str(&length.lexeme);
        }
        self.expect(TokenKind::RightBracket, "']'")?;
        text.push(']');
        Some((text, start.merge(&self.previous_span())))
    }

    /// Parse `ident(.ident)*`.
    fn parse_dotted_name(&mut self, what: &str) -> Option<(String, Span)> {
        let (mut name, start) = self.expect_name(what)?;
        while self.eat(TokenKind::Dot) {
            let (part, _) = self.expect_name(what)?;
            name.push('.');
            name.push_str(&part);
        }
        Some((name, start.merge(&self.previous_span())))
    }

    /// Parse a scalar-ish value: optional sign then a number, identifier,
    /// boolean or string. Returns its text: signs are kept, and strings are
    /// re-quoted when `quote_strings` is set.
    fn parse_scalar_text(&mut self, what: &str, quote_strings: bool) -> Option<(String, Span)> {
        let start = self.current_span();
        let mut text = String::new();
        if matches!(self.peek(), TokenKind::Plus | TokenKind::Minus) {
            text.push_str(&self.advance().lexeme);
        }

        let kind = self.peek();
        match kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                text.push_str(&self.advance().lexeme);
            }
            TokenKind::StringLiteral if text.is_empty() => {
                let value = &self.advance().lexeme;
                if quote_strings {
                    text = format!("\"{}\"", value);
                } else {
                    text = value.clone();
                }
            }
            TokenKind::Identifier | TokenKind::True | TokenKind::False => {
                text.push_str(&self.advance().lexeme);
            }
            _ if kind.is_keyword() && text.is_empty() => {
                text.push_str(&self.advance().lexeme);
            }
            _ => {
                self.error_expected(what);
                return None;
            }
        }
        Some((text, start.merge(&self.previous_span())))
    }

    /// Parse an optional `(key, key: value, ...)` list.
    pub(super) fn parse_metadata(&mut self) -> Option<Metadata> {
        if self.peek() != TokenKind::LeftParen {
            return Some(Metadata::default());
        }
        let start = self.current_span();
        self.advance(); // consume '('

        let mut entries = Vec::new();
        if self.peek() != TokenKind::RightParen {
            loop {
                entries.push(self.parse_metadata_entry()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')'")?;

        Some(Metadata {
            entries,
            span: Some(start.merge(&self.previous_span())),
        })
    }

    fn parse_metadata_entry(&mut self) -> Option<MetadataEntry> {
        let (key, start) = self.expect_name("attribute name")?;
        let value = if self.eat(TokenKind::Colon) {
            let (text, span) = self.parse_scalar_text("attribute value", false)?;
            Some(MetadataValue { text, span })
        } else {
            None
        };
        let span = start.merge(&self.previous_span());
        Some(MetadataEntry { key, value, span })
    }

    // ========================================================================
    // enum / union
    // ========================================================================

    /// Parse `enum Name [: type] [(metadata)] { A [= 1], B, ... }`.
    fn parse_enum_decl(&mut self) -> Option<EnumDecl> {
        let start = self.current_span();
        self.advance(); // consume 'enum' / 'union'

        let (name, _) = self.expect_name("enum name")?;
        let underlying_type = if self.eat(TokenKind::Colon) {
            Some(self.parse_type_text()?.0)
        } else {
            None
        };
        let metadata = self.parse_metadata()?;
        self.expect(TokenKind::LeftBrace, "'{'")?;

        let mut values = Vec::new();
        while self.peek() != TokenKind::RightBrace && !self.is_at_end() {
            let (value_name, value_start) = self.parse_dotted_name("enum value")?;
            let value = if self.eat(TokenKind::Equal) {
                Some(self.parse_scalar_text("enum value", false)?.0)
            } else {
                None
            };
            values.push(EnumValue {
                name: value_name,
                value,
                span: value_start.merge(&self.previous_span()),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBrace, "'}'")?;

        let span = start.merge(&self.previous_span());
        Some(EnumDecl {
            name,
            underlying_type,
            metadata,
            values,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(source: &str) -> Schema {
        let (tokens, lex_diags) = Lexer::new(source, "test.fbs").tokenize();
        assert!(
            !lex_diags.has_errors(),
            "lex errors: {:?}",
            lex_diags.diagnostics()
        );
        let (schema, parse_diags) = Parser::new(tokens).parse();
        assert!(
            !parse_diags.has_errors(),
            "parse errors: {:?}",
            parse_diags.diagnostics()
        );
        schema
    }

    fn parse_with_errors(source: &str) -> (Schema, fbsc_common::DiagnosticBag) {
        let (tokens, _) = Lexer::new(source, "test.fbs").tokenize();
        Parser::new(tokens).parse()
    }

    fn only_table(schema: &Schema) -> &TypeDecl {
        match &schema.declarations[0] {
            Declaration::Table(t) => t,
            other => panic!("expected Table, got {:?}", std::mem::discriminant(other)),
        }
    }

    #[test]
    fn parse_table_fields() {
        let schema = parse(
            r#"
            table Monster {
                name: string;
                hp: short = 100;
                inventory: [ubyte];
            }
        "#,
        );
        let table = only_table(&schema);
        assert_eq!(table.kind, TypeDeclKind::Table);
        assert_eq!(table.name, "Monster");
        let names: Vec<_> = table.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "hp", "inventory"]);
        assert_eq!(table.fields[1].default.as_ref().map(|d| d.text.as_str()), Some("100"));
        assert_eq!(table.fields[2].type_text, "[ubyte]");
    }

    #[test]
    fn parse_type_texts() {
        let schema = parse(
            r#"
            struct Vec3 {
                xs: [float:3];
            }
            table T {
                w: Game.Weapon;
                ws: [ Game.Weapon ];
            }
        "#,
        );
        match &schema.declarations[0] {
            Declaration::Struct(s) => assert_eq!(s.fields[0].type_text, "[float:3]"),
            other => panic!("expected Struct, got {:?}", std::mem::discriminant(other)),
        }
        match &schema.declarations[1] {
            Declaration::Table(t) => {
                assert_eq!(t.fields[0].type_text, "Game.Weapon");
                assert_eq!(t.fields[1].type_text, "[Game.Weapon]");
            }
            other => panic!("expected Table, got {:?}", std::mem::discriminant(other)),
        }
    }

    #[test]
    fn parse_default_texts() {
        let schema = parse(
            r#"
            table T {
                a: int = -5;
                b: float = 1.5;
                c: Color = Red;
                d: int = null;
                e: bool = true;
            }
        "#,
        );
        let defaults: Vec<_> = only_table(&schema)
            .fields
            .iter()
            .map(|f| f.default.as_ref().map(|d| d.text.clone()))
            .collect();
        assert_eq!(
            defaults,
            vec![
                Some("-5".to_string()),
                Some("1.5".to_string()),
                Some("Red".to_string()),
                Some("null".to_string()),
                Some("true".to_string()),
            ]
        );
    }

    #[test]
    fn parse_metadata_entries() {
        let schema = parse(
            r#"
            table T {
                a: [int] (id: -3, deprecated, vectortype: "IReadOnlyList", setter: Protected);
            }
        "#,
        );
        let field = &only_table(&schema).fields[0];
        let entries: Vec<_> = field
            .metadata
            .entries
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_ref().map(|v| v.text.as_str())))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("id", Some("-3")),
                ("deprecated", None),
                ("vectortype", Some("IReadOnlyList")),
                ("setter", Some("Protected")),
            ]
        );
    }

    #[test]
    fn parse_table_metadata() {
        let schema = parse("table T (fs_serializer: Lazy) { a: int; }");
        let table = only_table(&schema);
        assert_eq!(table.metadata.entries[0].key, "fs_serializer");
        assert!(table.metadata.span.is_some());
    }

    #[test]
    fn parse_directives() {
        let schema = parse(
            r#"
            include "weapons.fbs";
            namespace MyGame.Sample;
            attribute "priority";
            table Monster { hp: short; }
            root_type Monster;
            file_identifier "MONS";
            file_extension "mon";
        "#,
        );
        assert_eq!(schema.declarations.len(), 7);
        assert!(matches!(
            &schema.declarations[1],
            Declaration::Namespace(n) if n.path == "MyGame.Sample"
        ));
        assert!(matches!(
            &schema.declarations[2],
            Declaration::Attribute(a) if a.name == "priority"
        ));
        assert!(matches!(
            &schema.declarations[4],
            Declaration::RootType(r) if r.name == "Monster"
        ));
        assert!(matches!(
            &schema.declarations[5],
            Declaration::FileIdentifier(f) if f.value == "MONS"
        ));
    }

    #[test]
    fn parse_enum_and_union() {
        let schema = parse(
            r#"
            enum Color : byte { Red = 1, Green, Blue = -2, }
            union Equipment { Weapon, Shield }
        "#,
        );
        match &schema.declarations[0] {
            Declaration::Enum(e) => {
                assert_eq!(e.name, "Color");
                assert_eq!(e.underlying_type.as_deref(), Some("byte"));
                assert_eq!(e.values.len(), 3);
                assert_eq!(e.values[2].value.as_deref(), Some("-2"));
            }
            other => panic!("expected Enum, got {:?}", std::mem::discriminant(other)),
        }
        match &schema.declarations[1] {
            Declaration::Union(u) => assert_eq!(u.values.len(), 2),
            other => panic!("expected Union, got {:?}", std::mem::discriminant(other)),
        }
    }

    #[test]
    fn rpc_service_is_skipped_with_warning() {
        let (schema, diags) = parse_with_errors(
            r#"
            rpc_service MonsterStorage {
                Store(Monster):Stat (streaming: "none");
            }
            table T { a: int; }
        "#,
        );
        assert!(!diags.has_errors());
        assert!(diags.has_warnings());
        assert_eq!(schema.declarations.len(), 2);
    }

    #[test]
    fn field_error_recovers_within_table() {
        let (schema, diags) = parse_with_errors(
            r#"
            table T {
                a int;
                b: int;
            }
        "#,
        );
        assert_eq!(diags.error_count(), 1);
        assert!(diags.diagnostics()[0].message.contains("expected ':'"));
        let table = only_table(&schema);
        assert_eq!(table.fields.len(), 1);
        assert_eq!(table.fields[0].name, "b");
    }

    #[test]
    fn bad_declaration_recovers() {
        let (schema, diags) = parse_with_errors("garbage here; table T { a: int; }");
        assert!(diags.has_errors());
        assert!(schema
            .declarations
            .iter()
            .any(|d| matches!(d, Declaration::Table(t) if t.name == "T")));
    }

    #[test]
    fn missing_semicolon_reported() {
        let (_, diags) = parse_with_errors("table T { a: int }");
        assert!(diags
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("expected ';'")));
    }
}
