// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Recursive-descent IDL parser.
//!
//! Types must be declared before use (standard IDL ordering). All
//! diagnostics are collected; a non-empty diagnostic list fails the parse
//! as a whole.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::lexer::{Lexer, Spanned, Token};
use super::{Diagnostic, IdlContext, IdlError};
use crate::xtypes::{
    AliasType, ArrayType, DynamicType, EnumType, Enumerator, MapType, Member, PrimitiveKind,
    SequenceType, StructType, UnionCase, UnionType,
};

/// Parse preprocessed IDL source into a type registry.
pub fn parse_idl(source: &str) -> Result<IdlContext, IdlError> {
    let (tokens, mut diags) = Lexer::new(source).tokenize();
    let mut parser = Parser {
        tokens,
        pos: 0,
        scope: Vec::new(),
        types: BTreeMap::new(),
        consts: BTreeMap::new(),
        diags: Vec::new(),
    };
    parser.parse_definitions(false);
    diags.append(&mut parser.diags);
    if diags.is_empty() {
        Ok(IdlContext::from_types(parser.types))
    } else {
        Err(IdlError::Parse(diags))
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    scope: Vec<String>,
    types: BTreeMap<String, Arc<DynamicType>>,
    consts: BTreeMap<String, i64>,
    diags: Vec<Diagnostic>,
}

#[derive(Default)]
struct Annotations {
    is_key: bool,
    is_optional: bool,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> bool {
        if self.eat(expected) {
            true
        } else {
            self.error(format!("expected {} ({:?}), found {:?}", what, expected, self.peek()));
            false
        }
    }

    fn error(&mut self, message: String) {
        let line = self.line();
        self.diags.push(Diagnostic { line, message });
    }

    /// Skip forward to just past the next `;`, or past a balanced `{ }`
    /// block, so one bad definition does not cascade.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.bump() {
                Token::LBrace => depth += 1,
                Token::RBrace => depth = depth.saturating_sub(1),
                Token::Semi if depth == 0 => break,
                Token::Eof => break,
                _ => {}
            }
        }
    }

    fn scoped(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.scope.join("::"), name)
        }
    }

    fn register(&mut self, name: &str, ty: DynamicType) -> Arc<DynamicType> {
        let key = self.scoped(name);
        let arc = Arc::new(ty);
        if self.types.insert(key.clone(), arc.clone()).is_some() {
            self.error(format!("type redefined: {}", key));
        }
        arc
    }

    /// Resolve a (possibly scoped) name from the innermost scope outward.
    fn resolve(&self, name: &str) -> Option<Arc<DynamicType>> {
        if let Some(absolute) = name.strip_prefix("::") {
            return self.types.get(absolute).cloned();
        }
        for depth in (0..=self.scope.len()).rev() {
            let key = if depth == 0 {
                name.to_string()
            } else {
                format!("{}::{}", self.scope[..depth].join("::"), name)
            };
            if let Some(ty) = self.types.get(&key) {
                return Some(ty.clone());
            }
        }
        None
    }

    fn resolve_const(&self, name: &str) -> Option<i64> {
        for depth in (0..=self.scope.len()).rev() {
            let key = if depth == 0 {
                name.to_string()
            } else {
                format!("{}::{}", self.scope[..depth].join("::"), name)
            };
            if let Some(v) = self.consts.get(&key) {
                return Some(*v);
            }
        }
        None
    }

    fn parse_definitions(&mut self, in_module: bool) {
        loop {
            // Type-level annotations (@appendable, @mutable, ...) do not
            // affect the mapping and are dropped.
            self.parse_annotations();
            match self.peek().clone() {
                Token::Eof => break,
                Token::RBrace if in_module => break,
                Token::Ident(word) => match word.as_str() {
                    "module" => self.parse_module(),
                    "struct" => self.parse_struct(),
                    "enum" => self.parse_enum(),
                    "typedef" => self.parse_typedef(),
                    "union" => self.parse_union(),
                    "const" => self.parse_const(),
                    other => {
                        self.error(format!("unexpected token '{}'", other));
                        self.recover();
                    }
                },
                Token::Semi => {
                    self.bump();
                }
                other => {
                    self.error(format!("unexpected token {:?}", other));
                    self.recover();
                }
            }
        }
    }

    fn parse_annotations(&mut self) -> Annotations {
        let mut out = Annotations::default();
        while self.eat(&Token::At) {
            let name = match self.bump() {
                Token::Ident(name) => name,
                other => {
                    self.error(format!("expected annotation name, found {:?}", other));
                    continue;
                }
            };
            match name.as_str() {
                "key" => out.is_key = true,
                "optional" => out.is_optional = true,
                _ => {}
            }
            // Skip any annotation arguments.
            if self.eat(&Token::LParen) {
                let mut depth = 1usize;
                loop {
                    match self.bump() {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        Token::Eof => break,
                        _ => {}
                    }
                }
            }
        }
        out
    }

    fn ident(&mut self, what: &str) -> Option<String> {
        match self.bump() {
            Token::Ident(name) => Some(name),
            other => {
                self.error(format!("expected {}, found {:?}", what, other));
                None
            }
        }
    }

    fn parse_module(&mut self) {
        self.bump(); // module
        let Some(name) = self.ident("module name") else {
            self.recover();
            return;
        };
        if !self.expect(&Token::LBrace, "module body") {
            self.recover();
            return;
        }
        self.scope.push(name);
        self.parse_definitions(true);
        self.scope.pop();
        self.expect(&Token::RBrace, "end of module");
        self.eat(&Token::Semi);
    }

    fn parse_struct(&mut self) {
        self.bump(); // struct
        let Some(name) = self.ident("struct name") else {
            self.recover();
            return;
        };
        if !self.expect(&Token::LBrace, "struct body") {
            self.recover();
            return;
        }
        let scoped_name = self.scoped(&name);
        let mut members = Vec::new();
        while !matches!(self.peek(), Token::RBrace | Token::Eof) {
            let annotations = self.parse_annotations();
            let Some(ty) = self.parse_type_spec() else {
                self.recover();
                continue;
            };
            loop {
                let Some(member_name) = self.ident("member name") else {
                    self.recover();
                    break;
                };
                let member_ty = self.parse_array_suffix(ty.clone());
                let mut member = Member::new(member_name, member_ty);
                member.is_key = annotations.is_key;
                member.is_optional = annotations.is_optional;
                members.push(member);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::Semi, "end of member");
        }
        self.expect(&Token::RBrace, "end of struct");
        self.eat(&Token::Semi);
        self.register(
            &name,
            DynamicType::Struct(StructType {
                name: scoped_name,
                members,
            }),
        );
    }

    fn parse_enum(&mut self) {
        self.bump(); // enum
        let Some(name) = self.ident("enum name") else {
            self.recover();
            return;
        };
        if !self.expect(&Token::LBrace, "enum body") {
            self.recover();
            return;
        }
        let scoped_name = self.scoped(&name);
        let mut enumerators = Vec::new();
        let mut next_value: u32 = 0;
        while !matches!(self.peek(), Token::RBrace | Token::Eof) {
            self.parse_annotations();
            let Some(enum_name) = self.ident("enumerator") else {
                self.recover();
                return;
            };
            if self.eat(&Token::Eq) {
                if let Token::Int(v) = self.bump() {
                    next_value = v as u32;
                } else {
                    self.error("expected enumerator value".into());
                }
            }
            enumerators.push(Enumerator {
                name: enum_name,
                value: next_value,
            });
            next_value += 1;
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace, "end of enum");
        self.eat(&Token::Semi);
        self.register(
            &name,
            DynamicType::Enum(EnumType {
                name: scoped_name,
                enumerators,
            }),
        );
    }

    fn parse_typedef(&mut self) {
        self.bump(); // typedef
        let Some(ty) = self.parse_type_spec() else {
            self.recover();
            return;
        };
        let Some(name) = self.ident("typedef name") else {
            self.recover();
            return;
        };
        let underlying = self.parse_array_suffix(ty);
        self.expect(&Token::Semi, "end of typedef");
        let scoped_name = self.scoped(&name);
        self.register(
            &name,
            DynamicType::Alias(AliasType {
                name: scoped_name,
                underlying,
            }),
        );
    }

    fn parse_const(&mut self) {
        self.bump(); // const
        let _ty = self.parse_type_spec();
        let Some(name) = self.ident("constant name") else {
            self.recover();
            return;
        };
        if !self.expect(&Token::Eq, "constant value") {
            self.recover();
            return;
        }
        let value = self.parse_int_expr();
        self.expect(&Token::Semi, "end of constant");
        if let Some(v) = value {
            let key = self.scoped(&name);
            self.consts.insert(key, v);
        }
    }

    fn parse_union(&mut self) {
        self.bump(); // union
        let Some(name) = self.ident("union name") else {
            self.recover();
            return;
        };
        let scoped_name = self.scoped(&name);
        if self.ident("switch").as_deref() != Some("switch") {
            self.recover();
            return;
        }
        self.expect(&Token::LParen, "discriminator");
        let Some(discriminator) = self.parse_type_spec() else {
            self.recover();
            return;
        };
        self.expect(&Token::RParen, "end of discriminator");
        if !self.expect(&Token::LBrace, "union body") {
            self.recover();
            return;
        }
        let mut cases: Vec<UnionCase> = Vec::new();
        while !matches!(self.peek(), Token::RBrace | Token::Eof) {
            let mut labels = Vec::new();
            let mut is_default = false;
            loop {
                match self.peek().clone() {
                    Token::Ident(word) if word == "case" => {
                        self.bump();
                        if let Some(v) = self.parse_case_label(&discriminator) {
                            labels.push(v);
                        }
                        self.expect(&Token::Colon, "case label");
                    }
                    Token::Ident(word) if word == "default" => {
                        self.bump();
                        is_default = true;
                        self.expect(&Token::Colon, "default label");
                    }
                    _ => break,
                }
            }
            if labels.is_empty() && !is_default {
                self.error("union case without labels".into());
                self.recover();
                continue;
            }
            let Some(case_ty) = self.parse_type_spec() else {
                self.recover();
                continue;
            };
            let Some(case_name) = self.ident("case member name") else {
                self.recover();
                continue;
            };
            let case_ty = self.parse_array_suffix(case_ty);
            self.expect(&Token::Semi, "end of case");
            cases.push(UnionCase {
                name: case_name,
                labels,
                is_default,
                ty: case_ty,
            });
        }
        self.expect(&Token::RBrace, "end of union");
        self.eat(&Token::Semi);
        self.register(
            &name,
            DynamicType::Union(UnionType {
                name: scoped_name,
                discriminator,
                cases,
            }),
        );
    }

    fn parse_case_label(&mut self, discriminator: &Arc<DynamicType>) -> Option<i64> {
        match self.peek().clone() {
            Token::Int(_) | Token::Minus => self.parse_int_expr(),
            Token::CharLit(c) => {
                self.bump();
                Some(c as i64)
            }
            Token::Ident(word) if word == "TRUE" || word == "true" => {
                self.bump();
                Some(1)
            }
            Token::Ident(word) if word == "FALSE" || word == "false" => {
                self.bump();
                Some(0)
            }
            Token::Ident(_) => {
                let name = self.parse_scoped_name()?;
                // Enumerator labels resolve through the discriminator type.
                if let DynamicType::Enum(e) = discriminator.resolved() {
                    let short = name.rsplit("::").next().unwrap_or(&name);
                    if let Some(en) = e.enumerator(short) {
                        return Some(i64::from(en.value));
                    }
                }
                if let Some(v) = self.resolve_const(&name) {
                    return Some(v);
                }
                self.error(format!("cannot resolve case label '{}'", name));
                None
            }
            other => {
                self.error(format!("unexpected case label {:?}", other));
                None
            }
        }
    }

    fn parse_int_expr(&mut self) -> Option<i64> {
        let negative = self.eat(&Token::Minus);
        match self.bump() {
            Token::Int(v) => Some(if negative { -v } else { v }),
            Token::Ident(name) => {
                let value = self.resolve_const(&name);
                if value.is_none() {
                    self.error(format!("unknown constant '{}'", name));
                }
                value.map(|v| if negative { -v } else { v })
            }
            other => {
                self.error(format!("expected integer, found {:?}", other));
                None
            }
        }
    }

    /// Array declarator suffix, outermost extent first.
    fn parse_array_suffix(&mut self, base: Arc<DynamicType>) -> Arc<DynamicType> {
        let mut dims = Vec::new();
        while self.eat(&Token::LBracket) {
            if let Some(v) = self.parse_int_expr() {
                if v <= 0 {
                    self.error(format!("array extent must be positive, got {}", v));
                } else {
                    dims.push(v as usize);
                }
            }
            self.expect(&Token::RBracket, "array extent");
        }
        let mut ty = base;
        for len in dims.into_iter().rev() {
            ty = Arc::new(DynamicType::Array(ArrayType { element: ty, len }));
        }
        ty
    }

    fn parse_scoped_name(&mut self) -> Option<String> {
        let mut name = String::new();
        if self.eat(&Token::ScopeSep) {
            name.push_str("::");
        }
        loop {
            match self.bump() {
                Token::Ident(part) => name.push_str(&part),
                other => {
                    self.error(format!("expected name, found {:?}", other));
                    return None;
                }
            }
            if self.eat(&Token::ScopeSep) {
                name.push_str("::");
            } else {
                break;
            }
        }
        Some(name)
    }

    fn parse_type_spec(&mut self) -> Option<Arc<DynamicType>> {
        let word = match self.peek().clone() {
            Token::Ident(word) => word,
            Token::ScopeSep => {
                let name = self.parse_scoped_name()?;
                return self.lookup_named(&name);
            }
            other => {
                self.error(format!("expected type, found {:?}", other));
                return None;
            }
        };
        let prim = |p: PrimitiveKind| Some(Arc::new(DynamicType::Primitive(p)));
        match word.as_str() {
            "boolean" => {
                self.bump();
                prim(PrimitiveKind::Bool)
            }
            "octet" | "uint8" => {
                self.bump();
                prim(PrimitiveKind::U8)
            }
            "char" => {
                self.bump();
                prim(PrimitiveKind::Char)
            }
            "wchar" => {
                self.bump();
                prim(PrimitiveKind::WChar)
            }
            "int8" => {
                self.bump();
                prim(PrimitiveKind::I8)
            }
            "int16" | "short" => {
                self.bump();
                prim(PrimitiveKind::I16)
            }
            "uint16" => {
                self.bump();
                prim(PrimitiveKind::U16)
            }
            "int32" => {
                self.bump();
                prim(PrimitiveKind::I32)
            }
            "uint32" => {
                self.bump();
                prim(PrimitiveKind::U32)
            }
            "int64" => {
                self.bump();
                prim(PrimitiveKind::I64)
            }
            "uint64" => {
                self.bump();
                prim(PrimitiveKind::U64)
            }
            "float" => {
                self.bump();
                prim(PrimitiveKind::F32)
            }
            "double" => {
                self.bump();
                prim(PrimitiveKind::F64)
            }
            "unsigned" => {
                self.bump();
                match self.ident("integer type")?.as_str() {
                    "short" => prim(PrimitiveKind::U16),
                    "long" => {
                        if matches!(self.peek(), Token::Ident(w) if w == "long") {
                            self.bump();
                            prim(PrimitiveKind::U64)
                        } else {
                            prim(PrimitiveKind::U32)
                        }
                    }
                    other => {
                        self.error(format!("unexpected 'unsigned {}'", other));
                        None
                    }
                }
            }
            "long" => {
                self.bump();
                match self.peek() {
                    Token::Ident(w) if w == "long" => {
                        self.bump();
                        prim(PrimitiveKind::I64)
                    }
                    Token::Ident(w) if w == "double" => {
                        self.bump();
                        prim(PrimitiveKind::F128)
                    }
                    _ => prim(PrimitiveKind::I32),
                }
            }
            "string" => {
                self.bump();
                let bound = self.parse_bound();
                Some(Arc::new(DynamicType::Str { bound }))
            }
            "wstring" => {
                self.bump();
                self.parse_bound();
                Some(Arc::new(DynamicType::WStr))
            }
            "sequence" => {
                self.bump();
                self.expect(&Token::LAngle, "sequence element");
                let element = self.parse_type_spec()?;
                let bound = if self.eat(&Token::Comma) {
                    self.parse_int_expr().map(|v| v as usize)
                } else {
                    None
                };
                self.expect(&Token::RAngle, "end of sequence");
                Some(Arc::new(DynamicType::Sequence(SequenceType {
                    element,
                    bound,
                })))
            }
            "map" => {
                self.bump();
                self.expect(&Token::LAngle, "map key");
                let key = self.parse_type_spec()?;
                self.expect(&Token::Comma, "map value");
                let value = self.parse_type_spec()?;
                self.expect(&Token::RAngle, "end of map");
                Some(Arc::new(DynamicType::Map(MapType { key, value })))
            }
            _ => {
                let name = self.parse_scoped_name()?;
                self.lookup_named(&name)
            }
        }
    }

    fn parse_bound(&mut self) -> Option<usize> {
        if self.eat(&Token::LAngle) {
            let bound = self.parse_int_expr().map(|v| v as usize);
            self.expect(&Token::RAngle, "string bound");
            bound
        } else {
            None
        }
    }

    fn lookup_named(&mut self, name: &str) -> Option<Arc<DynamicType>> {
        let ty = self.resolve(name);
        if ty.is_none() {
            self.error(format!("unknown type '{}'", name));
        }
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scoped_struct() {
        let idl = r#"
            module idl { module test {
              struct RelativePosition {
                @key uint32 ship_id;
                double distance;
                double bearing;
              };
            }; };
        "#;
        let ctx = parse_idl(idl).expect("parse");
        assert!(ctx.has_structure("idl::test::RelativePosition"));
        let ty = ctx.structure("idl::test::RelativePosition").unwrap();
        let s = ty.as_struct().unwrap();
        assert_eq!(s.members.len(), 3);
        assert!(s.members[0].is_key);
        assert!(!s.members[1].is_key);
    }

    #[test]
    fn parses_arrays_and_typedefs() {
        let idl = r#"
            typedef uint32 Row[2];
            struct Grid {
              uint32 matrix[3][2];
              Row row;
            };
        "#;
        let ctx = parse_idl(idl).expect("parse");
        let grid = ctx.structure("Grid").unwrap();
        let s = grid.as_struct().unwrap();
        let DynamicType::Array(outer) = s.members[0].ty.resolved() else {
            panic!("expected array");
        };
        assert_eq!(outer.len, 3);
        let DynamicType::Array(inner) = outer.element.resolved() else {
            panic!("expected nested array");
        };
        assert_eq!(inner.len, 2);
        assert!(matches!(s.members[1].ty.resolved(), DynamicType::Array(a) if a.len == 2));
    }

    #[test]
    fn parses_enum_and_union() {
        let idl = r#"
            enum Color { ALPHA, BETA, GAMMA };
            union Choice switch (Color) {
              case ALPHA: double a;
              case BETA: uint32 b;
              default: string other;
            };
            struct Wrap { Color c; Choice pick; };
        "#;
        let ctx = parse_idl(idl).expect("parse");
        let Some(color) = ctx.lookup("Color") else {
            panic!("missing Color");
        };
        let DynamicType::Enum(e) = color.resolved() else {
            panic!("expected enum");
        };
        assert_eq!(e.enumerators[1].value, 1);
        let Some(choice) = ctx.lookup("Choice") else {
            panic!("missing Choice");
        };
        let DynamicType::Union(u) = choice.resolved() else {
            panic!("expected union");
        };
        assert_eq!(u.cases.len(), 3);
        assert_eq!(u.cases[1].labels, vec![1]);
        assert!(u.cases[2].is_default);
    }

    #[test]
    fn collects_all_diagnostics() {
        let idl = "struct A { unknown_t x; }; struct B { also_unknown y; };";
        let Err(IdlError::Parse(diags)) = parse_idl(idl) else {
            panic!("expected parse failure");
        };
        assert!(diags.len() >= 2);
    }

    #[test]
    fn const_array_extent() {
        let idl = r#"
            const uint32 N = 4;
            struct Buf { double values[N]; };
        "#;
        let ctx = parse_idl(idl).expect("parse");
        let s = ctx.structure("Buf").unwrap().as_struct().unwrap().clone();
        assert!(matches!(s.members[0].ty.resolved(), DynamicType::Array(a) if a.len == 4));
    }

    #[test]
    fn sequences_parse_but_are_not_structs() {
        let idl = "struct S { sequence<double> xs; sequence<uint8, 16> bounded; };";
        let ctx = parse_idl(idl).expect("parse");
        let s = ctx.structure("S").unwrap().as_struct().unwrap().clone();
        assert!(matches!(s.members[0].ty.resolved(), DynamicType::Sequence(_)));
    }
}
