// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Compiling record metadata into the grammar graph.
//!
//! The compiler walks a record type's annotations with a recursive descent
//! over the mini-language:
//!
//! ```text
//! expression  = alternative { "|" alternative }
//! alternative = { term }
//! term        = "@" ("@" | term) | literal | class | group
//! group       = "(" expression ")" | "[" expression "]" | "{" expression "}"
//! ```
//!
//! Record types are memoized by `TypeId`: the record node is inserted (with
//! a placeholder expression) before its fields are walked, so a type that
//! reaches itself - directly or through other records - closes into a
//! back-edge instead of recursing forever.

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::{CompileError, CompileErrorKind};
use crate::lexer::{SymbolTable, TokenClass};
use crate::record::{FieldKind, RecordDescriptor};

use super::field_lexer::FieldLexer;
use super::{Grammar, Node, NodeId};

/// One grammar compilation: the arena under construction plus the per-
/// compile memoization table.
pub(crate) struct Compiler<'def> {
    symbols: &'def SymbolTable,
    nodes: Vec<Node>,
    memo: HashMap<TypeId, NodeId>,
}

impl<'def> Compiler<'def> {
    pub(crate) fn new(symbols: &'def SymbolTable) -> Self {
        Self {
            symbols,
            nodes: Vec::new(),
            memo: HashMap::new(),
        }
    }

    /// Finalizes the arena into an immutable grammar.
    pub(crate) fn into_grammar(self, root: NodeId) -> Grammar {
        Grammar::new(self.nodes, root)
    }

    /// Compiles a record type, memoized. Every record type gets exactly one
    /// node; revisits return it.
    pub(crate) fn compile(
        &mut self,
        descriptor: &'static RecordDescriptor,
    ) -> Result<NodeId, CompileError> {
        if let Some(&id) = self.memo.get(&descriptor.type_id()) {
            return Ok(id);
        }

        if descriptor.has_custom_parse() {
            let id = self.push(Node::Custom { descriptor });
            self.memo.insert(descriptor.type_id(), id);
            return Ok(id);
        }

        // Insert before walking the fields so self-references resolve to
        // this node.
        let id = self.push(Node::Record {
            descriptor,
            expr: NodeId::PLACEHOLDER,
        });
        self.memo.insert(descriptor.type_id(), id);

        let mut lexer = FieldLexer::new(descriptor);
        let expr = self.parse_expression(&mut lexer)?;
        if !lexer.peek().is_eof() {
            return Err(self.fail(
                &lexer,
                CompileErrorKind::TrailingInput {
                    found: lexer.peek().lexeme.clone(),
                },
            ));
        }
        self.nodes[id.index()] = Node::Record { descriptor, expr };
        Ok(id)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn fail(&self, lexer: &FieldLexer, kind: CompileErrorKind) -> CompileError {
        CompileError::new(lexer.record_name(), lexer.field_name(), kind)
    }

    /// `alternative { "|" alternative }`
    fn parse_expression(&mut self, lexer: &mut FieldLexer) -> Result<NodeId, CompileError> {
        let mut branches = vec![self.parse_alternative(lexer)?];
        while lexer.peek().class == TokenClass::Punct('|') {
            lexer.next();
            branches.push(self.parse_alternative(lexer)?);
        }
        Ok(if branches.len() == 1 {
            branches[0]
        } else {
            self.push(Node::Choice(branches))
        })
    }

    /// `{ term }` - a run of terms forms a sequence; a single term stands
    /// alone. An empty alternative is legal and matches nothing.
    fn parse_alternative(&mut self, lexer: &mut FieldLexer) -> Result<NodeId, CompileError> {
        let mut terms = Vec::new();
        while let Some(term) = self.parse_term(lexer)? {
            terms.push(term);
        }
        Ok(if terms.len() == 1 {
            terms[0]
        } else {
            self.push(Node::Sequence(terms))
        })
    }

    /// One term, or `None` at a token that cannot start a term (the caller
    /// decides whether that ends an alternative or is an error).
    fn parse_term(&mut self, lexer: &mut FieldLexer) -> Result<Option<NodeId>, CompileError> {
        match lexer.peek().class {
            TokenClass::Punct('@') => {
                lexer.next();
                let field = lexer.field();
                if lexer.peek().class == TokenClass::Punct('@') {
                    lexer.next();
                    let Some(element) = field.element() else {
                        return Err(self.fail(lexer, CompileErrorKind::SelfCaptureOnScalar));
                    };
                    let inner = self.compile(element())?;
                    return Ok(Some(self.push(Node::Capture { field, inner })));
                }
                if field.kind() == FieldKind::Record {
                    return Err(self.fail(lexer, CompileErrorKind::RecordNeedsSelfCapture));
                }
                let Some(inner) = self.parse_term(lexer)? else {
                    return Err(self.fail(lexer, CompileErrorKind::ExpectedTerm));
                };
                Ok(Some(self.push(Node::Capture { field, inner })))
            }
            TokenClass::String | TokenClass::RawString | TokenClass::Char => {
                let token = lexer.next();
                Ok(Some(self.push(Node::Literal(token.lexeme))))
            }
            TokenClass::Ident => {
                let token = lexer.next();
                let Some(class) = self.symbols.get(&token.lexeme) else {
                    return Err(self.fail(
                        lexer,
                        CompileErrorKind::UnknownToken {
                            name: token.lexeme,
                        },
                    ));
                };
                Ok(Some(self.push(Node::Token {
                    class,
                    name: token.lexeme,
                })))
            }
            TokenClass::Punct('(') => {
                let expr = self.parse_bracketed(lexer, ')')?;
                Ok(Some(expr))
            }
            TokenClass::Punct('[') => {
                let expr = self.parse_bracketed(lexer, ']')?;
                Ok(Some(self.push(Node::Optional(expr))))
            }
            TokenClass::Punct('{') => {
                let expr = self.parse_bracketed(lexer, '}')?;
                Ok(Some(self.push(Node::Repeat(expr))))
            }
            _ => Ok(None),
        }
    }

    /// An expression between an (already peeked) opening bracket and
    /// `close`.
    fn parse_bracketed(
        &mut self,
        lexer: &mut FieldLexer,
        close: char,
    ) -> Result<NodeId, CompileError> {
        lexer.next(); // opening bracket
        let expr = self.parse_expression(lexer)?;
        if lexer.peek().class != TokenClass::Punct(close) {
            let found = if lexer.peek().is_eof() {
                "<eof>".into()
            } else {
                lexer.peek().lexeme.clone()
            };
            return Err(self.fail(
                lexer,
                CompileErrorKind::ExpectedClose {
                    expected: close,
                    found,
                },
            ));
        }
        lexer.next();
        Ok(expr)
    }
}
