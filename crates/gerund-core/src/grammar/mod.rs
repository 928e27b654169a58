// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The grammar graph.
//!
//! A compiled grammar is an arena of [`Node`]s indexed by [`NodeId`], rooted
//! at the node for the root record type. Cycles between record types are
//! index back-edges, closed by memoization during compilation; the finished
//! [`Grammar`] is immutable and freely shareable across concurrent parses.
//!
//! Compilation walks record metadata into the arena (`compile`, fed by
//! `field_lexer`); parsing executes the arena against a token stream
//! (`interpret`), writing captured values into the record under
//! construction (`assign`).

mod assign;
mod compile;
mod field_lexer;
mod interpret;

pub(crate) use assign::{assign, assign_values};
pub(crate) use compile::Compiler;

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt::{self, Write as _};

use ecow::EcoString;

use crate::lexer::TokenClass;
use crate::record::{FieldDescriptor, RecordDescriptor};

/// A value produced by a matched grammar node: either a token's lexeme or a
/// parsed record instance.
pub enum Value {
    /// The lexeme of a matched token.
    Lexeme(EcoString),
    /// A parsed record, boxed and type-erased.
    Record {
        /// The record instance.
        value: Box<dyn Any>,
        /// The record type's name, for diagnostics.
        name: &'static str,
    },
}

impl Value {
    /// A human-readable name for the value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Lexeme(_) => "string",
            Self::Record { name, .. } => name,
        }
    }

    /// The key used for the homogeneity check: lexemes are one family,
    /// records are keyed by concrete type.
    pub(crate) fn type_key(&self) -> Option<TypeId> {
        match self {
            Self::Lexeme(_) => None,
            Self::Record { value, .. } => Some((**value).type_id()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexeme(lexeme) => f.debug_tuple("Lexeme").field(lexeme).finish(),
            Self::Record { name, .. } => f.debug_tuple("Record").field(name).finish(),
        }
    }
}

/// Index of a node in the grammar arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// Stand-in for a record node's expression while its fields are still
    /// being compiled. Always patched before compilation finishes.
    pub(crate) const PLACEHOLDER: Self = Self(u32::MAX);

    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("grammar graph node count exceeds u32"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the grammar graph.
pub(crate) enum Node {
    /// Matches a token whose lexeme equals the string.
    Literal(EcoString),
    /// Matches a token of the given class.
    Token {
        class: TokenClass,
        name: EcoString,
    },
    /// Runs `inner`; on success, assigns the produced values into `field`
    /// of the record under construction.
    Capture {
        field: &'static FieldDescriptor,
        inner: NodeId,
    },
    /// Ordered sequence. The first child may refuse; once it matches, the
    /// rest are committed.
    Sequence(Vec<NodeId>),
    /// Ordered choice: first non-refusing branch wins.
    Choice(Vec<NodeId>),
    /// Swallows the inner node's refusal into empty success.
    Optional(NodeId),
    /// Runs the inner node until it refuses. Always succeeds.
    Repeat(NodeId),
    /// Allocates an instance of the record type and runs its grammar
    /// against it.
    Record {
        descriptor: &'static RecordDescriptor,
        expr: NodeId,
    },
    /// Delegates to the record type's custom parse routine.
    Custom {
        descriptor: &'static RecordDescriptor,
    },
}

/// A compiled, immutable grammar graph.
///
/// Produced by [`Parser::new`](crate::Parser::new); rendered human-readable
/// by its `Display` impl, with back-edges printed as `<>`.
pub struct Grammar {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Grammar {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes. A compiled grammar never
    /// is; this accompanies [`len`](Self::len) for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders a single node, for "expected ..." messages.
    pub(crate) fn describe(&self, id: NodeId) -> EcoString {
        let mut out = String::new();
        self.write_node(id, &mut HashSet::new(), &mut out);
        out.into()
    }

    fn write_node(&self, id: NodeId, seen: &mut HashSet<NodeId>, out: &mut String) {
        if !seen.insert(id) {
            out.push_str("<>");
            return;
        }
        match self.node(id) {
            Node::Literal(lexeme) => {
                let _ = write!(out, "{lexeme:?}");
            }
            Node::Token { name, .. } => {
                let _ = write!(out, "token({name:?})");
            }
            Node::Capture { field, inner } => {
                let _ = write!(out, "@(field={}, node=", field.name());
                self.write_node(*inner, seen, out);
                out.push(')');
            }
            Node::Sequence(children) => {
                out.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.write_node(*child, seen, out);
                }
                out.push(')');
            }
            Node::Choice(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    self.write_node(*branch, seen, out);
                }
            }
            Node::Optional(inner) => {
                out.push('[');
                self.write_node(*inner, seen, out);
                out.push(']');
            }
            Node::Repeat(inner) => {
                out.push_str("{ ");
                self.write_node(*inner, seen, out);
                out.push_str(" }");
            }
            Node::Record { descriptor, expr } => {
                let _ = write!(out, "record(type={}, expr=", descriptor.name());
                self.write_node(*expr, seen, out);
                out.push(')');
            }
            Node::Custom { descriptor } => {
                let _ = write!(out, "custom(type={})", descriptor.name());
            }
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_node(self.root, &mut HashSet::new(), &mut out);
        f.write_str(&out)
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_names() {
        let lexeme = Value::Lexeme("x".into());
        assert_eq!(lexeme.type_name(), "string");
        assert!(lexeme.type_key().is_none());

        let record = Value::Record {
            value: Box::new(42u32),
            name: "Answer",
        };
        assert_eq!(record.type_name(), "Answer");
        assert_eq!(record.type_key(), Some(std::any::TypeId::of::<u32>()));
    }

    #[test]
    fn node_id_round_trip() {
        let id = NodeId::new(7);
        assert_eq!(id.index(), 7);
    }

    #[test]
    fn dump_literal_and_token() {
        let grammar = Grammar::new(
            vec![
                Node::Literal("=".into()),
                Node::Token {
                    class: TokenClass::Ident,
                    name: "Ident".into(),
                },
                Node::Sequence(vec![NodeId::new(0), NodeId::new(1)]),
            ],
            NodeId::new(2),
        );
        assert_eq!(grammar.to_string(), "(\"=\" token(\"Ident\"))");
    }

    #[test]
    fn dump_is_stable() {
        let grammar = Grammar::new(
            vec![
                Node::Literal("x".into()),
                Node::Repeat(NodeId::new(0)),
            ],
            NodeId::new(1),
        );
        assert_eq!(grammar.to_string(), grammar.to_string());
    }

    #[test]
    fn dump_stops_at_back_edges() {
        // A record whose expression repeats the record itself.
        let grammar = Grammar::new(
            vec![
                Node::Literal("x".into()),
                Node::Sequence(vec![NodeId::new(0), NodeId::new(2)]),
                Node::Optional(NodeId::new(1)),
            ],
            NodeId::new(2),
        );
        assert_eq!(grammar.to_string(), "[(\"x\" <>)]");
    }
}
