// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for grammar compilation and parsing.
//!
//! Compile-time errors ([`CompileError`]) are decorated with the record and
//! field the offending annotation belongs to. Runtime errors ([`ParseError`])
//! carry a source [`Position`] and integrate with [`miette`] for diagnostics.
//!
//! A node that merely declines to match is not an error at all: refusal is an
//! internal signal and never surfaces to callers.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use crate::lexer::Position;

/// An error raised while compiling a record type's grammar annotations.
///
/// One compile produces at most one error; the first malformed annotation
/// aborts the walk.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{record}.{field}: {kind}")]
#[diagnostic()]
pub struct CompileError {
    /// Name of the record type whose annotation failed to compile.
    pub record: EcoString,
    /// Name of the field the offending token was lexed from.
    pub field: EcoString,
    /// The kind of compile error.
    #[source]
    pub kind: CompileErrorKind,
}

impl CompileError {
    /// Creates a new compile error for the given record and field.
    #[must_use]
    pub fn new(
        record: impl Into<EcoString>,
        field: impl Into<EcoString>,
        kind: CompileErrorKind,
    ) -> Self {
        Self {
            record: record.into(),
            field: field.into(),
            kind,
        }
    }
}

/// The kind of grammar compile error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    /// A bare identifier did not name a token class in the symbol table.
    #[error("unknown token type {name:?}")]
    UnknownToken {
        /// The unresolved identifier.
        name: EcoString,
    },

    /// `@` was applied to a record-typed field with something other than `@@`.
    #[error("record fields can only be captured with @@")]
    RecordNeedsSelfCapture,

    /// `@@` was applied to a field whose element type is not a record.
    #[error("@@ requires a record element type")]
    SelfCaptureOnScalar,

    /// `@` was not followed by a term.
    #[error("expected a term after '@'")]
    ExpectedTerm,

    /// A bracketed construct was not closed.
    #[error("expected {expected:?} but got {found:?}")]
    ExpectedClose {
        /// The closing delimiter that was required.
        expected: char,
        /// The lexeme found instead.
        found: EcoString,
    },

    /// Tokens remained after the record's grammar expression was consumed.
    #[error("unexpected input {found:?}")]
    TrailingInput {
        /// The first trailing lexeme.
        found: EcoString,
    },
}

/// A fatal error raised while parsing input.
///
/// Fatal errors abort the parse and bypass alternation, optional, and
/// repetition handling on the way out. The target record is left in an
/// unspecified, partially populated state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{pos}: {kind}")]
#[diagnostic()]
pub struct ParseError {
    /// The kind of parse error.
    #[source]
    pub kind: ParseErrorKind,
    /// The source position of the error.
    #[label("here")]
    pub pos: Position,
}

impl ParseError {
    /// Creates a new parse error at the given position.
    #[must_use]
    pub fn new(kind: ParseErrorKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

/// The kind of fatal parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A committed sequence required a node that did not match.
    #[error("expected {what}")]
    Expected {
        /// Rendering of the grammar node that was required.
        what: EcoString,
    },

    /// Input remained after the root record was parsed.
    #[error("unexpected token {lexeme:?}")]
    UnexpectedToken {
        /// The first unconsumed lexeme.
        lexeme: EcoString,
    },

    /// The root record refused the input outright.
    #[error("invalid syntax")]
    InvalidSyntax,

    /// A capture produced values of more than one type.
    #[error("inconsistent types {first} and {second}")]
    InconsistentValues {
        /// Type of the first captured value.
        first: EcoString,
        /// Type of the conflicting value.
        second: EcoString,
    },

    /// A scalar or record field received the wrong number of values.
    #[error("a single value must be assigned to a {target} field but have {count}")]
    ExpectedSingleValue {
        /// Description of the target field.
        target: EcoString,
        /// Number of values actually captured.
        count: usize,
    },

    /// A captured value could not be parsed as a signed integer.
    #[error("expected integer but got {lexeme:?}")]
    InvalidInteger {
        /// The offending lexeme.
        lexeme: EcoString,
    },

    /// A captured value could not be parsed as an unsigned integer.
    #[error("expected unsigned integer but got {lexeme:?}")]
    InvalidUnsigned {
        /// The offending lexeme.
        lexeme: EcoString,
    },

    /// A captured value could not be parsed as a float.
    #[error("expected float but got {lexeme:?}")]
    InvalidFloat {
        /// The offending lexeme.
        lexeme: EcoString,
    },

    /// A captured value's type does not fit the target field.
    #[error("cannot assign {value} value to a {target} field")]
    MismatchedValue {
        /// Type of the captured value.
        value: EcoString,
        /// Description of the target field.
        target: EcoString,
    },

    /// A user-supplied converter rejected the captured values.
    #[error("{message}")]
    Conversion {
        /// The converter's error message.
        message: EcoString,
    },
}

/// An error returned by a user-supplied [`Capture`](crate::record::Capture)
/// converter.
///
/// The message is reported verbatim, positioned at the capture site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CaptureError {
    /// Human-readable description of the conversion failure.
    pub message: EcoString,
}

impl CaptureError {
    /// Creates a new capture error with the given message.
    #[must_use]
    pub fn new(message: impl Into<EcoString>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
