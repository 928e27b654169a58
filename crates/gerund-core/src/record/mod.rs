// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Static record metadata.
//!
//! Rust has no runtime reflection, so the grammar compiler walks metadata
//! that each record type provides about itself: an ordered list of fields,
//! each with its annotation text, its shape, and an accessor projecting the
//! record to a mutable view of the field. The [`grammar!`](crate::grammar!)
//! macro generates this metadata from a struct declaration; the types here
//! are its vocabulary.
//!
//! # Field shapes
//!
//! A field's *kind* is the kind of its element type after stripping `Vec`,
//! `Option`, and `Box` wrappers - the wrappers decide aggregation and
//! allocation, the element decides what a captured value means. The mapping
//! from Rust types to kinds is the [`FieldTarget`] trait.
//!
//! # Opting out of declarative grammar
//!
//! A record may implement [`CustomParse`] and be declared with the macro's
//! `custom struct` form; the compiler then emits a delegation node instead
//! of walking its fields.

mod macros;
mod target;

pub use target::{
    FieldMut, FieldTarget, FloatSlot, IntSlot, RecordSlot, SequenceSlot, TextSlot, UIntSlot,
};

use std::any::{Any, TypeId};
use std::fmt;

use ecow::EcoString;

use crate::error::{CaptureError, ParseError};
use crate::lexer::{Position, TokenCursor};

/// A record type that can be the target of grammar-directed parsing.
///
/// Implemented by the [`grammar!`](crate::grammar!) macro; the descriptor is
/// built once and cached for the program's lifetime.
pub trait Record: Default + 'static {
    /// The record's static metadata.
    fn descriptor() -> &'static RecordDescriptor;
}

/// Transforms captured lexemes into a field value.
///
/// Implement this on a field's type to take over value conversion entirely:
/// the assigner hands over the raw lexemes and any returned error aborts the
/// parse at the capture position. The type also needs a three-line
/// [`FieldTarget`] impl routing it to the converter:
///
/// ```
/// use ecow::EcoString;
/// use gerund_core::error::CaptureError;
/// use gerund_core::record::{Capture, FieldKind, FieldMut, FieldTarget};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct CommaList(Vec<String>);
///
/// impl Capture for CommaList {
///     fn capture(&mut self, values: &[EcoString]) -> Result<(), CaptureError> {
///         for value in values {
///             self.0.extend(value.split(',').map(str::to_owned));
///         }
///         Ok(())
///     }
/// }
///
/// impl FieldTarget for CommaList {
///     fn kind() -> FieldKind {
///         FieldKind::Custom
///     }
///     fn field_mut(&mut self) -> FieldMut<'_> {
///         FieldMut::Converter(self)
///     }
/// }
/// ```
pub trait Capture {
    /// Consumes the captured lexemes, mutating the field in place.
    fn capture(&mut self, values: &[EcoString]) -> Result<(), CaptureError>;
}

/// Custom parsing for a record type that opts out of declarative grammar.
///
/// Declared with `grammar! { custom struct ... }`. The implementation
/// reads tokens directly from the cursor. Returning
/// [`ParseOutcome::NoMatch`] signals that no tokens were consumed and an
/// alternative may be tried; an error aborts the parse.
pub trait CustomParse: Record {
    /// Parses into the receiver from the token stream.
    fn parse(&mut self, tokens: &mut dyn TokenCursor) -> Result<ParseOutcome, ParseError>;
}

/// The outcome of a [`CustomParse`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The record matched and was populated.
    Matched,
    /// The record did not match; no tokens were consumed.
    NoMatch,
}

/// The kind of a field's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A string-like field; captured lexemes are appended.
    Text,
    /// A signed integer field.
    Int,
    /// An unsigned integer field.
    UInt,
    /// A floating-point field.
    Float,
    /// A boolean field; set when its capture fires.
    Bool,
    /// A nested record field, captured with `@@`.
    Record,
    /// A field converting its own lexemes via [`Capture`].
    Custom,
}

/// A lazy handle on a record type's descriptor.
///
/// Field metadata stores this function rather than the descriptor itself so
/// that self-referential record types can finish building their own
/// descriptor before it is ever looked up.
pub type DescriptorFn = fn() -> &'static RecordDescriptor;

type AccessFn = Box<dyn for<'a> Fn(&'a mut dyn Any) -> FieldMut<'a> + Send + Sync>;
type AllocFn = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type PositionFn = Box<dyn Fn(&mut dyn Any, Position) + Send + Sync>;
type CustomParseFn =
    Box<dyn Fn(&mut dyn Any, &mut dyn TokenCursor) -> Result<ParseOutcome, ParseError> + Send + Sync>;

/// Static metadata for one record type.
pub struct RecordDescriptor {
    name: &'static str,
    type_id: TypeId,
    alloc: AllocFn,
    fields: Vec<FieldDescriptor>,
    position: Option<PositionFn>,
    custom: Option<CustomParseFn>,
}

impl RecordDescriptor {
    /// The record type's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The record type's `TypeId`, the memoization key for grammar cycles.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The record's annotated fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns `true` if the record parses via [`CustomParse`].
    #[must_use]
    pub fn has_custom_parse(&self) -> bool {
        self.custom.is_some()
    }

    /// Allocates a default instance of the record.
    pub(crate) fn new_instance(&self) -> Box<dyn Any> {
        (self.alloc)()
    }

    /// Stores `pos` into the record's position slot, if it has one.
    pub(crate) fn set_position(&self, record: &mut dyn Any, pos: Position) {
        if let Some(set) = &self.position {
            set(record, pos);
        }
    }

    /// Delegates to the record's custom parse hook, if any.
    pub(crate) fn run_custom_parse(
        &self,
        record: &mut dyn Any,
        tokens: &mut dyn TokenCursor,
    ) -> Option<Result<ParseOutcome, ParseError>> {
        self.custom.as_ref().map(|parse| parse(record, tokens))
    }
}

impl fmt::Debug for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("custom", &self.custom.is_some())
            .finish_non_exhaustive()
    }
}

/// Static metadata for one annotated field.
pub struct FieldDescriptor {
    name: &'static str,
    grammar: &'static str,
    kind: FieldKind,
    element: Option<DescriptorFn>,
    access: AccessFn,
}

impl FieldDescriptor {
    /// The field's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The field's grammar annotation text.
    #[must_use]
    pub fn grammar(&self) -> &'static str {
        self.grammar
    }

    /// The kind of the field's element type.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The element record type's descriptor, for `@@` captures.
    #[must_use]
    pub fn element(&self) -> Option<DescriptorFn> {
        self.element
    }

    /// Projects the record to a mutable view of this field.
    pub(crate) fn project<'a>(&self, record: &'a mut dyn Any) -> FieldMut<'a> {
        (self.access)(record)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("grammar", &self.grammar)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`RecordDescriptor`]. Driven by the
/// [`grammar!`](crate::grammar!) macro.
pub struct RecordBuilder {
    name: &'static str,
    type_id: TypeId,
    alloc: AllocFn,
    fields: Vec<FieldDescriptor>,
    position: Option<PositionFn>,
    custom: Option<CustomParseFn>,
}

impl RecordBuilder {
    /// Starts a descriptor for record type `R`.
    #[must_use]
    pub fn new<R: Record>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<R>(),
            alloc: Box::new(|| Box::new(R::default()) as Box<dyn Any>),
            fields: Vec::new(),
            position: None,
            custom: None,
        }
    }

    /// Registers an annotated field, with `project` narrowing the record to
    /// the field.
    pub fn field<R: Record, T: FieldTarget + 'static>(
        &mut self,
        name: &'static str,
        grammar: &'static str,
        project: fn(&mut R) -> &mut T,
    ) {
        let access: AccessFn = Box::new(move |record: &mut dyn Any| {
            let record = record
                .downcast_mut::<R>()
                .expect("record descriptor used with a mismatched record type");
            project(record).field_mut()
        });
        self.fields.push(FieldDescriptor {
            name,
            grammar,
            kind: T::kind(),
            element: T::element(),
            access,
        });
    }

    /// Registers the record's position slot: it receives the position of
    /// the first token peeked while parsing the record.
    pub fn position<R: Record>(&mut self, set: fn(&mut R, Position)) {
        self.position = Some(Box::new(move |record: &mut dyn Any, pos| {
            let record = record
                .downcast_mut::<R>()
                .expect("record descriptor used with a mismatched record type");
            set(record, pos);
        }));
    }

    /// Routes the record through its [`CustomParse`] implementation.
    pub fn custom_parse<R: CustomParse>(&mut self) {
        self.custom = Some(Box::new(
            move |record: &mut dyn Any, tokens: &mut dyn TokenCursor| {
                let record = record
                    .downcast_mut::<R>()
                    .expect("record descriptor used with a mismatched record type");
                CustomParse::parse(record, tokens)
            },
        ));
    }

    /// Finalizes the descriptor.
    #[must_use]
    pub fn finish(self) -> RecordDescriptor {
        RecordDescriptor {
            name: self.name,
            type_id: self.type_id,
            alloc: self.alloc,
            fields: self.fields,
            position: self.position,
            custom: self.custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pair {
        left: String,
        right: String,
        pos: Position,
    }

    impl Record for Pair {
        fn descriptor() -> &'static RecordDescriptor {
            static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| {
                let mut builder = RecordBuilder::new::<Pair>("Pair");
                builder.field::<Pair, String>("left", "@Ident", |record| &mut record.left);
                builder.field::<Pair, String>("right", "@Ident", |record| &mut record.right);
                builder.position::<Pair>(|record, pos| record.pos = pos);
                builder.finish()
            })
        }
    }

    #[test]
    fn descriptor_shape() {
        let descriptor = Pair::descriptor();
        assert_eq!(descriptor.name(), "Pair");
        assert_eq!(descriptor.type_id(), TypeId::of::<Pair>());
        assert_eq!(descriptor.fields().len(), 2);
        assert_eq!(descriptor.fields()[0].name(), "left");
        assert_eq!(descriptor.fields()[0].grammar(), "@Ident");
        assert_eq!(descriptor.fields()[0].kind(), FieldKind::Text);
        assert!(descriptor.fields()[0].element().is_none());
        assert!(!descriptor.has_custom_parse());
    }

    #[test]
    fn descriptor_is_memoized() {
        assert!(std::ptr::eq(Pair::descriptor(), Pair::descriptor()));
    }

    #[test]
    fn new_instance_is_default() {
        let instance = Pair::descriptor().new_instance();
        let pair = instance.downcast_ref::<Pair>().unwrap();
        assert_eq!(*pair, Pair::default());
    }

    #[test]
    fn position_slot_is_set() {
        let descriptor = Pair::descriptor();
        let mut instance = descriptor.new_instance();
        descriptor.set_position(instance.as_mut(), Position::new("in", 3, 1, 4));
        let pair = instance.downcast_ref::<Pair>().unwrap();
        assert_eq!(pair.pos.column, 4);
    }

    #[test]
    fn project_reaches_the_field() {
        let descriptor = Pair::descriptor();
        let mut pair = Pair::default();
        match descriptor.fields()[1].project(&mut pair) {
            FieldMut::Text(slot) => slot.append("hi"),
            _ => panic!("expected a text field"),
        }
        assert_eq!(pair.right, "hi");
    }
}
