// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Mapping from Rust field types to assignable views.
//!
//! [`FieldTarget`] is implemented for every type that may appear as an
//! annotated field: string-likes, integer and float widths, `bool`, record
//! types (via the [`grammar!`](crate::grammar!) macro), converter types, and
//! the transparent wrappers `Vec<T>`, `Option<T>`, and `Box<T>`. Wrappers
//! delegate their kind and element to the wrapped type; `Option` and `Box`
//! allocate on first access, which is the address-of step for pointer-like
//! fields.
//!
//! [`FieldMut`] is what the assigner dispatches on: a mutable view of the
//! field with the concrete width erased behind small slot traits.

use std::any::Any;

use ecow::EcoString;

use super::{Capture, DescriptorFn, FieldKind, Record};
use crate::error::ParseError;
use crate::grammar::Value;
use crate::lexer::Position;

/// A type usable as an annotated record field.
pub trait FieldTarget {
    /// The kind of the element type, after stripping wrappers.
    fn kind() -> FieldKind;

    /// The element record type's descriptor, if the element is a record.
    fn element() -> Option<DescriptorFn> {
        None
    }

    /// A mutable, assignable view of this value.
    fn field_mut(&mut self) -> FieldMut<'_>;
}

/// A mutable view of a field, dispatched on by the assigner.
pub enum FieldMut<'a> {
    /// A string-like field.
    Text(&'a mut dyn TextSlot),
    /// A signed integer field of any width.
    Int(&'a mut dyn IntSlot),
    /// An unsigned integer field of any width.
    UInt(&'a mut dyn UIntSlot),
    /// A floating-point field.
    Float(&'a mut dyn FloatSlot),
    /// A boolean field.
    Bool(&'a mut bool),
    /// A nested record field.
    Record(&'a mut dyn RecordSlot),
    /// An aggregate field appending elements.
    Sequence(&'a mut dyn SequenceSlot),
    /// A field with a user-supplied converter.
    Converter(&'a mut dyn Capture),
}

/// A string-like field accepting appended lexemes.
pub trait TextSlot {
    /// Appends `text` to the current value.
    fn append(&mut self, text: &str);
}

/// A signed integer field of some width.
pub trait IntSlot {
    /// Stores `value`, returning `false` if it does not fit.
    fn store(&mut self, value: i64) -> bool;
}

/// An unsigned integer field of some width.
pub trait UIntSlot {
    /// Stores `value`, returning `false` if it does not fit.
    fn store(&mut self, value: u64) -> bool;
}

/// A floating-point field of some width.
pub trait FloatSlot {
    /// Stores `value`.
    fn store(&mut self, value: f64);
}

/// A nested record field accepting a parsed record instance.
pub trait RecordSlot {
    /// The record type's name, for diagnostics.
    fn record_type_name(&self) -> &'static str;

    /// Moves `value` into the field; `false` if the type does not match.
    fn put(&mut self, value: Box<dyn Any>) -> bool;
}

/// An aggregate field appending one element per captured value.
pub trait SequenceSlot {
    /// Converts `value` to an element and appends it.
    fn push_value(&mut self, pos: &Position, value: Value) -> Result<(), ParseError>;
}

impl TextSlot for String {
    fn append(&mut self, text: &str) {
        self.push_str(text);
    }
}

impl TextSlot for EcoString {
    fn append(&mut self, text: &str) {
        self.push_str(text);
    }
}

impl FieldTarget for String {
    fn kind() -> FieldKind {
        FieldKind::Text
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Text(self)
    }
}

impl FieldTarget for EcoString {
    fn kind() -> FieldKind {
        FieldKind::Text
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Text(self)
    }
}

impl FieldTarget for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Bool(self)
    }
}

macro_rules! int_target {
    ($($ty:ty),*) => {$(
        impl IntSlot for $ty {
            fn store(&mut self, value: i64) -> bool {
                match <$ty>::try_from(value) {
                    Ok(value) => {
                        *self = value;
                        true
                    }
                    Err(_) => false,
                }
            }
        }

        impl FieldTarget for $ty {
            fn kind() -> FieldKind {
                FieldKind::Int
            }

            fn field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::Int(self)
            }
        }
    )*};
}

int_target!(i8, i16, i32, i64, isize);

macro_rules! uint_target {
    ($($ty:ty),*) => {$(
        impl UIntSlot for $ty {
            fn store(&mut self, value: u64) -> bool {
                match <$ty>::try_from(value) {
                    Ok(value) => {
                        *self = value;
                        true
                    }
                    Err(_) => false,
                }
            }
        }

        impl FieldTarget for $ty {
            fn kind() -> FieldKind {
                FieldKind::UInt
            }

            fn field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::UInt(self)
            }
        }
    )*};
}

uint_target!(u8, u16, u32, u64, usize);

impl FloatSlot for f64 {
    fn store(&mut self, value: f64) {
        *self = value;
    }
}

impl FloatSlot for f32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "narrowing to f32 is the field's declared precision"
    )]
    fn store(&mut self, value: f64) {
        *self = value as f32;
    }
}

impl FieldTarget for f64 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Float(self)
    }
}

impl FieldTarget for f32 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Float(self)
    }
}

impl<R: Record> RecordSlot for R {
    fn record_type_name(&self) -> &'static str {
        R::descriptor().name()
    }

    fn put(&mut self, value: Box<dyn Any>) -> bool {
        match value.downcast::<R>() {
            Ok(value) => {
                *self = *value;
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: FieldTarget + Default> FieldTarget for Vec<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn element() -> Option<DescriptorFn> {
        T::element()
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Sequence(self)
    }
}

impl<T: FieldTarget + Default> SequenceSlot for Vec<T> {
    fn push_value(&mut self, pos: &Position, value: Value) -> Result<(), ParseError> {
        let mut element = T::default();
        crate::grammar::assign_values(pos, element.field_mut(), vec![value])?;
        self.push(element);
        Ok(())
    }
}

impl<T: FieldTarget + Default> FieldTarget for Option<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn element() -> Option<DescriptorFn> {
        T::element()
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        self.get_or_insert_with(T::default).field_mut()
    }
}

impl<T: FieldTarget> FieldTarget for Box<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn element() -> Option<DescriptorFn> {
        T::element()
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        (**self).field_mut()
    }
}
