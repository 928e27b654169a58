// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Writing captured values into record fields.
//!
//! Captured values are reconciled with the target field's shape:
//! aggregates append one element per value, string-likes concatenate,
//! scalars require exactly one value and parse it, booleans record that the
//! capture fired, and converter fields receive the raw lexemes. All values
//! of a single capture must be of one type.

use std::any::Any;

use ecow::EcoString;

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Position;
use crate::record::{FieldDescriptor, FieldMut};

use super::Value;

/// Assigns `values` into `field` of `record`. `pos` is the capture
/// position, used for error reporting.
pub(crate) fn assign(
    pos: &Position,
    record: &mut dyn Any,
    field: &FieldDescriptor,
    values: Vec<Value>,
) -> Result<(), ParseError> {
    check_homogeneous(pos, &values)?;
    assign_values(pos, field.project(record), values)
}

/// Assigns `values` into an already-projected field view. Sequence
/// elements route back through here, one value at a time.
pub(crate) fn assign_values(
    pos: &Position,
    slot: FieldMut<'_>,
    values: Vec<Value>,
) -> Result<(), ParseError> {
    match slot {
        FieldMut::Sequence(sequence) => {
            for value in values {
                sequence.push_value(pos, value)?;
            }
            Ok(())
        }

        FieldMut::Converter(converter) => {
            let mut lexemes = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Value::Lexeme(lexeme) => lexemes.push(lexeme),
                    Value::Record { name, .. } => {
                        return Err(mismatch(pos, name, "converter"));
                    }
                }
            }
            converter
                .capture(&lexemes)
                .map_err(|err| ParseError::new(
                    ParseErrorKind::Conversion {
                        message: err.message,
                    },
                    pos.clone(),
                ))
        }

        FieldMut::Text(text) => {
            for value in values {
                match value {
                    Value::Lexeme(lexeme) => text.append(&lexeme),
                    Value::Record { name, .. } => {
                        return Err(mismatch(pos, name, "string"));
                    }
                }
            }
            Ok(())
        }

        FieldMut::Record(slot) => {
            let count = values.len();
            let Ok([value]) = <[Value; 1]>::try_from(values) else {
                return Err(single_value_error(pos, "record", count));
            };
            match value {
                Value::Record { value, name } => {
                    if slot.put(value) {
                        Ok(())
                    } else {
                        Err(mismatch(pos, name, slot.record_type_name()))
                    }
                }
                Value::Lexeme(_) => Err(mismatch(pos, "string", slot.record_type_name())),
            }
        }

        FieldMut::Bool(flag) => {
            // The capture firing at all is the signal; values are ignored.
            *flag = true;
            Ok(())
        }

        FieldMut::Int(slot) => {
            let lexeme = single_lexeme(pos, values, "integer")?;
            let stored = lexeme
                .parse::<i64>()
                .is_ok_and(|parsed| slot.store(parsed));
            if stored {
                Ok(())
            } else {
                Err(ParseError::new(
                    ParseErrorKind::InvalidInteger { lexeme },
                    pos.clone(),
                ))
            }
        }

        FieldMut::UInt(slot) => {
            let lexeme = single_lexeme(pos, values, "unsigned integer")?;
            let stored = lexeme
                .parse::<u64>()
                .is_ok_and(|parsed| slot.store(parsed));
            if stored {
                Ok(())
            } else {
                Err(ParseError::new(
                    ParseErrorKind::InvalidUnsigned { lexeme },
                    pos.clone(),
                ))
            }
        }

        FieldMut::Float(slot) => {
            let lexeme = single_lexeme(pos, values, "float")?;
            match lexeme.parse::<f64>() {
                Ok(parsed) => {
                    slot.store(parsed);
                    Ok(())
                }
                Err(_) => Err(ParseError::new(
                    ParseErrorKind::InvalidFloat { lexeme },
                    pos.clone(),
                )),
            }
        }
    }
}

/// All values of a capture must be of one type: all lexemes, or all
/// records of the same record type.
fn check_homogeneous(pos: &Position, values: &[Value]) -> Result<(), ParseError> {
    let Some(first) = values.first() else {
        return Ok(());
    };
    for value in &values[1..] {
        if value.type_key() != first.type_key() {
            return Err(ParseError::new(
                ParseErrorKind::InconsistentValues {
                    first: first.type_name().into(),
                    second: value.type_name().into(),
                },
                pos.clone(),
            ));
        }
    }
    Ok(())
}

/// Scalar fields take exactly one lexeme.
fn single_lexeme(
    pos: &Position,
    values: Vec<Value>,
    target: &str,
) -> Result<EcoString, ParseError> {
    let count = values.len();
    let Ok([value]) = <[Value; 1]>::try_from(values) else {
        return Err(single_value_error(pos, target, count));
    };
    match value {
        Value::Lexeme(lexeme) => Ok(lexeme),
        Value::Record { name, .. } => Err(mismatch(pos, name, target)),
    }
}

fn single_value_error(pos: &Position, target: &str, count: usize) -> ParseError {
    ParseError::new(
        ParseErrorKind::ExpectedSingleValue {
            target: target.into(),
            count,
        },
        pos.clone(),
    )
}

fn mismatch(pos: &Position, value: &str, target: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::MismatchedValue {
            value: value.into(),
            target: target.into(),
        },
        pos.clone(),
    )
}
