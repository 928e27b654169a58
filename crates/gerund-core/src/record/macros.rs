// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The `grammar!` record-declaration macro.
//!
//! Declares a struct and generates its [`Record`](crate::record::Record)
//! and [`FieldTarget`](crate::record::FieldTarget) implementations from the
//! per-field annotations. See the macro's own documentation for the two
//! accepted forms.

/// Declares a record type with grammar annotations.
///
/// Each field is written `name: Type = "annotation"`. A field written
/// without an annotation is the record's *position slot*: it must be of
/// type [`Position`](crate::lexer::Position) and receives the position of
/// the first token peeked while parsing the record. The struct derives
/// `Debug`, `Clone`, `Default`, and `PartialEq`, so every field type must
/// implement those.
///
/// ```
/// use gerund_core::grammar;
/// use gerund_core::lexer::Position;
///
/// grammar! {
///     /// One `key = value` assignment.
///     pub struct Assignment {
///         pub pos: Position,
///         pub key: String = r#"@Ident "=""#,
///         pub value: String = "@String",
///     }
/// }
/// ```
///
/// A record may instead opt out of declarative grammar with the `custom`
/// form, implementing [`CustomParse`](crate::record::CustomParse) by hand:
///
/// ```
/// use gerund_core::grammar;
/// use gerund_core::error::ParseError;
/// use gerund_core::lexer::TokenCursor;
/// use gerund_core::record::{CustomParse, ParseOutcome};
///
/// grammar! {
///     pub custom struct Flag {
///         pub raised: bool,
///     }
/// }
///
/// impl CustomParse for Flag {
///     fn parse(&mut self, tokens: &mut dyn TokenCursor) -> Result<ParseOutcome, ParseError> {
///         if tokens.peek().lexeme != "flag" {
///             return Ok(ParseOutcome::NoMatch);
///         }
///         tokens.next();
///         self.raised = true;
///         Ok(ParseOutcome::Matched)
///     }
/// }
/// ```
#[macro_export]
macro_rules! grammar {
    (
        $(#[$meta:meta])*
        $vis:vis custom struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $fname:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $fname : $fty, )*
        }

        impl $crate::record::Record for $name {
            fn descriptor() -> &'static $crate::record::RecordDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::record::RecordDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    let mut builder =
                        $crate::record::RecordBuilder::new::<$name>(stringify!($name));
                    builder.custom_parse::<$name>();
                    builder.finish()
                })
            }
        }

        $crate::__grammar_target!($name);
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $fname:ident : $fty:ty $(= $grammar:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $fname : $fty, )*
        }

        impl $crate::record::Record for $name {
            fn descriptor() -> &'static $crate::record::RecordDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::record::RecordDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    let mut builder =
                        $crate::record::RecordBuilder::new::<$name>(stringify!($name));
                    $( $crate::__grammar_field!(builder, $name, $fname : $fty $(= $grammar)?); )*
                    builder.finish()
                })
            }
        }

        $crate::__grammar_target!($name);
    };
}

/// Registers one field with the descriptor builder. A field with an
/// annotation becomes a grammar field; one without becomes the position
/// slot.
#[doc(hidden)]
#[macro_export]
macro_rules! __grammar_field {
    ($builder:ident, $record:ident, $fname:ident : $fty:ty = $grammar:literal) => {
        $builder.field::<$record, $fty>(stringify!($fname), $grammar, |record| {
            &mut record.$fname
        });
    };
    ($builder:ident, $record:ident, $fname:ident : $fty:ty) => {
        $builder.position::<$record>(|record, pos| record.$fname = pos);
    };
}

/// Implements `FieldTarget` for a record type, so it can itself appear as
/// a field (directly or behind `Vec`/`Option`/`Box`).
#[doc(hidden)]
#[macro_export]
macro_rules! __grammar_target {
    ($name:ident) => {
        impl $crate::record::FieldTarget for $name {
            fn kind() -> $crate::record::FieldKind {
                $crate::record::FieldKind::Record
            }

            fn element() -> ::std::option::Option<$crate::record::DescriptorFn> {
                ::std::option::Option::Some(<$name as $crate::record::Record>::descriptor)
            }

            fn field_mut(&mut self) -> $crate::record::FieldMut<'_> {
                $crate::record::FieldMut::Record(self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::lexer::{Position, TokenCursor};
    use crate::record::{CustomParse, FieldKind, FieldTarget, ParseOutcome, Record};

    crate::grammar! {
        /// A rule of the form `name = body`.
        struct Rule {
            pos: Position,
            name: String = r#"@Ident "=""#,
            body: Vec<String> = "{ @Ident }",
        }
    }

    crate::grammar! {
        struct Tree {
            label: String = "@Ident",
            children: Vec<Tree> = r#"[ "(" { @@ } ")" ]"#,
        }
    }

    crate::grammar! {
        custom struct Verbatim {
            text: String,
        }
    }

    impl CustomParse for Verbatim {
        fn parse(&mut self, tokens: &mut dyn TokenCursor) -> Result<ParseOutcome, ParseError> {
            if tokens.peek().is_eof() {
                return Ok(ParseOutcome::NoMatch);
            }
            self.text.push_str(&tokens.next().lexeme);
            Ok(ParseOutcome::Matched)
        }
    }

    #[test]
    fn declarative_descriptor() {
        let descriptor = Rule::descriptor();
        assert_eq!(descriptor.name(), "Rule");
        assert_eq!(descriptor.fields().len(), 2);
        assert_eq!(descriptor.fields()[0].name(), "name");
        assert_eq!(descriptor.fields()[0].grammar(), r#"@Ident "=""#);
        assert_eq!(descriptor.fields()[0].kind(), FieldKind::Text);
        assert_eq!(descriptor.fields()[1].name(), "body");
        assert!(!descriptor.has_custom_parse());
    }

    #[test]
    fn position_slot_is_not_a_field() {
        // The pos field has no annotation, so it does not join the grammar
        // walk; it still receives positions.
        let descriptor = Rule::descriptor();
        assert!(descriptor.fields().iter().all(|f| f.name() != "pos"));

        let mut instance = descriptor.new_instance();
        descriptor.set_position(instance.as_mut(), Position::new("x", 0, 7, 3));
        let rule = instance.downcast_ref::<Rule>().unwrap();
        assert_eq!(rule.pos.line, 7);
    }

    #[test]
    fn self_referential_descriptor_builds() {
        // children's element handle is lazy, so building Tree's descriptor
        // never re-enters itself.
        let descriptor = Tree::descriptor();
        let element = descriptor.fields()[1].element().expect("record element");
        assert!(std::ptr::eq(element(), descriptor));
    }

    #[test]
    fn record_is_a_field_target() {
        assert_eq!(Rule::kind(), FieldKind::Record);
        assert_eq!(<Vec<Tree>>::kind(), FieldKind::Record);
        let element = <Option<Box<Tree>>>::element().expect("record element");
        assert_eq!(element().name(), "Tree");
    }

    #[test]
    fn custom_descriptor() {
        let descriptor = Verbatim::descriptor();
        assert!(descriptor.has_custom_parse());
        assert!(descriptor.fields().is_empty());
    }
}
