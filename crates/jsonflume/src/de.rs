//! Deserializing recorded token buffers into typed values.
//!
//! [`from_buffer`] is the decode half of the pluggable decoder boundary: it
//! walks the owned tokens of one [`TokenBuffer`] with a cursor and drives
//! any [`serde::Deserialize`] implementation from them, with no byte
//! parsing involved — the lexer already did that work when the buffer was
//! recorded.

use serde::{
    Deserialize,
    de::{
        DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
        value::BorrowedStrDeserializer,
    },
    forward_to_deserialize_any,
};

use crate::{buffer::TokenBuffer, error::DecodeError, token::TokenEvent};

/// Decodes one complete value from a recorded buffer.
///
/// The whole buffer must belong to the value: tokens left over after the
/// decode are an error, as is a buffer that runs out mid-value.
///
/// # Errors
///
/// Returns [`DecodeError`] when the token shapes do not match what `T`
/// expects, when the buffer is exhausted early, or when tokens trail the
/// decoded value.
pub fn from_buffer<T: for<'de> Deserialize<'de>>(buffer: &TokenBuffer) -> Result<T, DecodeError> {
    let mut de = TokenDeserializer::new(buffer.events());
    let value = T::deserialize(&mut de)?;
    de.finish()?;
    Ok(value)
}

fn token_name(token: &TokenEvent) -> &'static str {
    match token {
        TokenEvent::ObjectStart => "object start",
        TokenEvent::ObjectEnd => "object end",
        TokenEvent::ArrayStart => "array start",
        TokenEvent::ArrayEnd => "array end",
        TokenEvent::FieldName(_) => "field name",
        TokenEvent::String(_) => "string",
        TokenEvent::Int(_) => "integer",
        TokenEvent::Long(_) => "long integer",
        TokenEvent::Double(_) => "number",
        TokenEvent::Boolean(_) => "boolean",
        TokenEvent::Null => "null",
        TokenEvent::Embedded(_) => "embedded value",
        TokenEvent::EndOfStream => "end of stream",
    }
}

fn unexpected(token: &TokenEvent, expected: &'static str) -> DecodeError {
    DecodeError::UnexpectedToken {
        expected,
        found: token_name(token).to_string(),
    }
}

/// Cursor-based [`serde::Deserializer`] over a recorded token slice.
pub struct TokenDeserializer<'de> {
    tokens: &'de [TokenEvent],
    pos: usize,
}

impl<'de> TokenDeserializer<'de> {
    /// Starts a cursor at the beginning of `tokens`.
    #[must_use]
    pub fn new(tokens: &'de [TokenEvent]) -> Self {
        TokenDeserializer { tokens, pos: 0 }
    }

    /// Verifies the cursor consumed every token.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TrailingTokens`] when recorded tokens remain.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.pos < self.tokens.len() {
            Err(DecodeError::TrailingTokens)
        } else {
            Ok(())
        }
    }

    fn peek(&self) -> Result<&'de TokenEvent, DecodeError> {
        self.tokens.get(self.pos).ok_or(DecodeError::ExhaustedBuffer)
    }

    fn next(&mut self) -> Result<&'de TokenEvent, DecodeError> {
        let token = self.tokens.get(self.pos).ok_or(DecodeError::ExhaustedBuffer)?;
        self.pos += 1;
        Ok(token)
    }
}

impl<'de> serde::Deserializer<'de> for &mut TokenDeserializer<'de> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.next()? {
            TokenEvent::ObjectStart => visitor.visit_map(MapTokens {
                de: self,
                done: false,
            }),
            TokenEvent::ArrayStart => visitor.visit_seq(SeqTokens {
                de: self,
                done: false,
            }),
            TokenEvent::String(s) => visitor.visit_borrowed_str(s),
            TokenEvent::Int(n) => visitor.visit_i32(*n),
            TokenEvent::Long(n) => visitor.visit_i64(*n),
            TokenEvent::Double(n) => visitor.visit_f64(*n),
            TokenEvent::Boolean(b) => visitor.visit_bool(*b),
            TokenEvent::Null => visitor.visit_unit(),
            TokenEvent::Embedded(bytes) => visitor.visit_borrowed_bytes(bytes),
            token => Err(unexpected(token, "a value")),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        if matches!(self.peek()?, TokenEvent::Null) {
            self.pos += 1;
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.next()? {
            TokenEvent::Null => visitor.visit_unit(),
            token => Err(unexpected(token, "null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.peek()? {
            TokenEvent::String(variant) => {
                self.pos += 1;
                visitor.visit_enum(BorrowedStrDeserializer::new(variant))
            }
            TokenEvent::ObjectStart => {
                self.pos += 1;
                let variant = match self.next()? {
                    TokenEvent::FieldName(name) => name.as_str(),
                    token => return Err(unexpected(token, "an enum variant name")),
                };
                let value = visitor.visit_enum(EnumTokens { de: self, variant })?;
                match self.next()? {
                    TokenEvent::ObjectEnd => Ok(value),
                    token => Err(unexpected(token, "the end of the variant object")),
                }
            }
            token => Err(unexpected(token, "an enum value")),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_any(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf seq tuple tuple_struct map struct identifier
    }
}

struct SeqTokens<'a, 'de> {
    de: &'a mut TokenDeserializer<'de>,
    done: bool,
}

impl<'de> SeqAccess<'de> for SeqTokens<'_, 'de> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        if self.done {
            return Ok(None);
        }
        if matches!(self.de.peek()?, TokenEvent::ArrayEnd) {
            self.de.pos += 1;
            self.done = true;
            return Ok(None);
        }
        seed.deserialize(&mut *self.de).map(Some)
    }
}

struct MapTokens<'a, 'de> {
    de: &'a mut TokenDeserializer<'de>,
    done: bool,
}

impl<'de> MapAccess<'de> for MapTokens<'_, 'de> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        if self.done {
            return Ok(None);
        }
        match self.de.next()? {
            TokenEvent::FieldName(name) => seed
                .deserialize(BorrowedStrDeserializer::new(name))
                .map(Some),
            TokenEvent::ObjectEnd => {
                self.done = true;
                Ok(None)
            }
            token => Err(unexpected(token, "a field name")),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DecodeError> {
        seed.deserialize(&mut *self.de)
    }
}

struct EnumTokens<'a, 'de> {
    de: &'a mut TokenDeserializer<'de>,
    variant: &'de str,
}

impl<'a, 'de> EnumAccess<'de> for EnumTokens<'a, 'de> {
    type Error = DecodeError;
    type Variant = VariantTokens<'a, 'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), DecodeError> {
        let variant = seed.deserialize(BorrowedStrDeserializer::new(self.variant))?;
        Ok((variant, VariantTokens { de: self.de }))
    }
}

struct VariantTokens<'a, 'de> {
    de: &'a mut TokenDeserializer<'de>,
}

impl<'de> VariantAccess<'de> for VariantTokens<'_, 'de> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        match self.de.next()? {
            TokenEvent::Null => Ok(()),
            token => Err(unexpected(token, "null")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, DecodeError> {
        seed.deserialize(&mut *self.de)
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        serde::Deserializer::deserialize_any(&mut *self.de, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        serde::Deserializer::deserialize_any(&mut *self.de, visitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{TokenDeserializer, from_buffer};
    use crate::{buffer::TokenBuffer, error::DecodeError, token::TokenEvent, value::Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        id: u32,
        name: String,
    }

    fn record_buffer(id: i32, name: &str) -> TokenBuffer {
        [
            TokenEvent::ObjectStart,
            TokenEvent::FieldName("id".into()),
            TokenEvent::Int(id),
            TokenEvent::FieldName("name".into()),
            TokenEvent::String(name.into()),
            TokenEvent::ObjectEnd,
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn decodes_a_typed_struct() {
        let record: Record = from_buffer(&record_buffer(3, "three")).unwrap();
        assert_eq!(
            record,
            Record {
                id: 3,
                name: "three".to_string()
            }
        );
    }

    #[test]
    fn decodes_nested_collections() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Wrapper {
            items: Vec<i64>,
            flag: Option<bool>,
        }

        let buffer: TokenBuffer = [
            TokenEvent::ObjectStart,
            TokenEvent::FieldName("items".into()),
            TokenEvent::ArrayStart,
            TokenEvent::Int(1),
            TokenEvent::Long(1 << 40),
            TokenEvent::ArrayEnd,
            TokenEvent::FieldName("flag".into()),
            TokenEvent::Null,
            TokenEvent::ObjectEnd,
        ]
        .into_iter()
        .collect();

        let wrapper: Wrapper = from_buffer(&buffer).unwrap();
        assert_eq!(
            wrapper,
            Wrapper {
                items: vec![1, 1 << 40],
                flag: None
            }
        );
    }

    #[test]
    fn decodes_enums_in_both_shapes() {
        #[derive(Debug, Deserialize, PartialEq)]
        enum Shape {
            Point,
            Circle { radius: f64 },
        }

        let unit: TokenBuffer = [TokenEvent::String("Point".into())].into_iter().collect();
        assert_eq!(from_buffer::<Shape>(&unit).unwrap(), Shape::Point);

        let circle: TokenBuffer = [
            TokenEvent::ObjectStart,
            TokenEvent::FieldName("Circle".into()),
            TokenEvent::ObjectStart,
            TokenEvent::FieldName("radius".into()),
            TokenEvent::Double(2.5),
            TokenEvent::ObjectEnd,
            TokenEvent::ObjectEnd,
        ]
        .into_iter()
        .collect();
        assert_eq!(
            from_buffer::<Shape>(&circle).unwrap(),
            Shape::Circle { radius: 2.5 }
        );
    }

    #[test]
    fn generic_values_match_the_tree_assembler() {
        let buffer = record_buffer(0, "zero");
        let via_serde: Value = from_buffer(&buffer).unwrap();

        let mut assembler = crate::TreeAssembler::new();
        buffer.replay(&mut assembler).unwrap();
        assert_eq!(Some(via_serde), assembler.take_root());
    }

    #[test]
    fn type_mismatch_is_a_decode_error() {
        let buffer: TokenBuffer = [
            TokenEvent::ObjectStart,
            TokenEvent::FieldName("id".into()),
            TokenEvent::String("not a number".into()),
            TokenEvent::FieldName("name".into()),
            TokenEvent::String("x".into()),
            TokenEvent::ObjectEnd,
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            from_buffer::<Record>(&buffer),
            Err(DecodeError::Custom(_))
        ));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let buffer: TokenBuffer = [TokenEvent::Int(1), TokenEvent::Int(2)].into_iter().collect();
        assert_eq!(
            from_buffer::<i32>(&buffer),
            Err(DecodeError::TrailingTokens)
        );
    }

    #[test]
    fn exhausted_buffer_is_reported() {
        let empty = TokenBuffer::default();
        assert_eq!(
            from_buffer::<i32>(&empty),
            Err(DecodeError::ExhaustedBuffer)
        );
        let mut de = TokenDeserializer::new(empty.events());
        assert_eq!(
            <i32 as Deserialize>::deserialize(&mut de),
            Err(DecodeError::ExhaustedBuffer)
        );
    }
}
