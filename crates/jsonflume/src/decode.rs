//! Pluggable per-buffer decoders.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::{
    buffer::TokenBuffer, de::from_buffer, error::StreamError, token::TokenEvent, value::Value,
};

/// Turns one recorded sub-document buffer into a decoded value.
///
/// The readers invoke this once per emitted buffer. `Ok(None)` means the
/// buffer legitimately carries no value — it is skipped, not delivered to
/// the result sink and not counted. Errors are terminal for the whole
/// read.
///
/// Any `FnMut(&TokenBuffer) -> Result<Option<T>, StreamError>` closure is a
/// decoder.
pub trait BufferDecoder {
    /// The decoded value type.
    type Output;

    /// Decodes one buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] when the buffer cannot be decoded; the
    /// enclosing read aborts.
    fn decode(&mut self, buffer: &TokenBuffer) -> Result<Option<Self::Output>, StreamError>;
}

impl<T, F: FnMut(&TokenBuffer) -> Result<Option<T>, StreamError>> BufferDecoder for F {
    type Output = T;

    fn decode(&mut self, buffer: &TokenBuffer) -> Result<Option<T>, StreamError> {
        self(buffer)
    }
}

/// Decodes buffers into any [`DeserializeOwned`] type.
///
/// A buffer holding the lone JSON literal `null` decodes to `None`: a null
/// sub-document carries no typed value, so it is skipped rather than forced
/// through `T`. Callers who want nulls surfaced use [`ValueDecoder`] or a
/// target type of `Option<...>` inside their document shape.
pub struct SerdeDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeDecoder<T> {
    /// Creates a decoder for `T`.
    #[must_use]
    pub fn new() -> Self {
        SerdeDecoder {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeDecoder<T> {
    fn default() -> Self {
        SerdeDecoder::new()
    }
}

impl<T: DeserializeOwned> BufferDecoder for SerdeDecoder<T> {
    type Output = T;

    fn decode(&mut self, buffer: &TokenBuffer) -> Result<Option<T>, StreamError> {
        if buffer.is_empty() || matches!(buffer.events(), [TokenEvent::Null]) {
            return Ok(None);
        }
        Ok(Some(from_buffer(buffer)?))
    }
}

/// Decodes buffers into generic [`Value`] trees.
///
/// Unlike [`SerdeDecoder`], a lone `null` decodes to `Some(Value::Null)` —
/// in the generic tree model, null is a value like any other.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueDecoder;

impl BufferDecoder for ValueDecoder {
    type Output = Value;

    fn decode(&mut self, buffer: &TokenBuffer) -> Result<Option<Value>, StreamError> {
        if buffer.is_empty() {
            return Ok(None);
        }
        Ok(Some(from_buffer(buffer)?))
    }
}
