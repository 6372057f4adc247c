//! Pipeline error kinds.
//!
//! Everything fatal funnels into [`StreamError`]: lexical rejections from
//! the underlying lexer, structural impossibilities found by an assembler,
//! and per-sub-document decode failures. None of these are retried; a
//! failure aborts the stream it occurred on, and values already delivered
//! stay delivered.

use core::fmt;

use thiserror::Error;

/// A fatal error on one stream.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    /// The underlying lexer rejected malformed bytes.
    #[error("lexical error at byte {offset}: {message}")]
    Lexical {
        /// The lexer's own description of the rejection.
        message: String,
        /// Count of bytes accepted before the failing call, an upper bound
        /// on where the offending byte sits.
        offset: u64,
    },
    /// A token arrived that the receiving assembler cannot place.
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
    /// The pluggable decoder failed on one sub-document.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// A token that cannot be placed in the tree being assembled.
///
/// A conforming lexer never produces these orderings; they arise from
/// hand-built or corrupted token buffers.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StructuralError {
    /// A scalar value token arrived with no open container to attach to.
    #[error("value token with no open container")]
    ValueOutsideContainer,
    /// A value arrived inside an object with no field name pending.
    #[error("value token with no preceding field name")]
    ValueWithoutName,
    /// A field name arrived while the innermost container is not an object.
    #[error("field name with no open object")]
    NameOutsideObject,
    /// A close token arrived with no container open.
    #[error("close token with no open container")]
    UnmatchedClose,
    /// A close token arrived for the wrong container kind.
    #[error("close token does not match the open container")]
    MismatchedClose,
    /// A container closed while a field name was still waiting for its value.
    #[error("field name not followed by a value")]
    DanglingFieldName,
}

/// A failure while decoding one recorded sub-document buffer.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// Message raised by the deserialization target.
    #[error("{0}")]
    Custom(String),
    /// The buffer held a different token than the decode target expected.
    #[error("unexpected {found} where {expected} was expected")]
    UnexpectedToken {
        /// What the decoder was prepared to read.
        expected: &'static str,
        /// Short description of the token actually found.
        found: String,
    },
    /// The decoder needed more tokens than the buffer recorded.
    #[error("decode ran past the end of the recorded buffer")]
    ExhaustedBuffer,
    /// Tokens remained after the decoded value ended.
    #[error("trailing tokens after the decoded value")]
    TrailingTokens,
}

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Custom(msg.to_string())
    }
}
