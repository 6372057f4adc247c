//! The incremental lexer boundary.
//!
//! The pipeline never implements JSON lexical rules itself; it drives
//! anything that can turn bytes into [`TokenEvent`]s through the
//! [`JsonLexer`] trait. The bundled implementation is [`ActsonLexer`],
//! backed by the `actson` push-mode parser; every type of that crate stays
//! inside its binding module so the rest of the pipeline is lexer-agnostic.

mod actson;

pub use actson::ActsonLexer;

use crate::{error::StreamError, token::TokenEvent};

/// The result of one [`JsonLexer::next_token`] pull.
#[derive(Debug, Clone, PartialEq)]
pub enum LexStep {
    /// A complete token was decoded.
    Token(TokenEvent),
    /// The bytes fed so far do not complete the next token; feed more and
    /// pull again.
    NeedMoreInput,
    /// End of input was signaled and every remaining token has been pulled.
    EndOfInput,
}

/// A push-based incremental JSON lexer.
///
/// Bytes go in through [`feed`](JsonLexer::feed) in arbitrary
/// fragmentation — a chunk may end in the middle of a string literal, a
/// number, or a UTF-8 sequence. Tokens come out through
/// [`next_token`](JsonLexer::next_token) until it reports
/// [`LexStep::NeedMoreInput`]; after [`end_of_input`] the remaining tokens
/// drain and the lexer finishes with [`LexStep::EndOfInput`].
///
/// [`end_of_input`]: JsonLexer::end_of_input
pub trait JsonLexer {
    /// Makes `chunk` available for tokenization.
    ///
    /// Never blocks and never rejects input; bytes that cannot be used yet
    /// are carried until later feeds or pulls consume them.
    fn feed(&mut self, chunk: &[u8]);

    /// Signals that no more bytes will arrive.
    fn end_of_input(&mut self);

    /// Pulls the next decodable token.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Lexical`] when the input is rejected as
    /// malformed JSON, including truncated documents discovered at end of
    /// input.
    fn next_token(&mut self) -> Result<LexStep, StreamError>;
}
