//! The consumer seam between pipeline stages.

use crate::{error::StreamError, token::TokenEvent};

/// A push-mode receiver of token events.
///
/// Everything downstream of the [`TokenFeeder`](crate::TokenFeeder)
/// implements this: assemblers consume tokens directly, decorators such as
/// the [`TopLevelArrayFilter`](crate::TopLevelArrayFilter) wrap another
/// `TokenConsumer` and forward a rewritten stream. Chains are built by plain
/// composition — a filter around an assembler around a sink — and driven
/// synchronously: the feeder calls [`on_token`](TokenConsumer::on_token)
/// once per token, in document order, ending with
/// [`TokenEvent::EndOfStream`].
///
/// An `Err` return is fatal for the stream. The feeder propagates it to the
/// caller and no further tokens are delivered.
pub trait TokenConsumer {
    /// Handles one token event.
    ///
    /// # Errors
    ///
    /// Implementations return [`StreamError`] when the token cannot be
    /// placed or a downstream decode step fails; the error aborts the
    /// stream.
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError>;
}

impl<C: TokenConsumer + ?Sized> TokenConsumer for Box<C> {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        (**self).on_token(event)
    }
}

impl<C: TokenConsumer + ?Sized> TokenConsumer for &mut C {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        (**self).on_token(event)
    }
}
