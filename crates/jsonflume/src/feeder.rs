//! The token-feeding state machine.

use crate::{
    consumer::TokenConsumer,
    error::StreamError,
    lexer::{ActsonLexer, JsonLexer, LexStep},
    token::TokenEvent,
};

/// Drives an incremental lexer and pushes its tokens into a
/// [`TokenConsumer`] chain.
///
/// Byte chunks go in through [`consume`](TokenFeeder::consume) in whatever
/// fragmentation the transport delivers; after each chunk every token that
/// became decodable is forwarded, in document order, before the call
/// returns. [`stream_end`](TokenFeeder::stream_end) drains the rest, emits
/// the [`TokenEvent::EndOfStream`] sentinel exactly once, and hands the
/// consumer back to the caller.
///
/// A feeder is reusable: [`initialize`](TokenFeeder::initialize) binds a
/// fresh lexer and a consumer for a new stream, discarding any previous
/// binding.
pub struct TokenFeeder<C, L = ActsonLexer> {
    lexer: Option<L>,
    consumer: Option<C>,
}

impl<C, L> Default for TokenFeeder<C, L> {
    fn default() -> Self {
        TokenFeeder {
            lexer: None,
            consumer: None,
        }
    }
}

impl<C: TokenConsumer, L: JsonLexer + Default> TokenFeeder<C, L> {
    /// Creates a feeder with no stream bound.
    ///
    /// Calls to [`consume`](TokenFeeder::consume) and
    /// [`stream_end`](TokenFeeder::stream_end) are no-ops until
    /// [`initialize`](TokenFeeder::initialize) binds a consumer.
    #[must_use]
    pub fn new() -> Self {
        TokenFeeder::default()
    }

    /// Binds a fresh lexer and `consumer` for a new stream.
    pub fn initialize(&mut self, consumer: C) {
        tracing::trace!("token feeder initialized");
        self.lexer = Some(L::default());
        self.consumer = Some(consumer);
    }

    /// The bound consumer, while a stream is active.
    #[must_use]
    pub fn consumer(&self) -> Option<&C> {
        self.consumer.as_ref()
    }

    /// Feeds one byte chunk and forwards every token it completes.
    ///
    /// The chunk may be empty, and may begin or end in the middle of a
    /// token; a token split across calls is delivered once, fully
    /// reassembled, by the call that supplies its last byte. Without a
    /// bound consumer this is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates lexical errors and any error returned by the consumer
    /// chain. Errors are fatal for the stream; the feeder does not retry.
    pub fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        let (Some(lexer), Some(consumer)) = (self.lexer.as_mut(), self.consumer.as_mut()) else {
            return Ok(());
        };
        tracing::trace!(len = chunk.len(), "feeding chunk");
        lexer.feed(chunk);
        drain(lexer, consumer)
    }

    /// Signals end of input, drains remaining tokens, emits the
    /// [`TokenEvent::EndOfStream`] sentinel, and releases the stream.
    ///
    /// Returns the consumer so state accumulated during the stream (counts,
    /// assembled values) survives the teardown; `None` if no consumer was
    /// bound. The lexer and consumer references are released even when an
    /// error cuts the drain short.
    ///
    /// # Errors
    ///
    /// Propagates lexical errors found in the final drain — a truncated
    /// document surfaces here — and consumer errors.
    pub fn stream_end(&mut self) -> Result<Option<C>, StreamError> {
        let (Some(mut lexer), Some(mut consumer)) = (self.lexer.take(), self.consumer.take())
        else {
            return Ok(None);
        };
        tracing::trace!("stream end");
        lexer.end_of_input();
        drain(&mut lexer, &mut consumer)?;
        consumer.on_token(TokenEvent::EndOfStream)?;
        Ok(Some(consumer))
    }
}

/// Forwards tokens until the lexer runs out of decodable input.
fn drain<C: TokenConsumer, L: JsonLexer>(
    lexer: &mut L,
    consumer: &mut C,
) -> Result<(), StreamError> {
    loop {
        match lexer.next_token()? {
            LexStep::Token(token) => consumer.on_token(token)?,
            LexStep::NeedMoreInput | LexStep::EndOfInput => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TokenFeeder;
    use crate::{consumer::TokenConsumer, error::StreamError, token::TokenEvent};

    #[derive(Default)]
    struct Recorder(Vec<TokenEvent>);

    impl TokenConsumer for Recorder {
        fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
            self.0.push(event);
            Ok(())
        }
    }

    #[test]
    fn unbound_feeder_ignores_input() {
        let mut feeder: TokenFeeder<Recorder> = TokenFeeder::new();
        feeder.consume(b"{}").unwrap();
        assert!(feeder.stream_end().unwrap().is_none());
    }

    #[test]
    fn split_token_is_delivered_once() {
        let mut feeder: TokenFeeder<_> = TokenFeeder::new();
        feeder.initialize(Recorder::default());
        feeder.consume(br#"{"nam"#).unwrap();
        feeder.consume(br#"e":"#).unwrap();
        feeder.consume(br#""value"}"#).unwrap();
        let recorder = feeder.stream_end().unwrap().unwrap();
        assert_eq!(
            recorder.0,
            vec![
                TokenEvent::ObjectStart,
                TokenEvent::FieldName("name".into()),
                TokenEvent::String("value".into()),
                TokenEvent::ObjectEnd,
                TokenEvent::EndOfStream,
            ]
        );
    }

    #[test]
    fn initialize_resets_for_a_new_stream() {
        let mut feeder: TokenFeeder<_> = TokenFeeder::new();
        feeder.initialize(Recorder::default());
        feeder.consume(b"[1").unwrap();

        feeder.initialize(Recorder::default());
        feeder.consume(b"true").unwrap();
        let recorder = feeder.stream_end().unwrap().unwrap();
        assert_eq!(
            recorder.0,
            vec![TokenEvent::Boolean(true), TokenEvent::EndOfStream]
        );
    }

    #[test]
    fn empty_chunks_are_harmless() {
        let mut feeder: TokenFeeder<_> = TokenFeeder::new();
        feeder.initialize(Recorder::default());
        feeder.consume(b"").unwrap();
        feeder.consume(b"7").unwrap();
        feeder.consume(b"").unwrap();
        let recorder = feeder.stream_end().unwrap().unwrap();
        assert_eq!(recorder.0, vec![TokenEvent::Int(7), TokenEvent::EndOfStream]);
    }
}
