//! Recording complete sub-documents as replayable token buffers.

use crate::{
    consumer::TokenConsumer,
    error::{StreamError, StructuralError},
    sink::ResultSink,
    token::TokenEvent,
    value::Value,
};

/// A recorded token sequence for exactly one complete top-level value.
///
/// Buffers are the unit of hand-off between the streaming side and the
/// decode side: the [`BufferAssembler`] records one, closes it the moment
/// the value completes, and passes it downstream, where it can be
/// [replayed](TokenBuffer::replay) into any consumer or decoded
/// independently of the byte stream it came from. Payloads are owned
/// copies; a buffer outlives the lexer that produced its tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBuffer {
    events: Vec<TokenEvent>,
    closed: bool,
}

impl TokenBuffer {
    /// The recorded events, in document order.
    ///
    /// The [`TokenEvent::EndOfStream`] sentinel is never recorded;
    /// [`replay`](TokenBuffer::replay) appends it itself.
    #[must_use]
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the buffer's value is complete and the buffer immutable.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Feeds the recorded events, then the end-of-stream sentinel, into
    /// `consumer`.
    ///
    /// # Errors
    ///
    /// Propagates the first error the consumer returns.
    pub fn replay<C: TokenConsumer>(&self, consumer: &mut C) -> Result<(), StreamError> {
        for event in &self.events {
            consumer.on_token(event.clone())?;
        }
        consumer.on_token(TokenEvent::EndOfStream)
    }

    /// Tokenizes a generic value into a closed buffer.
    ///
    /// This is the write-side forward pass in token form: replaying the
    /// result through a [`TreeAssembler`](crate::TreeAssembler) rebuilds an
    /// equal value.
    #[must_use]
    pub fn from_value(value: &Value) -> TokenBuffer {
        fn push_value(events: &mut Vec<TokenEvent>, value: &Value) {
            match value {
                Value::Null => events.push(TokenEvent::Null),
                Value::Bool(b) => events.push(TokenEvent::Boolean(*b)),
                Value::Int(n) => events.push(TokenEvent::Int(*n)),
                Value::Long(n) => events.push(TokenEvent::Long(*n)),
                Value::Double(n) => events.push(TokenEvent::Double(*n)),
                Value::String(s) => events.push(TokenEvent::String(s.clone())),
                Value::Embedded(bytes) => events.push(TokenEvent::Embedded(bytes.clone())),
                Value::Array(items) => {
                    events.push(TokenEvent::ArrayStart);
                    for item in items {
                        push_value(events, item);
                    }
                    events.push(TokenEvent::ArrayEnd);
                }
                Value::Object(fields) => {
                    events.push(TokenEvent::ObjectStart);
                    for (name, field) in fields {
                        events.push(TokenEvent::FieldName(name.clone()));
                        push_value(events, field);
                    }
                    events.push(TokenEvent::ObjectEnd);
                }
            }
        }

        let mut events = Vec::new();
        push_value(&mut events, value);
        TokenBuffer {
            events,
            closed: true,
        }
    }

    pub(crate) fn push(&mut self, event: TokenEvent) {
        debug_assert!(!self.closed, "push into a closed buffer");
        self.events.push(event);
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}

impl FromIterator<TokenEvent> for TokenBuffer {
    /// Collects events into a closed buffer, for hand-built fixtures.
    fn from_iter<I: IntoIterator<Item = TokenEvent>>(iter: I) -> Self {
        TokenBuffer {
            events: iter.into_iter().collect(),
            closed: true,
        }
    }
}

/// A [`TokenConsumer`] that splits a token stream into one closed
/// [`TokenBuffer`] per complete top-level value.
///
/// Depth tracking finds the value boundaries: container starts increment,
/// container ends decrement, and a return to depth 0 closes the current
/// buffer and hands it to the sink, after which a fresh buffer opens. Only
/// one buffer is ever held, so memory stays bounded by the largest single
/// value no matter how long the stream runs.
///
/// A scalar token at depth 0 is a complete value on its own; it closes and
/// hands off its buffer immediately, so a top-level `null` sitting between
/// two objects travels as its own buffer instead of attaching to a
/// neighbor. A buffer still open at end of stream never completed its
/// value and is discarded, not emitted.
///
/// Sink discipline regardless of content: [`ResultSink::begin`] on the
/// first token of any kind — the sentinel of an empty stream included —
/// and [`ResultSink::end`] when the sentinel arrives.
pub struct BufferAssembler<S> {
    sink: S,
    buffer: TokenBuffer,
    depth: u32,
    size_hint: Option<usize>,
    started: bool,
    ended: bool,
}

impl<S: ResultSink<TokenBuffer>> BufferAssembler<S> {
    /// Creates an assembler that reports an unknown value count.
    pub fn new(sink: S) -> Self {
        BufferAssembler::with_size_hint(sink, None)
    }

    /// Creates an assembler that forwards `size_hint` to
    /// [`ResultSink::begin`].
    pub fn with_size_hint(sink: S, size_hint: Option<usize>) -> Self {
        BufferAssembler {
            sink,
            buffer: TokenBuffer::default(),
            depth: 0,
            size_hint,
            started: false,
            ended: false,
        }
    }

    /// Shared access to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tears the assembler down and returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn emit(&mut self) {
        let mut complete = std::mem::take(&mut self.buffer);
        complete.close();
        self.sink.accept(complete);
    }
}

impl<S: ResultSink<TokenBuffer>> TokenConsumer for BufferAssembler<S> {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        if !self.started {
            self.started = true;
            self.sink.begin(self.size_hint);
        }
        if event == TokenEvent::EndOfStream {
            if self.ended {
                return Ok(());
            }
            self.ended = true;
            self.buffer = TokenBuffer::default();
            self.sink.end();
            return Ok(());
        }

        let completes = event.closes_container() || (self.depth == 0 && event.is_scalar());
        if event.opens_container() {
            self.depth += 1;
        } else if event.closes_container() {
            if self.depth == 0 {
                return Err(StructuralError::UnmatchedClose.into());
            }
            self.depth -= 1;
        }
        self.buffer.push(event);
        if completes && self.depth == 0 {
            self.emit();
        }
        Ok(())
    }
}
