//! Binding to the `actson` push-mode parser.

use std::collections::VecDeque;

use actson::{JsonEvent, JsonParser, feeder::PushJsonFeeder, options::JsonParserOptionsBuilder};

use super::{JsonLexer, LexStep};
use crate::{error::StreamError, token::TokenEvent};

/// The bundled [`JsonLexer`] implementation.
///
/// Streaming mode is enabled, so a byte stream holding several top-level
/// values in sequence lexes as one continuous token stream. The parser's
/// internal feeder has bounded capacity; bytes it cannot take yet are
/// carried here and pushed as pulls free space, which keeps
/// [`feed`](JsonLexer::feed) infallible for chunks of any size.
pub struct ActsonLexer {
    parser: JsonParser<PushJsonFeeder>,
    carry: VecDeque<u8>,
    fed: u64,
    closed: bool,
    done_sent: bool,
}

impl Default for ActsonLexer {
    fn default() -> Self {
        ActsonLexer::new()
    }
}

impl ActsonLexer {
    /// Creates a lexer ready for the first chunk of a new stream.
    #[must_use]
    pub fn new() -> Self {
        let options = JsonParserOptionsBuilder::default()
            .with_streaming(true)
            .build();
        ActsonLexer {
            parser: JsonParser::new_with_options(PushJsonFeeder::new(), options),
            carry: VecDeque::new(),
            fed: 0,
            closed: false,
            done_sent: false,
        }
    }

    /// Moves carried bytes into the parser's feeder while it accepts them,
    /// and signals `done` once the carry drains after [`end_of_input`].
    ///
    /// [`end_of_input`]: JsonLexer::end_of_input
    fn top_up(&mut self) {
        while !self.carry.is_empty() {
            let (head, _) = self.carry.as_slices();
            let taken = self.parser.feeder.push_bytes(head);
            if taken == 0 {
                break;
            }
            self.carry.drain(..taken);
        }
        if self.closed && self.carry.is_empty() && !self.done_sent {
            self.parser.feeder.done();
            self.done_sent = true;
        }
    }

    fn lexical(&self, message: String) -> StreamError {
        StreamError::Lexical {
            message,
            offset: self.fed,
        }
    }

    fn current_str(&mut self) -> Result<String, StreamError> {
        let offset = self.fed;
        match self.parser.current_str() {
            Ok(s) => Ok(s.to_string()),
            Err(err) => Err(StreamError::Lexical {
                message: err.to_string(),
                offset,
            }),
        }
    }

    fn current_int(&mut self) -> Result<TokenEvent, StreamError> {
        // Smallest fitting width: a literal that parses as i32 is reported
        // as Int, anything wider as Long.
        if let Ok(n) = self.parser.current_int::<i32>() {
            return Ok(TokenEvent::Int(n));
        }
        let offset = self.fed;
        match self.parser.current_int::<i64>() {
            Ok(n) => Ok(TokenEvent::Long(n)),
            Err(err) => Err(StreamError::Lexical {
                message: err.to_string(),
                offset,
            }),
        }
    }

    fn current_float(&mut self) -> Result<TokenEvent, StreamError> {
        let offset = self.fed;
        match self.parser.current_float() {
            Ok(n) => Ok(TokenEvent::Double(n)),
            Err(err) => Err(StreamError::Lexical {
                message: err.to_string(),
                offset,
            }),
        }
    }

    fn token_for(&mut self, event: JsonEvent) -> Result<TokenEvent, StreamError> {
        match event {
            JsonEvent::StartObject => Ok(TokenEvent::ObjectStart),
            JsonEvent::EndObject => Ok(TokenEvent::ObjectEnd),
            JsonEvent::StartArray => Ok(TokenEvent::ArrayStart),
            JsonEvent::EndArray => Ok(TokenEvent::ArrayEnd),
            JsonEvent::FieldName => Ok(TokenEvent::FieldName(self.current_str()?)),
            JsonEvent::ValueString => Ok(TokenEvent::String(self.current_str()?)),
            JsonEvent::ValueInt => self.current_int(),
            JsonEvent::ValueFloat => self.current_float(),
            JsonEvent::ValueTrue => Ok(TokenEvent::Boolean(true)),
            JsonEvent::ValueFalse => Ok(TokenEvent::Boolean(false)),
            JsonEvent::ValueNull => Ok(TokenEvent::Null),
            other => Err(self.lexical(format!("unsupported lexer event: {other:?}"))),
        }
    }
}

impl JsonLexer for ActsonLexer {
    fn feed(&mut self, chunk: &[u8]) {
        self.fed += chunk.len() as u64;
        self.carry.extend(chunk.iter().copied());
        self.top_up();
    }

    fn end_of_input(&mut self) {
        self.closed = true;
        self.top_up();
    }

    fn next_token(&mut self) -> Result<LexStep, StreamError> {
        loop {
            match self.parser.next_event() {
                Ok(Some(JsonEvent::NeedMoreInput)) => {
                    if !self.carry.is_empty() {
                        // A starved parser implies a drained feeder, so the
                        // carry always makes progress here.
                        self.top_up();
                        continue;
                    }
                    if self.done_sent {
                        // The parser cannot be fed again; asking for more
                        // input now means the document was truncated.
                        return Err(self.lexical("unexpected end of input".to_string()));
                    }
                    return Ok(LexStep::NeedMoreInput);
                }
                Ok(None) => return Ok(LexStep::EndOfInput),
                Ok(Some(event)) => return Ok(LexStep::Token(self.token_for(event)?)),
                Err(err) => {
                    let message = err.to_string();
                    return Err(self.lexical(message));
                }
            }
        }
    }
}
