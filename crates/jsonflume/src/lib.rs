//! Streaming JSON token pipeline: byte chunks go in, complete values come
//! out.
//!
//! Incremental JSON handling is split into small single-purpose pieces
//! that compose like the streams they process. A [`TokenFeeder`] drives an
//! incremental lexer and pushes [`TokenEvent`]s into a [`TokenConsumer`]
//! chain. Downstream, a [`TreeAssembler`] folds the stream into one
//! [`Value`] tree, or a [`BufferAssembler`] cuts it into replayable
//! [`TokenBuffer`]s, one per top-level value, for independent decoding. A
//! [`TopLevelArrayFilter`] unwraps a top-level array so each element
//! becomes its own top-level value, and the readers bundle the usual
//! wirings behind a two-call surface. Nothing blocks: a chunk may end in
//! the middle of a token, and the pipeline simply waits for the next call.
//!
//! # Examples
//!
//! Stream a top-level array without ever holding the whole document:
//!
//! ```
//! use jsonflume::{BulkArrayReader, SerdeDecoder};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Event {
//!     id: u64,
//! }
//!
//! let mut total = 0;
//! {
//!     let mut reader = BulkArrayReader::new(SerdeDecoder::<Event>::new(), |event: Event| {
//!         total += event.id;
//!     });
//!     reader.consume(br#"[{"id":1},{"id":2},"#)?;
//!     reader.consume(br#"{"id":3}]"#)?;
//!     reader.stream_end()?;
//! }
//! assert_eq!(total, 6);
//! # Ok::<(), jsonflume::StreamError>(())
//! ```

mod buffer;
mod token;
mod value;

mod assembler;
mod consumer;
mod de;
mod decode;
mod error;
mod feeder;
mod filter;
mod lexer;
mod message;
mod reader;
mod sink;

#[cfg(test)]
mod tests;

pub use assembler::TreeAssembler;
pub use buffer::{BufferAssembler, TokenBuffer};
pub use consumer::TokenConsumer;
pub use de::{TokenDeserializer, from_buffer};
pub use decode::{BufferDecoder, SerdeDecoder, ValueDecoder};
pub use error::{DecodeError, StreamError, StructuralError};
pub use feeder::TokenFeeder;
pub use filter::TopLevelArrayFilter;
pub use lexer::{ActsonLexer, JsonLexer, LexStep};
pub use message::{
    BodyConsumer, BulkBody, MessageConsumer, MessageHead, Outcome, TreeBody, TypedBody,
};
pub use reader::{BulkArrayReader, ReaderOptions, SequenceReader};
pub use sink::ResultSink;
pub use token::TokenEvent;
pub use value::{Array, Map, Value};
