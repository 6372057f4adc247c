//! Glue between a framed-message transport and the token pipeline.
//!
//! A transport that delivers messages with an envelope — an HTTP exchange,
//! a payload on a queue — hands each message to a [`MessageConsumer`]: the
//! [`MessageHead`] first, then the body bytes in whatever chunks arrive,
//! then the end of the stream. The consumer routes the bytes into a
//! [`BodyConsumer`] when the head declares a JSON payload, silently drains
//! them when it declares something else, and reports the terminal
//! [`Outcome`] through a callback exactly once.

use std::mem;

use serde::de::DeserializeOwned;

use crate::{
    assembler::TreeAssembler,
    buffer::{BufferAssembler, TokenBuffer},
    decode::{BufferDecoder, SerdeDecoder},
    error::StreamError,
    feeder::TokenFeeder,
    reader::BulkArrayReader,
    sink::ResultSink,
    value::Value,
};

/// The envelope of one message: a status code and its headers.
///
/// Opaque to the pipeline itself. The only part the routing logic reads is
/// the `content-type` header, via [`content_type`](MessageHead::content_type).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHead {
    /// Protocol status code; zero when the transport has none.
    pub status: u16,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
}

impl MessageHead {
    /// Creates a head with the given status and no headers.
    #[must_use]
    pub fn new(status: u16) -> Self {
        MessageHead {
            status,
            headers: Vec::new(),
        }
    }

    /// Appends one header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of the named header, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The media type of the body, with any parameters stripped.
    ///
    /// `"application/json; charset=utf-8"` comes back as
    /// `"application/json"`. `None` when the header is missing or empty.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        let raw = self.header("content-type")?;
        let mime = raw.split(';').next().unwrap_or("").trim();
        (!mime.is_empty()).then_some(mime)
    }
}

/// Terminal result of one message, delivered to the completion callback
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The stream ended normally; `None` when the body produced no value
    /// (an empty payload, a lone `null` document, or a drained non-JSON
    /// body).
    Completed(Option<T>),
    /// The stream failed. Values already delivered to a result sink are
    /// not retracted.
    Failed(StreamError),
    /// The transport abandoned the message before the body ended.
    Cancelled,
}

/// One message body, viewed from the transport side.
///
/// The transport calls [`stream_start`](BodyConsumer::stream_start) once
/// when the head arrives, [`consume`](BodyConsumer::consume) for each byte
/// chunk, and [`stream_end`](BodyConsumer::stream_end) once to collect the
/// result. Between calls the body is exclusively owned by the caller; no
/// internal concurrency.
pub trait BodyConsumer {
    /// Value the body produces when it completes.
    type Output;

    /// Receives the message head before any body bytes.
    ///
    /// The default does nothing; bodies that never look at the envelope
    /// can leave it that way.
    ///
    /// # Errors
    ///
    /// A body may reject the message up front.
    fn stream_start(&mut self, head: &MessageHead) -> Result<(), StreamError> {
        let _ = head;
        Ok(())
    }

    /// How many bytes the body is prepared to accept next; `None` is
    /// unbounded. The default defers pacing entirely to the transport.
    fn capacity_hint(&self) -> Option<usize> {
        None
    }

    /// Feeds one chunk of body bytes.
    ///
    /// # Errors
    ///
    /// Failures are terminal for the body; see [`StreamError`].
    fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError>;

    /// Ends the body and yields its completed value, if any.
    ///
    /// # Errors
    ///
    /// A truncated or otherwise unfinishable body surfaces here.
    fn stream_end(&mut self) -> Result<Option<Self::Output>, StreamError>;

    /// Notifies the body of a transport-level failure; no further calls
    /// follow. The default does nothing — dropping the body reclaims its
    /// state.
    fn failed(&mut self, error: &StreamError) {
        let _ = error;
    }
}

/// Assembles the whole body into one [`Value`] tree.
pub struct TreeBody {
    feeder: TokenFeeder<TreeAssembler>,
}

impl TreeBody {
    /// Creates a body consumer that parses the payload into a tree.
    #[must_use]
    pub fn new() -> Self {
        let mut feeder = TokenFeeder::new();
        feeder.initialize(TreeAssembler::new());
        TreeBody { feeder }
    }
}

impl Default for TreeBody {
    fn default() -> Self {
        TreeBody::new()
    }
}

impl BodyConsumer for TreeBody {
    type Output = Value;

    fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.feeder.consume(chunk)
    }

    fn stream_end(&mut self) -> Result<Option<Value>, StreamError> {
        match self.feeder.stream_end()? {
            Some(mut assembler) => Ok(assembler.take_root()),
            None => Ok(None),
        }
    }
}

/// Keeps the first emitted sub-document and ignores the rest.
#[derive(Debug, Default)]
struct FirstBufferSink {
    first: Option<TokenBuffer>,
}

impl ResultSink<TokenBuffer> for FirstBufferSink {
    fn accept(&mut self, value: TokenBuffer) {
        if self.first.is_none() {
            self.first = Some(value);
        }
    }
}

/// Decodes the whole body into a single value of `T`.
///
/// When the payload holds several concatenated documents, the first one
/// wins and the rest are ignored, the same rule [`TreeAssembler`] applies
/// to multiple roots.
pub struct TypedBody<T> {
    feeder: TokenFeeder<BufferAssembler<FirstBufferSink>>,
    decoder: SerdeDecoder<T>,
}

impl<T> TypedBody<T> {
    /// Creates a body consumer that decodes the payload into a `T`.
    #[must_use]
    pub fn new() -> Self {
        let mut feeder = TokenFeeder::new();
        feeder.initialize(BufferAssembler::new(FirstBufferSink::default()));
        TypedBody {
            feeder,
            decoder: SerdeDecoder::new(),
        }
    }
}

impl<T> Default for TypedBody<T> {
    fn default() -> Self {
        TypedBody::new()
    }
}

impl<T: DeserializeOwned> BodyConsumer for TypedBody<T> {
    type Output = T;

    fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.feeder.consume(chunk)
    }

    fn stream_end(&mut self) -> Result<Option<T>, StreamError> {
        let Some(assembler) = self.feeder.stream_end()? else {
            return Ok(None);
        };
        match assembler.into_sink().first {
            Some(buffer) => self.decoder.decode(&buffer),
            None => Ok(None),
        }
    }
}

/// Streams the elements of a top-level JSON array into a [`ResultSink`],
/// completing with the number of accepted values.
pub struct BulkBody<D: BufferDecoder, S: ResultSink<D::Output>> {
    reader: BulkArrayReader<D, S>,
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> BulkBody<D, S> {
    /// Creates a body consumer that streams array elements to `sink`.
    pub fn new(decoder: D, sink: S) -> Self {
        BulkBody {
            reader: BulkArrayReader::new(decoder, sink),
        }
    }
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> BodyConsumer for BulkBody<D, S> {
    type Output = u64;

    fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.reader.consume(chunk)
    }

    fn stream_end(&mut self) -> Result<Option<u64>, StreamError> {
        Ok(Some(self.reader.stream_end()?))
    }
}

/// Where the body bytes of the current message go.
enum Route<B> {
    /// Waiting for the message head.
    Pending(B),
    /// The head declared a JSON payload; bytes flow into the body.
    Body(B),
    /// The head declared something else; bytes are discarded.
    Drain,
}

fn declares_json(head: &MessageHead) -> bool {
    head.content_type()
        .is_none_or(|mime| mime.eq_ignore_ascii_case("application/json"))
}

/// Drives one message through a [`BodyConsumer`], with content-type
/// routing and a once-only terminal callback.
///
/// The head decides the route: a missing or `application/json` content
/// type sends the bytes into the body; anything else drains them and the
/// message completes with an absent value, so a mismatched payload is not
/// an error at this level. Every message ends in exactly one [`Outcome`]
/// delivered to the callback, whether the stream completes, fails, or is
/// cancelled — late duplicates are ignored.
///
/// # Examples
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use jsonflume::{MessageConsumer, MessageHead, Outcome, TreeBody};
///
/// let seen = Rc::new(RefCell::new(None));
/// let slot = Rc::clone(&seen);
/// let mut consumer = MessageConsumer::new(TreeBody::new(), move |outcome| {
///     *slot.borrow_mut() = Some(outcome);
/// });
///
/// let head = MessageHead::new(200).with_header("Content-Type", "application/json");
/// consumer.message_begin(head)?;
/// consumer.consume(br#"{"ok":true}"#)?;
/// consumer.stream_end()?;
///
/// assert!(matches!(
///     seen.borrow_mut().take(),
///     Some(Outcome::Completed(Some(_)))
/// ));
/// # Ok::<(), jsonflume::StreamError>(())
/// ```
pub struct MessageConsumer<B: BodyConsumer> {
    route: Route<B>,
    head: Option<MessageHead>,
    head_callback: Option<Box<dyn FnOnce(&MessageHead)>>,
    callback: Option<Box<dyn FnOnce(Outcome<B::Output>)>>,
}

impl<B: BodyConsumer> MessageConsumer<B> {
    /// Creates a consumer that feeds `body` and reports the terminal
    /// outcome to `on_result`.
    pub fn new(body: B, on_result: impl FnOnce(Outcome<B::Output>) + 'static) -> Self {
        MessageConsumer {
            route: Route::Pending(body),
            head: None,
            head_callback: None,
            callback: Some(Box::new(on_result)),
        }
    }

    /// Registers a callback invoked with the head when it arrives, before
    /// any body bytes are routed.
    #[must_use]
    pub fn on_head(mut self, on_head: impl FnOnce(&MessageHead) + 'static) -> Self {
        self.head_callback = Some(Box::new(on_head));
        self
    }

    /// The head of the current message, once it has arrived.
    #[must_use]
    pub fn head(&self) -> Option<&MessageHead> {
        self.head.as_ref()
    }

    /// Intake capacity of the routed body; `None` is unbounded.
    #[must_use]
    pub fn capacity_hint(&self) -> Option<usize> {
        match &self.route {
            Route::Body(body) => body.capacity_hint(),
            Route::Pending(_) | Route::Drain => None,
        }
    }

    /// Receives the message head and routes the body.
    ///
    /// A repeat call while a message is in flight is ignored.
    ///
    /// # Errors
    ///
    /// Propagates the body's [`stream_start`](BodyConsumer::stream_start)
    /// rejection; the message is settled as failed.
    pub fn message_begin(&mut self, head: MessageHead) -> Result<(), StreamError> {
        match mem::replace(&mut self.route, Route::Drain) {
            Route::Pending(mut body) => {
                if let Some(on_head) = self.head_callback.take() {
                    on_head(&head);
                }
                let result = if declares_json(&head) {
                    match body.stream_start(&head) {
                        Ok(()) => {
                            self.route = Route::Body(body);
                            Ok(())
                        }
                        Err(err) => {
                            self.settle(Outcome::Failed(err.clone()));
                            Err(err)
                        }
                    }
                } else {
                    tracing::debug!(
                        content_type = ?head.content_type(),
                        "payload is not JSON, draining the body"
                    );
                    Ok(())
                };
                self.head = Some(head);
                result
            }
            active => {
                self.route = active;
                Ok(())
            }
        }
    }

    /// Feeds one chunk of body bytes to the routed body.
    ///
    /// Chunks arriving before the head, or on a drained route, are
    /// discarded.
    ///
    /// # Errors
    ///
    /// A body failure settles the message as failed and is returned to
    /// the transport.
    pub fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        let result = match &mut self.route {
            Route::Body(body) => body.consume(chunk),
            Route::Pending(_) | Route::Drain => Ok(()),
        };
        if let Err(err) = &result {
            let err = err.clone();
            self.settle(Outcome::Failed(err));
        }
        result
    }

    /// Ends the message and settles its outcome.
    ///
    /// # Errors
    ///
    /// A failure while finishing the body settles the message as failed
    /// and is returned to the transport.
    pub fn stream_end(&mut self) -> Result<(), StreamError> {
        let result = match &mut self.route {
            Route::Body(body) => body.stream_end(),
            Route::Pending(_) | Route::Drain => Ok(None),
        };
        match result {
            Ok(value) => {
                self.settle(Outcome::Completed(value));
                Ok(())
            }
            Err(err) => {
                self.settle(Outcome::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Reports a transport-level failure.
    pub fn failed(&mut self, error: StreamError) {
        if let Route::Pending(body) | Route::Body(body) = &mut self.route {
            body.failed(&error);
        }
        self.settle(Outcome::Failed(error));
    }

    /// Reports that the transport abandoned the message.
    pub fn cancel(&mut self) {
        self.settle(Outcome::Cancelled);
    }

    fn settle(&mut self, outcome: Outcome<B::Output>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}
