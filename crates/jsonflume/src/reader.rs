//! Streaming readers: bytes in, decoded values out.

use crate::{
    buffer::{BufferAssembler, TokenBuffer},
    consumer::TokenConsumer,
    decode::BufferDecoder,
    error::StreamError,
    feeder::TokenFeeder,
    filter::TopLevelArrayFilter,
    sink::ResultSink,
    token::TokenEvent,
};

/// Options shared by [`BulkArrayReader`] and [`SequenceReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderOptions {
    /// Expected number of values, forwarded to [`ResultSink::begin`].
    ///
    /// # Default
    ///
    /// `None`: the count is not known ahead of time.
    pub size_hint: Option<usize>,
}

/// Buffer sink that decodes each emitted sub-document and forwards the
/// result, counting delivered values and holding the first decode failure
/// until the pipeline can re-raise it.
struct DecodeSink<D: BufferDecoder, S> {
    decoder: D,
    sink: S,
    count: u64,
    error: Option<StreamError>,
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> ResultSink<TokenBuffer> for DecodeSink<D, S> {
    fn begin(&mut self, size_hint: Option<usize>) {
        self.sink.begin(size_hint);
    }

    fn accept(&mut self, buffer: TokenBuffer) {
        if self.error.is_some() {
            return;
        }
        match self.decoder.decode(&buffer) {
            Ok(Some(value)) => {
                self.count += 1;
                self.sink.accept(value);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "sub-document decode failed");
                self.error = Some(err);
            }
        }
    }

    fn end(&mut self) {
        // A failed read reports through the error path; the sink protocol
        // ends only on success.
        if self.error.is_none() {
            self.sink.end();
        }
    }
}

/// The shared tail of both readers: buffer assembly plus per-buffer decode,
/// surfacing decode failures as consumer errors so they abort the feed.
struct DecodePipeline<D: BufferDecoder, S> {
    assembler: BufferAssembler<DecodeSink<D, S>>,
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> DecodePipeline<D, S> {
    fn new(decoder: D, sink: S, size_hint: Option<usize>) -> Self {
        DecodePipeline {
            assembler: BufferAssembler::with_size_hint(
                DecodeSink {
                    decoder,
                    sink,
                    count: 0,
                    error: None,
                },
                size_hint,
            ),
        }
    }

    fn count(&self) -> u64 {
        self.assembler.sink().count
    }
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> TokenConsumer for DecodePipeline<D, S> {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        self.assembler.on_token(event)?;
        match &self.assembler.sink().error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Reads one top-level JSON array as a stream of independently decoded
/// elements.
///
/// The orchestration behind "feed bytes in, get typed values out":
/// [`TokenFeeder`] → [`TopLevelArrayFilter`] → [`BufferAssembler`] →
/// per-buffer decode → the caller's [`ResultSink`]. Memory use is bounded
/// by one element at a time, so an array of millions of elements streams in
/// constant space. Input that is not an array passes through the filter
/// untouched and is read as a sequence of top-level values.
///
/// Decode failures abort the read: the failing call returns the error, no
/// further values are delivered, and [`ResultSink::end`] is not called.
/// Values delivered before the failure stay delivered.
pub struct BulkArrayReader<D: BufferDecoder, S: ResultSink<D::Output>> {
    feeder: TokenFeeder<TopLevelArrayFilter<DecodePipeline<D, S>>>,
    done: Option<u64>,
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> BulkArrayReader<D, S> {
    /// Wires the pipeline with default options.
    pub fn new(decoder: D, sink: S) -> Self {
        BulkArrayReader::with_options(decoder, sink, ReaderOptions::default())
    }

    /// Wires the pipeline with explicit options.
    pub fn with_options(decoder: D, sink: S, options: ReaderOptions) -> Self {
        let pipeline = DecodePipeline::new(decoder, sink, options.size_hint);
        let mut feeder = TokenFeeder::new();
        feeder.initialize(TopLevelArrayFilter::new(pipeline));
        BulkArrayReader { feeder, done: None }
    }

    /// Feeds one byte chunk; decoded values flow to the sink before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Lexical and decode failures are terminal; see [`StreamError`].
    pub fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.feeder.consume(chunk)
    }

    /// Ends the stream and returns the total number of values delivered to
    /// the sink.
    ///
    /// # Errors
    ///
    /// A truncated document or a failing decode of the final value
    /// surfaces here.
    pub fn stream_end(&mut self) -> Result<u64, StreamError> {
        if let Some(count) = self.done {
            return Ok(count);
        }
        match self.feeder.stream_end()? {
            Some(filter) => {
                let count = filter.into_inner().count();
                tracing::debug!(values = count, "bulk array read complete");
                self.done = Some(count);
                Ok(count)
            }
            None => Ok(0),
        }
    }

    /// Number of values delivered so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.done
            .or_else(|| self.feeder.consumer().map(|f| f.inner().count()))
            .unwrap_or(0)
    }
}

/// Reads a stream of concatenated top-level JSON documents, decoding each
/// one independently.
///
/// Identical to [`BulkArrayReader`] but without the array-unwrapping
/// filter: `{...} {...} {...}` yields three values. A top-level array here
/// is one value, not many.
pub struct SequenceReader<D: BufferDecoder, S: ResultSink<D::Output>> {
    feeder: TokenFeeder<DecodePipeline<D, S>>,
    done: Option<u64>,
}

impl<D: BufferDecoder, S: ResultSink<D::Output>> SequenceReader<D, S> {
    /// Wires the pipeline with default options.
    pub fn new(decoder: D, sink: S) -> Self {
        SequenceReader::with_options(decoder, sink, ReaderOptions::default())
    }

    /// Wires the pipeline with explicit options.
    pub fn with_options(decoder: D, sink: S, options: ReaderOptions) -> Self {
        let mut feeder = TokenFeeder::new();
        feeder.initialize(DecodePipeline::new(decoder, sink, options.size_hint));
        SequenceReader { feeder, done: None }
    }

    /// Feeds one byte chunk; decoded values flow to the sink before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Lexical and decode failures are terminal; see [`StreamError`].
    pub fn consume(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.feeder.consume(chunk)
    }

    /// Ends the stream and returns the total number of values delivered to
    /// the sink.
    ///
    /// # Errors
    ///
    /// A truncated document or a failing decode of the final value
    /// surfaces here.
    pub fn stream_end(&mut self) -> Result<u64, StreamError> {
        if let Some(count) = self.done {
            return Ok(count);
        }
        match self.feeder.stream_end()? {
            Some(pipeline) => {
                let count = pipeline.count();
                tracing::debug!(values = count, "sequence read complete");
                self.done = Some(count);
                Ok(count)
            }
            None => Ok(0),
        }
    }

    /// Number of values delivered so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.done
            .or_else(|| self.feeder.consumer().map(DecodePipeline::count))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{BulkArrayReader, ReaderOptions, SequenceReader};
    use crate::{
        decode::{SerdeDecoder, ValueDecoder},
        error::{DecodeError, StreamError},
        tests::support::SharedSink,
        value::Value,
    };

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        id: u32,
    }

    #[test]
    fn reads_each_array_element_independently() {
        let mut ids = Vec::new();
        let mut reader =
            BulkArrayReader::new(SerdeDecoder::<Record>::new(), |r: Record| ids.push(r.id));
        reader.consume(br#"[{"id":0},{"id":1},{"id":2}]"#).unwrap();
        let count = reader.stream_end().unwrap();
        drop(reader);

        assert_eq!(count, 3);
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn sink_protocol_holds_across_chunk_splits() {
        let sink = SharedSink::<Record>::default();
        let mut reader = BulkArrayReader::new(SerdeDecoder::<Record>::new(), sink.clone());
        reader.consume(br#"[{"id":0},{"id":1}"#).unwrap();
        reader.consume(br#",{"id":2}]"#).unwrap();
        reader.stream_end().unwrap();

        let log = sink.log();
        assert_eq!(log.begins, vec![None]);
        assert_eq!(log.ends, 1);
        assert_eq!(
            log.values.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn empty_input_counts_zero() {
        let sink = SharedSink::<Record>::default();
        let mut reader = BulkArrayReader::new(SerdeDecoder::<Record>::new(), sink.clone());
        assert_eq!(reader.stream_end().unwrap(), 0);
        // Repeat calls stay settled.
        assert_eq!(reader.stream_end().unwrap(), 0);

        let log = sink.log();
        assert_eq!(log.begins, vec![None]);
        assert_eq!(log.ends, 1);
        assert!(log.values.is_empty());
    }

    #[test]
    fn decode_failure_aborts_the_read() {
        let sink = SharedSink::<Record>::default();
        let mut reader = BulkArrayReader::new(SerdeDecoder::<Record>::new(), sink.clone());
        let err = reader.consume(br#"[{"id":0},{"id":"oops"}]"#).unwrap_err();
        assert!(matches!(err, StreamError::Decode(DecodeError::Custom(_))));
        assert_eq!(reader.count(), 1);

        let log = sink.log();
        assert_eq!(log.values.len(), 1);
        assert_eq!(log.ends, 0, "a failed read must not end the sink");
    }

    #[test]
    fn null_elements_are_skipped_not_counted() {
        let mut reader = BulkArrayReader::new(SerdeDecoder::<Record>::new(), |_: Record| {});
        reader.consume(br#"[null,{"id":1},null]"#).unwrap();
        assert_eq!(reader.stream_end().unwrap(), 1);
    }

    #[test]
    fn scalar_array_elements_decode_individually() {
        let sink = SharedSink::<Value>::default();
        let mut reader = BulkArrayReader::new(ValueDecoder, sink.clone());
        reader.consume(br#"[1,"two",true]"#).unwrap();
        assert_eq!(reader.stream_end().unwrap(), 3);
        assert_eq!(
            sink.log().values,
            vec![Value::Int(1), Value::from("two"), Value::Bool(true)]
        );
    }

    #[test]
    fn non_array_input_reads_as_a_sequence() {
        let mut reader = BulkArrayReader::new(ValueDecoder, |_: Value| {});
        reader.consume(br#"{"id":5}"#).unwrap();
        assert_eq!(reader.stream_end().unwrap(), 1);
    }

    #[test]
    fn sequence_reader_decodes_concatenated_documents() {
        let mut ids = Vec::new();
        let mut reader =
            SequenceReader::new(SerdeDecoder::<Record>::new(), |r: Record| ids.push(r.id));
        reader.consume(br#"{"id":0} {"id":1}"#).unwrap();
        reader.consume(br#" {"id":2}"#).unwrap();
        assert_eq!(reader.stream_end().unwrap(), 3);
        drop(reader);
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn sequence_reader_treats_an_array_as_one_value() {
        let mut reader = SequenceReader::new(ValueDecoder, |_: Value| {});
        reader.consume(br"[1,2,3]").unwrap();
        assert_eq!(reader.stream_end().unwrap(), 1);
    }

    #[test]
    fn size_hint_flows_to_the_sink() {
        let sink = SharedSink::<Value>::default();
        let mut reader = BulkArrayReader::with_options(
            ValueDecoder,
            sink.clone(),
            ReaderOptions {
                size_hint: Some(40),
            },
        );
        reader.consume(b"[]").unwrap();
        reader.stream_end().unwrap();
        assert_eq!(sink.log().begins, vec![Some(40)]);
    }
}
