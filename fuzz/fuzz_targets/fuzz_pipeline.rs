#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use jsonflume::{
    BulkArrayReader, MessageConsumer, MessageHead, ResultSink, SequenceReader, TokenFeeder,
    TreeAssembler, TreeBody, Value, ValueDecoder,
};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde_json::{Map, Number, Value as JsonValue};

// Input layout: one route byte, four split-seed bytes, then the document.
const HEADER: usize = 5;

// RFC 8259 insignificant whitespace; the lexer accepts nothing wider.
const WS: &[u8] = b" \t\n\r";

/// Custom mutator. Every tenth round the input is replaced wholesale with a
/// fresh header plus a run of whitespace-separated JSON documents, keeping
/// the corpus supplied with well-formed streams that reach the structural
/// paths; other rounds fall through to the stock byte mutator.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size >= HEADER && !seed.is_multiple_of(10) {
        return fuzzer_mutate(data, size, max_size);
    }

    let mut rng = SmallRng::seed_from_u64(u64::from(seed));
    let cap = max_size.min(size.max(64));

    let mut out = Vec::with_capacity(cap);
    out.push(rng.random::<u8>() & 0x07); // route bits
    out.extend_from_slice(&rng.random::<u32>().to_le_bytes());
    while out.len() < cap {
        push_whitespace(&mut out, &mut rng, cap);
        push_document(&mut out, &mut rng, cap);
        push_whitespace(&mut out, &mut rng, cap);
    }
    out.truncate(max_size);

    data[..out.len()].copy_from_slice(&out);
    out.len()
}

fn push_whitespace(out: &mut Vec<u8>, rng: &mut SmallRng, cap: usize) {
    for _ in 0..rng.random_range(1..=4usize) {
        if out.len() >= cap {
            return;
        }
        out.push(WS[rng.random_range(0..WS.len())]);
    }
}

/// Serializes one generated document into `out`, truncating at the cap;
/// a truncated tail is exactly the malformed input the error paths want.
fn push_document(out: &mut Vec<u8>, rng: &mut SmallRng, cap: usize) {
    let room = cap.saturating_sub(out.len());
    if room == 0 {
        return;
    }
    let entropy: Vec<u8> = (0..rng.random_range(8..=256usize))
        .map(|_| rng.random())
        .collect();
    if let Ok(doc) = SeedValue::arbitrary(&mut Unstructured::new(&entropy))
        && let Ok(bytes) = serde_json::to_vec(&doc.0)
    {
        let take = bytes.len().min(room);
        out.extend_from_slice(&bytes[..take]);
    }
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// One JSON document drawn from unstructured bytes.
#[derive(Debug)]
struct SeedValue(JsonValue);

impl<'a> Arbitrary<'a> for SeedValue {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(8)? {
            0 => JsonValue::Null,
            1 => JsonValue::Bool(u.arbitrary()?),
            // Both integer widths, so the narrow/wide token split is hit.
            2 => JsonValue::Number(Number::from(u.arbitrary::<i32>()?)),
            3 => JsonValue::Number(Number::from(u.arbitrary::<i64>()?)),
            4 => {
                let n = f64::from(u.arbitrary::<i32>()?) / 16.0;
                JsonValue::Number(Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?)
            }
            5 => JsonValue::String(u.arbitrary()?),
            6 => {
                let items: Vec<SeedValue> = u.arbitrary()?;
                JsonValue::Array(items.into_iter().map(|item| item.0).collect())
            }
            _ => {
                let fields: Vec<(String, SeedValue)> = u.arbitrary()?;
                JsonValue::Object(Map::from_iter(
                    fields.into_iter().map(|(name, field)| (name, field.0)),
                ))
            }
        };
        Ok(SeedValue(value))
    }
}

/// Panics when the begin/accept*/end contract is broken, which is the
/// invariant the reader routes are checked against.
#[derive(Default)]
struct OrderedSink {
    begun: bool,
    ended: bool,
}

impl ResultSink<Value> for OrderedSink {
    fn begin(&mut self, _size_hint: Option<usize>) {
        assert!(!self.begun, "begin delivered twice");
        self.begun = true;
    }

    fn accept(&mut self, _value: Value) {
        assert!(self.begun, "accept before begin");
        assert!(!self.ended, "accept after end");
    }

    fn end(&mut self) {
        assert!(self.begun, "end before begin");
        assert!(!self.ended, "end delivered twice");
        self.ended = true;
    }
}

fn pipeline(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u64::from(u32::from_le_bytes(data[1..5].try_into().unwrap()));
    let data = &data[HEADER..];

    if data.is_empty() {
        return;
    }

    let chunks = chunked(data, split_seed);

    // Low two bits pick the consumer stack; malformed input must surface
    // as an Err on every route, never as a panic.
    match flags & 3 {
        0 => {
            let mut feeder: TokenFeeder<TreeAssembler> = TokenFeeder::new();
            feeder.initialize(TreeAssembler::new());
            for chunk in &chunks {
                if feeder.consume(chunk).is_err() {
                    return;
                }
            }
            if let Ok(Some(mut assembler)) = feeder.stream_end() {
                let _ = assembler.take_root();
            }
        }
        1 => {
            let mut reader = BulkArrayReader::new(ValueDecoder, OrderedSink::default());
            for chunk in &chunks {
                if reader.consume(chunk).is_err() {
                    return;
                }
            }
            let _ = reader.stream_end();
        }
        2 => {
            let mut reader = SequenceReader::new(ValueDecoder, OrderedSink::default());
            for chunk in &chunks {
                if reader.consume(chunk).is_err() {
                    return;
                }
            }
            let _ = reader.stream_end();
        }
        _ => {
            let declared = if flags & 4 == 0 {
                "application/json"
            } else {
                "text/plain" // takes the drain route
            };
            let mut consumer = MessageConsumer::new(TreeBody::new(), |_| {});
            let head = MessageHead::new(200).with_header("Content-Type", declared);
            if consumer.message_begin(head).is_err() {
                return;
            }
            for chunk in &chunks {
                if consumer.consume(chunk).is_err() {
                    return;
                }
            }
            let _ = consumer.stream_end();
        }
    }
}

fuzz_target!(|data: &[u8]| pipeline(data));

/// Splits `data` into chunks of at least one byte, sizes drawn from a
/// rolling congruential step of `seed` so consecutive chunks differ.
/// Splits land anywhere, including inside multi-byte UTF-8 sequences and
/// numeric literals; the lexer has to reassemble those itself.
fn chunked(data: &[u8], seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut rest = data;
    let mut roll = seed | 1;
    while !rest.is_empty() {
        roll = roll
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let take = (roll as usize % rest.len()) + 1;
        let (head, tail) = rest.split_at(take);
        chunks.push(head);
        rest = tail;
    }
    chunks
}
