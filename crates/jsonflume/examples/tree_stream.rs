//! Demonstrates assembling one complete JSON tree from a stream that
//! arrives in fragments.
//!
//! Where `bulk_ingest` decodes array elements one at a time, this example
//! wants the *whole* document: a configuration payload small enough to hold
//! in memory, delivered by a transport that fragments it anyway.  The tree
//! assembler sits behind the token feeder, grows the value as tokens
//! arrive, and hands the finished root back at end of stream.
//!
//! Run with
//!
//! ```bash
//! cargo run -p jsonflume --example tree_stream
//! ```

use jsonflume::{TokenFeeder, TreeAssembler, Value};

fn main() {
    // Four fragments of one document, split mid-string and mid-object.
    let fragments: [&[u8]; 4] = [
        br#"{"service":"ing"#,
        br#"est","workers":4,"#,
        br#""limits":{"burst":250,"sustained":"#,
        br#"100}}"#,
    ];

    let mut feeder: TokenFeeder<_> = TokenFeeder::new();
    feeder.initialize(TreeAssembler::with_callback(|root| {
        // Fires exactly once, at end of stream, with the finished root.
        if let Some(root) = root {
            println!("assembled: {root}");
        }
    }));

    for fragment in fragments {
        feeder.consume(fragment).expect("well-formed fragment");
    }
    let mut assembler = feeder
        .stream_end()
        .expect("well-formed document")
        .expect("a consumer was bound");

    let root = assembler.take_root().expect("document held a value");

    // Field access on the generic tree.
    assert_eq!(root.get("workers").and_then(Value::as_i64), Some(4));
    assert_eq!(
        root.get("limits")
            .and_then(|limits| limits.get("burst"))
            .and_then(Value::as_i64),
        Some(250)
    );

    // `Display` renders the tree back to JSON, fields in document order.
    assert_eq!(
        root.to_string(),
        r#"{"service":"ingest","workers":4,"limits":{"burst":250,"sustained":100}}"#
    );
}
