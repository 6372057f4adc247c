//! Demonstrates how to consume a *large* JSON array one element at a time
//! while the payload is still arriving in small, irregular chunks.
//!
//! In this scenario a fleet of temperature sensors uploads a bulk report: a
//! single JSON array holding one object per reading.  The report can be
//! arbitrarily long, so we never want the whole document in memory — only
//! the element currently being assembled.
//!
//! Each element looks roughly as follows (abridged):
//!
//! ```text
//! {
//!   "sensor":  string,
//!   "celsius": number,
//! }
//! ```
//!
//! The example below streams a *single* report but feeds it to the reader in
//! small, irregular chunks to mirror how an HTTP client delivers a body.
//! Two things happen while the payload arrives:
//!
//! 1. Every reading is decoded into a typed struct and checked the moment
//!    its closing brace arrives – **before** the rest of the report has even
//!    been received.
//! 2. A `null` element (a sensor that had nothing to say) is dropped without
//!    ever reaching the decoder, and does not count towards the total.
//!
//! Run with
//!
//! ```bash
//! cargo run -p jsonflume --example bulk_ingest
//! ```

#![allow(clippy::needless_raw_string_hashes)]

use jsonflume::{BulkArrayReader, SerdeDecoder, StreamError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Reading {
    sensor: String,
    celsius: f64,
}

fn main() -> Result<(), StreamError> {
    // A toy report streamed in eight tiny chunks.  The splits land in the
    // middle of tokens on purpose; the reader reassembles them and delivers
    // every element exactly once.  In real life this would come from the
    // network.
    let simulated_stream: [&[u8]; 8] = [
        // 0 – array start, first reading up to a split inside "celsius"
        br#"[{"sensor":"boiler-room","cel"#,
        // 1 – rest of the first reading
        br#"sius":21.5},"#,
        // 2 – a sensor that had nothing to report
        br#"null,"#,
        // 3 – second reading, split inside the sensor name
        br#"{"sensor":"cold-"#,
        // 4 – rest of the second reading
        br#"storage","celsius":-18.25},"#,
        // 5 – third reading
        br#"{"sensor":"server-rack","#,
        // 6 – its temperature, split inside the number
        br#""celsius":31."#,
        // 7 – end of the reading and of the report
        br#"0}]"#,
    ];

    // Readings that need attention, collected as they stream past.
    let mut alerts = Vec::new();

    let mut reader = BulkArrayReader::new(SerdeDecoder::<Reading>::new(), |reading: Reading| {
        println!("{}: {} °C", reading.sensor, reading.celsius);
        if reading.celsius > 30.0 {
            alerts.push(reading.sensor);
        }
    });

    for chunk in simulated_stream {
        reader.consume(chunk)?;
    }
    let total = reader.stream_end()?;

    println!("{total} readings ingested");

    // The null element was skipped, not counted.
    assert_eq!(total, 3);

    drop(reader);
    assert_eq!(alerts, ["server-rack"]);

    Ok(())
}
