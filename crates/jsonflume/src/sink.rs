//! The result-sink protocol.

/// Receiver for the sequence of results produced by one stream.
///
/// The protocol is strict: [`begin`](ResultSink::begin) exactly once before
/// anything else, [`accept`](ResultSink::accept) zero or more times in
/// document order, then [`end`](ResultSink::end) exactly once — even for a
/// stream that produced no values at all. `begin` and `end` have no-op
/// defaults so simple sinks only implement `accept`; any `FnMut(T)` closure
/// is already a sink.
pub trait ResultSink<T> {
    /// Announces the start of the result sequence.
    ///
    /// `size_hint` is the expected number of values when the caller knows
    /// it ahead of time, `None` otherwise.
    fn begin(&mut self, size_hint: Option<usize>) {
        let _ = size_hint;
    }

    /// Delivers the next value.
    fn accept(&mut self, value: T);

    /// Announces that no further values will arrive.
    fn end(&mut self) {}
}

impl<T, F: FnMut(T)> ResultSink<T> for F {
    fn accept(&mut self, value: T) {
        self(value);
    }
}

#[cfg(test)]
mod tests {
    use super::ResultSink;

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |v: u32| seen.push(v);
            ResultSink::begin(&mut sink, Some(2));
            sink.accept(1);
            sink.accept(2);
            ResultSink::end(&mut sink);
        }
        assert_eq!(seen, vec![1, 2]);
    }
}
