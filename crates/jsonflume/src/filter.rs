//! Unwrapping a top-level array into independent values.

use crate::{consumer::TokenConsumer, error::StreamError, token::TokenEvent};

/// A [`TokenConsumer`] decorator that strips top-level array brackets.
///
/// Array tokens arriving at the filter's own depth 0 are swallowed and do
/// not change the depth; everything else updates the depth the usual way
/// and is forwarded unchanged. Wrapped around a
/// [`BufferAssembler`](crate::BufferAssembler), this turns "one JSON array
/// of N elements" into "N independent top-level values" — one emitted
/// buffer per element, which is what bounds memory for arbitrarily large
/// arrays.
///
/// The depth-0 rule applies to every array bracket that reaches it, so an
/// element that is itself an array is unwrapped too: its brackets also sit
/// at depth 0 once the outer pair is gone. Element-level identity holds
/// for object and scalar elements; arrays nested anywhere below depth 0
/// are untouched.
///
/// The depth counter tracks only the unwrapped content, so it is
/// independent of any depth the wrapped consumer keeps. Streams that do not
/// start with an array pass through untouched.
pub struct TopLevelArrayFilter<C> {
    inner: C,
    depth: u32,
}

impl<C: TokenConsumer> TopLevelArrayFilter<C> {
    /// Wraps `inner`.
    pub fn new(inner: C) -> Self {
        TopLevelArrayFilter { inner, depth: 0 }
    }

    /// Shared access to the wrapped consumer.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwraps the filter, returning the wrapped consumer.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: TokenConsumer> TokenConsumer for TopLevelArrayFilter<C> {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        if self.depth == 0
            && matches!(event, TokenEvent::ArrayStart | TokenEvent::ArrayEnd)
        {
            return Ok(());
        }
        if event.opens_container() {
            self.depth += 1;
        } else if event.closes_container() && self.depth > 0 {
            // A close at depth 0 here is malformed; it is forwarded as-is
            // for the wrapped consumer to reject.
            self.depth -= 1;
        }
        self.inner.on_token(event)
    }
}

#[cfg(test)]
mod tests {
    use super::TopLevelArrayFilter;
    use crate::{
        buffer::BufferAssembler, consumer::TokenConsumer, tests::support::CollectingSink,
        tests::support::Recorder, token::TokenEvent,
    };

    fn feed<C: TokenConsumer>(filter: &mut TopLevelArrayFilter<C>, tokens: Vec<TokenEvent>) {
        for token in tokens {
            filter.on_token(token).unwrap();
        }
    }

    #[test]
    fn array_brackets_at_depth_zero_are_swallowed() {
        // Array-typed elements sit at depth 0 once the outer pair is gone,
        // so their brackets are unwrapped as well.
        let mut filter = TopLevelArrayFilter::new(Recorder::default());
        feed(
            &mut filter,
            vec![
                TokenEvent::ArrayStart,
                TokenEvent::ArrayStart,
                TokenEvent::Int(1),
                TokenEvent::ArrayEnd,
                TokenEvent::ArrayStart,
                TokenEvent::Int(2),
                TokenEvent::ArrayEnd,
                TokenEvent::ArrayEnd,
                TokenEvent::EndOfStream,
            ],
        );
        assert_eq!(
            filter.into_inner().0,
            vec![
                TokenEvent::Int(1),
                TokenEvent::Int(2),
                TokenEvent::EndOfStream,
            ]
        );
    }

    #[test]
    fn arrays_below_the_top_level_are_preserved() {
        let mut filter = TopLevelArrayFilter::new(Recorder::default());
        feed(
            &mut filter,
            vec![
                TokenEvent::ArrayStart,
                TokenEvent::ObjectStart,
                TokenEvent::FieldName("tags".into()),
                TokenEvent::ArrayStart,
                TokenEvent::Int(1),
                TokenEvent::ArrayEnd,
                TokenEvent::ObjectEnd,
                TokenEvent::ArrayEnd,
                TokenEvent::EndOfStream,
            ],
        );
        assert_eq!(
            filter.into_inner().0,
            vec![
                TokenEvent::ObjectStart,
                TokenEvent::FieldName("tags".into()),
                TokenEvent::ArrayStart,
                TokenEvent::Int(1),
                TokenEvent::ArrayEnd,
                TokenEvent::ObjectEnd,
                TokenEvent::EndOfStream,
            ]
        );
    }

    #[test]
    fn non_array_streams_pass_through_unchanged() {
        let tokens = vec![
            TokenEvent::ObjectStart,
            TokenEvent::FieldName("a".into()),
            TokenEvent::Int(1),
            TokenEvent::ObjectEnd,
            TokenEvent::EndOfStream,
        ];
        let mut filter = TopLevelArrayFilter::new(Recorder::default());
        feed(&mut filter, tokens.clone());
        assert_eq!(filter.into_inner().0, tokens);
    }

    #[test]
    fn array_elements_become_independent_buffers() {
        let mut filter = TopLevelArrayFilter::new(BufferAssembler::new(CollectingSink::default()));
        feed(
            &mut filter,
            vec![
                TokenEvent::ArrayStart,
                TokenEvent::ObjectStart,
                TokenEvent::FieldName("id".into()),
                TokenEvent::Int(0),
                TokenEvent::ObjectEnd,
                TokenEvent::ObjectStart,
                TokenEvent::FieldName("id".into()),
                TokenEvent::Int(1),
                TokenEvent::ObjectEnd,
                TokenEvent::ArrayEnd,
                TokenEvent::EndOfStream,
            ],
        );
        let sink = filter.into_inner().into_sink();
        assert_eq!(sink.begins, vec![None]);
        assert_eq!(sink.values.len(), 2);
        assert_eq!(sink.ends, 1);
    }

    #[test]
    fn empty_top_level_array_produces_no_buffers() {
        let mut filter = TopLevelArrayFilter::new(BufferAssembler::new(CollectingSink::default()));
        feed(
            &mut filter,
            vec![
                TokenEvent::ArrayStart,
                TokenEvent::ArrayEnd,
                TokenEvent::EndOfStream,
            ],
        );
        let sink = filter.into_inner().into_sink();
        assert_eq!(sink.begins, vec![None]);
        assert!(sink.values.is_empty());
        assert_eq!(sink.ends, 1);
    }
}
