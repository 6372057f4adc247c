//! Token events reported by the incremental lexer.
//!
//! One [`TokenEvent`] is one lexical unit of a JSON document: a container
//! boundary, a field name, or a scalar value. Scalar payloads are owned by
//! the event itself; the lexer boundary copies them out of the lexer's
//! transient state exactly once, so events can be buffered and replayed
//! independently of the byte stream they came from.

/// One lexical unit of a JSON token stream.
///
/// Integer scalars are split by width: the lexer reports [`TokenEvent::Int`]
/// when the literal fits in 32 bits and [`TokenEvent::Long`] otherwise.
/// Consumers that do not care about width should match both.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenEvent {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// A field name inside an object.
    ///
    /// Always followed by the value it names — either a scalar event or a
    /// container start.
    FieldName(String),
    /// A string scalar, unescaped.
    String(String),
    /// An integer scalar that fits in 32 bits.
    Int(i32),
    /// An integer scalar wider than 32 bits.
    Long(i64),
    /// A floating-point scalar.
    Double(f64),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    Null,
    /// An opaque payload reported by a lexer extension.
    ///
    /// Standard JSON never produces this; it exists so lexers with embedded
    /// binary extensions can pass values through the pipeline unchanged.
    Embedded(Vec<u8>),
    /// Sentinel terminating every stream: no more tokens will arrive.
    EndOfStream,
}

impl TokenEvent {
    /// Whether this event opens a container (`{` or `[`).
    #[must_use]
    pub fn opens_container(&self) -> bool {
        matches!(self, TokenEvent::ObjectStart | TokenEvent::ArrayStart)
    }

    /// Whether this event closes a container (`}` or `]`).
    #[must_use]
    pub fn closes_container(&self) -> bool {
        matches!(self, TokenEvent::ObjectEnd | TokenEvent::ArrayEnd)
    }

    /// Whether this event carries a scalar value (including `null`).
    ///
    /// Field names are not scalars: they name the value that follows.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TokenEvent::String(_)
                | TokenEvent::Int(_)
                | TokenEvent::Long(_)
                | TokenEvent::Double(_)
                | TokenEvent::Boolean(_)
                | TokenEvent::Null
                | TokenEvent::Embedded(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::TokenEvent;

    #[test]
    fn container_predicates() {
        assert!(TokenEvent::ObjectStart.opens_container());
        assert!(TokenEvent::ArrayStart.opens_container());
        assert!(TokenEvent::ObjectEnd.closes_container());
        assert!(TokenEvent::ArrayEnd.closes_container());
        assert!(!TokenEvent::Null.opens_container());
        assert!(!TokenEvent::EndOfStream.closes_container());
    }

    #[test]
    fn scalar_predicate_excludes_names_and_structure() {
        assert!(TokenEvent::Int(1).is_scalar());
        assert!(TokenEvent::Null.is_scalar());
        assert!(TokenEvent::Embedded(vec![0xFF]).is_scalar());
        assert!(!TokenEvent::FieldName("a".into()).is_scalar());
        assert!(!TokenEvent::ObjectStart.is_scalar());
        assert!(!TokenEvent::EndOfStream.is_scalar());
    }
}
