use quickcheck::{Arbitrary, Gen};

use crate::value::{Map, Value};

/// A finite double; NaN and the infinities have no JSON literal and print
/// as `null`, so they cannot survive a print/lex round trip.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct JsonDouble(pub(crate) f64);

impl Arbitrary for JsonDouble {
    fn arbitrary(g: &mut Gen) -> Self {
        loop {
            let n = f64::arbitrary(g);
            if n.is_finite() {
                return JsonDouble(n);
            }
        }
    }
}

/// An `i64` strictly outside the `i32` range, so the pipeline keeps the
/// wide representation instead of narrowing it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct WideLong(pub(crate) i64);

impl Arbitrary for WideLong {
    fn arbitrary(g: &mut Gen) -> Self {
        let magnitude = i64::from(u32::arbitrary(g)) + i64::from(i32::MAX) + 2;
        WideLong(if bool::arbitrary(g) {
            magnitude
        } else {
            -magnitude
        })
    }
}

fn scalar(g: &mut Gen) -> Value {
    match usize::arbitrary(g) % 6 {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => Value::Int(i32::arbitrary(g)),
        3 => Value::Long(WideLong::arbitrary(g).0),
        4 => Value::Double(JsonDouble::arbitrary(g).0),
        _ => Value::String(String::arbitrary(g)),
    }
}

fn fields(g: &mut Gen, depth: usize) -> Map {
    let mut map = Map::new();
    for _ in 0..usize::arbitrary(g) % 4 {
        map.insert(String::arbitrary(g), node(g, depth));
    }
    map
}

fn node(g: &mut Gen, depth: usize) -> Value {
    if depth == 0 {
        return scalar(g);
    }
    match usize::arbitrary(g) % 4 {
        0 => {
            let items = usize::arbitrary(g) % 4;
            Value::Array((0..items).map(|_| node(g, depth - 1)).collect())
        }
        1 => Value::Object(fields(g, depth - 1)),
        _ => scalar(g),
    }
}

impl Arbitrary for Value {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = usize::arbitrary(g) % 3;
        node(g, depth)
    }
}

/// A value whose root is a container, as the tree path requires.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ContainerValue(pub(crate) Value);

impl Arbitrary for ContainerValue {
    fn arbitrary(g: &mut Gen) -> Self {
        ContainerValue(if bool::arbitrary(g) {
            let items = usize::arbitrary(g) % 4;
            Value::Array((0..items).map(|_| node(g, 1)).collect())
        } else {
            Value::Object(fields(g, 1))
        })
    }
}

/// A value whose root is an object.
///
/// Bulk-array elements need this shape to arrive intact: the top-level
/// filter also swallows array brackets sitting at its depth 0, so an
/// array-rooted element would be unwrapped into its items.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObjectValue(pub(crate) Value);

impl Arbitrary for ObjectValue {
    fn arbitrary(g: &mut Gen) -> Self {
        ObjectValue(Value::Object(fields(g, 1)))
    }
}
