//! Assembling token streams into generic value trees.

use crate::{
    consumer::TokenConsumer,
    error::{StreamError, StructuralError},
    token::TokenEvent,
    value::{Array, Map, Value},
};

enum Container {
    Object(Map),
    Array(Array),
}

impl Container {
    fn into_value(self) -> Value {
        match self {
            Container::Object(fields) => Value::Object(fields),
            Container::Array(items) => Value::Array(items),
        }
    }
}

/// One open container, plus the slot it will occupy in its parent when it
/// closes: a field name when the parent is an object, `None` when the
/// parent is an array (append) or the container is the root.
struct Frame {
    slot: Option<String>,
    container: Container,
}

/// A [`TokenConsumer`] that builds one generic [`Value`] tree per stream.
///
/// Containers live on an explicit owned stack while open, so nesting depth
/// is bounded by memory rather than call-stack depth; each container
/// attaches to its parent the moment it closes. The first root to complete
/// is retained and stays addressable after the stack empties — tokens of
/// any later document in the same stream are assembled and discarded.
///
/// A stream that ends before any container completes exposes no root. Bare
/// scalar streams are rejected as structural errors: a scalar token has no
/// container to attach to. Callers who want scalar top-level values use the
/// buffering pipeline instead.
#[derive(Default)]
pub struct TreeAssembler {
    stack: Vec<Frame>,
    pending_name: Option<String>,
    root: Option<Value>,
    finished: bool,
    on_complete: Option<Box<dyn FnOnce(Option<&Value>)>>,
}

impl TreeAssembler {
    /// Creates an assembler with no completion callback.
    #[must_use]
    pub fn new() -> Self {
        TreeAssembler::default()
    }

    /// Creates an assembler that runs `callback` exactly once, when the
    /// stream's [`TokenEvent::EndOfStream`] sentinel arrives, with the
    /// completed root (or `None` for a stream that produced no tree).
    #[must_use]
    pub fn with_callback(callback: impl FnOnce(Option<&Value>) + 'static) -> Self {
        TreeAssembler {
            on_complete: Some(Box::new(callback)),
            ..TreeAssembler::default()
        }
    }

    /// The completed root, if one has been assembled.
    #[must_use]
    pub fn root(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    /// Takes ownership of the completed root, leaving the assembler empty.
    pub fn take_root(&mut self) -> Option<Value> {
        self.root.take()
    }

    /// Whether the end-of-stream sentinel has arrived.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn open(&mut self, container: Container) -> Result<(), StructuralError> {
        let slot = self.pending_name.take();
        if slot.is_none()
            && matches!(
                self.stack.last(),
                Some(Frame {
                    container: Container::Object(_),
                    ..
                })
            )
        {
            return Err(StructuralError::ValueWithoutName);
        }
        self.stack.push(Frame { slot, container });
        Ok(())
    }

    fn close(&mut self, want_object: bool) -> Result<(), StructuralError> {
        if self.pending_name.is_some() {
            return Err(StructuralError::DanglingFieldName);
        }
        let Some(frame) = self.stack.pop() else {
            return Err(StructuralError::UnmatchedClose);
        };
        if matches!(frame.container, Container::Object(_)) != want_object {
            return Err(StructuralError::MismatchedClose);
        }
        let value = frame.container.into_value();
        match (self.stack.last_mut(), frame.slot) {
            (
                Some(Frame {
                    container: Container::Object(fields),
                    ..
                }),
                Some(name),
            ) => {
                fields.insert(name, value);
            }
            (
                Some(Frame {
                    container: Container::Object(_),
                    ..
                }),
                None,
            ) => return Err(StructuralError::ValueWithoutName),
            (
                Some(Frame {
                    container: Container::Array(items),
                    ..
                }),
                _,
            ) => items.push(value),
            (None, _) => {
                if self.root.is_none() {
                    self.root = Some(value);
                }
            }
        }
        Ok(())
    }

    fn name(&mut self, name: String) -> Result<(), StructuralError> {
        match self.stack.last() {
            Some(Frame {
                container: Container::Object(_),
                ..
            }) => {
                self.pending_name = Some(name);
                Ok(())
            }
            _ => Err(StructuralError::NameOutsideObject),
        }
    }

    fn attach(&mut self, value: Value) -> Result<(), StructuralError> {
        match self.stack.last_mut() {
            Some(Frame {
                container: Container::Object(fields),
                ..
            }) => match self.pending_name.take() {
                Some(name) => {
                    fields.insert(name, value);
                    Ok(())
                }
                None => Err(StructuralError::ValueWithoutName),
            },
            Some(Frame {
                container: Container::Array(items),
                ..
            }) => {
                items.push(value);
                Ok(())
            }
            None => Err(StructuralError::ValueOutsideContainer),
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(callback) = self.on_complete.take() {
            callback(self.root.as_ref());
        }
    }
}

impl TokenConsumer for TreeAssembler {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        match event {
            TokenEvent::ObjectStart => self.open(Container::Object(Map::new()))?,
            TokenEvent::ArrayStart => self.open(Container::Array(Array::new()))?,
            TokenEvent::ObjectEnd => self.close(true)?,
            TokenEvent::ArrayEnd => self.close(false)?,
            TokenEvent::FieldName(name) => self.name(name)?,
            TokenEvent::String(s) => self.attach(Value::String(s))?,
            TokenEvent::Int(n) => self.attach(Value::Int(n))?,
            TokenEvent::Long(n) => self.attach(Value::Long(n))?,
            TokenEvent::Double(n) => self.attach(Value::Double(n))?,
            TokenEvent::Boolean(b) => self.attach(Value::Bool(b))?,
            TokenEvent::Null => self.attach(Value::Null)?,
            TokenEvent::Embedded(bytes) => self.attach(Value::Embedded(bytes))?,
            TokenEvent::EndOfStream => self.finish(),
        }
        Ok(())
    }
}
