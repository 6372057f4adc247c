//! Shared fixtures for the test suites.

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use crate::{consumer::TokenConsumer, error::StreamError, sink::ResultSink, token::TokenEvent};

/// Records every token it is handed, in order.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Recorder(pub(crate) Vec<TokenEvent>);

impl TokenConsumer for Recorder {
    fn on_token(&mut self, event: TokenEvent) -> Result<(), StreamError> {
        self.0.push(event);
        Ok(())
    }
}

/// A by-value sink that keeps a full log of the protocol calls it saw.
///
/// Move it into the component under test and recover it afterwards (via
/// `into_sink` or an accessor) to make assertions.
#[derive(Debug, PartialEq)]
pub(crate) struct CollectingSink<T> {
    pub(crate) begins: Vec<Option<usize>>,
    pub(crate) values: Vec<T>,
    pub(crate) ends: usize,
}

impl<T> Default for CollectingSink<T> {
    fn default() -> Self {
        CollectingSink {
            begins: Vec::new(),
            values: Vec::new(),
            ends: 0,
        }
    }
}

impl<T> ResultSink<T> for CollectingSink<T> {
    fn begin(&mut self, size_hint: Option<usize>) {
        self.begins.push(size_hint);
    }

    fn accept(&mut self, value: T) {
        self.values.push(value);
    }

    fn end(&mut self) {
        self.ends += 1;
    }
}

/// The protocol log behind a [`SharedSink`].
#[derive(Debug)]
pub(crate) struct SinkLog<T> {
    pub(crate) begins: Vec<Option<usize>>,
    pub(crate) values: Vec<T>,
    pub(crate) ends: usize,
}

impl<T> Default for SinkLog<T> {
    fn default() -> Self {
        SinkLog {
            begins: Vec::new(),
            values: Vec::new(),
            ends: 0,
        }
    }
}

/// A sink whose log stays inspectable from outside the component that owns
/// the sink.
///
/// Cloning shares the log, so one handle goes into the pipeline while the
/// test keeps the other.
#[derive(Debug)]
pub(crate) struct SharedSink<T>(Rc<RefCell<SinkLog<T>>>);

impl<T> Default for SharedSink<T> {
    fn default() -> Self {
        SharedSink(Rc::default())
    }
}

impl<T> Clone for SharedSink<T> {
    fn clone(&self) -> Self {
        SharedSink(Rc::clone(&self.0))
    }
}

impl<T> SharedSink<T> {
    pub(crate) fn log(&self) -> Ref<'_, SinkLog<T>> {
        self.0.borrow()
    }
}

impl<T> ResultSink<T> for SharedSink<T> {
    fn begin(&mut self, size_hint: Option<usize>) {
        self.0.borrow_mut().begins.push(size_hint);
    }

    fn accept(&mut self, value: T) {
        self.0.borrow_mut().values.push(value);
    }

    fn end(&mut self) {
        self.0.borrow_mut().ends += 1;
    }
}
