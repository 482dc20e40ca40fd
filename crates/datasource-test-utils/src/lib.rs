//! Test utilities and fixtures for datasource development.
//!
//! Provides recording subscribers ([`Recorder`], [`ValueRecorder`]), a
//! canned player tree ([`PlayerFixture`]) and [`init_test_logging`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::PlayerFixture;

use std::cell::RefCell;
use std::rc::Rc;

use datasource::prelude::*;

/// Install a `tracing` subscriber honoring `RUST_LOG` that writes through
/// the test harness. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A subscriber that records every event it receives.
///
/// Clone the [`callback`](Recorder::callback) into as many bindings as
/// needed; all of them share this recorder's log.
pub struct Recorder {
    events: Rc<RefCell<Vec<ChangeEvent>>>,
    callback: Callback,
}

impl Recorder {
    pub fn new() -> Self {
        let events: Rc<RefCell<Vec<ChangeEvent>>> = Rc::default();
        let log = Rc::clone(&events);
        let callback: Callback = Rc::new(move |_: &mut Store, event: &ChangeEvent| {
            log.borrow_mut().push(*event);
        });
        Self { events, callback }
    }

    /// The recording callback. Every clone is the same subscriber.
    pub fn callback(&self) -> Callback {
        Rc::clone(&self.callback)
    }

    /// Everything received so far.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.borrow().clone()
    }

    /// Take everything received so far.
    pub fn take(&self) -> Vec<ChangeEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Number of events of `kind` received so far.
    pub fn count(&self, kind: ChangeEventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber that records each event together with the node's value
/// read as `T` at delivery time.
pub struct ValueRecorder<T> {
    seen: Rc<RefCell<Vec<(ChangeEvent, T)>>>,
    callback: Callback,
}

impl<T: CellValue + 'static> ValueRecorder<T> {
    pub fn new() -> Self {
        let seen: Rc<RefCell<Vec<(ChangeEvent, T)>>> = Rc::default();
        let log = Rc::clone(&seen);
        let callback: Callback = Rc::new(move |store: &mut Store, event: &ChangeEvent| {
            let value = store.get::<T>(event.handle);
            log.borrow_mut().push((*event, value));
        });
        Self { seen, callback }
    }

    /// The recording callback.
    pub fn callback(&self) -> Callback {
        Rc::clone(&self.callback)
    }

    /// Everything received so far.
    pub fn seen(&self) -> Vec<(ChangeEvent, T)> {
        self.seen.borrow().clone()
    }
}

impl<T: CellValue + 'static> Default for ValueRecorder<T> {
    fn default() -> Self {
        Self::new()
    }
}
