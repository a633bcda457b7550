//! Event sink that keeps the UI snapshot current.
//!
//! Records every event into the gate's shared snapshot (read by
//! [`GateHandle`](crate::app::handle::GateHandle)), then forwards it to
//! the wrapped sink.

use std::sync::Arc;

use crate::app::events::AppEvent;
use crate::app::handle::GateShared;
use crate::app::ports::EventSink;

pub struct SnapshotSink<S: EventSink> {
    shared: Arc<GateShared>,
    inner: S,
}

impl<S: EventSink> SnapshotSink<S> {
    pub fn new(shared: Arc<GateShared>, inner: S) -> Self {
        Self { shared, inner }
    }
}

impl<S: EventSink> EventSink for SnapshotSink<S> {
    fn emit(&mut self, event: &AppEvent) {
        self.shared.record(event);
        self.inner.emit(event);
    }
}
