//! Bounded before/after log of resource changes, for debugging only.
//!
//! The buffer is owned by whoever drives the rules (a CLI run, a daemon, a
//! test) and passed in where needed. Nothing in the rules reads it back.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;
use tracing::debug;

use crate::config::TraceConfig;
use crate::diff::Diff;
use crate::state::ResourceSnapshot;

pub const TRACE_CAPACITY: usize = 200;

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u64,
    pub day_index: u32,
    pub source: String,
    pub delta: Diff,
    pub before: ResourceSnapshot,
    pub after: ResourceSnapshot,
    pub meta: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct ResourceTrace {
    enabled: bool,
    events: VecDeque<TraceEvent>,
}

impl Default for ResourceTrace {
    fn default() -> Self {
        Self::new(TraceConfig::default())
    }
}

impl ResourceTrace {
    /// A buffer holding at most [`TRACE_CAPACITY`] events.
    pub fn new(config: TraceConfig) -> Self {
        Self {
            enabled: config.enabled,
            events: VecDeque::with_capacity(TRACE_CAPACITY),
        }
    }

    pub fn from_env() -> Self {
        Self::new(TraceConfig::from_env())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an event stamped with the wall clock. Returns whether it was kept.
    pub fn record(
        &mut self,
        day_index: u32,
        source: &str,
        delta: &Diff,
        before: ResourceSnapshot,
        after: ResourceSnapshot,
        meta: Option<Value>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        self.push(TraceEvent {
            timestamp_ms,
            day_index,
            source: source.to_string(),
            delta: delta.clone(),
            before,
            after,
            meta,
        })
    }

    /// Append a fully built event, dropping the oldest entry when full.
    pub fn push(&mut self, event: TraceEvent) -> bool {
        if !self.enabled {
            return false;
        }
        if self.events.len() == TRACE_CAPACITY {
            self.events.pop_front();
        }
        debug!(source = %event.source, day = event.day_index, "resource trace event");
        self.events.push_back(event);
        true
    }

    /// Copy of the buffered events, oldest first.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&TraceEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every buffered event, oldest first, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<TraceEvent> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceKey;

    fn event(day_index: u32) -> TraceEvent {
        TraceEvent {
            timestamp_ms: 0,
            day_index,
            source: "test".into(),
            delta: Diff::default(),
            before: ResourceSnapshot::new(),
            after: ResourceSnapshot::new(),
            meta: None,
        }
    }

    #[test]
    fn disabled_trace_records_nothing() {
        let mut trace = ResourceTrace::default();
        assert!(!trace.push(event(1)));
        assert!(!trace.record(1, "x", &Diff::default(), ResourceSnapshot::new(), ResourceSnapshot::new(), None));
        assert!(trace.is_empty());
    }

    #[test]
    fn oldest_entries_drop_first() {
        let mut trace = ResourceTrace::new(TraceConfig::enabled());
        for day in 0..(TRACE_CAPACITY as u32 + 5) {
            trace.push(event(day));
        }
        assert_eq!(trace.len(), TRACE_CAPACITY);
        let events = trace.events();
        assert_eq!(events.first().map(|e| e.day_index), Some(5));
        assert_eq!(
            trace.latest().map(|e| e.day_index),
            Some(TRACE_CAPACITY as u32 + 4)
        );
    }

    #[test]
    fn record_never_exceeds_capacity() {
        let mut trace = ResourceTrace::new(TraceConfig::enabled());
        for day in 0..250 {
            let kept = trace.record(
                day,
                "allocation",
                &Diff::default(),
                ResourceSnapshot::new(),
                ResourceSnapshot::new(),
                None,
            );
            assert!(kept);
            assert!(trace.len() <= TRACE_CAPACITY);
        }
        assert_eq!(trace.len(), TRACE_CAPACITY);
        assert_eq!(trace.events().first().map(|e| e.day_index), Some(50));
    }

    #[test]
    fn drain_hands_over_events_in_order() {
        let mut trace = ResourceTrace::new(TraceConfig::enabled());
        trace.push(event(1));
        trace.push(event(2));
        let drained: Vec<_> = trace.drain().into_iter().map(|e| e.day_index).collect();
        assert_eq!(drained, [1, 2]);
        assert!(trace.is_empty());
        assert!(trace.push(event(3)));
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn reads_are_copies() {
        let mut trace = ResourceTrace::new(TraceConfig::enabled());
        let mut after = ResourceSnapshot::new();
        after.insert(ResourceKey::Morale, 4);
        trace.record(2, "choice", &Diff::default(), ResourceSnapshot::new(), after, None);
        let mut copy = trace.events();
        copy.clear();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.events()[0].after.get(&ResourceKey::Morale), Some(&4));
    }

    #[test]
    fn separate_instances_do_not_share_events() {
        let mut first = ResourceTrace::new(TraceConfig::enabled());
        let second = ResourceTrace::new(TraceConfig::enabled());
        first.push(event(1));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn meta_is_omitted_when_absent() {
        let value = serde_json::to_value(event(3)).expect("event serializes");
        assert!(value.get("meta").is_none());
        assert_eq!(value.get("day_index").and_then(|v| v.as_u64()), Some(3));
    }
}
