use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

/// Receives usage events from a bound repository.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, name: &str, props: Value);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub props: Value,
    pub at: DateTime<Utc>,
}

/// Keeps events in memory. Used by memory-only runs and tests.
#[derive(Debug, Default)]
pub struct MemAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.lock().clone()
    }

    // A panic while recording cannot leave the list half written, so a
    // poisoned lock is reported and then used as is.
    fn lock(&self) -> MutexGuard<'_, Vec<AnalyticsEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| {
            warn!("Analytics event lock was poisoned, continuing with recorded events");
            poisoned.into_inner()
        })
    }
}

impl AnalyticsSink for MemAnalytics {
    fn record(&self, name: &str, props: Value) {
        self.lock().push(AnalyticsEvent {
            name: name.to_string(),
            props,
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_in_order() {
        let sink = MemAnalytics::new();
        sink.record("a", json!(1));
        sink.record("b", json!({"k": "v"}));
        let names: Vec<String> = sink.events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn keeps_recording_after_a_panic_under_the_lock() {
        let sink = std::sync::Arc::new(MemAnalytics::new());
        sink.record("before", json!(null));

        let holder = std::sync::Arc::clone(&sink);
        let panicked = std::thread::spawn(move || {
            let _guard = holder.events.lock().unwrap();
            panic!("recorder failed");
        })
        .join();
        assert!(panicked.is_err());
        assert!(sink.events.is_poisoned());

        sink.record("after", json!(null));
        let names: Vec<String> = sink.events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["before", "after"]);
    }
}
