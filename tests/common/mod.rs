// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides event builders and local-time date strings for template assertions

#![allow(dead_code)]

use chrono::{Local, TimeZone};

use herald::Event;

pub struct TestEventBuilder {
    event: Event,
}

impl TestEventBuilder {
    pub fn new(metric: &str) -> Self {
        Self {
            event: Event {
                metric: metric.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.event.value = Some(value);
        self
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.event.state = state.to_string();
        self
    }

    pub fn with_metric_elements(mut self, elements: &[&str]) -> Self {
        self.event.metric_elements = elements.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> Event {
        self.event
    }
}

/// Two events named "1" and "2" sharing a timestamp, the shape most
/// dashboard templates iterate over.
pub fn numbered_events(timestamp: i64) -> Vec<Event> {
    vec![
        TestEventBuilder::new("1").with_timestamp(timestamp).build(),
        TestEventBuilder::new("2").with_timestamp(timestamp).build(),
    ]
}

/// Format an epoch in local time, the same way the date helpers do.
pub fn local_date(epoch: i64, layout: &str) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|ts| ts.format(layout).to_string())
        .unwrap_or_default()
}
