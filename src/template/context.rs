// ABOUTME: Typed render context exposed to templates, the trigger plus its events
// ABOUTME: Field and method lookup tables live here next to the data they expose

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FuncError;
use super::value::{format_float, Value};

/// Trigger metadata, reachable in templates as `.Trigger`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
}

/// A single metric event, reachable in templates through `.Events`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub metric: String,
    pub metric_elements: Vec<String>,
    pub timestamp: i64,
    pub value: Option<f64>,
    pub state: String,
}

impl Event {
    /// Timestamp shifted forward by `seconds`, wrapping on overflow.
    pub fn timestamp_increase(&self, seconds: i64) -> i64 {
        self.timestamp.wrapping_add(seconds)
    }

    /// Timestamp shifted back by `seconds`, wrapping on overflow.
    pub fn timestamp_decrease(&self, seconds: i64) -> i64 {
        self.timestamp.wrapping_sub(seconds)
    }

    pub(crate) fn lookup_field(&self, name: &str) -> Option<Value> {
        match name {
            "Metric" => Some(Value::Str(self.metric.clone())),
            "MetricElements" => Some(Value::List(
                self.metric_elements
                    .iter()
                    .cloned()
                    .map(Value::Str)
                    .collect(),
            )),
            "Timestamp" => Some(Value::Int(self.timestamp)),
            "Value" => Some(match self.value {
                Some(v) => Value::Float(v),
                None => Value::Null,
            }),
            "State" => Some(Value::Str(self.state.clone())),
            _ => None,
        }
    }

    pub(crate) fn call_method(&self, name: &str, args: &[Value]) -> Option<Result<Value, FuncError>> {
        match name {
            "TimestampIncrease" => Some(
                shift_arg(name, args).map(|seconds| Value::Int(self.timestamp_increase(seconds))),
            ),
            "TimestampDecrease" => Some(
                shift_arg(name, args).map(|seconds| Value::Int(self.timestamp_decrease(seconds))),
            ),
            _ => None,
        }
    }
}

/// Validate the single integer argument the timestamp shift methods take.
fn shift_arg(name: &str, args: &[Value]) -> Result<i64, FuncError> {
    if args.len() != 1 {
        return Err(FuncError::new(format!(
            "wrong number of args for {name}: want 1 got {}",
            args.len()
        )));
    }
    args[0].as_int().ok_or_else(|| {
        FuncError::new(format!(
            "wrong type for argument 1 to {name}: expected integer, got {}",
            args[0].type_name()
        ))
    })
}

impl Trigger {
    pub(crate) fn lookup_field(&self, name: &str) -> Option<Value> {
        match name {
            "Name" => Some(Value::Str(self.name.clone())),
            _ => None,
        }
    }
}

/// Root value a template executes against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    pub trigger: Trigger,
    pub events: Vec<Event>,
}

impl RenderContext {
    pub fn new(trigger_name: impl Into<String>, events: &[Event]) -> Self {
        Self {
            trigger: Trigger {
                name: trigger_name.into(),
            },
            events: events.to_vec(),
        }
    }

    pub(crate) fn lookup_field(&self, name: &str) -> Option<Value> {
        match name {
            "Trigger" => Some(Value::Trigger(self.trigger.clone())),
            "Events" => Some(Value::List(
                self.events.iter().cloned().map(Value::Event).collect(),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} [", self.metric)?;
        for (i, element) in self.metric_elements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            f.write_str(element)?;
        }
        write!(f, "] {} ", self.timestamp)?;
        match self.value {
            Some(v) => f.write_str(&format_float(v))?,
            None => f.write_str("<nil>")?,
        }
        write!(f, " {}}}", self.state)
    }
}

impl fmt::Display for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} [", self.trigger)?;
        for (i, event) in self.events.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{event}")?;
        }
        write!(f, "]}}")
    }
}
