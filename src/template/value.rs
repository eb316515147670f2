// ABOUTME: Runtime value model shared by the template executor and helper functions
// ABOUTME: Implements truthiness, display formatting, and HTML escaping of rendered output

use std::fmt;

use super::context::{Event, RenderContext, Trigger};
use super::error::FuncError;

/// A value flowing through a template pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Event(Event),
    Trigger(Trigger),
    Context(RenderContext),
}

impl Value {
    /// Name used in type mismatch error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Event(_) => "event",
            Value::Trigger(_) => "trigger",
            Value::Context(_) => "context",
        }
    }

    /// Truthiness used by `if`, `and`, `or`, and `empty`. The zero value of
    /// every kind is false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Event(_) | Value::Trigger(_) | Value::Context(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric view used by the comparison helpers, integers promote to floats.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Resolve a field on this value, `None` when no such field exists.
    pub(crate) fn field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Context(context) => context.lookup_field(name),
            Value::Trigger(trigger) => trigger.lookup_field(name),
            Value::Event(event) => event.lookup_field(name),
            _ => None,
        }
    }

    /// Invoke a method on this value. `None` means the method does not exist,
    /// `Some(Err(..))` means it exists but rejected its arguments.
    pub(crate) fn call_method(&self, name: &str, args: &[Value]) -> Option<Result<Value, FuncError>> {
        match self {
            Value::Event(event) => event.call_method(name, args),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<nil>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Event(event) => write!(f, "{event}"),
            Value::Trigger(trigger) => write!(f, "{trigger}"),
            Value::Context(context) => write!(f, "{context}"),
        }
    }
}

/// Format a float the way template output expects: shortest round-trip
/// decimal form, switching to exponent notation for very small or very
/// large magnitudes.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && (magnitude < 1e-4 || magnitude >= 1e21) {
        return exponent_form(value);
    }
    format!("{value}")
}

/// Exponent notation with an explicit sign and at least two exponent digits.
fn exponent_form(value: f64) -> String {
    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}

/// Append `text` to `out`, escaping `&`, `'`, `<`, `>`, and `"` as HTML entities.
pub(crate) fn html_escape(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(c),
        }
    }
}
