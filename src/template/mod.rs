// ABOUTME: Template engine module for notification descriptions
// ABOUTME: Provides parsing, rendering, helper functions, and the event context model

pub mod context;
pub mod engine;
pub mod error;
mod exec;
pub mod helpers;
mod layout;
pub mod value;

pub use context::{Event, RenderContext, Trigger};
pub use engine::TemplateEngine;
pub use error::{FuncError, PopulateError, Result, TemplateError};
pub use helpers::FuncRegistry;
pub use value::Value;
