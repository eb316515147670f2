// ABOUTME: Main library module for the herald templating engine
// ABOUTME: Exports all core modules and provides the public API

pub mod parser;
pub mod template;

// Re-export commonly used types
pub use parser::{ParseError, Parser};
pub use template::{
    Event, FuncRegistry, PopulateError, RenderContext, TemplateEngine, TemplateError, Trigger,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
