// ABOUTME: Main template engine for notification description text
// ABOUTME: Parses and renders templates against trigger events, falling back to raw text on failure

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::context::{Event, RenderContext};
use super::error::{PopulateError, TemplateError};
use super::exec;
use super::helpers::FuncRegistry;
use crate::parser::Parser;

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    funcs: FuncRegistry,
}

impl TemplateEngine {
    /// Create a new template engine with all built-in helpers.
    pub fn new() -> Self {
        Self {
            funcs: FuncRegistry::standard(),
        }
    }

    /// Check if a string contains template syntax.
    pub fn has_template_syntax(&self, text: &str) -> bool {
        text.contains("{{")
    }

    /// Render a description template for a trigger and its events.
    ///
    /// Text without template syntax passes through unchanged. On failure
    /// the returned error carries the original text, so callers can keep
    /// showing the description they already had.
    pub fn populate(
        &self,
        trigger_name: &str,
        template: &str,
        events: &[Event],
    ) -> Result<String, PopulateError> {
        if !self.has_template_syntax(template) {
            return Ok(template.to_string());
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.render(trigger_name, template, events)
        }))
        .unwrap_or_else(|payload| Err(TemplateError::Internal(panic_message(payload))));
        match outcome {
            Ok(rendered) => {
                debug!(
                    "Rendered description template for trigger '{}' ({} events)",
                    trigger_name,
                    events.len()
                );
                Ok(rendered)
            }
            Err(error) => {
                warn!(
                    "Description template for trigger '{}' failed: {}",
                    trigger_name, error
                );
                Err(PopulateError::new(template, error))
            }
        }
    }

    /// Parse and execute a template, trimming surrounding whitespace.
    pub fn render(
        &self,
        trigger_name: &str,
        template: &str,
        events: &[Event],
    ) -> Result<String, TemplateError> {
        let nodes = Parser::parse(template, &self.funcs)?;
        let context = RenderContext::new(trigger_name, events);
        let rendered = exec::execute(&nodes, &context, &self.funcs)?;
        Ok(rendered.trim().to_string())
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "template rendering panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_event() -> Vec<Event> {
        vec![Event {
            metric: "node1".to_string(),
            ..Default::default()
        }]
    }

    #[test]
    fn test_text_without_syntax_passes_through() {
        let engine = TemplateEngine::new();
        let result = engine.populate("TestName", "  plain description  ", &[]);
        assert_eq!(result.unwrap(), "  plain description  ");
    }

    #[test]
    fn test_rendered_output_is_trimmed() {
        let engine = TemplateEngine::new();
        let result = engine.populate("TestName", "  {{ .Trigger.Name }}  ", &[]);
        assert_eq!(result.unwrap(), "TestName");
    }

    #[test]
    fn test_parse_failure_carries_original_text() {
        let engine = TemplateEngine::new();
        let template = "{{ bad_function .Trigger.Name }}";
        let err = engine.populate("TestName", template, &[]).unwrap_err();
        assert_eq!(err.template(), template);
        assert!(matches!(err.cause(), TemplateError::Parse(_)));
    }

    #[test]
    fn test_render_failure_carries_original_text() {
        let engine = TemplateEngine::new();
        let template = "{{ .Trigger.Missing }}";
        let err = engine.populate("TestName", template, &[]).unwrap_err();
        assert_eq!(err.template(), template);
        assert!(matches!(err.cause(), TemplateError::Render(_)));
    }

    #[test]
    fn test_events_are_reachable() {
        let engine = TemplateEngine::new();
        let result = engine.populate(
            "TestName",
            "{{range .Events}}{{.Metric}}{{end}}",
            &single_event(),
        );
        assert_eq!(result.unwrap(), "node1");
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TemplateEngine>();
    }
}
