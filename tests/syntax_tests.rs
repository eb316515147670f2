// ABOUTME: Integration tests for template grammar support
// ABOUTME: Covers trim markers, comments, branching, variables, pipelines, and malformed input

use herald::{TemplateEngine, TemplateError};

mod common;
use common::{numbered_events, TestEventBuilder};

const TRIGGER_NAME: &str = "TestName";

fn populate(template: &str) -> Result<String, herald::PopulateError> {
    TemplateEngine::new().populate(TRIGGER_NAME, template, &[])
}

fn populate_with_events(template: &str) -> Result<String, herald::PopulateError> {
    let events = numbered_events(100);
    TemplateEngine::new().populate(TRIGGER_NAME, template, &events)
}

#[test]
fn test_trim_markers_strip_surrounding_whitespace() {
    assert_eq!(populate("a  {{- \"b\" -}}  c").unwrap(), "abc");
    assert_eq!(populate("a {{ \"b\" }} c").unwrap(), "a b c");
}

#[test]
fn test_comments_produce_no_output() {
    assert_eq!(populate("x{{/* a note */}}y").unwrap(), "xy");
    assert_eq!(populate("x  {{- /* a note */ -}}  y").unwrap(), "xy");
}

#[test]
fn test_else_if_chain_shares_one_end() {
    let template = "{{if eq 1 2}}a{{else if eq 2 2}}b{{else}}c{{end}}";
    assert_eq!(populate(template).unwrap(), "b");
}

#[test]
fn test_range_else_runs_on_empty_list() {
    let template = "{{range .Events}}{{.Metric}}{{else}}no events{{end}}";
    assert_eq!(populate(template).unwrap(), "no events");
    assert_eq!(populate_with_events(template).unwrap(), "12");
}

#[test]
fn test_range_assignment_leaves_last_element_behind() {
    let template = "{{$v := \"\"}}{{range $v = .Events}}{{end}}{{$v.Metric}}";
    assert_eq!(populate_with_events(template).unwrap(), "2");
}

#[test]
fn test_dollar_reaches_the_root_from_inside_a_range() {
    let template = "{{range $i, $v := .Events}}{{$i}}:{{$.Trigger.Name}} {{end}}";
    assert_eq!(
        populate_with_events(template).unwrap(),
        "0:TestName 1:TestName"
    );
}

#[test]
fn test_pipeline_feeds_previous_result_as_final_argument() {
    assert_eq!(populate("{{ list 1 2 3 | join \", \" }}").unwrap(), "1, 2, 3");
    assert_eq!(populate("{{ \"ab\" | repeat 3 }}").unwrap(), "ababab");
}

#[test]
fn test_parenthesized_pipeline_with_field_chain() {
    let template = "{{ (index .Events 1).Metric }}";
    assert_eq!(populate_with_events(template).unwrap(), "2");
}

#[test]
fn test_builtin_comparisons_and_logic() {
    assert_eq!(populate("{{ lt 1 2 }},{{ ge 2 2 }}").unwrap(), "true,true");
    assert_eq!(populate("{{ and 1 \"x\" }},{{ or 0 \"y\" }}").unwrap(), "x,y");
    assert_eq!(populate("{{ not .Events }}").unwrap(), "true");
}

#[test]
fn test_builtin_len_and_nested_index() {
    assert_eq!(populate("{{ len \"abcd\" }}").unwrap(), "4");
    let template = "{{ index (list (list 1 2) (list 3 4)) 1 0 }}";
    assert_eq!(populate(template).unwrap(), "3");
}

#[test]
fn test_default_and_coalesce_fill_missing_values() {
    assert_eq!(populate("{{ default \"fallback\" \"\" }}").unwrap(), "fallback");
    assert_eq!(populate("{{ coalesce \"\" 0 \"picked\" }}").unwrap(), "picked");
    assert_eq!(populate("{{ empty .Events }}").unwrap(), "true");
}

#[test]
fn test_base64_round_trip() {
    assert_eq!(populate("{{ b64enc \"hello\" }}").unwrap(), "aGVsbG8=");
    assert_eq!(populate("{{ b64enc \"hello\" | b64dec }}").unwrap(), "hello");
}

#[test]
fn test_title_trim_and_first_last() {
    assert_eq!(populate("{{ title \"hello wide world\" }}").unwrap(), "Hello Wide World");
    assert_eq!(populate("{{ trim \"  x  \" }}").unwrap(), "x");
    assert_eq!(populate("{{ first (list 7 8 9) }}-{{ last (list 7 8 9) }}").unwrap(), "7-9");
}

#[test]
fn test_string_literals_support_escapes_and_raw_form() {
    assert_eq!(populate("{{ \"tab\\there\" }}").unwrap(), "tab\there");
    assert_eq!(populate("{{ `a\"b` }}").unwrap(), "a&#34;b");
}

#[test]
fn test_number_literals() {
    assert_eq!(populate("{{ 007 }}").unwrap(), "7");
    assert_eq!(populate("{{ -7 }}").unwrap(), "-7");
    assert_eq!(populate("{{ 3.5 }}").unwrap(), "3.5");
}

#[test]
fn test_missing_end_falls_back() {
    let template = "{{if .Events}}x";
    let err = populate(template).unwrap_err();
    assert_eq!(err.template(), template);
    assert!(matches!(err.cause(), TemplateError::Parse(_)));
}

#[test]
fn test_stray_end_falls_back() {
    let err = populate("x{{end}}").unwrap_err();
    assert_eq!(err.template(), "x{{end}}");
}

#[test]
fn test_unclosed_action_falls_back() {
    let template = "oops {{ .Trigger.Name";
    let err = populate(template).unwrap_err();
    assert_eq!(err.template(), template);
}

#[test]
fn test_undefined_variable_falls_back() {
    let template = "{{ $nope }}";
    let err = populate(template).unwrap_err();
    assert_eq!(err.template(), template);
    assert!(matches!(err.cause(), TemplateError::Render(_)));
}

#[test]
fn test_range_over_scalar_falls_back() {
    let template = "{{range .Trigger.Name}}x{{end}}";
    let err = populate(template).unwrap_err();
    assert_eq!(err.template(), template);
}

#[test]
fn test_too_many_declarations_falls_back() {
    let template = "{{ $a, $b := 1 }}";
    let err = populate(template).unwrap_err();
    assert_eq!(err.template(), template);
    assert!(matches!(err.cause(), TemplateError::Parse(_)));
}

#[test]
fn test_text_with_only_closing_braces_passes_through() {
    assert_eq!(populate("no {braces}} here").unwrap(), "no {braces}} here");
}

#[test]
fn test_nested_ranges_iterate_metric_elements() {
    let events = vec![TestEventBuilder::new("node1")
        .with_metric_elements(&["db", "cpu"])
        .build()];
    let engine = TemplateEngine::new();
    let template = "{{range .Events}}{{range .MetricElements}}<{{.}}>{{end}}{{end}}";
    let result = engine.populate(TRIGGER_NAME, template, &events);
    assert_eq!(result.unwrap(), "<db><cpu>");
}
