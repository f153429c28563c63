//! Failing documents: every error surfaces as a located diagnostic and no
//! output is produced.

use bustool_common::DocumentFormat;
use bustool_conformance::{run_json, run_pipeline};

const BUS: &str = r#""bus_a": {
    "type": "asymmetric_bus",
    "controller": "host",
    "device": "target",
    "transaction": {"request": "req"},
    "clock": {"type": "ext_clock", "signal": "clk", "edge": "rising"},
    "addr": "addr",
    "signals": {"req": {"dir": "output"}, "addr": {"dir": "output", "span": 8}}
}"#;

fn design(rest: &str) -> String {
    format!("{{{BUS}, {rest}}}")
}

#[test]
fn unresolved_bus_reference() {
    let result = run_json(&design(r#""mux": {"type": "multiplexer", "bus": "bus_z"}"#));
    assert!(result.has_errors);
    assert!(result.rendered.is_empty());
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code.to_string(), "E301");
    assert_eq!(diag.location.entity.as_deref(), Some("mux"));
    assert_eq!(diag.location.field.as_deref(), Some("bus"));
}

#[test]
fn bus_reference_must_name_a_bus() {
    let result = run_json(&design(
        r#""xbar": {"type": "crossbar", "bus": "bus_a", "arbiter": {"type": "fixed"}},
           "mux": {"type": "multiplexer", "bus": "xbar"}"#,
    ));
    assert!(result.has_code("E301"));
}

#[test]
fn broken_reference_fails_even_when_unselected() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_z"}"#);
    let result = run_pipeline(&doc, DocumentFormat::Json, &["bus_a"]);
    assert!(result.has_code("E301"));
    assert!(result.rendered.is_empty());
}

#[test]
fn missing_address_signal() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}"#)
        .replace(r#""addr": "addr","#, "");
    let result = run_json(&doc);
    assert!(result.has_code("E302"));
    assert_eq!(result.error_count, 1);
}

#[test]
fn duplicate_identifier_between_bus_parameter_and_loop_variable() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}"#).replace(
        r#""transaction":"#,
        r#""parameters": {"x": {"default": 1}}, "transaction":"#,
    );
    let result = run_json(&doc);
    assert!(result.has_code("E401"));
    let diag = &result.diagnostics[0];
    assert!(diag.message.contains("`x`"));
    assert_eq!(diag.location.entity.as_deref(), Some("mux"));
    assert!(result.rendered.is_empty());
}

#[test]
fn repeated_signal_key_is_a_duplicate_identifier() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}"#).replace(
        r#""signals": {"#,
        r#""signals": {"x": {"dir": "output", "span": 8}, "x": {"dir": "input"}, "#,
    );
    let result = run_json(&doc);
    assert!(result.has_errors);
    assert!(result.rendered.is_empty());
    assert!(result.decls.is_empty());
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code.to_string(), "E205");
    assert!(diag.message.contains("`x`"));
    assert_eq!(diag.location.entity.as_deref(), Some("bus_a"));
    assert_eq!(diag.location.field.as_deref(), Some("signals"));
}

#[test]
fn repeated_entity_key_is_a_duplicate_identifier() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}, "mux": {"type": "multiplexer", "bus": "bus_a"}"#);
    let result = run_json(&doc);
    assert_eq!(result.error_count, 1);
    assert!(result.has_code("E205"));
    assert_eq!(result.diagnostics[0].location.entity.as_deref(), Some("mux"));
}

#[test]
fn malformed_text_is_reported() {
    let result = run_json("{\"bus_a\": ");
    assert!(result.has_code("E502"));
    assert!(result.rendered.is_empty());
}

#[test]
fn unknown_operator_names_the_field() {
    let doc = design("").replace(r#""span": 8"#, r#""span": {"$pow": [2, 3]}"#);
    let doc = doc.replace(", }", "}");
    let result = run_json(&doc);
    let diag = &result.diagnostics[0];
    assert_eq!(diag.code.to_string(), "E102");
    assert_eq!(diag.location.entity.as_deref(), Some("bus_a"));
    assert_eq!(diag.location.field.as_deref(), Some("signals.addr.span"));
}

#[test]
fn invalid_clock_edge() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}"#)
        .replace(r#""edge": "rising""#, r#""edge": "both""#);
    let result = run_json(&doc);
    assert!(result.has_code("E202"));
    assert!(result.diagnostics[0].message.contains("both"));
}

#[test]
fn missing_required_field() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}"#)
        .replace(r#""controller": "host","#, "");
    let result = run_json(&doc);
    assert!(result.has_code("E201"));
    assert!(result.diagnostics[0].message.contains("controller"));
}

#[test]
fn unknown_selected_entity() {
    let doc = design(r#""mux": {"type": "multiplexer", "bus": "bus_a"}"#);
    let result = run_pipeline(&doc, DocumentFormat::Json, &["nope"]);
    assert!(result.has_code("E303"));
}

#[test]
fn diagnostics_serialize_for_json_reports() {
    let result = run_json(&design(r#""mux": {"type": "multiplexer", "bus": "bus_z"}"#));
    let json = serde_json::to_value(&result.diagnostics).unwrap();
    assert_eq!(json[0]["severity"], "Error");
    assert_eq!(json[0]["location"]["entity"], "mux");
}
