// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use crate::defaults::{init_logging, session_for};

use anyhow::{bail, Result};
use figschema::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct WantDiagnostic {
    code: String,
    container: String,
    trace: Option<usize>,
    astr: String,
    msg: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    config: Option<Config>,
    data: Option<Value>,
    layout: Option<Value>,
    want: Option<Vec<WantDiagnostic>>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn container_name(container: Container) -> &'static str {
    match container {
        Container::Data => "data",
        Container::Layout => "layout",
    }
}

fn check_diagnostics(computed: &[Diagnostic], expected: &[WantDiagnostic]) -> Result<()> {
    let listing = || {
        computed
            .iter()
            .map(|d| format!("  {} {}", d.code, d.msg))
            .collect::<Vec<_>>()
            .join("\n")
    };
    if computed.len() != expected.len() {
        bail!(
            "expected {} diagnostics, got {}:\n{}",
            expected.len(),
            computed.len(),
            listing()
        );
    }

    for (n, (d, want)) in computed.iter().zip(expected).enumerate() {
        let matches = d.code.as_str() == want.code
            && container_name(d.container) == want.container
            && d.trace == want.trace
            && d.astr == want.astr
            && want.msg.as_ref().is_none_or(|msg| d.msg.contains(msg.as_str()));
        if !matches {
            bail!("diagnostic {n} mismatch\nwant = {want:?}\ngot  = {d:?}\nall:\n{}", listing());
        }
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    std::eprintln!("running {file}");

    for case in test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }

        let session = session_for(case.config)?;
        let data = case.data.unwrap_or(Value::Undefined);
        let layout = case.layout.unwrap_or(Value::Undefined);

        match (session.validate(&data, &layout)?, case.want) {
            (None, None) => (),
            (Some(computed), Some(want)) => check_diagnostics(&computed, &want)?,
            (None, Some(want)) if want.is_empty() => (),
            (Some(computed), None) => check_diagnostics(&computed, &[])?,
            (None, Some(want)) => check_diagnostics(&[], &want)?,
        }

        std::println!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{e}");
        }
    }
}

#[test_resources("tests/validate/cases/*.yaml")]
fn run(path: &str) {
    init_logging();
    yaml_test(path).unwrap()
}

#[test]
fn custom_trace_type() -> Result<()> {
    use figschema::registry::BasePlotDef;
    use std::rc::Rc;

    let mut session = Session::new()?;
    let bars = ModuleDef::trace(
        "bar",
        &["cartesian", "showLegend"],
        Rc::new(BasePlotDef {
            name: "cartesian".into(),
            ..BasePlotDef::default()
        }),
    )
    .with_attributes(serde_json::json!({
        "y": { "valType": "data_array", "editType": "calc" },
        "orientation": { "valType": "enumerated", "values": ["v", "h"], "dflt": "v", "editType": "calc" }
    }))
    .with_supply_defaults(|c, _| {
        if !c.coerce("y")?.is_array() {
            c.set("visible", false)?;
            return Ok(());
        }
        c.coerce("orientation")?;
        Ok(())
    });
    session.register(bars)?;

    let data = Value::from_json_str(r#"[{ "type": "bar", "y": [1], "orientation": "h" }]"#)?;
    assert_eq!(session.validate(&data, &Value::Undefined)?, None);

    // Scatter attributes are not part of a bar trace.
    let data = Value::from_json_str(r#"[{ "type": "bar", "y": [1], "mode": "lines" }, { "type": "bar" }]"#)?;
    let diagnostics = session.validate(&data, &Value::Undefined)?.unwrap_or_default();
    let got: Vec<(&str, Option<usize>, &str)> = diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.trace, d.astr.as_str()))
        .collect();
    assert_eq!(got, vec![("schema", Some(0), "mode"), ("invisible", Some(1), "")]);

    // The shared cartesian axes are still defaulted for bars.
    let full = session.supply_defaults(data.as_array()?, &Value::new_object())?;
    assert_eq!(full.layout["xaxis"]["type"], Value::from("linear"));
    Ok(())
}

#[test]
fn failed_batch_registers_nothing() -> Result<()> {
    let mut session = Session::new()?;
    let batch: Vec<Option<ModuleDef>> = vec![
        Some(ModuleDef::component("shapes").with_layout_attributes(serde_json::json!({
            "_isLinkedToArray": "shape",
            "x0": { "valType": "any" }
        }))),
        None,
    ];

    assert!(session.register(batch).is_err());
    let diagnostics = session
        .validate(&Value::new_array(), &Value::from_json_str(r#"{ "shapes": [] }"#)?)?
        .unwrap_or_default();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::Schema);
    Ok(())
}
