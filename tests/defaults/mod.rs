// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use figschema::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

/// Routes library events to the test output. `RUST_LOG` overrides the
/// default warn level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn display_values(c: &Value, e: &Value) -> Result<String> {
    Ok(format!(
        "\nleft  = {}\nright = {}\n",
        serde_json::to_string_pretty(c)?,
        serde_json::to_string_pretty(e)?
    ))
}

// Every key of an expected object must match in the computed one; computed
// objects may hold more. "#undefined" expects the key to be absent.
fn match_values_impl(computed: &Value, expected: &Value, at: &str) -> Result<()> {
    match (computed, expected) {
        (_, Value::String(s)) if &**s == "#undefined" => {
            if !computed.is_undefined() {
                bail!("{at}: expected no value{}", display_values(computed, expected)?);
            }
            Ok(())
        }

        (Value::Array(a1), Value::Array(a2)) => {
            if a1.len() != a2.len() {
                bail!(
                    "{at}: array length mismatch: {} != {}{}",
                    a1.len(),
                    a2.len(),
                    display_values(computed, expected)?
                );
            }
            for (idx, v2) in a2.iter().enumerate() {
                match_values_impl(&a1[idx], v2, &format!("{at}[{idx}]"))?;
            }
            Ok(())
        }

        (Value::Object(_), Value::Object(o2)) => {
            for (k, v2) in o2.iter() {
                match_values_impl(&computed[&**k], v2, &format!("{at}.{k}"))?;
            }
            Ok(())
        }

        (Value::Number(n1), Value::Number(n2)) if (n1 - n2).abs() < 1e-9 => Ok(()),
        (Value::String(s1), Value::String(s2)) if s1 == s2 => Ok(()),
        (Value::Bool(b1), Value::Bool(b2)) if b1 == b2 => Ok(()),
        (Value::Null, Value::Null) => Ok(()),

        _ => bail!("{at}: value mismatch{}", display_values(computed, expected)?),
    }
}

pub fn match_values(computed: &Value, expected: &Value) -> Result<()> {
    match match_values_impl(computed, expected, "") {
        Ok(()) => Ok(()),
        Err(e) => bail!("\nmismatch {e}"),
    }
}

pub fn session_for(config: Option<Config>) -> Result<Session> {
    match config {
        Some(config) => Session::with_config(config),
        None => Session::new(),
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    config: Option<Config>,
    data: Vec<Value>,
    layout: Option<Value>,
    want_data: Option<Vec<Value>>,
    want_layout: Option<Value>,
    want_traces: Option<Vec<Value>>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
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
        let layout = case.layout.unwrap_or_else(Value::new_object);
        let full = session.supply_defaults(&case.data, &layout)?;

        if let Some(want_data) = case.want_data {
            match_values(&Value::from(full.data.clone()), &Value::from(want_data))?;
        }
        if let Some(want_layout) = case.want_layout {
            match_values(&full.layout, &want_layout)?;
        }
        if let Some(want_traces) = case.want_traces {
            let traces = session.apply_transforms(&full)?;
            match_values(&Value::from(traces), &Value::from(want_traces))?;
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

#[test_resources("tests/defaults/cases/*.yaml")]
fn run(path: &str) {
    init_logging();
    yaml_test(path).unwrap()
}
