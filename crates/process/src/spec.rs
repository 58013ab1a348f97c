// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal port/spec contract: the core treats validation results
//! opaquely and implements no schema language of its own. A real schema
//! validator is an external collaborator; this gives `corral-process` a
//! concrete type to validate inputs/outputs against.

use serde_json::Value;

/// A single named input or output slot.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
    validate: Option<Box<dyn Fn(&Value) -> Option<String> + Send + Sync>>,
}

impl Port {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: false, default: None, validate: None }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_validator(
        mut self,
        f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Box::new(f));
        self
    }

    /// Fill defaults, matching the external contract's `pre_process`.
    pub fn pre_process(&self, value: Option<Value>) -> Option<Value> {
        value.or_else(|| self.default.clone())
    }

    /// `validate(value) -> Option<error>`.
    pub fn validate(&self, value: Option<&Value>) -> Option<String> {
        match value {
            None if self.required => Some(format!("missing required port {:?}", self.name)),
            None => None,
            Some(v) => self.validate.as_ref().and_then(|f| f(v)),
        }
    }
}

/// The set of input/output ports a [`crate::ProcessBehavior`] declares.
#[derive(Default)]
pub struct ProcessSpec {
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

impl ProcessSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Validate a raw input map against every declared input port,
    /// returning the first error encountered.
    pub fn validate_inputs(&self, raw: &serde_json::Map<String, Value>) -> Result<(), String> {
        for port in &self.inputs {
            if let Some(err) = port.validate(raw.get(&port.name)) {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Apply every input port's `pre_process` to fill in defaults.
    pub fn pre_process_inputs(
        &self,
        raw: &serde_json::Map<String, Value>,
    ) -> serde_json::Map<String, Value> {
        let mut parsed = raw.clone();
        for port in &self.inputs {
            if let Some(v) = port.pre_process(raw.get(&port.name).cloned()) {
                parsed.insert(port.name.clone(), v);
            }
        }
        parsed
    }
}
