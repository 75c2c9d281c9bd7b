//! Interactive collection of parameter values and per-component build input.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::builder::{BuildMode, ComponentBuildInput};
use super::coerce::{accepts_empty, coerce};
use super::schema::{ComponentSpec, ParamType, ParameterSpec, REDACTED, StackSchema};
use crate::api::types::Registry;
use crate::error::DeployError;
use crate::traits::{InputRule, UserInput};

/// Collected values in schema order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedParameters {
    entries: Vec<(String, Value)>,
}

impl CollectedParameters {
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object for the request body
    pub fn to_map(&self) -> Map<String, Value> {
        self.entries.iter().cloned().collect()
    }

    /// Display rows with masked values hidden
    pub fn display_rows(&self, schema: &StackSchema) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, value)| {
                let shown = if schema.is_masked(name) {
                    REDACTED.to_string()
                } else {
                    match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    }
                };
                (name.clone(), shown)
            })
            .collect()
    }
}

/// Default as shown on screen; masked defaults are never echoed
fn shown_default(spec: &ParameterSpec) -> Option<String> {
    let default = spec.default_label()?;
    Some(if spec.masked { REDACTED.to_string() } else { default })
}

fn prompt_title(spec: &ParameterSpec) -> String {
    match shown_default(spec) {
        Some(default) => format!("Enter value for {} (default: {})", spec.name, default),
        None => format!("Enter value for {}", spec.name),
    }
}

fn prompt_placeholder(spec: &ParameterSpec) -> Option<String> {
    if spec.masked { None } else { spec.default_label() }
}

/// Prompt once for `spec` and coerce the answer.
pub fn collect_parameter(input: &dyn UserInput, spec: &ParameterSpec) -> Result<Value, DeployError> {
    let title = prompt_title(spec);
    let placeholder = prompt_placeholder(spec);
    let rule = InputRule {
        required: !accepts_empty(spec),
        numeric: spec.param_type == ParamType::Number,
    };

    let raw = if spec.masked {
        input.password(&title, placeholder.as_deref(), rule)
    } else {
        input.text_validated(&title, placeholder.as_deref(), rule)
    }
    .map_err(DeployError::from_prompt)?;

    let value = coerce(spec, Some(&raw))?;
    if spec.masked {
        debug!(parameter = %spec.name, "collected masked parameter");
    } else {
        debug!(parameter = %spec.name, %value, "collected parameter");
    }
    Ok(value)
}

/// Prompt for every parameter of `schema`, in schema order.
///
/// Aborting any prompt fails the whole collection with `Aborted`.
pub fn collect_parameters(input: &dyn UserInput, schema: &StackSchema) -> Result<CollectedParameters, DeployError> {
    let mut collected = CollectedParameters::default();
    for spec in &schema.parameters {
        let value = collect_parameter(input, spec)?;
        collected.insert(spec.name.clone(), value);
    }
    Ok(collected)
}

fn ask(input: &dyn UserInput, title: &str) -> Result<String, DeployError> {
    input
        .text_validated(title, None, InputRule::REQUIRED)
        .map_err(DeployError::from_prompt)
}

/// Ask for build mode, registry and source details of one app component.
///
/// With no registries in the project the pull secret is left unset.
pub fn collect_component_input(
    input: &dyn UserInput,
    component: &ComponentSpec,
    registries: &[Registry],
) -> Result<ComponentBuildInput, DeployError> {
    let labels: Vec<String> = BuildMode::ALL.iter().map(|m| m.label().to_string()).collect();
    let picked = input
        .select(&format!("Select build mode for {}", component.name), labels)
        .map_err(DeployError::from_prompt)?;
    let mode = BuildMode::ALL
        .into_iter()
        .find(|m| m.label() == picked)
        .ok_or_else(|| DeployError::UnknownBuildMode(picked.clone()))?;

    let registry = if registries.is_empty() {
        warn!(component = %component.name, "project has no registries, skipping registry secret");
        None
    } else {
        let names = registries.iter().map(|r| r.name.clone()).collect();
        Some(
            input
                .select("Select registry", names)
                .map_err(DeployError::from_prompt)?,
        )
    };

    let (image, git_url, git_ref) = if mode.is_git() {
        let url = ask(input, "Enter git repository URL")?;
        let reference = ask(input, "Enter git reference (branch/tag/commit)")?;
        (None, Some(url), Some(reference))
    } else {
        (Some(ask(input, "Enter image URL")?), None, None)
    };

    let image_tag = ask(input, "Enter image tag")?;

    Ok(ComponentBuildInput {
        mode,
        image,
        git_url,
        git_ref,
        image_tag,
        registry,
    })
}
