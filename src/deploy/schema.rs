//! Immutable stack schema: typed parameters and components.

use serde::Serialize;
use serde_json::Value;

use crate::api::types::{AppDetail, StackDetail, StackParameter};

/// Shown in place of masked parameter values
pub const REDACTED: &str = "********";

/// Declared type of a stack parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Secret,
    /// Absent or unrecognised type; coerced on the string path
    Unspecified,
}

impl ParamType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "string" => ParamType::String,
            "number" => ParamType::Number,
            "secret" => ParamType::Secret,
            _ => ParamType::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Secret => "secret",
            ParamType::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    /// `None` when the schema declares no default (or a JSON `null` one)
    pub default: Option<Value>,
    /// Prompt input is hidden and the value is never echoed back.
    ///
    /// Set for `secret` parameters and, as a compatibility shim, for
    /// untyped parameters whose name ends in `password`. Display only.
    pub masked: bool,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType, default: Option<Value>) -> Self {
        let name = name.into();
        let masked = is_masked(&name, param_type);
        Self {
            name,
            param_type,
            description: String::new(),
            default: default.filter(|v| !v.is_null()),
            masked,
        }
    }

    /// Default rendered for prompt titles; empty strings render as nothing.
    pub fn default_label(&self) -> Option<String> {
        match &self.default {
            None => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

impl From<&StackParameter> for ParameterSpec {
    fn from(wire: &StackParameter) -> Self {
        let mut spec = ParameterSpec::new(
            wire.name.clone(),
            ParamType::parse(&wire.kind),
            wire.default_value.clone(),
        );
        spec.description = wire.description.clone();
        spec
    }
}

fn is_masked(name: &str, param_type: ParamType) -> bool {
    match param_type {
        ParamType::Secret => true,
        ParamType::Unspecified => name.ends_with("password"),
        ParamType::String | ParamType::Number => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    App,
    Chart,
    Other,
}

impl ComponentKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "app" => ComponentKind::App,
            "chart" => ComponentKind::Chart,
            _ => ComponentKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSpec {
    pub name: String,
    pub kind: ComponentKind,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Parameters and components of a stack, in server order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackSchema {
    pub name: String,
    pub parameters: Vec<ParameterSpec>,
    pub components: Vec<ComponentSpec>,
}

impl StackSchema {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Components built by the create flow
    pub fn app_components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.iter().filter(|c| c.kind == ComponentKind::App)
    }

    pub fn is_masked(&self, name: &str) -> bool {
        self.parameter(name).is_some_and(|p| p.masked)
    }
}

impl From<&StackDetail> for StackSchema {
    fn from(detail: &StackDetail) -> Self {
        Self {
            name: detail.name.clone(),
            parameters: detail.parameters.iter().map(ParameterSpec::from).collect(),
            components: detail
                .components
                .iter()
                .map(|c| ComponentSpec::new(c.name.clone(), ComponentKind::parse(&c.kind)))
                .collect(),
        }
    }
}

impl From<&AppDetail> for StackSchema {
    /// Schema view of a deployed app; current values stand in for defaults
    /// so numeric overrides normalise against what is live.
    fn from(app: &AppDetail) -> Self {
        Self {
            name: app.stack.name.clone(),
            parameters: app
                .parameters
                .iter()
                .map(|p| {
                    let mut spec = ParameterSpec::from(p);
                    if let Some(current) = p.value.clone().filter(|v| !v.is_null()) {
                        spec.default = Some(current);
                    }
                    spec
                })
                .collect(),
            components: app
                .components
                .iter()
                .map(|c| ComponentSpec::new(c.name.clone(), ComponentKind::parse(&c.kind)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DeployedComponent, StackComponent};
    use serde_json::json;

    fn wire(name: &str, kind: &str, default: Option<Value>) -> StackParameter {
        StackParameter {
            name: name.to_string(),
            kind: kind.to_string(),
            default_value: default,
            ..Default::default()
        }
    }

    #[test]
    fn test_masked_flag_computed_at_load() {
        let detail = StackDetail {
            name: "web".into(),
            parameters: vec![
                wire("db_password", "", None),
                wire("api_key", "secret", None),
                wire("admin_password", "string", None),
                wire("region", "", None),
            ],
            components: vec![],
            ..Default::default()
        };
        let schema = StackSchema::from(&detail);

        assert!(schema.is_masked("db_password"));
        assert!(schema.is_masked("api_key"));
        assert!(!schema.is_masked("admin_password"));
        assert!(!schema.is_masked("region"));
        assert_eq!(schema.parameter("region").unwrap().param_type, ParamType::Unspecified);
    }

    #[test]
    fn test_null_default_is_absent() {
        let spec = ParameterSpec::from(&wire("replicas", "number", Some(Value::Null)));
        assert_eq!(spec.default, None);
    }

    #[test]
    fn test_default_label_hides_empty_string() {
        let empty = ParameterSpec::new("tag", ParamType::String, Some(json!("")));
        assert_eq!(empty.default, Some(json!("")));
        assert_eq!(empty.default_label(), None);

        let number = ParameterSpec::new("replicas", ParamType::Number, Some(json!(2)));
        assert_eq!(number.default_label().as_deref(), Some("2"));
    }

    #[test]
    fn test_app_components_filter() {
        let detail = StackDetail {
            components: vec![
                StackComponent { name: "web".into(), kind: "app".into() },
                StackComponent { name: "db".into(), kind: "chart".into() },
                StackComponent { name: "cron".into(), kind: "job".into() },
            ],
            ..Default::default()
        };
        let schema = StackSchema::from(&detail);
        let names: Vec<&str> = schema.app_components().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["web"]);
        assert_eq!(schema.component("cron").unwrap().kind, ComponentKind::Other);
    }

    #[test]
    fn test_app_detail_uses_current_value_as_default() {
        let app = AppDetail {
            uuid: "a-1".into(),
            name: "shop".into(),
            parameters: vec![StackParameter {
                name: "replicas".into(),
                kind: "number".into(),
                default_value: Some(json!(1)),
                value: Some(json!(3)),
                ..Default::default()
            }],
            components: vec![DeployedComponent {
                name: "web".into(),
                kind: "app".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let schema = StackSchema::from(&app);

        assert_eq!(schema.parameter("replicas").unwrap().default, Some(json!(3)));
        assert_eq!(schema.component("web").unwrap().kind, ComponentKind::App);
    }
}
