//! Final request bodies for create, component patch and parameter patch.
//!
//! Synthesis is pure apart from prompting: nothing here talks to the
//! control plane, so a failure leaves no remote state changed.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::builder::{AppSpec, BuildMode, BuildSpec, BuildTarget, ComponentPayload, build, verify_registry};
use super::coerce::coerce_overrides;
use super::collector::{CollectedParameters, collect_component_input, collect_parameters};
use super::resolver::ResourceKind;
use super::schema::{REDACTED, StackSchema};
use crate::api::types::Registry;
use crate::error::DeployError;
use crate::traits::UserInput;

/// Inputs of `apps deploy`; empty strings count as not supplied.
#[derive(Debug, Clone, Default)]
pub struct DeployInputs {
    pub component: String,
    pub image_url: Option<String>,
    pub image_tag: Option<String>,
    pub git_ref: Option<String>,
    pub mode: Option<String>,
    pub params: Vec<String>,
    pub registry_secret: Option<String>,
}

fn supplied(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployContext {
    #[serde(rename = "clusterUUID")]
    pub cluster_uuid: String,
    #[serde(rename = "projectUUID")]
    pub project_uuid: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRequest {
    pub name: String,
    pub parameters: Map<String, Value>,
    pub context: DeployContext,
    pub components: Vec<ComponentPayload>,
}

/// Body sent to the control plane, exactly as serialized here
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeploymentRequest {
    ParameterPatch { parameters: Map<String, Value> },
    ComponentPatch { components: Vec<ComponentPayload> },
    Create(CreateRequest),
}

impl DeploymentRequest {
    pub fn shape(&self) -> &'static str {
        match self {
            DeploymentRequest::ParameterPatch { .. } => "parameter-patch",
            DeploymentRequest::ComponentPatch { .. } => "component-patch",
            DeploymentRequest::Create(_) => "create",
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Request body with masked parameter values replaced, for logs and previews
    pub fn redacted(&self, schema: &StackSchema) -> Value {
        let mut body = self.to_value();
        redact_params(body.get_mut("parameters"), schema);
        if let Some(Value::Array(components)) = body.get_mut("components") {
            for component in components {
                for block in ["appSpec", "buildSpec"] {
                    if let Some(spec) = component.get_mut(block) {
                        redact_params(spec.get_mut("params"), schema);
                    }
                }
            }
        }
        body
    }
}

fn redact_params(params: Option<&mut Value>, schema: &StackSchema) {
    if let Some(Value::Object(map)) = params {
        for (name, value) in map.iter_mut() {
            if schema.is_masked(name) {
                *value = Value::String(REDACTED.to_string());
            }
        }
    }
}

/// Where the registries for `--registry-secret` come from
#[derive(Debug, Clone, Copy)]
pub struct PatchTarget<'a> {
    pub project_name: &'a str,
    pub registries: &'a [Registry],
}

fn check_build_inputs(
    image: Option<&str>,
    image_tag: Option<&str>,
    git_ref: Option<&str>,
    mode: Option<BuildMode>,
) -> Result<(), DeployError> {
    if git_ref.is_some() && image_tag.is_some() {
        return Err(DeployError::ConflictingBuildInputs(
            "only one of --git-ref or --image-tag can be specified, not both".to_string(),
        ));
    }
    if image.is_some() && git_ref.is_some() {
        return Err(DeployError::ConflictingBuildInputs(
            "an image cannot be combined with a git ref".to_string(),
        ));
    }
    match mode {
        Some(m) if m.is_git() && image.is_some() => Err(DeployError::ConflictingBuildInputs(format!(
            "build mode '{}' builds from git and cannot take an image",
            m
        ))),
        Some(BuildMode::Image) if git_ref.is_some() => Err(DeployError::ConflictingBuildInputs(
            "build mode 'image' cannot take a git ref".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Build the PATCH body for `apps deploy`.
///
/// Parameter overrides alone yield `{parameters}`; anything else yields a
/// single-component `{components}` patch. A component with no other input
/// is a redeploy.
pub fn synthesize(
    inputs: &DeployInputs,
    schema: &StackSchema,
    target: &PatchTarget<'_>,
) -> Result<DeploymentRequest, DeployError> {
    let image = supplied(&inputs.image_url);
    let image_tag = supplied(&inputs.image_tag);
    let git_ref = supplied(&inputs.git_ref);
    let registry_secret = supplied(&inputs.registry_secret);
    let mode = supplied(&inputs.mode)
        .map(|m| m.parse::<BuildMode>())
        .transpose()?;

    check_build_inputs(image.as_deref(), image_tag.as_deref(), git_ref.as_deref(), mode)?;

    if inputs.component.is_empty() {
        return Err(DeployError::MissingRequiredValue("component".to_string()));
    }
    if schema.component(&inputs.component).is_none() {
        return Err(DeployError::NotFound {
            kind: ResourceKind::Component,
            query: inputs.component.clone(),
        });
    }

    let registry_secret = registry_secret
        .map(|name| verify_registry(&name, target.project_name, target.registries))
        .transpose()?;

    let overrides = if inputs.params.is_empty() {
        None
    } else {
        Some(coerce_overrides(schema, &inputs.params)?)
    };

    let build_fields = git_ref.is_some() || image_tag.is_some();
    let param_only = overrides.is_some() && !build_fields && image.is_none() && mode.is_none();

    if param_only {
        if registry_secret.is_some() {
            warn!("--registry-secret is ignored for a parameter-only update");
        }
        debug!(shape = "parameter-patch", "selected request shape");
        return Ok(DeploymentRequest::ParameterPatch {
            parameters: overrides.unwrap_or_default(),
        });
    }

    let mut component = ComponentPayload::named(inputs.component.clone());

    if image.is_some() || mode.is_some() || registry_secret.is_some() {
        component.app_spec = Some(AppSpec {
            image,
            mode,
            registry_secret,
            params: if build_fields { None } else { overrides.clone() },
            ..Default::default()
        });
    }

    if build_fields {
        component.build_spec = Some(BuildSpec {
            git_ref,
            image_tag,
            params: overrides,
        });
    }

    debug!(shape = "component-patch", component = %component.name, "selected request shape");
    Ok(DeploymentRequest::ComponentPatch {
        components: vec![component],
    })
}

/// Where a new app is being created
#[derive(Debug, Clone)]
pub struct CreateTarget {
    pub cluster_uuid: String,
    pub project_uuid: String,
    pub project_name: String,
    pub namespace: String,
    pub registries: Vec<Registry>,
}

/// Assemble a creation body from already collected pieces.
pub fn synthesize_create(
    name: &str,
    parameters: &CollectedParameters,
    target: &CreateTarget,
    components: Vec<ComponentPayload>,
) -> Result<DeploymentRequest, DeployError> {
    if name.trim().is_empty() {
        return Err(DeployError::MissingRequiredValue("name".to_string()));
    }
    if target.namespace.is_empty() {
        return Err(DeployError::MissingRequiredValue("namespace".to_string()));
    }

    Ok(DeploymentRequest::Create(CreateRequest {
        name: name.to_string(),
        parameters: parameters.to_map(),
        context: DeployContext {
            cluster_uuid: target.cluster_uuid.clone(),
            project_uuid: target.project_uuid.clone(),
            namespace: target.namespace.clone(),
        },
        components,
    }))
}

/// Run the interactive create flow: parameters first, then one build
/// per `app` component, in schema order.
pub fn plan_create(
    input: &dyn UserInput,
    name: &str,
    schema: &StackSchema,
    target: &CreateTarget,
) -> Result<(CollectedParameters, DeploymentRequest), DeployError> {
    if target.namespace.is_empty() {
        return Err(DeployError::MissingRequiredValue("namespace".to_string()));
    }

    let parameters = collect_parameters(input, schema)?;

    let build_target = BuildTarget {
        app_name: name,
        project_name: &target.project_name,
        registries: &target.registries,
    };
    let mut components = Vec::new();
    for component in schema.app_components() {
        let build_input = collect_component_input(input, component, &target.registries)?;
        components.push(build(component, &build_input, &build_target)?);
    }

    let request = synthesize_create(name, &parameters, target, components)?;
    debug!(shape = request.shape(), body = %request.redacted(schema), "synthesized create request");
    Ok((parameters, request))
}
