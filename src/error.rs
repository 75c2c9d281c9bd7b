//! Error types for deployment resolution and synthesis

use thiserror::Error;

use crate::deploy::ResourceKind;

/// Failures raised by the resolver, coercer, collector, builder and synthesizer.
///
/// Command handlers carry these inside `anyhow::Error`, so callers can still
/// `downcast_ref::<DeployError>()` to decide on exit codes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeployError {
    #[error("{kind} not found: {query}")]
    NotFound { kind: ResourceKind, query: String },

    #[error("a value is required for {0}")]
    MissingRequiredValue(String),

    #[error("invalid number for {name}: {raw:?}")]
    InvalidNumber { name: String, raw: String },

    #[error("conflicting build inputs: {0}")]
    ConflictingBuildInputs(String),

    #[error("registry secret '{name}' not found in project '{project}'")]
    RegistryNotFound { name: String, project: String },

    #[error("invalid --param format, expected key=value: {0}")]
    MalformedOverride(String),

    #[error("unknown build mode '{0}' (expected image, buildpack or dockerfile)")]
    UnknownBuildMode(String),

    #[error("{0} context must be set. Use 'kubenest context set-{0} <{0}>' first or pass --{0}")]
    MissingContext(&'static str),

    #[error("operation aborted by user")]
    Aborted,

    #[error("request cancelled: {0}")]
    Cancelled(String),

    #[error("request rejected by control plane (status {status}): {}", remote_detail(.error, .code, .description))]
    RemoteRejected {
        status: u16,
        error: String,
        code: String,
        description: String,
    },

    #[error("prompt failed: {0}")]
    Prompt(String),
}

fn remote_detail(error: &str, code: &str, description: &str) -> String {
    let mut detail = error.to_string();
    if !code.is_empty() {
        detail.push_str(&format!(" (code: {})", code));
    }
    if !description.is_empty() {
        detail.push_str(&format!(", description: {}", description));
    }
    detail
}

impl DeployError {
    /// Recover the typed error from a prompt-layer failure, or wrap it.
    pub fn from_prompt(err: anyhow::Error) -> Self {
        match err.downcast::<DeployError>() {
            Ok(typed) => typed,
            Err(other) => DeployError::Prompt(format!("{:#}", other)),
        }
    }

    /// True when the user or a deadline stopped the operation.
    pub fn is_interruption(&self) -> bool {
        matches!(self, DeployError::Aborted | DeployError::Cancelled(_))
    }
}

/// Exit status for a failed invocation.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DeployError>() {
        Some(typed) if typed.is_interruption() => 130,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_kind_and_query() {
        let err = DeployError::NotFound {
            kind: ResourceKind::Cluster,
            query: "prod-eu".to_string(),
        };
        assert_eq!(err.to_string(), "cluster not found: prod-eu");
    }

    #[test]
    fn test_remote_rejected_carries_server_fields() {
        let err = DeployError::RemoteRejected {
            status: 422,
            error: "invalid payload".to_string(),
            code: "4221".to_string(),
            description: "imageTag is required".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("invalid payload"));
        assert!(message.contains("code: 4221"));
        assert!(message.contains("imageTag is required"));
    }

    #[test]
    fn test_from_prompt_keeps_abort() {
        let err = anyhow::Error::new(DeployError::Aborted);
        assert_eq!(DeployError::from_prompt(err), DeployError::Aborted);

        let other = anyhow::anyhow!("terminal is not interactive");
        assert!(matches!(DeployError::from_prompt(other), DeployError::Prompt(_)));
    }

    #[test]
    fn test_exit_code_for_interruptions() {
        assert_eq!(exit_code(&anyhow::Error::new(DeployError::Aborted)), 130);
        assert_eq!(
            exit_code(&anyhow::Error::new(DeployError::Cancelled("deadline".into()))),
            130
        );
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
