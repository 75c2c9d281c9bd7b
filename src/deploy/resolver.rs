//! Name-or-UUID resolution over server-returned candidate lists.
//!
//! Every lookup is a linear scan of an in-memory slice: exact `uuid` match
//! first, then exact `name` match, first hit in list order wins. No caching
//! and no partial or case-insensitive matching. Duplicate names are not
//! rejected; the earliest entry in server order is returned.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::types::StackDeployApp;
use crate::error::DeployError;

/// Kind of resource being looked up, used in user-facing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Team,
    Cluster,
    Project,
    Registry,
    Stack,
    App,
    Component,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Team => "team",
            ResourceKind::Cluster => "cluster",
            ResourceKind::Project => "project",
            ResourceKind::Registry => "registry",
            ResourceKind::Stack => "stack",
            ResourceKind::App => "app",
            ResourceKind::Component => "component",
        };
        f.write_str(label)
    }
}

/// Anything addressable by UUID or display name
pub trait Identified {
    fn uuid(&self) -> &str;
    fn name(&self) -> &str;
}

/// Find the candidate matching `query`, UUID matches taking precedence over names.
pub fn resolve_entry<'a, T: Identified>(
    kind: ResourceKind,
    query: &str,
    candidates: &'a [T],
) -> Result<&'a T, DeployError> {
    let found = candidates
        .iter()
        .find(|c| c.uuid() == query)
        .or_else(|| candidates.iter().find(|c| c.name() == query));

    match found {
        Some(entry) => {
            debug!(%kind, query, uuid = entry.uuid(), "resolved identifier");
            Ok(entry)
        }
        None => Err(DeployError::NotFound {
            kind,
            query: query.to_string(),
        }),
    }
}

/// Resolve `query` to the UUID of a matching candidate.
pub fn resolve<T: Identified>(
    kind: ResourceKind,
    query: &str,
    candidates: &[T],
) -> Result<String, DeployError> {
    resolve_entry(kind, query, candidates).map(|entry| entry.uuid().to_string())
}

/// Filters applied when looking an app up by name
#[derive(Debug, Clone, Default)]
pub struct AppFilter<'a> {
    pub cluster_uuid: Option<&'a str>,
    pub project_uuid: Option<&'a str>,
}

/// Find an app by UUID or name, skipping apps outside the active cluster/project.
pub fn find_app<'a>(
    query: &str,
    apps: &'a [StackDeployApp],
    filter: &AppFilter<'_>,
) -> Result<&'a StackDeployApp, DeployError> {
    let in_scope: Vec<&StackDeployApp> = apps
        .iter()
        .filter(|app| filter.cluster_uuid.is_none_or(|c| app.cluster.uuid == c))
        .filter(|app| filter.project_uuid.is_none_or(|p| app.project.uuid == p))
        .collect();

    in_scope
        .iter()
        .find(|app| app.uuid == query)
        .or_else(|| in_scope.iter().find(|app| app.name == query))
        .copied()
        .ok_or_else(|| DeployError::NotFound {
            kind: ResourceKind::App,
            query: query.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{NamedRef, Team};

    fn team(uuid: &str, name: &str) -> Team {
        Team {
            uuid: uuid.to_string(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn app(uuid: &str, name: &str, cluster: &str, project: &str) -> StackDeployApp {
        StackDeployApp {
            uuid: uuid.to_string(),
            name: name.to_string(),
            cluster: NamedRef {
                uuid: cluster.to_string(),
                name: format!("{}-name", cluster),
            },
            project: NamedRef {
                uuid: project.to_string(),
                name: format!("{}-name", project),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_by_uuid_and_name() {
        let teams = vec![team("t-1", "platform"), team("t-2", "payments")];

        assert_eq!(resolve(ResourceKind::Team, "t-2", &teams).unwrap(), "t-2");
        assert_eq!(resolve(ResourceKind::Team, "platform", &teams).unwrap(), "t-1");
    }

    #[test]
    fn test_uuid_match_beats_earlier_name_match() {
        // A team named like another team's UUID must not shadow the UUID match.
        let teams = vec![team("t-1", "t-2"), team("t-2", "payments")];
        assert_eq!(resolve(ResourceKind::Team, "t-2", &teams).unwrap(), "t-2");
    }

    #[test]
    fn test_duplicate_names_take_first_in_list_order() {
        let teams = vec![team("t-1", "dup"), team("t-2", "dup")];
        assert_eq!(resolve(ResourceKind::Team, "dup", &teams).unwrap(), "t-1");
    }

    #[test]
    fn test_resolution_is_exact() {
        let teams = vec![team("t-1", "Platform")];

        let err = resolve(ResourceKind::Team, "platform", &teams).unwrap_err();
        assert_eq!(
            err,
            DeployError::NotFound {
                kind: ResourceKind::Team,
                query: "platform".to_string()
            }
        );
        assert!(resolve(ResourceKind::Team, "Plat", &teams).is_err());
        assert!(resolve(ResourceKind::Team, "", &teams).is_err());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let teams = vec![team("t-1", "platform"), team("t-2", "payments")];
        let first = resolve(ResourceKind::Team, "payments", &teams).unwrap();
        let second = resolve(ResourceKind::Team, "payments", &teams).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_empty_candidates() {
        let teams: Vec<Team> = Vec::new();
        let err = resolve(ResourceKind::Registry, "ghcr", &teams).unwrap_err();
        assert_eq!(err.to_string(), "registry not found: ghcr");
    }

    #[test]
    fn test_find_app_honours_filters() {
        let apps = vec![
            app("a-1", "shop", "c-1", "p-1"),
            app("a-2", "shop", "c-2", "p-2"),
        ];

        let unfiltered = find_app("shop", &apps, &AppFilter::default()).unwrap();
        assert_eq!(unfiltered.uuid, "a-1");

        let filter = AppFilter {
            cluster_uuid: Some("c-2"),
            project_uuid: None,
        };
        assert_eq!(find_app("shop", &apps, &filter).unwrap().uuid, "a-2");

        let filter = AppFilter {
            cluster_uuid: None,
            project_uuid: Some("p-9"),
        };
        assert!(find_app("shop", &apps, &filter).is_err());
    }

    #[test]
    fn test_find_app_by_uuid() {
        let apps = vec![app("a-1", "shop", "c-1", "p-1")];
        assert_eq!(find_app("a-1", &apps, &AppFilter::default()).unwrap().name, "shop");
    }
}
