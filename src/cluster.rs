//! In-cluster access for app pods: log streaming and exec.
//!
//! The control plane hands out a per-project kubeconfig. It is decoded and
//! parsed in memory and never written to disk. Pods are selected with the
//! `release=<stack name>` label the control plane puts on everything it
//! installs for an app.

use std::fmt;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::{AsyncBufReadExt, StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams, ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::api::types::KubeconfigResponse;

pub const DEFAULT_TAIL: u32 = 100;

/// Decoded kubeconfig document plus the namespace it grants
#[derive(Clone, PartialEq)]
pub struct ClusterAccess {
    pub kubeconfig: String,
    pub namespace: String,
}

impl fmt::Debug for ClusterAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterAccess")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl ClusterAccess {
    /// Decode the control plane's base64 kubeconfig.
    pub fn decode(response: &KubeconfigResponse) -> Result<Self> {
        let bytes = STANDARD
            .decode(response.kubeconfig.trim())
            .context("Failed to decode kubeconfig")?;
        let kubeconfig = String::from_utf8(bytes).context("Kubeconfig is not valid UTF-8")?;
        Ok(Self {
            kubeconfig,
            namespace: response.namespace.clone(),
        })
    }
}

/// A pod and the containers declared in its spec
#[derive(Debug, Clone, PartialEq)]
pub struct PodInfo {
    pub name: String,
    pub containers: Vec<String>,
}

/// One container whose log lines are streamed
#[derive(Debug, Clone, PartialEq)]
pub struct LogTarget {
    pub pod: String,
    pub container: String,
}

impl LogTarget {
    /// Every container of every pod, in listing order
    pub fn all(pods: &[PodInfo]) -> Vec<LogTarget> {
        pods.iter()
            .flat_map(|pod| {
                pod.containers.iter().map(|container| LogTarget {
                    pod: pod.name.clone(),
                    container: container.clone(),
                })
            })
            .collect()
    }

    pub fn prefix(&self) -> String {
        format!("[pod/{}/{}]", self.pod, self.container)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogOptions {
    pub follow: bool,
    /// Lines of history per container; `None` sends the whole log
    pub tail: Option<u32>,
}

impl LogOptions {
    /// Without `--tail` a snapshot shows the last `DEFAULT_TAIL` lines and
    /// following starts from the beginning of the log.
    pub fn new(follow: bool, tail: Option<u32>) -> Self {
        let tail = match tail {
            Some(lines) => Some(lines),
            None if follow => None,
            None => Some(DEFAULT_TAIL),
        };
        Self { follow, tail }
    }
}

/// Pod operations within the namespace of one project
pub trait PodClient {
    fn list_pods(&self, selector: &str) -> Result<Vec<PodInfo>>;

    /// Stream prefixed log lines of `targets` into `on_line`. Streams of
    /// different containers are interleaved as lines arrive.
    fn stream_logs(&self, targets: &[LogTarget], options: LogOptions, on_line: &mut dyn FnMut(&str)) -> Result<()>;

    /// Run `command` attached to the terminal and return its exit code.
    fn exec(&self, pod: &str, container: Option<&str>, command: &[String]) -> Result<i32>;
}

/// Opens a `PodClient` from project credentials, allowing for mocking in tests
pub trait ClusterConnector: Send + Sync {
    fn connect(&self, access: &ClusterAccess) -> Result<Box<dyn PodClient>>;
}

pub fn release_selector(stack_name: &str) -> String {
    format!("release={}", stack_name)
}

pub fn shell_command(command: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), command.to_string()]
}

/// Exit code carried by the status the API server sends when an exec ends
pub fn exit_code_from_status(status: Option<&Status>) -> i32 {
    let Some(status) = status else {
        return 0;
    };
    if status.status.as_deref() == Some("Success") {
        return 0;
    }
    status
        .details
        .as_ref()
        .and_then(|details| details.causes.as_ref())
        .and_then(|causes| {
            causes
                .iter()
                .find(|cause| cause.reason.as_deref() == Some("ExitCode"))
                .and_then(|cause| cause.message.as_deref())
                .and_then(|message| message.trim().parse::<i32>().ok())
        })
        .unwrap_or(1)
}

/// kube-rs backed connector
pub struct KubeConnector;

impl ClusterConnector for KubeConnector {
    fn connect(&self, access: &ClusterAccess) -> Result<Box<dyn PodClient>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let kubeconfig = Kubeconfig::from_yaml(&access.kubeconfig).context("Failed to parse kubeconfig")?;

        let client = runtime.block_on(async {
            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Kubeconfig is incomplete")?;
            Client::try_from(config).context("Failed to create cluster client")
        })?;
        debug!(namespace = %access.namespace, "cluster client ready");

        Ok(Box::new(KubePods {
            pods: Api::namespaced(client, &access.namespace),
            runtime: Some(runtime),
        }))
    }
}

struct KubePods {
    pods: Api<Pod>,
    runtime: Option<Runtime>,
}

impl KubePods {
    fn runtime(&self) -> Result<&Runtime> {
        self.runtime
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Cluster client has been shut down"))
    }
}

impl Drop for KubePods {
    fn drop(&mut self) {
        // A stdin reader left behind by exec must not block shutdown
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl PodClient for KubePods {
    fn list_pods(&self, selector: &str) -> Result<Vec<PodInfo>> {
        let params = ListParams::default().labels(selector);
        let list = self
            .runtime()?
            .block_on(self.pods.list(&params))
            .with_context(|| format!("Failed to list pods for {}", selector))?;

        Ok(list
            .items
            .into_iter()
            .map(|pod| PodInfo {
                name: pod.metadata.name.unwrap_or_default(),
                containers: pod
                    .spec
                    .map(|spec| spec.containers.into_iter().map(|c| c.name).collect())
                    .unwrap_or_default(),
            })
            .collect())
    }

    fn stream_logs(&self, targets: &[LogTarget], options: LogOptions, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        self.runtime()?.block_on(async {
            let mut streams = Vec::with_capacity(targets.len());
            for target in targets {
                let params = LogParams {
                    container: Some(target.container.clone()),
                    follow: options.follow,
                    tail_lines: options.tail.map(i64::from),
                    ..LogParams::default()
                };
                let reader = self
                    .pods
                    .log_stream(&target.pod, &params)
                    .await
                    .with_context(|| format!("Failed to read logs of {}", target.prefix()))?;
                let prefix = target.prefix();
                streams.push(
                    reader
                        .lines()
                        .map_ok(move |line| format!("{} {}", prefix, line))
                        .boxed_local(),
                );
            }

            let mut merged = futures::stream::select_all(streams);
            while let Some(line) = merged.next().await {
                on_line(&line.context("Log stream failed")?);
            }
            Ok(())
        })
    }

    fn exec(&self, pod: &str, container: Option<&str>, command: &[String]) -> Result<i32> {
        let mut params = AttachParams::interactive_tty();
        if let Some(container) = container {
            params = params.container(container);
        }

        self.runtime()?.block_on(async {
            let mut attached = self
                .pods
                .exec(pod, command.to_vec(), &params)
                .await
                .with_context(|| format!("Failed to exec in pod {}", pod))?;
            let status = attached.take_status();

            let input = attached.stdin().map(|mut remote| {
                tokio::spawn(async move {
                    let mut stdin = tokio::io::stdin();
                    let _ = tokio::io::copy(&mut stdin, &mut remote).await;
                })
            });
            let output = attached.stdout().map(|mut remote| {
                tokio::spawn(async move {
                    let mut stdout = tokio::io::stdout();
                    let _ = tokio::io::copy(&mut remote, &mut stdout).await;
                    let _ = stdout.flush().await;
                })
            });

            let status = match status {
                Some(status) => status.await,
                None => None,
            };
            if let Some(output) = output {
                let _ = output.await;
            }
            if let Some(input) = input {
                input.abort();
            }
            Ok(exit_code_from_status(status.as_ref()))
        })
    }
}

#[cfg(test)]
pub use mock::{ExecCall, MockCluster};

#[cfg(test)]
mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub struct ExecCall {
        pub pod: String,
        pub container: Option<String>,
        pub command: Vec<String>,
    }

    #[derive(Default)]
    struct State {
        pods: Vec<PodInfo>,
        logs: HashMap<String, Vec<String>>,
        exit_code: i32,
        connections: Vec<ClusterAccess>,
        selectors: Vec<String>,
        log_requests: Vec<(Vec<LogTarget>, LogOptions)>,
        execs: Vec<ExecCall>,
    }

    /// In-memory cluster with canned pods and log lines
    #[derive(Default, Clone)]
    pub struct MockCluster {
        state: Arc<Mutex<State>>,
    }

    impl MockCluster {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_pod(self, name: &str, containers: &[&str]) -> Self {
            self.state.lock().unwrap().pods.push(PodInfo {
                name: name.to_string(),
                containers: containers.iter().map(|c| c.to_string()).collect(),
            });
            self
        }

        /// Lines returned for `pod`'s `container`, unprefixed
        pub fn with_logs(self, pod: &str, container: &str, lines: &[&str]) -> Self {
            self.state.lock().unwrap().logs.insert(
                format!("{}/{}", pod, container),
                lines.iter().map(|l| l.to_string()).collect(),
            );
            self
        }

        pub fn with_exit_code(self, code: i32) -> Self {
            self.state.lock().unwrap().exit_code = code;
            self
        }

        pub fn connections(&self) -> Vec<ClusterAccess> {
            self.state.lock().unwrap().connections.clone()
        }

        pub fn selectors(&self) -> Vec<String> {
            self.state.lock().unwrap().selectors.clone()
        }

        pub fn log_requests(&self) -> Vec<(Vec<LogTarget>, LogOptions)> {
            self.state.lock().unwrap().log_requests.clone()
        }

        pub fn execs(&self) -> Vec<ExecCall> {
            self.state.lock().unwrap().execs.clone()
        }
    }

    impl ClusterConnector for MockCluster {
        fn connect(&self, access: &ClusterAccess) -> Result<Box<dyn PodClient>> {
            self.state.lock().unwrap().connections.push(access.clone());
            Ok(Box::new(self.clone()))
        }
    }

    impl PodClient for MockCluster {
        fn list_pods(&self, selector: &str) -> Result<Vec<PodInfo>> {
            let mut state = self.state.lock().unwrap();
            state.selectors.push(selector.to_string());
            Ok(state.pods.clone())
        }

        fn stream_logs(&self, targets: &[LogTarget], options: LogOptions, on_line: &mut dyn FnMut(&str)) -> Result<()> {
            let lines: Vec<String> = {
                let mut state = self.state.lock().unwrap();
                state.log_requests.push((targets.to_vec(), options));
                targets
                    .iter()
                    .flat_map(|target| {
                        let key = format!("{}/{}", target.pod, target.container);
                        let prefix = target.prefix();
                        state
                            .logs
                            .get(&key)
                            .cloned()
                            .unwrap_or_default()
                            .into_iter()
                            .map(move |line| format!("{} {}", prefix, line))
                    })
                    .collect()
            };
            for line in &lines {
                on_line(line);
            }
            Ok(())
        }

        fn exec(&self, pod: &str, container: Option<&str>, command: &[String]) -> Result<i32> {
            let mut state = self.state.lock().unwrap();
            state.execs.push(ExecCall {
                pod: pod.to_string(),
                container: container.map(str::to_string),
                command: command.to_vec(),
            });
            Ok(state.exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{StatusCause, StatusDetails};

    #[test]
    fn test_decode_keeps_document_in_memory() {
        let response = KubeconfigResponse {
            kubeconfig: STANDARD.encode("apiVersion: v1\nkind: Config\n"),
            namespace: "shop".to_string(),
        };

        let access = ClusterAccess::decode(&response).unwrap();
        assert_eq!(access.kubeconfig, "apiVersion: v1\nkind: Config\n");
        assert_eq!(access.namespace, "shop");
        assert!(!format!("{:?}", access).contains("apiVersion"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let response = KubeconfigResponse {
            kubeconfig: "not base64!".to_string(),
            namespace: "shop".to_string(),
        };
        assert!(ClusterAccess::decode(&response).is_err());
    }

    #[test]
    fn test_log_targets_cover_every_container() {
        let pods = vec![
            PodInfo {
                name: "web-1".into(),
                containers: vec!["app".into(), "proxy".into()],
            },
            PodInfo {
                name: "web-2".into(),
                containers: vec!["app".into()],
            },
        ];

        let targets = LogTarget::all(&pods);
        let prefixes: Vec<String> = targets.iter().map(LogTarget::prefix).collect();
        assert_eq!(prefixes, vec!["[pod/web-1/app]", "[pod/web-1/proxy]", "[pod/web-2/app]"]);
    }

    #[test]
    fn test_log_options_tail() {
        assert_eq!(LogOptions::new(false, None).tail, Some(DEFAULT_TAIL));
        assert_eq!(LogOptions::new(true, None).tail, None);
        assert_eq!(LogOptions::new(true, Some(20)).tail, Some(20));
        assert_eq!(LogOptions::new(false, Some(5)).tail, Some(5));
    }

    #[test]
    fn test_selector_and_shell_command() {
        assert_eq!(release_selector("web-stack"), "release=web-stack");
        assert_eq!(shell_command("ls /srv"), vec!["sh", "-c", "ls /srv"]);
    }

    fn failure(cause: Option<(&str, &str)>) -> Status {
        Status {
            status: Some("Failure".to_string()),
            details: cause.map(|(reason, message)| StatusDetails {
                causes: Some(vec![StatusCause {
                    reason: Some(reason.to_string()),
                    message: Some(message.to_string()),
                    ..StatusCause::default()
                }]),
                ..StatusDetails::default()
            }),
            ..Status::default()
        }
    }

    #[test]
    fn test_exit_code_from_status() {
        let success = Status {
            status: Some("Success".to_string()),
            ..Status::default()
        };
        assert_eq!(exit_code_from_status(Some(&success)), 0);
        assert_eq!(exit_code_from_status(None), 0);
        assert_eq!(exit_code_from_status(Some(&failure(Some(("ExitCode", "42"))))), 42);
        assert_eq!(exit_code_from_status(Some(&failure(None))), 1);
        assert_eq!(exit_code_from_status(Some(&failure(Some(("NonZeroExitCode", "x"))))), 1);
    }
}
