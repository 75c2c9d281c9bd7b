//! Deployment configuration resolution.
//!
//! Turns a stack schema plus partial user input (prompts or flags) into the
//! request body the control plane accepts. Data flows one way: `resolver`
//! and `coerce` feed `collector` and `builder`, which feed `synthesizer`.

pub mod builder;
pub mod coerce;
pub mod collector;
pub mod resolver;
pub mod schema;
pub mod synthesizer;

pub use resolver::{AppFilter, Identified, ResourceKind, find_app, resolve, resolve_entry};
pub use schema::StackSchema;
pub use synthesizer::{CreateTarget, DeployInputs, DeploymentRequest, PatchTarget, plan_create, synthesize};
