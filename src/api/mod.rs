//! Control-plane API access

pub mod client;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use client::{ApiClient, ControlPlane};
#[cfg(test)]
pub use mock::{MockControlPlane, RecordedCall};
