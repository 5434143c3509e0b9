//! Cluster definitions and everything that turns one into a concrete URL.
//!
//! - [`ClusterDefinition`]: the one capability the resolver relies on,
//!   plus embedding support.
//! - [`NamedCluster`]: the concrete Hadoop-style definition.
//! - [`substitution`]: applying a definition to a raw URL.
//! - [`codec`]: inline XML copies of a definition.
//! - [`registry`]: lookup by name.

pub mod codec;
pub mod definition;
pub mod error;
pub mod named_cluster;
pub mod registry;
pub mod substitution;

pub use codec::{decode, decode_with_tag, encode};
pub use definition::{ClusterDefinition, ClusterLookupResult};
pub use error::{ClusterError, Result};
pub use named_cluster::NamedCluster;
pub use registry::{ClusterRegistry, FileRegistry, InMemoryRegistry};
pub use substitution::substitute;
