//! Shared data model for resolving where a data-sink step writes.
//!
//! A step configuration carries a [`SourceReference`]: the raw URL the user
//! typed plus either the name of a registered cluster or an embedded copy of
//! the cluster definition. Resolution against a [`ResolutionContext`] happens
//! in `sinkpath_step`; this crate only holds the types and the two storage
//! shapes (XML nodes and flat step attributes) they persist to.

pub mod attributes;
pub mod config;
pub mod error;
pub mod paths;
pub mod types;
pub mod xml;

pub use attributes::{AttributeRecord, InMemoryAttributeStore, ObjectId, StepAttributeStore};
pub use config::SystemConfig;
pub use error::{AttributeError, ConfigError, XmlError};
pub use types::{
    MetaStoreHandle, ResolutionContext, SourceReference, VariableSpace, FILE_NAME_ATTRIBUTE,
    FILE_TAG, NAMED_CLUSTER_TAG, NAME_TAG, SOURCE_CONFIGURATION_NAME,
};
pub use xml::XmlNode;
