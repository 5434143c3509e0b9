//! The file output step and where it writes.
//!
//! [`FileOutputMeta`] is the step configuration. Its output location is a
//! [`SourceReference`](sinkpath_protocol::SourceReference) that
//! [`resolve`] turns into a concrete URL on demand, and that the persistence
//! adapter in [`source`] reads and writes in both storage shapes.

pub mod error;
pub mod field;
pub mod meta;
pub mod resolve;
pub mod resources;
pub mod source;

pub use error::{Result, StepError};
pub use field::{FieldType, OutputField, TrimType};
pub use meta::{Compression, FileFormat, FileOutputMeta};
pub use resolve::resolve;
pub use resources::load_step_resource;
pub use source::SavedSource;
