//! Sampling and derivation layer.
//!
//! Data flows one way: `source` → `metrics` → `registry` → `collector`.

pub mod collector;
pub mod error;
pub mod metrics;
pub mod platform;
pub mod process;
pub mod registry;
pub mod sampler;
pub mod snapshot;
pub mod source;
pub mod users;

pub use collector::Collector;
pub use error::SourceError;
pub use snapshot::SystemSnapshot;
pub use source::ProcPaths;
