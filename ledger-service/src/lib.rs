pub mod aggregation;
pub mod alerts;
pub mod auth;
pub mod billing;
pub mod config;
pub mod export;
pub mod importer;
pub mod observability;
pub mod pipeline;
pub mod recorder;
pub mod reports;
pub mod sinks;
pub mod sources;

pub use importer::{ImportKind, Importer};
pub use pipeline::{Envelope, Pipeline};
