pub mod ledger;

pub use ledger::{BuildingSink, UnitSink, UsageSink};
