pub mod billing;
pub mod building;
pub mod money;
pub mod usage;
pub mod user;

pub use billing::{exceeds_threshold, AlertRecord, BillLineItem};
pub use building::{Building, Unit};
pub use usage::{Period, UsageRecord};
pub use user::{Role, UserRecord};

pub type BuildingId = i64;
pub type UnitId = i64;
