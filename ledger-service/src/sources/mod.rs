pub mod csv_file;
pub mod rows;

pub use csv_file::{CsvRow, CsvSource};
pub use rows::{BuildingRow, UnitRow, UsageRow};
