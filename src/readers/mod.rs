pub mod degree_day_reader;
pub mod delivery_reader;
pub mod energy_reader;
pub mod report;
pub mod workbook;

pub use degree_day_reader::DegreeDayReader;
pub use delivery_reader::DeliveryReader;
pub use energy_reader::EnergyReader;
pub use report::{Loaded, ReadReport, SkipReason};
pub use workbook::Workbook;
