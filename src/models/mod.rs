pub mod delivery;
pub mod degree_day;
pub mod energy;
pub mod fitted;
pub mod installation;
pub mod prediction;

pub use degree_day::{hdd_from_tmean, HeatingDegreeRecord};
pub use delivery::BiomassDelivery;
pub use energy::{DailyEnergyIncrement, EnergyReading, EnergySeries};
pub use fitted::{BiomassConversionModel, EnergyModel, ModelSet};
pub use installation::InstallationCode;
pub use prediction::{InstallationPrediction, WeekForecast, WeeklyPredictionReport};
