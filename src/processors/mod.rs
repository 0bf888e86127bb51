pub mod forecaster;
pub mod integrity_checker;
pub mod model_builder;
pub mod pipeline;
pub mod series_transformer;

pub use forecaster::{predict_biomass, predict_installations, predict_week_energy};
pub use integrity_checker::{
    DegreeDayStatistics, InstallationStatistics, IntegrityChecker, IntegrityReport,
};
pub use model_builder::{fit_linear, ModelBuilder};
pub use pipeline::{InputData, Pipeline};
pub use series_transformer::{group_by_week, series_to_map, to_daily_increments};
