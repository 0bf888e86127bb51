use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Forecast fetch failed: {0}")]
    ForecastFetch(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Stage in which a batch failure happened, if it was tagged with one.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            ProcessingError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    LoadDegreeDays,
    LoadEnergy,
    LoadDeliveries,
    BuildModels,
    FetchForecast,
    WriteReport,
}

impl PipelineStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStage::LoadDegreeDays => "Loading heating-degree-day records",
            PipelineStage::LoadEnergy => "Loading energy readings",
            PipelineStage::LoadDeliveries => "Loading biomass deliveries",
            PipelineStage::BuildModels => "Building models",
            PipelineStage::FetchForecast => "Fetching weather forecast",
            PipelineStage::WriteReport => "Writing prediction report",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tags an error leaving a pipeline stage with that stage.
pub trait StageContext<T> {
    fn in_stage(self, stage: PipelineStage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn in_stage(self, stage: PipelineStage) -> Result<T> {
        self.map_err(|e| match e {
            // keep the innermost stage
            ProcessingError::Stage { .. } => e,
            other => ProcessingError::Stage {
                stage,
                source: Box::new(other),
            },
        })
    }
}
