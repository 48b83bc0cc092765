use thiserror::Error;

#[derive(Error, Debug)]
pub enum KpiError {
    #[error("missing required setting: {0}")]
    MissingSetting(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("failed to write table {table}: {reason}")]
    SinkWrite { table: String, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KpiError {
    /// Configuration problems are detected before any data is read.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            KpiError::MissingSetting(_) | KpiError::ConfigParse(_) | KpiError::Toml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KpiError>;
