use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankRatioError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid entity id '{0}': expected a 3-character bank ticker or a sector label")]
    InvalidEntityId(String),

    #[error("Invalid period length {0}: must be between 1 and 5")]
    InvalidPeriodLength(u8),

    #[error("Invalid period label: {0}")]
    InvalidPeriodLabel(String),

    #[error("Series for {entity} mixes quarterly and yearly records")]
    MixedPeriodKinds { entity: String },

    #[error("Entity {0} has no periods after aggregation")]
    EmptyEntity(String),

    #[error("Duplicate period {period_key} for entity {entity}")]
    DuplicatePeriod { entity: String, period_key: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error in {source_name} at row {row}: {details}")]
    Parse {
        source_name: String,
        row: usize,
        details: String,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BankRatioError>;
