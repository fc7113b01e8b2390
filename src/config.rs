use crate::error::{BankRatioError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on `forecast_horizon`, in years.
pub const MAX_FORECAST_HORIZON: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    #[schemars(description = "Records reported before this year are dropped after deduplication.")]
    pub min_year: i32,

    #[schemars(description = "Write-off figures are reported in millions; this scales them to base units.")]
    pub writeoff_scale: f64,

    #[schemars(description = "Write-off rows listed on these exchanges are ignored.")]
    pub excluded_exchanges: Vec<String>,

    #[schemars(description = "Number of years after the latest reported full year that forecast entries may cover.")]
    pub forecast_horizon: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_year: 2018,
            writeoff_scale: 1_000_000.0,
            excluded_exchanges: vec!["OTC".to_string()],
            forecast_horizon: 2,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BankRatioError::MissingInput(path.display().to_string()));
        }
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.writeoff_scale.is_finite() || self.writeoff_scale <= 0.0 {
            return Err(BankRatioError::InvalidConfig(format!(
                "writeoff_scale must be a positive number, got {}",
                self.writeoff_scale
            )));
        }
        if self.forecast_horizon == 0 || self.forecast_horizon > MAX_FORECAST_HORIZON {
            return Err(BankRatioError::InvalidConfig(format!(
                "forecast_horizon must be between 1 and {}, got {}",
                MAX_FORECAST_HORIZON, self.forecast_horizon
            )));
        }
        Ok(())
    }

    pub fn is_excluded_exchange(&self, exchange: &str) -> bool {
        self.excluded_exchanges
            .iter()
            .any(|e| e.eq_ignore_ascii_case(exchange.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_year, 2018);
        assert_eq!(config.writeoff_scale, 1_000_000.0);
        assert!(config.is_excluded_exchange("OTC"));
        assert!(!config.is_excluded_exchange("HOSE"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = PipelineConfig::from_json_str(r#"{ "min_year": 2020 }"#).unwrap();
        assert_eq!(config.min_year, 2020);
        assert_eq!(config.forecast_horizon, 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{ "writeoff_scale": 0.0 }"#),
            Err(BankRatioError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{ "forecast_horizon": 0 }"#),
            Err(BankRatioError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{ "forecast_horizon": 2147483647 }"#),
            Err(BankRatioError::InvalidConfig(_))
        ));
        assert!(PipelineConfig::from_json_str(r#"{ "forecast_horizon": 100 }"#).is_ok());
        assert!(matches!(
            PipelineConfig::from_json_file("/nonexistent/pipeline.json"),
            Err(BankRatioError::MissingInput(_))
        ));
    }
}
