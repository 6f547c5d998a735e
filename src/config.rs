use crate::domain::payment::{DEFAULT_PAYMENT_METHOD, PaymentRequest};
use crate::error::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings handed to the services at construction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub payments: PaymentConfig,
}

impl Config {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Printed on every receipt.
    pub merchant_info: String,
    pub remarks: String,
    /// Used when a request carries no payment method.
    pub default_payment_method: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            merchant_info: "Smart Parking Management System".to_string(),
            remarks: "Thank you for your payment!".to_string(),
            default_payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
        }
    }
}

impl PaymentConfig {
    pub fn payment_method_for(&self, request: &PaymentRequest) -> String {
        request
            .payment_method
            .clone()
            .unwrap_or_else(|| self.default_payment_method.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"payments": {{"merchant_info": "City Car Park"}}}}"#).unwrap();

        let config = Config::from_path(file.path()).unwrap();
        assert_eq!(config.payments.merchant_info, "City Car Park");
        assert_eq!(config.payments.remarks, "Thank you for your payment!");
        assert_eq!(config.payments.default_payment_method, "CARD");
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let result = Config::from_path("does/not/exist.json");
        assert!(matches!(result, Err(crate::error::ParkingError::Io(_))));
    }
}
