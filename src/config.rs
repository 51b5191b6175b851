//! Store configuration.

use serde::Deserialize;

use crate::error::{Result, StoreError};

/// Paging limits applied by [`Repository::query`](crate::Repository::query).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Page size used when a query does not name one.
    pub default_limit: usize,
    /// Largest page size a query may request.
    pub max_limit: usize,
    /// Largest offset a query may request.
    pub max_offset: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 500,
            max_offset: 10_000,
        }
    }
}

impl StoreConfig {
    /// Reject configurations that could never serve a query.
    pub fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            return Err(StoreError::Configuration("maxLimit must be positive".into()));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(StoreError::Configuration(format!(
                "defaultLimit must be between 1 and {}",
                self.max_limit
            )));
        }
        Ok(())
    }

    /// Resolve the requested paging window against the configured bounds.
    pub fn page(&self, limit: Option<usize>, offset: Option<usize>) -> Result<(usize, usize)> {
        let limit = limit.unwrap_or(self.default_limit);
        if limit == 0 || limit > self.max_limit {
            return Err(StoreError::invalid_input(format!(
                "limit must be between 1 and {}, got {}",
                self.max_limit, limit
            )));
        }
        let offset = offset.unwrap_or(0);
        if offset > self.max_offset {
            return Err(StoreError::invalid_input(format!(
                "offset must not exceed {}, got {}",
                self.max_offset, offset
            )));
        }
        Ok((limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StoreConfig::default();
        config.validate().unwrap();
        assert_eq!(config.page(None, None).unwrap(), (20, 0));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: StoreConfig = serde_json::from_str(r#"{"defaultLimit": 5}"#).unwrap();
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.max_limit, 500);
    }

    #[test]
    fn rejects_out_of_range_paging() {
        let config = StoreConfig::default();
        assert!(matches!(
            config.page(Some(0), None),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            config.page(Some(501), None),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            config.page(None, Some(10_001)),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_default_above_max() {
        let config = StoreConfig {
            default_limit: 50,
            max_limit: 10,
            max_offset: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(StoreError::Configuration(_))
        ));
    }
}
