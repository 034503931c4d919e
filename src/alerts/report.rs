//! Report submission form.

use super::feed::AlertStore;
use super::storage::KeyValueStore;
use super::{Alert, AlertError};
use serde::Deserialize;
use thiserror::Error;

/// Validation failures for a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("product name is required")]
    MissingProductName,
    #[error("location is required")]
    MissingLocation,
}

/// Fields of the "Submit a Report" form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportForm {
    pub product_name: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ReportForm {
    pub fn new(product_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            location: location.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Product name and location must be non-blank.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.product_name.trim().is_empty() {
            return Err(ReportError::MissingProductName);
        }
        if self.location.trim().is_empty() {
            return Err(ReportError::MissingLocation);
        }
        Ok(())
    }

    /// Validates and appends the report to the feed.
    pub fn submit<S: KeyValueStore>(self, store: &mut AlertStore<S>) -> Result<Alert, AlertError> {
        self.validate()?;
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            tracing::debug!(description, "Report description");
        }
        store
            .add_alert(self.product_name.trim(), self.location.trim())
            .cloned()
    }
}
