#![forbid(unsafe_code)]

//! Error types.
//!
//! None of these are fatal to the page. [`SetupError`] explains why one
//! feature was skipped during [`Engine::new`](crate::engine::Engine::new);
//! [`ConfigError`] is returned by the config loaders.

/// Why a feature could not be wired on this page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// Nothing on the page matches the feature's selector.
    #[error("no element matches `{selector}`")]
    Missing { selector: String },

    /// A required data attribute is absent.
    #[error("element is missing the `{attribute}` attribute")]
    MissingAttribute { attribute: String },

    /// A data attribute could not be parsed.
    #[error("attribute `{attribute}` has invalid value {value:?}")]
    InvalidAttribute { attribute: String, value: String },

    /// The host refused to create an element.
    #[error("host could not create a <{tag}> element")]
    CreateFailed { tag: String },
}

impl SetupError {
    pub fn missing(selector: &str) -> Self {
        Self::Missing {
            selector: selector.to_owned(),
        }
    }

    pub fn missing_attribute(attribute: &str) -> Self {
        Self::MissingAttribute {
            attribute: attribute.to_owned(),
        }
    }

    pub fn invalid_attribute(attribute: &str, value: &str) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn create_failed(tag: &str) -> Self {
        Self::CreateFailed {
            tag: tag.to_owned(),
        }
    }

    /// True when the page simply does not use the feature.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// Failure to load or validate an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[cfg(feature = "config")]
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "config")]
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("key sequence must not be empty")]
    EmptyKeySequence,

    #[error("`{field}` must be at most 1000 per-mille, got {value}")]
    ThresholdOutOfRange { field: &'static str, value: u16 },
}
