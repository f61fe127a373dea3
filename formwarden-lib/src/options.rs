//! Validator configuration

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SettingsError;
use crate::host::FormValues;
use crate::result::FieldError;
use crate::submit::{ReqwestTransport, Transport};

/// Default delay between the last input and validation.
pub const DEFAULT_DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(500);

/// Default lifetime of a cached validation result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default message for fields whose rule failed unexpectedly.
pub const DEFAULT_UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

type ValidSubmitFn = Arc<dyn Fn(FormValues) + Send + Sync>;
type InvalidSubmitFn = Arc<dyn Fn(Vec<FieldError>) + Send + Sync>;

/// Options controlling a [`FormValidator`](crate::FormValidator).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use formwarden_lib::ValidatorOptions;
///
/// let options = ValidatorOptions::default()
///     .with_debounce_timeout(Duration::from_millis(250))
///     .with_cache_ttl(Duration::from_secs(10))
///     .on_valid_submit(|values| println!("submitting {} fields", values.len()));
/// ```
#[derive(Clone)]
pub struct ValidatorOptions {
    /// Quiet period after the last input before a field is validated.
    ///
    /// Default: 500 ms
    pub debounce_timeout: Duration,

    /// How long a validation result is reused for an unchanged value.
    ///
    /// Default: 30 seconds
    pub cache_ttl: Duration,

    /// Message shown when a rule fails with an unexpected error.
    pub unexpected_error_message: String,

    pub(crate) on_valid_submit: Option<ValidSubmitFn>,
    pub(crate) on_invalid_submit: Option<InvalidSubmitFn>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            debounce_timeout: DEFAULT_DEBOUNCE_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            unexpected_error_message: DEFAULT_UNEXPECTED_ERROR_MESSAGE.to_string(),
            on_valid_submit: None,
            on_invalid_submit: None,
            transport: None,
        }
    }
}

impl ValidatorOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the debounce timeout.
    pub fn with_debounce_timeout(mut self, timeout: Duration) -> Self {
        self.debounce_timeout = timeout;
        self
    }

    /// Sets the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the message used for unexpected rule errors.
    pub fn with_unexpected_error_message(mut self, message: impl Into<String>) -> Self {
        self.unexpected_error_message = message.into();
        self
    }

    /// Called with the serialized values when a submit passes validation.
    pub fn on_valid_submit<F>(mut self, f: F) -> Self
    where
        F: Fn(FormValues) + Send + Sync + 'static,
    {
        self.on_valid_submit = Some(Arc::new(f));
        self
    }

    /// Called with every field error when a submit fails validation.
    pub fn on_invalid_submit<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<FieldError>) + Send + Sync + 'static,
    {
        self.on_invalid_submit = Some(Arc::new(f));
        self
    }

    /// Replaces the transport used by the submit helper.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// The configured transport, or a default [`ReqwestTransport`].
    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        self.transport
            .clone()
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()))
    }

    /// Applies the values present in `settings`.
    pub fn with_settings(mut self, settings: &ValidatorSettings) -> Self {
        if let Some(ms) = settings.debounce_timeout_ms {
            self.debounce_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = settings.cache_ttl_ms {
            self.cache_ttl = Duration::from_millis(ms);
        }
        if let Some(message) = &settings.unexpected_error_message {
            self.unexpected_error_message = message.clone();
        }
        self
    }
}

impl std::fmt::Debug for ValidatorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorOptions")
            .field("debounce_timeout", &self.debounce_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("unexpected_error_message", &self.unexpected_error_message)
            .field("on_valid_submit", &self.on_valid_submit.is_some())
            .field("on_invalid_submit", &self.on_invalid_submit.is_some())
            .finish_non_exhaustive()
    }
}

/// Serializable subset of [`ValidatorOptions`].
///
/// Every key is optional; missing keys keep the defaults.
///
/// ```json
/// { "debounce_timeout_ms": 300, "cache_ttl_ms": 60000 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorSettings {
    /// Debounce timeout in milliseconds.
    #[serde(default)]
    pub debounce_timeout_ms: Option<u64>,
    /// Cache TTL in milliseconds.
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,
    /// Message for unexpected rule errors.
    #[serde(default)]
    pub unexpected_error_message: Option<String>,
}

impl ValidatorSettings {
    /// Parses settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ValidatorOptions::default();
        assert_eq!(options.debounce_timeout, Duration::from_millis(500));
        assert_eq!(options.cache_ttl, Duration::from_secs(30));
        assert!(options.on_valid_submit.is_none());
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = ValidatorSettings::from_json_str(r#"{ "debounce_timeout_ms": 120 }"#).unwrap();
        let options = ValidatorOptions::default().with_settings(&settings);
        assert_eq!(options.debounce_timeout, Duration::from_millis(120));
        assert_eq!(options.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(options.unexpected_error_message, DEFAULT_UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let err = ValidatorSettings::from_json_str(r#"{ "debounce": 1 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ValidatorSettings::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
