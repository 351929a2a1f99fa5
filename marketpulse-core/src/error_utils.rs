use crate::error::*;
use std::time::Duration;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::SearchApi(e) => {
                error!("Search engine error details: {:?}", e);
            }
            CoreError::Price(e) => {
                error!("Price provider error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::SearchApi(e) => e.is_retryable(),
            CoreError::Price(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            CoreError::Timeout { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::SearchApi(SearchApiError::RateLimitExceeded { retry_after }) => {
                Some(Duration::from_secs(*retry_after))
            }
            CoreError::Price(PriceApiError::RateLimitExceeded { retry_after }) => {
                Some(Duration::from_secs(*retry_after))
            }
            CoreError::Timeout { seconds } => Some(Duration::from_secs(*seconds)),
            _ if self.is_retryable() => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::SearchApi(e) => e.user_friendly_message(),
            CoreError::Price(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { .. } => {
                "Invalid input provided. Please check your input and try again.".to_string()
            }
            CoreError::Timeout { .. } => {
                "The operation took too long to complete. Please try again.".to_string()
            }
            CoreError::NotFound { resource } => format!("Could not find: {}", resource),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::SearchApi(_) => "SEARCH_API".to_string(),
            CoreError::Price(_) => "PRICE_API".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Timeout { .. } => "TIMEOUT".to_string(),
            CoreError::NotFound { .. } => "NOT_FOUND".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for SearchApiError {
    fn log_error(&self) -> &Self {
        error!("SearchApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("SearchApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            SearchApiError::RateLimitExceeded { .. } => true,
            SearchApiError::RequestTimeout => true,
            SearchApiError::ServerError { status_code } => *status_code >= 500,
            SearchApiError::EngineUnreachable { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            SearchApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(30)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            SearchApiError::EngineUnreachable { .. } => {
                "The search engine is not reachable. Please check that it is running."
                    .to_string()
            }
            SearchApiError::QuerySyntax { .. } => {
                "The search query could not be understood by the engine.".to_string()
            }
            SearchApiError::IndexNotFound { index } => {
                format!("Search index '{}' does not exist. Has the corpus been loaded?", index)
            }
            SearchApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            SearchApiError::RequestTimeout => {
                "Request to the search engine timed out. Please try again.".to_string()
            }
            _ => "Search engine error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            SearchApiError::EngineUnreachable { .. } => "SEARCH_ENGINE_UNREACHABLE".to_string(),
            SearchApiError::QuerySyntax { .. } => "SEARCH_QUERY_SYNTAX".to_string(),
            SearchApiError::IndexNotFound { .. } => "SEARCH_INDEX_NOT_FOUND".to_string(),
            SearchApiError::RateLimitExceeded { .. } => "SEARCH_RATE_LIMIT".to_string(),
            SearchApiError::RequestTimeout => "SEARCH_TIMEOUT".to_string(),
            SearchApiError::InvalidResponse { .. } => "SEARCH_INVALID_RESPONSE".to_string(),
            SearchApiError::ServerError { .. } => "SEARCH_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for PriceApiError {
    fn log_error(&self) -> &Self {
        error!("PriceApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("PriceApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            PriceApiError::RateLimitExceeded { .. } => true,
            PriceApiError::RequestTimeout => true,
            PriceApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            PriceApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(30)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            PriceApiError::SymbolNotFound { symbol } => {
                format!("Ticker '{}' was not found by the price provider.", symbol)
            }
            PriceApiError::RequestTimeout => {
                "Request to the price provider timed out.".to_string()
            }
            _ => "Price provider error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            PriceApiError::SymbolNotFound { .. } => "PRICE_SYMBOL_NOT_FOUND".to_string(),
            PriceApiError::RateLimitExceeded { .. } => "PRICE_RATE_LIMIT".to_string(),
            PriceApiError::RequestTimeout => "PRICE_TIMEOUT".to_string(),
            PriceApiError::InvalidResponse { .. } => "PRICE_INVALID_RESPONSE".to_string(),
            PriceApiError::ServerError { .. } => "PRICE_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => {
                "Configuration file not found. Please check the installation.".to_string()
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            _ => "Configuration error occurred. Please check your settings.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
            if error.is_retryable() {
                if let Some(retry_after) = error.retry_after() {
                    info!("Error is retryable. Retry after: {:?}", retry_after);
                }
            }
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
