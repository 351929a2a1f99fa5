use marketpulse_core::{
    ConfigError, CoreError, ErrorExt, ErrorReporter, PriceApiError, SearchApiError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let search_error = CoreError::SearchApi(SearchApiError::RequestTimeout);
    assert_eq!(search_error.error_code(), "SEARCH_API");

    let price_error = CoreError::Price(PriceApiError::SymbolNotFound {
        symbol: "TSLA".to_string(),
    });
    assert_eq!(price_error.error_code(), "PRICE_API");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "search_url".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::SearchApi(SearchApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let non_retryable_error = CoreError::Config(ConfigError::MissingField {
        field: "search_url".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());

    let query_error = CoreError::SearchApi(SearchApiError::QuerySyntax {
        details: "unbalanced quotes".to_string(),
    });
    assert!(!query_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::SearchApi(SearchApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let timeout_error = CoreError::Timeout { seconds: 30 };
    assert_eq!(timeout_error.retry_after(), Some(Duration::from_secs(30)));
}

#[test]
fn test_user_friendly_messages() {
    let search_error = CoreError::SearchApi(SearchApiError::EngineUnreachable {
        endpoint: "http://localhost:7700".to_string(),
    });
    let message = search_error.user_friendly_message();
    assert!(!message.is_empty());
    assert!(message.contains("not reachable"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "MARKETPULSE_SEARCH_URL".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("MARKETPULSE_SEARCH_URL"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::SearchApi(SearchApiError::RequestTimeout);

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
