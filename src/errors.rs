use thiserror::Error;

/// RealityVPN SDK errors.
#[derive(Debug, Error)]
pub enum RealityError {
    /// The base URL provided is not usable. Must be an absolute http(s) URL.
    #[error("Invalid base URL. Must be an absolute http(s) URL.")]
    InvalidBaseUrl,

    /// Failed to open the hosted login page for the Telegram widget.
    #[error("Failed to open the login widget.")]
    WidgetUnavailable,

    /// Failed to send a request to the dashboard API. No response was received.
    #[error("Failed to send a request to the dashboard API.")]
    RequestFailed,

    /// The backend rejected the Telegram login assertion.
    /// Carries the `detail` string from the response body, or a generic
    /// message when the body had none.
    #[error("{0}")]
    ExchangeRejected(String),

    /// The dashboard API returned a 401: Unauthorized status code.
    /// There is no valid session; the user has to log in again.
    #[error("Требуется авторизация")]
    Unauthenticated,

    /// The dashboard API returned a 403: Forbidden status code.
    /// The session is valid but the account is blocked or deleted.
    #[error("{0}")]
    Forbidden(String),

    /// The dashboard API returned any other non-success status code while
    /// fetching account data. Carries the `detail` string from the response
    /// body, or a generic message when the body had none.
    #[error("{0}")]
    FetchFailed(String),
}
