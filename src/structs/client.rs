use std::env;
use std::time::Duration;

use colorful::Color;
use colorful::Colorful;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::RealityError;
use crate::structs::{Device, LoginAssertion, ProfileSnapshot};

pub(crate) const LOGIN_FALLBACK: &str = "Не удалось выполнить вход";
pub(crate) const RETRY_LATER: &str = "Попробуйте позже";
pub(crate) const BLOCKED_FALLBACK: &str = "Аккаунт заблокирован или удалён.";
pub(crate) const LOAD_FALLBACK: &str = "Не удалось загрузить профиль";

const DEFAULT_BASE_URL: &str = "http://localhost:5173";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Where the session credential currently is in its lifecycle.
///
/// Tracked explicitly; never inferred from the success or failure of a
/// side-effecting read. The credential itself lives in the cookie jar and
/// is opaque to the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No credential. Either never logged in, or signed out.
    NoSession,
    /// An assertion exchange is in flight.
    Pending,
    /// The backend issued a session cookie.
    Established,
}

/// Outcome of a credentialed dashboard API call, tagged per status class.
///
/// Callers branch on this instead of raw HTTP statuses.
#[derive(Debug, Clone)]
pub enum ApiOutcome<T> {
    Ok(T),
    /// 401. No valid session, regardless of response body.
    Unauthenticated,
    /// 403. Account blocked or deleted; carries the user-facing message.
    Forbidden(String),
    /// Any other failure, including transport errors; carries the
    /// user-facing message. The caller stays where it is.
    Error(String),
}

impl<T> ApiOutcome<T> {
    pub fn into_result(self) -> Result<T, RealityError> {
        match self {
            ApiOutcome::Ok(value) => Ok(value),
            ApiOutcome::Unauthenticated => Err(RealityError::Unauthenticated),
            ApiOutcome::Forbidden(message) => Err(RealityError::Forbidden(message)),
            ApiOutcome::Error(message) => Err(RealityError::FetchFailed(message)),
        }
    }
}

/// RealityVPN dashboard client. Used to interact with the dashboard API.
#[derive(Debug)]
pub struct Client {
    /// Base URL of the dashboard, e.g. "https://realityvpn.ru".
    pub base_url: String,
    /// Whether the SDK should print debug statements.
    pub debug: bool,
    http: reqwest::blocking::Client,
    phase: SessionPhase,
}

/// RealityVPN client options. Pass this into the `new()` function of the client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the dashboard, e.g. "https://realityvpn.ru".
    pub base_url: String,
    /// Whether the SDK should print debug statements.
    pub debug: bool,
}

impl ClientOptions {
    /// Reads `REALITYVPN_BASE_URL`, falling back to the local dev origin.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("REALITYVPN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            debug: false,
        }
    }
}

#[derive(Deserialize)]
struct DeviceList {
    devices: Vec<Device>,
}

impl Client {
    /// Creates a new dashboard client with an empty cookie jar.
    pub fn new(options: ClientOptions) -> Result<Self, RealityError> {
        // Verify that all options passed are in the right format
        if !options.base_url.starts_with("http://") && !options.base_url.starts_with("https://") {
            return Err(RealityError::InvalidBaseUrl);
        }

        Ok(Self {
            base_url: options.base_url.trim_end_matches('/').to_string(),
            debug: options.debug,
            http: Self::build_http()?,
            phase: SessionPhase::NoSession,
        })
    }

    /// Current phase of the session credential lifecycle.
    pub fn session_phase(&self) -> SessionPhase {
        self.phase
    }

    /// Exchanges a Telegram login assertion for a session cookie.
    ///
    /// The assertion is forwarded verbatim as the JSON body; on success the
    /// backend sets the session cookie into the jar as a side effect.
    pub fn exchange_assertion(&mut self, assertion: &LoginAssertion) -> Result<(), RealityError> {
        if self.debug {
            #[cfg(windows)]
            println!("[AUTH] Exchanging Telegram assertion...");

            #[cfg(not(windows))]
            println!(
                "{}",
                "[AUTH] Exchanging Telegram assertion..."
                    .gradient_with_color(Color::Cyan, Color::SpringGreen4)
            );
        }

        self.phase = SessionPhase::Pending;

        let url = format!("{}/api/auth/telegram/callback", self.base_url);
        let result = match self.http.post(url).json(assertion).send() {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.bytes().unwrap_or_default();
                classify_exchange(status, &body)
            }
            Err(_) => Err(RealityError::ExchangeRejected(RETRY_LATER.to_string())),
        };

        match &result {
            Ok(()) => {
                self.phase = SessionPhase::Established;

                if self.debug {
                    #[cfg(windows)]
                    println!("[AUTH] Successfully authenticated.");

                    #[cfg(not(windows))]
                    println!(
                        "{}",
                        "[AUTH] Successfully authenticated."
                            .gradient_with_color(Color::Cyan, Color::SpringGreen4)
                    );
                }
            }
            Err(err) => {
                self.phase = SessionPhase::NoSession;

                if self.debug {
                    #[cfg(windows)]
                    println!("[AUTH] Failed to authenticate: {}", err);

                    #[cfg(not(windows))]
                    println!(
                        "{}",
                        format!("[AUTH] Failed to authenticate: {}", err)
                            .gradient_with_color(Color::Cyan, Color::SpringGreen4)
                    );
                }
            }
        }

        result
    }

    /// Fetches the account snapshot from `GET /api/me`.
    pub fn fetch_profile(&self) -> ApiOutcome<ProfileSnapshot> {
        self.get_classified("/api/me")
    }

    /// Lists devices registered against the subscription's hardware limit.
    pub fn devices(&self) -> Result<Vec<Device>, RealityError> {
        self.get_classified::<DeviceList>("/api/devices")
            .into_result()
            .map(|list| list.devices)
    }

    /// Revokes one device by hardware ID and returns the refreshed list.
    pub fn revoke_device(&self, hwid: &str) -> Result<Vec<Device>, RealityError> {
        let url = format!("{}/api/devices/{}", self.base_url, hwid);
        let outcome = match self.http.delete(url).send() {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.bytes().unwrap_or_default();
                classify_protected::<DeviceList>(status, &body)
            }
            Err(_) => ApiOutcome::Error(RETRY_LATER.to_string()),
        };

        outcome.into_result().map(|list| list.devices)
    }

    /// Ends the session. Fire and forget: a failed request never blocks the
    /// local sign-out, which always resets the phase and drops the jar.
    pub fn logout(&mut self) {
        let url = format!("{}/api/auth/logout", self.base_url);
        if let Err(err) = self.http.post(url).send() {
            if self.debug {
                #[cfg(windows)]
                println!("[AUTH] Logout request failed: {}", err);

                #[cfg(not(windows))]
                println!(
                    "{}",
                    format!("[AUTH] Logout request failed: {}", err)
                        .gradient_with_color(Color::Cyan, Color::SpringGreen4)
                );
            }
        }

        self.phase = SessionPhase::NoSession;

        // A fresh client drops the jar and with it the session cookie.
        if let Ok(fresh) = Self::build_http() {
            self.http = fresh;
        }
    }

    fn get_classified<T: DeserializeOwned>(&self, path: &str) -> ApiOutcome<T> {
        let url = format!("{}{}", self.base_url, path);
        match self.http.get(url).send() {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.bytes().unwrap_or_default();
                classify_protected(status, &body)
            }
            Err(_) => ApiOutcome::Error(RETRY_LATER.to_string()),
        }
    }

    fn build_http() -> Result<reqwest::blocking::Client, RealityError> {
        reqwest::blocking::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .or(Err(RealityError::RequestFailed))
    }
}

/// Classifies the exchange endpoint's response.
pub(crate) fn classify_exchange(status: u16, body: &[u8]) -> Result<(), RealityError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let message = detail_from_body(body).unwrap_or_else(|| LOGIN_FALLBACK.to_string());
    Err(RealityError::ExchangeRejected(message))
}

/// Classifies a credentialed GET/DELETE response into a tagged outcome.
///
/// The order is fixed: 401 before 403 before any other non-success status.
pub(crate) fn classify_protected<T: DeserializeOwned>(status: u16, body: &[u8]) -> ApiOutcome<T> {
    if status == 401 {
        return ApiOutcome::Unauthenticated;
    }

    if status == 403 {
        let message = detail_from_body(body).unwrap_or_else(|| BLOCKED_FALLBACK.to_string());
        return ApiOutcome::Forbidden(message);
    }

    if !(200..300).contains(&status) {
        let message = detail_from_body(body).unwrap_or_else(|| LOAD_FALLBACK.to_string());
        return ApiOutcome::Error(message);
    }

    match serde_json::from_slice(body) {
        Ok(value) => ApiOutcome::Ok(value),
        Err(_) => ApiOutcome::Error(LOAD_FALLBACK.to_string()),
    }
}

/// Pulls the optional `detail` string out of an error body.
/// A malformed or non-object body yields `None`; the caller falls open to
/// its generic message instead of failing.
fn detail_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail")?.as_str()?;

    if detail.is_empty() {
        return None;
    }

    Some(detail.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_base_url_without_scheme() {
        let result = Client::new(ClientOptions {
            base_url: "realityvpn.ru".to_string(),
            debug: false,
        });

        assert!(matches!(result, Err(RealityError::InvalidBaseUrl)));
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = Client::new(ClientOptions {
            base_url: "https://realityvpn.ru/".to_string(),
            debug: false,
        })
        .unwrap();

        assert_eq!(client.base_url, "https://realityvpn.ru");
        assert_eq!(client.session_phase(), SessionPhase::NoSession);
    }

    #[test]
    fn exchange_ok_on_2xx() {
        assert!(classify_exchange(200, br#"{"ok": true}"#).is_ok());
        assert!(classify_exchange(204, b"").is_ok());
    }

    #[test]
    fn exchange_carries_detail_from_error_body() {
        let err = classify_exchange(400, br#"{"detail": "hash mismatch"}"#).unwrap_err();

        match err {
            RealityError::ExchangeRejected(message) => assert_eq!(message, "hash mismatch"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn exchange_falls_back_on_unparseable_body() {
        let err = classify_exchange(400, b"<html>bad gateway</html>").unwrap_err();

        match err {
            RealityError::ExchangeRejected(message) => assert_eq!(message, LOGIN_FALLBACK),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn exchange_falls_back_on_empty_detail() {
        let err = classify_exchange(401, br#"{"detail": ""}"#).unwrap_err();

        match err {
            RealityError::ExchangeRejected(message) => assert_eq!(message, LOGIN_FALLBACK),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn protected_401_wins_regardless_of_body() {
        let empty: ApiOutcome<ProfileSnapshot> = classify_protected(401, b"");
        assert!(matches!(empty, ApiOutcome::Unauthenticated));

        let with_detail: ApiOutcome<ProfileSnapshot> =
            classify_protected(401, r#"{"detail": "Подписка не активна"}"#.as_bytes());
        assert!(matches!(with_detail, ApiOutcome::Unauthenticated));

        let malformed: ApiOutcome<ProfileSnapshot> = classify_protected(401, b"\xff\xfe");
        assert!(matches!(malformed, ApiOutcome::Unauthenticated));
    }

    #[test]
    fn protected_403_extracts_detail() {
        let outcome: ApiOutcome<ProfileSnapshot> =
            classify_protected(403, r#"{"detail": "Подписка не активна"}"#.as_bytes());

        match outcome {
            ApiOutcome::Forbidden(message) => assert_eq!(message, "Подписка не активна"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn protected_403_falls_back_on_malformed_body() {
        let outcome: ApiOutcome<ProfileSnapshot> = classify_protected(403, b"not json");

        match outcome {
            ApiOutcome::Forbidden(message) => assert_eq!(message, BLOCKED_FALLBACK),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn protected_5xx_is_a_plain_error() {
        let with_detail: ApiOutcome<ProfileSnapshot> =
            classify_protected(503, r#"{"detail": "На обслуживании"}"#.as_bytes());
        match with_detail {
            ApiOutcome::Error(message) => assert_eq!(message, "На обслуживании"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let bare: ApiOutcome<ProfileSnapshot> = classify_protected(500, b"");
        match bare {
            ApiOutcome::Error(message) => assert_eq!(message, LOAD_FALLBACK),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn protected_2xx_with_unparseable_body_is_an_error() {
        let outcome: ApiOutcome<ProfileSnapshot> = classify_protected(200, b"{\"telegram\":");

        match outcome {
            ApiOutcome::Error(message) => assert_eq!(message, LOAD_FALLBACK),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn protected_2xx_parses_snapshot() {
        let body = br#"{
            "telegram": {"id": 7, "username": null, "first_name": null, "last_name": null, "photo_url": null},
            "subscription": {
                "blocked": false,
                "deleted": false,
                "is_tarif": true,
                "type": "wifi",
                "end_date": null,
                "device_limit_expires_at": null,
                "auto_payment_enabled": false
            }
        }"#;

        let outcome: ApiOutcome<ProfileSnapshot> = classify_protected(200, body);

        match outcome {
            ApiOutcome::Ok(snapshot) => {
                assert_eq!(snapshot.telegram.id, 7);
                assert_eq!(snapshot.subscription.plan_type.as_deref(), Some("wifi"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn outcome_maps_into_errors() {
        let forbidden: ApiOutcome<()> = ApiOutcome::Forbidden("нет доступа".to_string());
        assert!(matches!(
            forbidden.into_result(),
            Err(RealityError::Forbidden(_))
        ));

        let unauthenticated: ApiOutcome<()> = ApiOutcome::Unauthenticated;
        assert!(matches!(
            unauthenticated.into_result(),
            Err(RealityError::Unauthenticated)
        ));
    }
}
