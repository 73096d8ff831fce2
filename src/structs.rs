use serde::{Deserialize, Serialize};

pub mod client;
pub mod gate;
pub mod profile;

/// Identity assertion issued by the Telegram login widget.
///
/// Forwarded to the backend exchange endpoint exactly as received; the
/// integrity `hash` is verifiable server-side only. Absent optional fields
/// stay absent on the wire so the backend sees what the widget issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAssertion {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Unix timestamp of when the widget issued the assertion.
    pub auth_date: i64,
    pub hash: String,
}

/// Combined account snapshot returned by `GET /api/me`.
///
/// Immutable once fetched; a re-login or sign-out discards it entirely and
/// a fresh fetch replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub telegram: TelegramIdentity,
    pub subscription: Subscription,
    /// Not every deployment exposes the connection block.
    #[serde(default)]
    pub connection: Connection,
    /// Server order, never re-sorted client-side.
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// Telegram identity of the logged-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramIdentity {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Subscription state of the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub blocked: bool,
    pub deleted: bool,
    #[serde(rename = "is_tarif")]
    pub on_tariff: bool,
    /// Plan label, e.g. "lte" or "wifi".
    #[serde(rename = "type")]
    pub plan_type: Option<String>,
    /// Expiry timestamp. Either "2024-07-15T10:00:00" or the
    /// space-separated variant; may carry an offset or "Z".
    pub end_date: Option<String>,
    pub device_limit_expires_at: Option<String>,
    pub auto_payment_enabled: bool,
}

/// VPN connection details for the account.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Access URL to import into a client app.
    pub url: Option<String>,
    pub short_id: Option<String>,
}

/// A single payment record from the account's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub amount: f64,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub processed_at: Option<String>,
    /// Paid period in days.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub device_count: Option<i64>,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
}

/// Payment identifier. The billing provider sends either form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentId {
    Number(i64),
    Text(String),
}

/// A device registered against the subscription's hardware limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub hwid: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub device_model: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Application routes the SDK can ask the host to navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Auth,
    Dashboard,
}

/// Kind of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-facing notice (rendered by the host as a toast or banner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn success(title: &str, body: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    pub fn error(title: &str, body: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

/// Host-application boundary: notices and navigation.
///
/// The SDK never renders anything itself; it reports outcomes through this
/// trait and the host decides how to present them.
pub trait Shell {
    fn notify(&mut self, notice: Notice);
    fn navigate(&mut self, route: Route);
}
