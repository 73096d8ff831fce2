use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::structs::client::{ApiOutcome, Client};
use crate::structs::{Notice, Payment, ProfileSnapshot, Route, Shell, Subscription};

/// Display timezone for all user-facing timestamps. UTC+3, no DST.
const MSK_UTC_OFFSET_SECS: i32 = 3 * 3600;
const SECONDS_PER_DAY: i64 = 86_400;

const EXPIRY_FORMAT: &str = "%d.%m.%Y, %H:%M";
const DATE_FORMAT: &str = "%d.%m.%Y";

const UNAUTH_TITLE: &str = "Нужна авторизация";
const UNAUTH_BODY: &str = "Пожалуйста, войдите через Telegram.";
const FORBIDDEN_TITLE: &str = "Доступ ограничен";
const LOAD_ERR_TITLE: &str = "Ошибка загрузки";
const LOGOUT_TITLE: &str = "Выход выполнен";
const LOGOUT_BODY: &str = "До скорой встречи!";

fn msk() -> FixedOffset {
    FixedOffset::east_opt(MSK_UTC_OFFSET_SECS).unwrap()
}

/// Parses a wire timestamp into an instant.
///
/// Accepts the "2024-07-15T10:00:00" form and the space-separated variant,
/// with an optional fractional part and an optional offset or "Z". Naive
/// values are taken as UTC. Anything else yields `None`; callers degrade
/// the affected field instead of failing.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let normalized = if value.contains('T') {
        value.to_string()
    } else {
        value.replacen(' ', "T", 1)
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn days_left(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = expiry.signed_duration_since(now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Presentation-ready subscription fields.
///
/// A pure function of the subscription record and the evaluation instant.
/// Recomputed on every call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    /// Expiry strictly in the future at the evaluation instant.
    pub active: bool,
    /// Expiry rendered in Moscow time, "15.07.2024, 13:00".
    pub formatted_expiry: Option<String>,
    /// Whole days remaining, ceiling, never negative.
    pub days_left: Option<i64>,
}

impl SubscriptionView {
    pub fn derive(subscription: &Subscription, now: DateTime<Utc>) -> Self {
        let expiry = subscription.end_date.as_deref().and_then(parse_timestamp);

        match expiry {
            Some(end) => Self {
                active: end > now,
                formatted_expiry: Some(end.with_timezone(&msk()).format(EXPIRY_FORMAT).to_string()),
                days_left: Some(days_left(end, now)),
            },
            None => Self::unknown(),
        }
    }

    /// The degraded view for an absent or unparseable expiry.
    pub fn unknown() -> Self {
        Self {
            active: false,
            formatted_expiry: None,
            days_left: None,
        }
    }
}

impl Payment {
    /// Date label for history rows; falls back to the raw server string
    /// when the timestamp does not parse.
    pub fn created_label(&self) -> String {
        match parse_timestamp(&self.created_at) {
            Some(created) => created.with_timezone(&msk()).format(DATE_FORMAT).to_string(),
            None => self.created_at.clone(),
        }
    }

    /// Status label for history rows. Completed payments get the fixed paid
    /// label, anything else shows the server's status verbatim.
    pub fn status_label(&self) -> String {
        if self.status == "completed" {
            "Оплачен".to_string()
        } else {
            self.status.clone()
        }
    }
}

/// Account side of the protected pages: snapshot fetch and sign-out.
pub trait AccountPort {
    fn fetch_profile(&self) -> ApiOutcome<ProfileSnapshot>;
    fn logout(&mut self);
}

impl AccountPort for Client {
    fn fetch_profile(&self) -> ApiOutcome<ProfileSnapshot> {
        Client::fetch_profile(self)
    }

    fn logout(&mut self) {
        Client::logout(self);
    }
}

/// How a [`ProfileStore::load`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// Snapshot fetched and stored.
    Loaded,
    /// No session or account blocked; the shell was sent to the login page.
    RedirectedToLogin,
    /// Fetch failed; an error notice was shown, no navigation.
    Failed,
}

/// Holds the account snapshot for protected pages.
///
/// The snapshot is immutable once stored. A reload or sign-out discards it
/// entirely; there is no partial patching.
#[derive(Default)]
pub struct ProfileStore {
    snapshot: Option<ProfileSnapshot>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&ProfileSnapshot> {
        self.snapshot.as_ref()
    }

    /// Fetches the snapshot and drives the shell from the classification.
    ///
    /// 401 and 403 both route to the login page with a notice; any other
    /// failure surfaces in place and leaves the current page alone.
    pub fn load(&mut self, account: &dyn AccountPort, shell: &mut dyn Shell) -> LoadResult {
        self.snapshot = None;

        match account.fetch_profile() {
            ApiOutcome::Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                LoadResult::Loaded
            }
            ApiOutcome::Unauthenticated => {
                shell.notify(Notice::error(UNAUTH_TITLE, UNAUTH_BODY));
                shell.navigate(Route::Auth);
                LoadResult::RedirectedToLogin
            }
            ApiOutcome::Forbidden(message) => {
                shell.notify(Notice::error(FORBIDDEN_TITLE, &message));
                shell.navigate(Route::Auth);
                LoadResult::RedirectedToLogin
            }
            ApiOutcome::Error(message) => {
                shell.notify(Notice::error(LOAD_ERR_TITLE, &message));
                LoadResult::Failed
            }
        }
    }

    /// Derived subscription fields at `now`, or the unknown view when no
    /// snapshot is loaded.
    pub fn subscription_view(&self, now: DateTime<Utc>) -> SubscriptionView {
        match &self.snapshot {
            Some(snapshot) => SubscriptionView::derive(&snapshot.subscription, now),
            None => SubscriptionView::unknown(),
        }
    }

    /// Discards the snapshot, fires the logout call and sends the shell back
    /// to the landing page. The logout call is fire and forget.
    pub fn sign_out(&mut self, account: &mut dyn AccountPort, shell: &mut dyn Shell) {
        self.snapshot = None;
        account.logout();
        shell.notify(Notice::success(LOGOUT_TITLE, LOGOUT_BODY));
        shell.navigate(Route::Landing);
    }
}
