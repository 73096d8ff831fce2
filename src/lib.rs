//! Rust SDK for the RealityVPN account dashboard.
//!
//! Drives the Telegram login handshake, holds the resulting session cookie,
//! fetches the account snapshot from the dashboard API and derives the
//! presentation-ready subscription fields.

pub mod errors;
pub mod structs;

pub use errors::RealityError;
pub use structs::client::{ApiOutcome, Client, ClientOptions, SessionPhase};
pub use structs::gate::{
    login_bot_from_env, BrowserWidget, ExchangePort, LoginGate, LoginState, WidgetHost,
};
pub use structs::profile::{
    parse_timestamp, AccountPort, LoadResult, ProfileStore, SubscriptionView,
};
pub use structs::{
    Connection, Device, LoginAssertion, Notice, NoticeKind, Payment, PaymentId, ProfileSnapshot,
    Route, Shell, Subscription, TelegramIdentity,
};
