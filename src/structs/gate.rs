use std::env;

use colorful::Color;
use colorful::Colorful;

use crate::errors::RealityError;
use crate::structs::client::{Client, RETRY_LATER};
use crate::structs::{LoginAssertion, Notice, Route, Shell};

/// Shown instead of the login button when no bot handle is configured.
pub const WIDGET_FALLBACK: &str = "Укажите REALITYVPN_LOGIN_BOT, чтобы отобразить кнопку входа";

const LOGIN_OK_TITLE: &str = "Успешный вход";
const LOGIN_OK_BODY: &str = "Добро пожаловать в RealityVPN!";
const LOGIN_ERR_TITLE: &str = "Ошибка входа";

/// Reads the login bot handle from `REALITYVPN_LOGIN_BOT`.
/// An unset or empty variable means no widget can be mounted.
pub fn login_bot_from_env() -> Option<String> {
    env::var("REALITYVPN_LOGIN_BOT")
        .ok()
        .filter(|handle| !handle.is_empty())
}

/// Backend side of the handshake: exchanges one assertion for a session.
pub trait ExchangePort {
    fn exchange(&mut self, assertion: &LoginAssertion) -> Result<(), RealityError>;
}

impl ExchangePort for Client {
    fn exchange(&mut self, assertion: &LoginAssertion) -> Result<(), RealityError> {
        self.exchange_assertion(assertion)
    }
}

/// Mount point for the Telegram login affordance.
///
/// `clear` must leave the mount point empty no matter how many times it ran
/// before; the gate calls it on every mount and unmount.
pub trait WidgetHost {
    fn install(&mut self, bot_handle: &str) -> Result<(), RealityError>;
    fn clear(&mut self);
    fn show_fallback(&mut self, message: &str);
}

/// Default host: hands the login off to the hosted auth page in the browser.
pub struct BrowserWidget {
    /// Base URL of the dashboard whose auth page embeds the widget.
    pub base_url: String,
    installed: bool,
}

impl BrowserWidget {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            installed: false,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl WidgetHost for BrowserWidget {
    fn install(&mut self, bot_handle: &str) -> Result<(), RealityError> {
        open::that(format!("{}/auth?bot={}", self.base_url, bot_handle))
            .or(Err(RealityError::WidgetUnavailable))?;
        self.installed = true;
        Ok(())
    }

    fn clear(&mut self) {
        self.installed = false;
    }

    fn show_fallback(&mut self, message: &str) {
        #[cfg(windows)]
        println!("{}", message);

        #[cfg(not(windows))]
        println!("{}", message.color(Color::Yellow));
    }
}

/// Where the login handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// Widget not mounted.
    Idle,
    /// Widget mounted, awaiting user action.
    WidgetReady,
    /// Assertion received, backend exchange in flight.
    Exchanging,
    /// Exchange succeeded; the session cookie is set.
    Authenticated,
    /// Exchange rejected or transport failure; carries the shown message.
    /// Recoverable: remounting the widget returns to `WidgetReady`.
    Failed(String),
}

/// Drives the Telegram login handshake.
///
/// Owns its assertion delivery end to end: the widget host is told to mount
/// and clear, deliveries arrive through [`LoginGate::on_assertion`], and
/// after [`LoginGate::unmount`] any late delivery is inert. There is no
/// process-wide callback slot to leak.
pub struct LoginGate<E: ExchangePort> {
    exchange: E,
    bot_handle: Option<String>,
    state: LoginState,
    navigated: bool,
}

impl<E: ExchangePort> LoginGate<E> {
    pub fn new(exchange: E, bot_handle: Option<String>) -> Self {
        Self {
            exchange,
            bot_handle,
            state: LoginState::Idle,
            navigated: false,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Mounts the login widget, clearing any stale prior mount first.
    ///
    /// With no bot handle configured this is a no-op apart from the fallback
    /// notice; the gate stays `Idle` instead of hanging silently.
    pub fn mount(&mut self, host: &mut dyn WidgetHost) -> &LoginState {
        host.clear();
        self.navigated = false;

        let handle = self.bot_handle.clone().filter(|handle| !handle.is_empty());
        match handle {
            Some(handle) => match host.install(&handle) {
                Ok(()) => self.state = LoginState::WidgetReady,
                Err(_) => {
                    host.show_fallback(WIDGET_FALLBACK);
                    self.state = LoginState::Idle;
                }
            },
            None => {
                host.show_fallback(WIDGET_FALLBACK);
                self.state = LoginState::Idle;
            }
        }

        &self.state
    }

    /// Delivery point for an assertion from the widget.
    ///
    /// Only a `WidgetReady` gate accepts one; anything else (delivery before
    /// mount, a duplicate after a finished exchange, a stale callback firing
    /// after unmount) is ignored. One exchange per delivery, no retries.
    pub fn on_assertion(&mut self, assertion: LoginAssertion, shell: &mut dyn Shell) -> &LoginState {
        if self.state != LoginState::WidgetReady {
            return &self.state;
        }

        self.state = LoginState::Exchanging;

        match self.exchange.exchange(&assertion) {
            Ok(()) => {
                self.state = LoginState::Authenticated;
                shell.notify(Notice::success(LOGIN_OK_TITLE, LOGIN_OK_BODY));

                if !self.navigated {
                    self.navigated = true;
                    shell.navigate(Route::Dashboard);
                }
            }
            Err(err) => {
                let message = match err {
                    RealityError::ExchangeRejected(detail) => detail,
                    RealityError::RequestFailed => RETRY_LATER.to_string(),
                    other => other.to_string(),
                };
                shell.notify(Notice::error(LOGIN_ERR_TITLE, &message));
                self.state = LoginState::Failed(message);
            }
        }

        &self.state
    }

    /// Clears the mount point and returns to `Idle`.
    ///
    /// Runs on every exit path; afterwards a stale delivery has no effect.
    pub fn unmount(&mut self, host: &mut dyn WidgetHost) {
        host.clear();
        self.state = LoginState::Idle;
    }

    /// Hands the exchange port back, e.g. the authenticated [`Client`].
    pub fn into_inner(self) -> E {
        self.exchange
    }
}
