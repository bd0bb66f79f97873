//! Access-token guard for the metrics endpoints.
//!
//! Candidate token, in priority order:
//! 1. `X-Access-Token: <token>`
//! 2. `Authorization: Bearer <token>` (scheme matched case-insensitively)
//!
//! Comparison is constant-time over the token bytes. The secret is held in a
//! `SecretString`, so it is redacted from `Debug` output and zeroed when it
//! drops. `revoke()` drops it explicitly at teardown even while other owners
//! (a host router, say) still hold the guard; a revoked guard denies every
//! request. Copies made before construction are out of reach.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

#[derive(Debug)]
enum Secret {
    Disabled,
    Armed(SecretString),
    Revoked,
}

#[derive(Debug)]
pub struct AccessGuard {
    secret: RwLock<Secret>,
}

impl AccessGuard {
    /// An empty secret disables access control.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        if secret.is_empty() {
            return Self::disabled();
        }
        Self::with(Secret::Armed(SecretString::from(secret)))
    }

    /// Take ownership of an already-protected secret without copying it.
    pub fn from_secret(secret: SecretString) -> Self {
        if secret.expose_secret().is_empty() {
            return Self::disabled();
        }
        Self::with(Secret::Armed(secret))
    }

    pub fn disabled() -> Self {
        Self::with(Secret::Disabled)
    }

    fn with(secret: Secret) -> Self {
        Self {
            secret: RwLock::new(secret),
        }
    }

    /// True unless constructed without a secret.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.secret.read().as_deref(), Ok(Secret::Disabled))
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self.secret.read().as_deref(), Ok(Secret::Revoked) | Err(_))
    }

    /// Zero the secret now and deny everything from here on. Idempotent.
    pub fn revoke(&self) {
        let previous = match self.secret.write() {
            Ok(mut slot) => std::mem::replace(&mut *slot, Secret::Revoked),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), Secret::Revoked),
        };
        if matches!(previous, Secret::Armed(_)) {
            tracing::debug!("access token revoked");
        }
    }

    /// Check a request given its raw `X-Access-Token` and `Authorization`
    /// header values.
    pub fn check(&self, access_token: Option<&str>, authorization: Option<&str>) -> bool {
        let Ok(secret) = self.secret.read() else {
            return false;
        };
        match &*secret {
            Secret::Disabled => true,
            Secret::Revoked => false,
            Secret::Armed(secret) => extract_token(access_token, authorization)
                .is_some_and(|token| token_matches(secret, token)),
        }
    }

    /// Compare an already-extracted token against the secret.
    pub fn check_token(&self, token: &str) -> bool {
        let Ok(secret) = self.secret.read() else {
            return false;
        };
        match &*secret {
            Secret::Disabled => true,
            Secret::Revoked => false,
            Secret::Armed(secret) => token_matches(secret, token),
        }
    }
}

fn token_matches(secret: &SecretString, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    bool::from(secret.expose_secret().as_bytes().ct_eq(token.as_bytes()))
}

/// The dedicated header wins when non-empty; the bearer header is consulted
/// only when it is absent.
pub fn extract_token<'a>(
    access_token: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    if let Some(t) = access_token.filter(|t| !t.is_empty()) {
        return Some(t);
    }
    let (scheme, token) = authorization?.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
