// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with the shared `JWT_SECRET`. They are
//! stateless bearer credentials: nothing is stored, and expiry is the only
//! way a token stops being valid.

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{TokenClaims, TokenSubject, TOKEN_ISSUER};
use super::error::AuthError;
use super::scope::Scope;

/// Default token lifetime (1 hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Shortest accepted token lifetime.
pub const MIN_TOKEN_TTL: Duration = Duration::from_secs(1);

/// Fixed signing algorithm.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid token expiry {0:?} (expected at least one second, as seconds or a duration like \"1h\", \"30m\", \"7d\")")]
pub struct InvalidExpiry(pub String);

/// Configured token lifetime.
///
/// Deployments set either a plain number of seconds (`3600`) or a duration
/// string (`"1h"`, `"2 days"`, `"90m"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenExpiry {
    Seconds(u64),
    Duration(String),
}

impl Default for TokenExpiry {
    fn default() -> Self {
        TokenExpiry::Duration("1h".to_string())
    }
}

impl TokenExpiry {
    /// Parse a configured value: all digits means seconds, anything else is a duration.
    pub fn parse(value: &str) -> Result<Self, InvalidExpiry> {
        let value = value.trim();
        let expiry = if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            value
                .parse()
                .map(TokenExpiry::Seconds)
                .map_err(|_| InvalidExpiry(value.to_string()))?
        } else {
            TokenExpiry::Duration(value.to_string())
        };
        expiry.ttl()?;
        Ok(expiry)
    }

    /// Resolve the lifetime. It must be at least [`MIN_TOKEN_TTL`] and fit a
    /// signed Unix timestamp.
    pub fn ttl(&self) -> Result<Duration, InvalidExpiry> {
        let (ttl, raw) = match self {
            TokenExpiry::Seconds(secs) => (Some(Duration::from_secs(*secs)), secs.to_string()),
            TokenExpiry::Duration(text) => (parse_duration(text), text.clone()),
        };
        match ttl {
            Some(ttl) if ttl >= MIN_TOKEN_TTL && i64::try_from(ttl.as_secs()).is_ok() => Ok(ttl),
            _ => Err(InvalidExpiry(raw)),
        }
    }
}

/// Parse `<number><unit>` with an optional space, e.g. `1h`, `1.5 hours`, `500ms`.
fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let number: f64 = number.parse().ok()?;

    let millis_per_unit: f64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600_000.0,
        _ => return None,
    };

    let millis = number * millis_per_unit;
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_millis(millis as u64))
}

/// Signs and verifies gateway tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], expiry: &TokenExpiry) -> Result<Self, InvalidExpiry> {
        let ttl = expiry.ttl()?;
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| InvalidExpiry(format!("{expiry:?}")))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            ttl_secs,
        })
    }

    /// Lifetime applied to newly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `subject` with the given scope.
    pub fn issue(&self, subject: TokenSubject, scope: Scope) -> Result<String, AuthError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            iss: TOKEN_ISSUER.to_string(),
            scope,
            role: subject.role,
            user_id: subject.user_id,
            email: subject.email,
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("failed to sign token: {e}")))
    }

    /// Token this gateway presents to the data service.
    pub fn service_token(&self) -> Result<String, AuthError> {
        self.issue(TokenSubject::default(), Scope::Service)
    }

    /// Decode and validate a token, reporting why it was rejected.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }

    /// True only for a well-formed, correctly signed, unexpired token.
    pub fn verify(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str, expiry: TokenExpiry) -> TokenIssuer {
        TokenIssuer::new(secret.as_bytes(), &expiry).unwrap()
    }

    #[test]
    fn expiry_parses_seconds_and_durations() {
        assert_eq!(TokenExpiry::parse("3600").unwrap(), TokenExpiry::Seconds(3600));
        assert_eq!(
            TokenExpiry::parse("1h").unwrap().ttl().unwrap(),
            Duration::from_secs(3600)
        );
        assert_eq!(
            TokenExpiry::parse("2 days").unwrap().ttl().unwrap(),
            Duration::from_secs(172_800)
        );
        assert_eq!(
            TokenExpiry::parse("1.5h").unwrap().ttl().unwrap(),
            Duration::from_secs(5400)
        );
        assert!(TokenExpiry::parse("soon").is_err());
        assert!(TokenExpiry::parse("10 fortnights").is_err());
    }

    #[test]
    fn expiry_rejects_sub_second_and_oversized_lifetimes() {
        assert!(TokenExpiry::parse("500ms").is_err());
        assert!(TokenExpiry::parse("0").is_err());
        assert!(TokenExpiry::parse(&u64::MAX.to_string()).is_err());
        assert!(TokenExpiry::Seconds(u64::MAX).ttl().is_err());
        assert!(TokenIssuer::new(b"secret", &TokenExpiry::Seconds(u64::MAX)).is_err());
        assert_eq!(TokenExpiry::parse("1000ms").unwrap().ttl().unwrap(), MIN_TOKEN_TTL);
    }

    #[test]
    fn default_expiry_is_one_hour() {
        assert_eq!(TokenExpiry::default().ttl().unwrap(), DEFAULT_TOKEN_TTL);
    }

    #[test]
    fn issued_token_verifies_and_carries_claims() {
        let issuer = issuer("secret", TokenExpiry::default());
        let token = issuer
            .issue(TokenSubject::web_user(7, "ops@example.com"), Scope::User)
            .unwrap();

        assert!(issuer.verify(&token));
        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.scope, Scope::User);
        assert_eq!(claims.role.as_deref(), Some("web_user"));
        assert_eq!(claims.user_id, Some(7));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_fails() {
        let token = issuer("other", TokenExpiry::default())
            .issue(TokenSubject::default(), Scope::Public)
            .unwrap();
        let issuer = issuer("secret", TokenExpiry::default());

        assert!(!issuer.verify(&token));
        assert!(matches!(issuer.decode(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn token_expires() {
        let issuer = issuer("secret", TokenExpiry::Seconds(1));
        let token = issuer.issue(TokenSubject::default(), Scope::Public).unwrap();
        assert!(issuer.verify(&token));

        std::thread::sleep(Duration::from_secs(2));

        assert!(!issuer.verify(&token));
        assert!(matches!(issuer.decode(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn garbage_and_other_algorithms_are_rejected() {
        let issuer = issuer("secret", TokenExpiry::default());
        assert!(!issuer.verify(""));
        assert!(!issuer.verify("not.a.jwt"));

        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            iss: TOKEN_ISSUER.to_string(),
            scope: Scope::Public,
            role: None,
            user_id: None,
            email: None,
            iat: now,
            exp: now + 60,
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(!issuer.verify(&hs512));
    }

    #[test]
    fn service_token_has_service_scope() {
        let issuer = issuer("secret", TokenExpiry::default());
        let token = issuer.service_token().unwrap();
        assert_eq!(issuer.decode(&token).unwrap().scope, Scope::Service);
    }
}
