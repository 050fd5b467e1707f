use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, Identity};
use crate::config::JwtConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token malformed")]
    Malformed,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signs and verifies bearer tokens. Keys are derived once from the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| TokenError::Signing("token expiry out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        // jsonwebtoken only rejects exp < now; a token is already dead at exp.
        let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as usize;
        if now >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_service(secret: &str, issuer: &str, audience: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60 * 24,
        })
    }

    fn service() -> TokenService {
        make_service("test-secret-test-secret-test-secret", "iss", "aud")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "a@example.com").expect("issue");
        let identity = tokens.verify(&token).expect("verify");
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "a@example.com");
    }

    #[test]
    fn token_past_ttl_is_expired() {
        let tokens = service();
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(25);
        let token = tokens
            .issue_at(Uuid::new_v4(), "a@example.com", issued)
            .expect("issue");
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_is_dead_at_exp() {
        let tokens = service();
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(60 * 24);
        let token = tokens
            .issue_at(Uuid::new_v4(), "a@example.com", issued)
            .expect("issue");
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        let tokens = TokenService::new(&JwtConfig {
            secret: "test-secret-test-secret-test-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        });
        assert!(matches!(
            tokens.issue(Uuid::new_v4(), "a@example.com"),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn altered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4(), "a@example.com").expect("issue");
        let (body, sig) = token.rsplit_once('.').expect("three segments");
        let first = if sig.starts_with('A') { 'B' } else { 'A' };
        let tampered = format!("{}.{}{}", body, first, &sig[1..]);
        assert!(matches!(
            tokens.verify(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = service();
        let theirs = make_service("another-secret-another-secret-xx", "iss", "aud");
        let token = theirs.issue(Uuid::new_v4(), "a@example.com").expect("issue");
        assert!(matches!(
            ours.verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert!(matches!(tokens.verify("garbage"), Err(TokenError::Malformed)));
        assert!(matches!(tokens.verify(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let good = make_service("same-secret-same-secret-same-secret", "good-iss", "good-aud");
        let bad = make_service("same-secret-same-secret-same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), "a@example.com").expect("issue");
        assert!(bad.verify(&token).is_err());
    }
}
