use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;
use crate::error::{Error, Result};

/// Session token payload. Carries enough identity to rebuild a
/// `PublicUser` without a store lookup, though validation still checks
/// the user exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub login: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// HS256 signing and verification keys. Built from config at startup;
/// no process-wide key state.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::hours(cfg.ttl_hours),
        }
    }

    pub fn sign(&self, user_id: i64, login: &str) -> Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            login: login.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Internal(e.into()))?;
        debug!(user_id, "session token signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience. All failures collapse
    /// into the same uninformative auth error.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| Error::Auth("invalid token".into()))?;
        debug!(user_id = data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig::for_tests())
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let token = keys.sign(42, "alice").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.login, "alice");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = JwtKeys::from_config(&JwtConfig {
            ttl_hours: -1,
            ..JwtConfig::for_tests()
        });
        let token = keys.sign(1, "bob").expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let keys = make_keys();
        let other = JwtKeys::from_config(&JwtConfig {
            issuer: "someone-else".into(),
            audience: "their-users".into(),
            ..JwtConfig::for_tests()
        });
        let token = other.sign(1, "bob").expect("sign");
        assert!(matches!(keys.verify(&token), Err(Error::Auth(_))));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(matches!(
            keys.verify("not.a.token"),
            Err(Error::Auth(_))
        ));
    }
}
