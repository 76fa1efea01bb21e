use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{auth::repo_types::User, config::JwtConfig, error::AppError};

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,  // user ID
    pub name: String, // full name at issuance
    pub iat: i64,     // issued at (unix timestamp)
    pub exp: i64,     // expires at (unix timestamp)
}

/// RS256 key pair used to sign and verify session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    /// Parses both PEMs and checks that they belong together.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> anyhow::Result<Self> {
        let encoding =
            EncodingKey::from_rsa_pem(private_pem).context("parse RSA private key")?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).context("parse RSA public key")?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let keys = Self {
            encoding,
            decoding,
            validation,
        };

        let probe = keys
            .sign(&Claims {
                sub: "0".into(),
                name: "probe".into(),
                iat: OffsetDateTime::now_utc().unix_timestamp(),
                exp: (OffsetDateTime::now_utc() + TimeDuration::minutes(1)).unix_timestamp(),
            })
            .context("sign probe token")?;
        decode::<Claims>(&probe, &keys.decoding, &keys.validation)
            .context("public key does not match private key")?;

        Ok(keys)
    }

    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        Self::from_pem(
            cfg.private_key_pem.as_bytes(),
            cfg.public_key_pem.as_bytes(),
        )
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::new(Algorithm::RS256), claims, &self.encoding)?;
        Ok(token)
    }

    /// Issues a token for `user` valid from `now` for [`TOKEN_TTL`].
    pub fn issue(&self, user: &User, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(TOKEN_TTL.as_secs() as i64);
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.full_name.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = self.sign(&claims).context("sign session token")?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    /// Returns the user ID carried by a valid token.
    ///
    /// Every failure is reported as [`AppError::Unauthorized`] so callers
    /// cannot tell a forged token from an expired one.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            warn!(reason = ?e.kind(), "token rejected");
            AppError::Unauthorized
        })?;
        let user_id = data.claims.sub.parse::<i64>().map_err(|_| {
            warn!("token subject is not a user id");
            AppError::Unauthorized
        })?;
        debug!(user_id, "jwt verified");
        Ok(user_id)
    }
}

#[cfg(test)]
pub(crate) const TEST_PRIVATE_PEM: &str = include_str!("testdata/private.pem");
#[cfg(test)]
pub(crate) const TEST_PUBLIC_PEM: &str = include_str!("testdata/public.pem");

#[cfg(test)]
pub(crate) fn test_keys() -> JwtKeys {
    JwtKeys::from_pem(TEST_PRIVATE_PEM.as_bytes(), TEST_PUBLIC_PEM.as_bytes())
        .expect("test key pair")
}
