use std::fmt;

use jsonwebtoken::{decode, errors::Error, Algorithm, DecodingKey, EncodingKey, Validation};

use crate::config::Config;
use crate::routes::auth::claims::Claims;

/// Verifies the `auth_token` session issued by the account service. Secret
/// strength is enforced when the config loads, so construction can't fail.
#[derive(Clone)]
pub struct SessionKeys {
    #[cfg_attr(not(test), allow(dead_code))]
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("iss", &self.validation.iss)
            .field("aud", &self.validation.aud)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &[u8], issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        // Expired sessions must not buy another message.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            &config.jwt_issuer,
            &config.jwt_audience,
        )
    }

    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    /// Signs claims the way the account service does. Only tests mint tokens.
    #[cfg(test)]
    pub fn issue(&self, mut claims: Claims) -> Result<String, Error> {
        if let Some(iss) = self.validation.iss.as_ref().and_then(|set| set.iter().next()) {
            claims.iss = iss.clone();
        }
        if let Some(aud) = self.validation.aud.as_ref().and_then(|set| set.iter().next()) {
            claims.aud = aud.clone();
        }
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
    }
}

/// State that can verify sessions for the `AuthSession` extractor.
pub trait SessionKeyProvider {
    fn session_keys(&self) -> &SessionKeys;
}
