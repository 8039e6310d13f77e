use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};

/// Shared-secret keys used to sign and verify access tokens.
#[derive(Clone)]
pub struct Security {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Security { .. }")
    }
}

impl Security {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn from_secret(secret: &SecretString) -> Security {
        let bytes = secret.expose_secret().as_bytes();
        Security {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Signature and expiry only; no clock leeway, no audience.
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation
    }
}
