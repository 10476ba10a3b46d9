/// Token Issuance and Validation
///
/// A token is `base64url(header) "." base64url(payload) "." base64url(mac)`,
/// every segment without padding. The MAC is HMAC-SHA256 over the first two
/// segments joined by `.`.
///
/// One codec exists per token class; each has its own secret and validity
/// duration. Codecs hold no mutable state and may be shared freely.

use std::marker::PhantomData;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};

use crate::auth::payload::{IssuedAt, TokenPayload, DEFAULT_HEADER};
use crate::clock::Clock;
use crate::error::TokenError;

const ALGORITHM: Algorithm = Algorithm::HS256;
const SEGMENTS: usize = 3;

pub struct TokenCodec<P> {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    duration: Duration,
    clock: Arc<dyn Clock>,
    payload: PhantomData<fn() -> P>,
}

impl<P: TokenPayload> TokenCodec<P> {
    /// Create a codec signing with `secret` whose tokens stay valid for
    /// `duration` after their `issued_at`.
    pub fn new(secret: &[u8], duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            duration,
            clock,
            payload: PhantomData,
        }
    }

    /// Encode and sign `payload`.
    ///
    /// Deterministic: the same payload under the same secret always yields
    /// the same token.
    ///
    /// # Errors
    /// Returns `TokenError::Encoding` if serialization or signing fails
    pub fn issue(&self, payload: &P) -> Result<String, TokenError> {
        let header = serde_json::to_vec(&DEFAULT_HEADER)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        let body =
            serde_json::to_vec(payload).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        let payload_b64 = URL_SAFE_NO_PAD.encode(body);
        let signature = self.sign(&header_b64, &payload_b64)?;

        Ok(format!("{}.{}.{}", header_b64, payload_b64, signature))
    }

    /// Check a token against the codec's clock.
    ///
    /// # Errors
    /// See [`TokenCodec::validate_at`]
    pub fn validate(&self, token: &str) -> Result<(), TokenError> {
        self.validate_at(token, self.clock.now())
    }

    /// Check a token as of `now`.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// 1. exactly three segments, else `InvalidFormat`
    /// 2. `issued_at` not older than `now - duration`, else `Expired`
    /// 3. MAC matches, else `InvalidSignature`
    ///
    /// Only `issued_at` is read from the payload here. A payload segment that
    /// cannot be decoded that far fails with `InvalidPayload`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
        let [header_b64, payload_b64, signature] = split_token(token)?;

        let issued_at = decode_segment::<IssuedAt>(payload_b64)?.issued_at;
        // a duration reaching past the calendar range never expires anything
        let expiration = now
            .checked_sub_signed(self.duration)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        if issued_at < expiration {
            return Err(TokenError::Expired {
                issued_at,
                expiration,
            });
        }

        let message = format!("{}.{}", header_b64, payload_b64);
        // constant-time comparison against a freshly computed MAC
        let matches = crypto::verify(signature, message.as_bytes(), &self.decoding_key, ALGORITHM)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        if !matches {
            return Err(TokenError::InvalidSignature);
        }

        Ok(())
    }

    /// Decode the typed payload. Neither the signature nor the expiry is
    /// re-checked; call [`TokenCodec::validate`] first.
    pub fn load_payload(&self, token: &str) -> Result<P, TokenError> {
        let [_, payload_b64, _] = split_token(token)?;
        decode_segment(payload_b64)
    }

    /// `validate` followed by `load_payload`.
    pub fn verify(&self, token: &str) -> Result<P, TokenError> {
        self.validate(token)?;
        self.load_payload(token)
    }

    fn sign(&self, header_b64: &str, payload_b64: &str) -> Result<String, TokenError> {
        let message = format!("{}.{}", header_b64, payload_b64);
        crypto::sign(message.as_bytes(), &self.encoding_key, ALGORITHM)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

fn split_token(token: &str) -> Result<[&str; SEGMENTS], TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [header, payload, signature] => Ok([*header, *payload, *signature]),
        _ => Err(TokenError::InvalidFormat {
            segments: parts.len(),
        }),
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::InvalidPayload(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::InvalidPayload(e.to_string()))
}
