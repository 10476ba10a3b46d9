/// Token payloads
///
/// The claims carried inside access and refresh tokens. A payload is never
/// mutated once it is embedded in a token: renewal means a new payload with
/// a new `issued_at`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Constant token header
#[derive(Debug, Serialize)]
pub struct Header {
    pub alg: &'static str,
    pub typ: &'static str,
}

pub const DEFAULT_HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Fields common to every token class.
pub trait TokenPayload: Serialize + DeserializeOwned {
    fn user_id(&self) -> &str;
    fn issued_at(&self) -> DateTime<Utc>;
}

/// Payload of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPayload {
    pub user_id: String,
    #[serde(rename = "issuedAtTime", with = "rfc3339")]
    pub issued_at: DateTime<Utc>,
    pub is_admin: bool,
}

impl TokenPayload for AccessPayload {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Payload of a refresh token. `(user_id, issued_at)` is the identity the
/// session registry is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    pub user_id: String,
    #[serde(rename = "issuedAtTime", with = "rfc3339")]
    pub issued_at: DateTime<Utc>,
}

impl TokenPayload for RefreshPayload {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Just enough of any payload to run the expiry check.
#[derive(Debug, Deserialize)]
pub(crate) struct IssuedAt {
    #[serde(rename = "issuedAtTime", with = "rfc3339")]
    pub issued_at: DateTime<Utc>,
}

/// RFC 3339 in UTC with a `Z` suffix. Fractional seconds are written only as
/// far as they are non-zero, so parsing gives back the exact instant.
pub(crate) mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
