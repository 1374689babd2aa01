//! Persisted session record (what lives in the storage slot).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Identity;

pub const RECORD_VERSION: u32 = 1;

/// Versioned envelope around the persisted identity.
///
/// Earlier builds stored the bare identity object; [`SessionRecord::decode`]
/// still accepts that shape and reports it as version 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u32,
    pub session_id: Uuid,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Identity,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed session record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported session record version {0}")]
    UnsupportedVersion(u32),

    #[error("session record expired at {0}")]
    Expired(DateTime<Utc>),
}

impl SessionRecord {
    /// A TTL that runs past the last representable instant means the record
    /// never expires.
    pub fn new(user: Identity, saved_at: DateTime<Utc>, ttl: Option<chrono::Duration>) -> Self {
        let expires_at = ttl.and_then(|ttl| {
            let expires_at = saved_at.checked_add_signed(ttl);
            if expires_at.is_none() {
                tracing::warn!(ttl_secs = ttl.num_seconds(), "session ttl overflows; storing record without expiry");
            }
            expires_at
        });

        Self {
            version: RECORD_VERSION,
            session_id: Uuid::now_v7(),
            saved_at: Some(saved_at),
            expires_at,
            user,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a raw slot value.
    ///
    /// Anything that does not decode to an identity with a known role is an
    /// error; callers treat every error here as "no session".
    pub fn decode(raw: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;

        match value.get("version").map(serde_json::Value::as_u64) {
            None => {
                let user: Identity = serde_json::from_value(value)?;
                Ok(Self {
                    version: 0,
                    session_id: Uuid::nil(),
                    saved_at: None,
                    expires_at: None,
                    user,
                })
            }
            Some(Some(v)) if v == u64::from(RECORD_VERSION) => Ok(serde_json::from_value(value)?),
            Some(Some(v)) => Err(RecordError::UnsupportedVersion(u32::try_from(v).unwrap_or(u32::MAX))),
            Some(None) => Err(RecordError::UnsupportedVersion(u32::MAX)),
        }
    }

    /// Decode and reject records whose expiry has passed.
    pub fn decode_valid_at(raw: &str, now: DateTime<Utc>) -> Result<Self, RecordError> {
        let record = Self::decode(raw)?;
        match record.expires_at {
            Some(expires_at) if expires_at <= now => Err(RecordError::Expired(expires_at)),
            _ => Ok(record),
        }
    }
}
