//! JSON response envelope: `{"code": .., "data": .., "ts": ..}`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::SqlWebError;

/// Application status code carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCode(pub i64);

impl ResponseCode {
    pub const OK: ResponseCode = ResponseCode(200);
    pub const ERROR: ResponseCode = ResponseCode(100);
    pub const NOK: ResponseCode = ResponseCode::ERROR;
    pub const BAD_LOGIN: ResponseCode = ResponseCode(301);
}

impl Default for ResponseCode {
    fn default() -> Self {
        ResponseCode::OK
    }
}

impl From<i64> for ResponseCode {
    fn from(code: i64) -> Self {
        ResponseCode(code)
    }
}

/// The envelope itself, for callers that embed it in something larger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub code: ResponseCode,
    /// `None` serializes as `null`.
    pub data: Option<T>,
    /// Unix time in milliseconds.
    pub ts: i64,
}

pub struct Response;

impl Response {
    /// Wrap `data` with a code and the current time.
    #[must_use]
    pub fn envelope<T: Serialize>(data: Option<T>, code: ResponseCode) -> Envelope<T> {
        Envelope {
            code,
            data,
            ts: Utc::now().timestamp_millis(),
        }
    }

    /// Serialize `data` inside an envelope.
    ///
    /// # Errors
    /// Returns `SqlWebError::SerializationError` if `data` cannot be serialized.
    pub fn json<T: Serialize>(data: &T, code: ResponseCode) -> Result<String, SqlWebError> {
        Ok(serde_json::to_string(&Self::envelope(Some(data), code))?)
    }

    /// An envelope with `"data": null`.
    ///
    /// # Errors
    /// Returns `SqlWebError::SerializationError` if serialization fails.
    pub fn empty(code: ResponseCode) -> Result<String, SqlWebError> {
        Ok(serde_json::to_string(&Self::envelope::<()>(None, code))?)
    }
}
