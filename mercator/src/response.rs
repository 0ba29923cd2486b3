//! Response model: the result half of the data exchanged with resource sources.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// Classification of a response error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested item does not exist at the source. Recoverable: callers are expected to
    /// substitute a placeholder or retry elsewhere.
    NotFound,
    /// The source is not currently reachable, or an archive row is absent.
    Connection,
    /// The request required an access credential that was missing or empty.
    InvalidCredential,
    /// Malformed input or any other failure.
    Other,
}

/// Error attached to a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    /// Classification of the failure.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ResponseError {
    /// Creates a new error value.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Unix timestamp with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The maximum representable timestamp. Used as the expiration of responses that never need
    /// revalidation.
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    /// Creates a timestamp from seconds since the Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// The current time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs() as i64)
            .unwrap_or(0);
        Self(secs)
    }

    /// Seconds since the Unix epoch.
    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

/// Result of a resource request, delivered through a single callback invocation.
///
/// Exactly one of `data` or (`error` or `no_content`) is meaningfully populated. The value is
/// immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Payload of the resource, when the request succeeded.
    pub data: Option<Bytes>,
    /// Error that prevented the request from producing data.
    pub error: Option<ResponseError>,
    /// The request was processed but the source has no content for it.
    pub no_content: bool,
    /// Validator that upstream caching layers may use for revalidation.
    pub etag: Option<String>,
    /// Time until which the response may be served from cache without revalidation.
    pub expires: Option<Timestamp>,
}

impl Response {
    /// Creates a successful response with the given payload.
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    /// Creates a failed response with the given error.
    pub fn from_error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: Some(ResponseError::new(kind, message)),
            ..Self::default()
        }
    }

    /// Creates an empty response carrying the given error, for items a source does not have.
    pub fn no_content(error: ResponseError) -> Self {
        Self {
            no_content: true,
            error: Some(error),
            ..Self::default()
        }
    }

    /// Whether the response carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
