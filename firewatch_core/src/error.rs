// firewatch_core/src/error.rs

use thiserror::Error;

/// Outcome categories of a geolocation request.
///
/// None of these are retried automatically; the operator re-triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location information unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported in this environment")]
    Unsupported,
}

impl LocationError {
    /// The operator-facing message, including a remediation hint.
    pub fn operator_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location permission denied. Please enable location services in your settings."
            }
            LocationError::PositionUnavailable => {
                "Location information unavailable. Move to an open area and try again."
            }
            LocationError::Timeout => "Location request timed out. Check your signal and try again.",
            LocationError::Unsupported => "Geolocation is not supported by this device or browser.",
        }
    }
}

/// Failures of the snapshot persistence medium.
///
/// The coordinator only ever logs these; tracking is never gated on them.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize snapshot record: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to parse snapshot record: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("snapshot storage unavailable: {0}")]
    Unavailable(String),
}

/// A handoff token that could not be decoded. Every variant means "malformed";
/// the variants only say where decoding gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("handoff token is not valid base64url text")]
    Encoding,
    #[error("handoff token ended before field `{0}`")]
    Truncated(&'static str),
    #[error("handoff token does not start with the expected magic bytes")]
    BadMagic,
    #[error("unsupported handoff token version {0}")]
    UnsupportedVersion(u8),
    #[error("handoff token has {0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("handoff field `{0}` is not valid UTF-8")]
    InvalidText(&'static str),
    #[error("handoff field `{0}` is out of range")]
    InvalidField(&'static str),
}

/// Why an operator action was refused without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no successful location fix yet")]
    NoFix,
    #[error("a request for this control is already in flight")]
    Busy,
    #[error("control is cooling down")]
    CoolingDown,
    #[error("feature is disabled by configuration")]
    Disabled,
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

/// A coordinator setting the coordinator cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinator setting `{field}`: {reason}")]
pub struct InvalidSetting {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidSetting {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
