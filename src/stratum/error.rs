use super::*;
use snafu::Snafu;

pub type Result<T, E = InternalError> = std::result::Result<T, E>;

/// Stratum reject codes sent back to miners. The numeric values follow the
/// de-facto pool convention: 20 for everything internal, 21-25 for the share
/// rejections miners special-case, higher codes for this pool's own kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StratumError {
    Internal = 20,
    StaleJob = 21,
    DuplicateShare = 22,
    LowDifficulty = 23,
    Unauthorized = 24,
    NotSubscribed = 25,
    MalformedRequest = 26,
    Banned = 27,
    InvalidAddress = 28,
    BadHeader = 29,
    RpcUnavailable = 30,
    NodeRejected = 31,
}

impl StratumError {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            20 => Some(Self::Internal),
            21 => Some(Self::StaleJob),
            22 => Some(Self::DuplicateShare),
            23 => Some(Self::LowDifficulty),
            24 => Some(Self::Unauthorized),
            25 => Some(Self::NotSubscribed),
            26 => Some(Self::MalformedRequest),
            27 => Some(Self::Banned),
            28 => Some(Self::InvalidAddress),
            29 => Some(Self::BadHeader),
            30 => Some(Self::RpcUnavailable),
            31 => Some(Self::NodeRejected),
            _ => None,
        }
    }

    pub fn reply(self) -> ErrorReply {
        ErrorReply {
            error: self,
            detail: None,
        }
    }

    pub fn with_detail(self, detail: impl Display) -> ErrorReply {
        ErrorReply {
            error: self,
            detail: Some(detail.to_string()),
        }
    }
}

impl Display for StratumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Internal => "Internal error",
            Self::StaleJob => "Stale job",
            Self::DuplicateShare => "Duplicate share",
            Self::LowDifficulty => "Low difficulty share",
            Self::Unauthorized => "Unauthorized worker",
            Self::NotSubscribed => "Not subscribed",
            Self::MalformedRequest => "Malformed request",
            Self::Banned => "Banned",
            Self::InvalidAddress => "Invalid address",
            Self::BadHeader => "Bad header",
            Self::RpcUnavailable => "Upstream unavailable",
            Self::NodeRejected => "Rejected by node",
        };
        f.write_str(message)
    }
}

/// Error object inside a Stratum response: `{"code": .., "message": ..}`, with
/// the message extended by optional detail.
#[derive(Debug, Clone)]
pub struct ErrorReply {
    pub error: StratumError,
    pub detail: Option<String>,
}

impl ErrorReply {
    fn message(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{}: {detail}", self.error),
            None => self.error.to_string(),
        }
    }
}

impl PartialEq for ErrorReply {
    fn eq(&self, other: &Self) -> bool {
        self.error == other.error
    }
}

impl From<StratumError> for ErrorReply {
    fn from(error: StratumError) -> Self {
        error.reply()
    }
}

impl Display for ErrorReply {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error as i32, self.message())
    }
}

impl Serialize for ErrorReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("code", &(self.error as i32))?;
        map.serialize_entry("message", &self.message())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ErrorReply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            code: i32,
            message: String,
        }

        let wire = Wire::deserialize(deserializer)?;

        let error = StratumError::from_code(wire.code)
            .ok_or_else(|| de::Error::custom(format!("unknown stratum error code {}", wire.code)))?;

        Ok(ErrorReply {
            error,
            detail: Some(wire.message),
        })
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InternalError {
    #[snafu(display("Failed to parse hex string: {source}"))]
    HexParse { source: hex::FromHexError },

    #[snafu(display("Invalid length: expected {expected}, got {actual}"))]
    InvalidLength { expected: usize, actual: usize },

    #[snafu(display("Invalid value: {reason}"))]
    InvalidValue { reason: String },

    #[snafu(display("Parse error: {message}"))]
    Parse { message: String },

    #[snafu(display("Failed to serialize JSON: {source}"))]
    Serialization {
        #[snafu(source(from(serde_json::Error, Box::new)))]
        source: Box<serde_json::Error>,
    },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },
}

impl From<serde_json::Error> for InternalError {
    fn from(source: serde_json::Error) -> Self {
        InternalError::Serialization {
            source: Box::new(source),
        }
    }
}

impl From<std::io::Error> for InternalError {
    fn from(source: std::io::Error) -> Self {
        InternalError::Io { source }
    }
}
