use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
}

/// Heterogeneous Stratum `result` values. Keeping the variants closed stops
/// untyped JSON from leaking past the protocol boundary.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum StratumResult {
    Null,
    Bool(bool),
    Array(Vec<Value>),
    Map(serde_json::Map<String, Value>),
}

impl StratumResult {
    pub fn of<T: Serialize>(value: &T) -> Result<Self, InternalError> {
        Ok(serde_json::from_value(serde_json::to_value(value)?)?)
    }
}

impl From<bool> for StratumResult {
    fn from(value: bool) -> Self {
        StratumResult::Bool(value)
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<StratumResult>,
        error: Option<ErrorReply>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

impl Message {
    pub fn response(id: Id, result: StratumResult) -> Self {
        Message::Response {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Id, error: ErrorReply) -> Self {
        Message::Response {
            id,
            result: Some(StratumResult::Bool(false)),
            error: Some(error),
        }
    }

    pub fn notification(method: &str, params: impl Serialize) -> Result<Self, InternalError> {
        Ok(Message::Notification {
            method: method.into(),
            params: serde_json::to_value(params)?,
        })
    }
}

/// Stratum notifications carry `id: null`, which the JSON-RPC spec says
/// should be an absent field. Both shapes are accepted here; anything with a
/// non-null id and a method is a request.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let has_method = value.get("method").is_some();

        let is_notification = has_method
            && (value.get("id").is_none() || value.get("id") == Some(&Value::Null));

        let is_response = value.get("result").is_some() || value.get("error").is_some();

        if is_response {
            #[derive(Deserialize)]
            struct Resp {
                id: Id,
                result: Option<StratumResult>,
                error: Option<ErrorReply>,
            }

            let r: Resp = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Response {
                id: r.id,
                result: r.result,
                error: r.error,
            })
        } else if is_notification {
            let method = value
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| de::Error::missing_field("method"))?
                .to_string();

            let params = value
                .get("params")
                .cloned()
                .ok_or_else(|| de::Error::missing_field("params"))?;

            Ok(Message::Notification { method, params })
        } else if has_method {
            #[derive(Deserialize)]
            struct Req {
                id: Id,
                method: String,
                params: Value,
            }

            let r: Req = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Request {
                id: r.id,
                method: r.method,
                params: r.params,
            })
        } else {
            Err(de::Error::custom("unknown message format"))
        }
    }
}
