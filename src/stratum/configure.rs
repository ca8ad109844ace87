use super::*;

/// `mining.configure` request: extension names plus a map of dotted options.
#[derive(Debug, PartialEq, Clone)]
pub struct Configure {
    pub extensions: Vec<String>,
    pub options: serde_json::Map<String, Value>,
}

impl Configure {
    pub fn requests(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

impl Serialize for Configure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.extensions, &self.options).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Configure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One((Vec<String>,)),
            Two((Vec<String>, serde_json::Map<String, Value>)),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One((extensions,)) => Configure {
                extensions,
                options: serde_json::Map::new(),
            },
            Raw::Two((extensions, options)) => Configure {
                extensions,
                options,
            },
        })
    }
}

/// The pool's fixed configure reply: version rolling is denied, the
/// minimum-difficulty and subscribe-extranonce extensions are acknowledged.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ConfigureResult {
    #[serde(rename = "version-rolling")]
    pub version_rolling: bool,
    #[serde(rename = "minimum-difficulty")]
    pub minimum_difficulty: bool,
    #[serde(rename = "subscribe-extranonce")]
    pub subscribe_extranonce: bool,
}

impl Default for ConfigureResult {
    fn default() -> Self {
        Self {
            version_rolling: false,
            minimum_difficulty: true,
            subscribe_extranonce: true,
        }
    }
}
