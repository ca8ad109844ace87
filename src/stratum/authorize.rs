use super::*;

#[derive(Debug, PartialEq, Clone)]
pub struct Authorize {
    pub username: String,
    pub password: Option<String>,
}

impl Serialize for Authorize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.password.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.username)?;
        if let Some(password) = &self.password {
            seq.serialize_element(password)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Authorize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One((String,)),
            Two((String, Option<String>)),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One((username,)) => Authorize {
                username,
                password: None,
            },
            Raw::Two((username, password)) => Authorize { username, password },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_password() {
        let authorize: Authorize =
            serde_json::from_str(r#"["DxyzMiner.rig1","x"]"#).unwrap();
        assert_eq!(authorize.username, "DxyzMiner.rig1");
        assert_eq!(authorize.password.as_deref(), Some("x"));
    }

    #[test]
    fn without_password() {
        let authorize: Authorize = serde_json::from_str(r#"["DxyzMiner.rig1"]"#).unwrap();
        assert_eq!(authorize.password, None);
    }

    #[test]
    fn serialize_shapes() {
        let a = Authorize {
            username: "u.r".into(),
            password: None,
        };
        assert_eq!(serde_json::to_value(&a).unwrap(), json!(["u.r"]));

        let b = Authorize {
            username: "u.r".into(),
            password: Some("x".into()),
        };
        assert_eq!(serde_json::to_value(&b).unwrap(), json!(["u.r", "x"]));
    }
}
