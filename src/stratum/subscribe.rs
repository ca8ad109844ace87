use super::*;

#[derive(Debug, PartialEq, Clone)]
pub struct Subscribe {
    pub user_agent: Option<String>,
}

impl Serialize for Subscribe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(usize::from(self.user_agent.is_some())))?;
        if let Some(user_agent) = &self.user_agent {
            seq.serialize_element(user_agent)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Subscribe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let params = Vec::<Value>::deserialize(deserializer)?;

        let user_agent = params
            .first()
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Subscribe { user_agent })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SubscribeResult {
    pub subscriptions: Vec<(String, String)>,
    pub extranonce1: Extranonce,
    pub extranonce2_size: usize,
}

impl Serialize for SubscribeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.subscriptions)?;
        seq.serialize_element(&self.extranonce1)?;
        seq.serialize_element(&self.extranonce2_size)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SubscribeResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (subscriptions, extranonce1, extranonce2_size) =
            <(Vec<(String, String)>, Extranonce, usize)>::deserialize(deserializer)?;

        Ok(SubscribeResult {
            subscriptions,
            extranonce1,
            extranonce2_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_with_user_agent() {
        let subscribe: Subscribe = serde_json::from_str(r#"["cgminer/4.12"]"#).unwrap();
        assert_eq!(subscribe.user_agent.as_deref(), Some("cgminer/4.12"));
    }

    #[test]
    fn subscribe_empty_params() {
        let subscribe: Subscribe = serde_json::from_str("[]").unwrap();
        assert_eq!(subscribe.user_agent, None);
    }

    #[test]
    fn subscribe_ignores_session_id_suggestion() {
        let subscribe: Subscribe =
            serde_json::from_str(r#"["cgminer/4.12","deadbeef"]"#).unwrap();
        assert_eq!(subscribe.user_agent.as_deref(), Some("cgminer/4.12"));
    }

    #[test]
    fn result_shape() {
        let result = SubscribeResult {
            subscriptions: vec![
                ("mining.set_difficulty".into(), "a1b2".into()),
                ("mining.notify".into(), "a1b2".into()),
            ],
            extranonce1: "deadbeef".parse().unwrap(),
            extranonce2_size: 4,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!([
                [["mining.set_difficulty", "a1b2"], ["mining.notify", "a1b2"]],
                "deadbeef",
                4
            ])
        );

        let back: SubscribeResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }
}
