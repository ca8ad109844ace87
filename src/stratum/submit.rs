use {super::*, crate::chain::SubmitLayout};

/// `mining.submit` parameters. The tuple slots are resolved through the
/// chain adapter's [`SubmitLayout`] rather than hard-coded positions, so a
/// chain with a reordered share tuple only swaps its layout.
#[derive(Debug, PartialEq, Clone)]
pub struct Submit {
    pub worker: String,
    pub job_id: JobId,
    pub extranonce2: Extranonce,
    pub ntime: Ntime,
    pub nonce: Nonce,
}

impl Submit {
    pub fn from_params(params: &Value, layout: SubmitLayout) -> Result<Self, InternalError> {
        let params = params.as_array().ok_or_else(|| InternalError::Parse {
            message: "submit params must be an array".into(),
        })?;

        let slot = |index: usize, name: &str| -> Result<&str, InternalError> {
            params
                .get(index)
                .and_then(Value::as_str)
                .ok_or_else(|| InternalError::Parse {
                    message: format!("submit slot {index} ({name}) missing or not a string"),
                })
        };

        Ok(Submit {
            worker: slot(layout.worker, "worker")?.to_string(),
            job_id: slot(layout.job_id, "job_id")?.parse()?,
            extranonce2: slot(layout.extranonce2, "extranonce2")?.parse()?,
            ntime: slot(layout.ntime, "ntime")?.parse()?,
            nonce: slot(layout.nonce, "nonce")?.parse()?,
        })
    }
}

impl Serialize for Submit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(5))?;
        seq.serialize_element(&self.worker)?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.extranonce2)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.nonce)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Submit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Submit::from_params(&value, SubmitLayout::default())
            .map_err(|e| de::Error::custom(e.to_string()))
    }
}
