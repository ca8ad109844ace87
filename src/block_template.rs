use super::*;

/// Deserialized `getblocktemplate` reply. Immutable once fetched; a
/// notification replaces it wholesale. Transaction data stays opaque hex so
/// auxiliary-family chains never round-trip through consensus decoding.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BlockTemplate {
    #[serde(deserialize_with = "version_from_i64")]
    pub version: Version,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: String,
    pub target: String,
    pub bits: Nbits,
    #[serde(rename = "curtime")]
    pub current_time: u32,
    #[serde(rename = "mintime", default)]
    pub min_time: u32,
    pub height: u64,
    #[serde(rename = "coinbasevalue", default)]
    pub coinbase_value: u64,
    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,
    /// Litecoin-family extension block trailer, appended to submissions.
    #[serde(rename = "mweb", default, skip_serializing_if = "Option::is_none")]
    pub mimble_wimble: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct TemplateTransaction {
    pub txid: Txid,
    pub data: String,
}

impl BlockTemplate {
    pub fn network_target(&self) -> Result<Target, stratum::InternalError> {
        Target::from_hex(&self.target)
    }

    pub fn network_difficulty(&self) -> f64 {
        self.bits.to_target().difficulty()
    }
}

fn version_from_i64<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let version = i64::deserialize(deserializer)?;
    Ok(Version::from(version as u32))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_json() -> Value {
        json!({
            "version": 6422788,
            "previousblockhash": "4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000",
            "target": "00000fffff000000000000000000000000000000000000000000000000000000",
            "bits": "1e0ffff0",
            "curtime": 1725000000u32,
            "mintime": 1724990000u32,
            "height": 5_300_000u64,
            "coinbasevalue": 1_000_000_000_000u64,
            "transactions": [
                {
                    "txid": "1111111111111111111111111111111111111111111111111111111111111111",
                    "data": "0100000001aa"
                }
            ]
        })
    }

    #[test]
    fn deserializes_rpc_reply() {
        let template: BlockTemplate = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(template.version.to_consensus(), 6422788);
        assert_eq!(template.height, 5_300_000);
        assert_eq!(template.bits, "1e0ffff0".parse().unwrap());
        assert_eq!(template.current_time, 1725000000);
        assert_eq!(template.min_time, 1724990000);
        assert_eq!(template.coinbase_value, 1_000_000_000_000);
        assert_eq!(template.transactions.len(), 1);
        assert_eq!(template.mimble_wimble, None);
    }

    #[test]
    fn negative_version_is_consensus_cast() {
        let mut raw = sample_json();
        raw["version"] = json!(-1);
        let template: BlockTemplate = serde_json::from_value(raw).unwrap();
        assert_eq!(template.version.to_consensus(), u32::MAX);
    }

    #[test]
    fn optional_fields_default() {
        let template: BlockTemplate = serde_json::from_value(json!({
            "version": 4,
            "previousblockhash": "00".repeat(32),
            "target": "00000fffff000000000000000000000000000000000000000000000000000000",
            "bits": "1e0ffff0",
            "curtime": 1725000000u32,
            "height": 10u64,
        }))
        .unwrap();

        assert_eq!(template.min_time, 0);
        assert_eq!(template.coinbase_value, 0);
        assert!(template.transactions.is_empty());
    }

    #[test]
    fn mweb_trailer_is_kept() {
        let mut raw = sample_json();
        raw["mweb"] = json!("cafebabe");
        let template: BlockTemplate = serde_json::from_value(raw).unwrap();
        assert_eq!(template.mimble_wimble.as_deref(), Some("cafebabe"));
    }

    #[test]
    fn network_target_and_difficulty_agree() {
        let template: BlockTemplate = serde_json::from_value(sample_json()).unwrap();
        let from_bits = template.network_difficulty();
        let from_target = template.network_target().unwrap().difficulty();
        assert!((from_bits - from_target).abs() / from_bits < 1e-3);
    }

    #[test]
    fn txid_parses_display_order() {
        let template: BlockTemplate = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(
            template.transactions[0].txid.to_string(),
            "1111111111111111111111111111111111111111111111111111111111111111"
        );
    }
}
