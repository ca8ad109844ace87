use super::*;

/// Merge-mining magic preceding the aux block hash in the coinbase.
pub const MERGED_MINING_HEADER: &str = "fabe6d6d";

/// Merkle size 1, merkle nonce 0, and the reserved tail the aux chains
/// expect after the hash. Bit-exact on the wire.
pub const MERGED_MINING_TRAILER: &str = "010000000000000000002632";

const MERKLE_BRANCH_MASK: &str = "00000000";

/// Auxiliary chain's merge-mining request, as returned by `createauxblock`.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct AuxBlock {
    pub hash: String,
    #[serde(rename = "chainid")]
    pub chain_id: u32,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: String,
    #[serde(rename = "coinbasehash", default)]
    pub coinbase_hash: String,
    #[serde(rename = "coinbasevalue", default)]
    pub coinbase_value: u64,
    pub bits: Nbits,
    pub height: u64,
    #[serde(alias = "_target")]
    pub target: String,
}

impl AuxBlock {
    /// The commitment spliced into the parent coinbase:
    /// `fabe6d6d ‖ aux_hash ‖ 010000000000000000002632`.
    pub fn commitment(&self) -> String {
        format!("{MERGED_MINING_HEADER}{}{MERGED_MINING_TRAILER}", self.hash)
    }

    /// `createauxblock` reports the target byte-reversed relative to the
    /// natural big-endian form.
    pub fn network_target(&self) -> Result<Target, stratum::InternalError> {
        let natural =
            encoding::reverse_hex_bytes(&self.target).map_err(|e| stratum::InternalError::Parse {
                message: format!("aux target: {e}"),
            })?;
        Target::from_hex(&natural)
    }
}

/// The blob accepted by the aux node's `submitauxblock`: proof that the
/// parent header commits to the aux block hash.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxPow {
    pub parent_coinbase: String,
    pub parent_header_hash: String,
    pub parent_merkle_steps: Vec<MerkleNode>,
    pub parent_header: String,
}

impl AuxPow {
    pub fn new(
        parent_coinbase: String,
        parent_header_hash: String,
        parent_merkle_steps: Vec<MerkleNode>,
        parent_header: String,
    ) -> Self {
        Self {
            parent_coinbase,
            parent_header_hash,
            parent_merkle_steps,
            parent_header,
        }
    }

    fn parent_merkle_branch(&self) -> String {
        let mut branch = hex::encode(encoding::var_uint(self.parent_merkle_steps.len() as u64));
        for step in &self.parent_merkle_steps {
            branch.push_str(&step.to_string());
        }
        branch.push_str(MERKLE_BRANCH_MASK);
        branch
    }

    /// Single-aux-chain pools prove membership in a one-leaf aux tree.
    fn aux_merkle_branch(&self) -> String {
        format!("00{MERKLE_BRANCH_MASK}")
    }

    pub fn serialize(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.parent_coinbase,
            self.parent_header_hash,
            self.parent_merkle_branch(),
            self.aux_merkle_branch(),
            self.parent_header,
        )
    }
}
