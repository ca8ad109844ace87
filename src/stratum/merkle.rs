use super::*;

/// One node of the coinbase Merkle branch. Bytes are kept in the natural
/// little-endian order they are hashed and wired in; hex on the wire is the
/// byte-for-byte encoding, not the reversed display form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleNode([u8; 32]);

impl MerkleNode {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Display for MerkleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for MerkleNode {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(InternalError::InvalidLength {
                expected: 64,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|source| InternalError::HexParse { source })?;
        Ok(MerkleNode(bytes))
    }
}

impl From<Txid> for MerkleNode {
    fn from(txid: Txid) -> Self {
        Self(txid.to_raw_hash().to_byte_array())
    }
}

impl From<sha256d::Hash> for MerkleNode {
    fn from(hash: sha256d::Hash) -> Self {
        Self(hash.to_byte_array())
    }
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut concat = [0u8; 64];
    concat[..32].copy_from_slice(left);
    concat[32..].copy_from_slice(right);
    sha256d::Hash::hash(&concat).to_byte_array()
}

/// The branch proving the coinbase (leaf index 0) against the Merkle root:
/// at every level record the sibling of the leftmost node, pair adjacent
/// nodes (duplicating the last when odd), and hash upward until one remains.
pub fn merkle_steps(non_coinbase_txids: &[Txid]) -> Vec<MerkleNode> {
    if non_coinbase_txids.is_empty() {
        return Vec::new();
    }

    let mut level: Vec<[u8; 32]> = Vec::with_capacity(non_coinbase_txids.len() + 1);
    level.push([0u8; 32]);
    level.extend(
        non_coinbase_txids
            .iter()
            .map(|txid| txid.to_raw_hash().to_byte_array()),
    );

    let mut steps = Vec::new();
    let mut coinbase_index = 0usize;

    while level.len() > 1 {
        // XOR flips to the sibling on either side.
        let sibling_index = coinbase_index ^ 1;

        let sibling = if sibling_index < level.len() {
            level[sibling_index]
        } else {
            level[coinbase_index]
        };

        steps.push(MerkleNode(sibling));

        let mut next_level = Vec::with_capacity(level.len() / 2 + 1);
        let mut i = 0;
        while i < level.len() {
            let left = level[i];
            let right = if i + 1 < level.len() { level[i + 1] } else { left };
            next_level.push(hash_pair(&left, &right));
            i += 2;
        }

        level = next_level;
        coinbase_index /= 2;
    }

    steps
}

/// Left-fold of the coinbase hash through the ordered steps:
/// `acc ← sha256d(acc ‖ step)`.
pub fn fold_merkle_root(coinbase_hash: [u8; 32], steps: &[MerkleNode]) -> [u8; 32] {
    steps
        .iter()
        .fold(coinbase_hash, |acc, step| hash_pair(&acc, &step.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txid(n: u32) -> Txid {
        let hex = format!("{n:x}");
        assert_eq!(hex.len(), 1);
        hex.repeat(64).parse().unwrap()
    }

    fn leaf(txid: Txid) -> [u8; 32] {
        txid.to_raw_hash().to_byte_array()
    }

    #[test]
    fn empty_when_only_coinbase() {
        assert!(merkle_steps(&[]).is_empty());
    }

    #[test]
    fn single_txid_branch_is_the_txid() {
        let steps = merkle_steps(&[txid(1)]);
        assert_eq!(steps, vec![MerkleNode::from(txid(1))]);
    }

    #[test]
    fn two_level_tree() {
        // Leaves [cb, t1, t2] → steps [t1, H(t2‖t2)]
        let steps = merkle_steps(&[txid(1), txid(2)]);

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], MerkleNode::from(txid(1)));
        assert_eq!(
            steps[1],
            MerkleNode(hash_pair(&leaf(txid(2)), &leaf(txid(2))))
        );
    }

    #[test]
    fn two_level_tree_with_three_transactions() {
        // Leaves [cb, t1, t2, t3] → steps [t1, H(t2‖t3)]
        let steps = merkle_steps(&[txid(1), txid(2), txid(3)]);

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], MerkleNode::from(txid(1)));
        assert_eq!(
            steps[1],
            MerkleNode(hash_pair(&leaf(txid(2)), &leaf(txid(3))))
        );
    }

    #[test]
    fn three_level_tree() {
        // Leaves [cb, t1..t5] → steps [t1, H(t2‖t3), H(H(t4‖t5)‖H(t4‖t5))]
        let steps = merkle_steps(&[txid(1), txid(2), txid(3), txid(4), txid(5)]);

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], MerkleNode::from(txid(1)));
        assert_eq!(
            steps[1],
            MerkleNode(hash_pair(&leaf(txid(2)), &leaf(txid(3))))
        );

        let right_pair = hash_pair(&leaf(txid(4)), &leaf(txid(5)));
        assert_eq!(steps[2], MerkleNode(hash_pair(&right_pair, &right_pair)));
    }

    #[test]
    fn step_count_is_tree_depth() {
        // For k non-coinbase transactions the branch has ⌈log2(k+1)⌉ steps.
        for (k, expected) in [(0usize, 0usize), (1, 1), (2, 2), (3, 2), (4, 3), (7, 3), (8, 4)] {
            let txids: Vec<Txid> = (0..k).map(|i| txid((i % 9 + 1) as u32)).collect();
            assert_eq!(
                merkle_steps(&txids).len(),
                expected,
                "wrong depth for {k} transactions"
            );
        }
    }

    #[test]
    fn fold_without_steps_is_identity() {
        let coinbase_hash = [7u8; 32];
        assert_eq!(fold_merkle_root(coinbase_hash, &[]), coinbase_hash);
    }

    #[test]
    fn fold_reproduces_root() {
        // Manually: root = H( H(cb‖t1) ‖ H(t2‖t2) )
        let coinbase_hash = [7u8; 32];
        let steps = merkle_steps(&[txid(1), txid(2)]);

        let left = hash_pair(&coinbase_hash, &leaf(txid(1)));
        let right = hash_pair(&leaf(txid(2)), &leaf(txid(2)));
        let expected = hash_pair(&left, &right);

        assert_eq!(fold_merkle_root(coinbase_hash, &steps), expected);
    }

    #[test]
    fn node_hex_roundtrip() {
        let wire = "c0f65e3443b9e2215ebd08cd6fc52d0e776897a3afdf4787cf28de48d9a8c3ad";
        let node = wire.parse::<MerkleNode>().unwrap();
        assert_eq!(node.to_string(), wire);
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            format!("\"{wire}\"")
        );
    }

    #[test]
    fn node_rejects_bad_hex() {
        assert!("abcd".parse::<MerkleNode>().is_err());
        assert!("g".repeat(64).parse::<MerkleNode>().is_err());
    }
}
