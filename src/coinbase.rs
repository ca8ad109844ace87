use {super::*, snafu::Snafu};

/// Consensus cap on the coinbase scriptSig.
const MAX_SCRIPT_SIG_SIZE: usize = 100;

/// The arbitrary region is a single direct push, so its length byte must
/// stay below OP_PUSHDATA1.
const MAX_ARBITRARY_REGION: usize = 75;

const TX_VERSION: u32 = 1;
const SEQUENCE_FINAL: [u8; 4] = [0xff; 4];
const LOCK_TIME: [u8; 4] = [0; 4];

#[derive(Debug, Snafu, PartialEq)]
pub enum CoinbaseError {
    #[snafu(display("coinbase scriptSig is {size} bytes (max {MAX_SCRIPT_SIG_SIZE})"))]
    ScriptSigTooLarge { size: usize },

    #[snafu(display("arbitrary region is {size} bytes (max {MAX_ARBITRARY_REGION})"))]
    ArbitraryRegionTooLarge { size: usize },

    #[snafu(display("block height {height} does not fit a script int"))]
    HeightOutOfRange { height: u64 },
}

/// Split coinbase transaction: `initial ‖ extranonce ‖ final`, where the
/// miner fills `extranonce = extranonce1 ‖ extranonce2`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinbasePieces {
    pub initial: String,
    pub final_part: String,
}

impl CoinbasePieces {
    pub fn assemble(&self, extranonce_hex: &str) -> String {
        format!("{}{}{}", self.initial, extranonce_hex, self.final_part)
    }
}

/// Builds the two coinbase halves around the reserved extranonce region.
///
/// The scriptSig is `height_push ‖ L ‖ extranonce ‖ varint(sig‖commitment) ‖
/// sig ‖ commitment`, with `L` declaring the byte length of everything after
/// it. `initial` ends on the `L` byte so the miner's extranonce lands
/// immediately behind it; `final` opens with the length-prefixed signature
/// and merge-mining commitment and closes with the payout output.
#[derive(Debug, Clone)]
pub struct CoinbaseBuilder {
    height: u64,
    value: u64,
    payout_script: Vec<u8>,
    signature: Vec<u8>,
    aux_commitment: Vec<u8>,
    extranonce_reserve: usize,
}

impl CoinbaseBuilder {
    pub fn new(height: u64, value: u64, payout_script: Vec<u8>) -> Self {
        Self {
            height,
            value,
            payout_script,
            signature: Vec::new(),
            aux_commitment: Vec::new(),
            extranonce_reserve: EXTRANONCE_RESERVE,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<Vec<u8>>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn with_aux_commitment(mut self, commitment: Vec<u8>) -> Self {
        self.aux_commitment = commitment;
        self
    }

    pub fn with_extranonce_reserve(mut self, reserve: usize) -> Self {
        self.extranonce_reserve = reserve;
        self
    }

    pub fn build(self) -> Result<CoinbasePieces, CoinbaseError> {
        let height_push = self.height_push()?;

        let mut arbitrary = self.signature.clone();
        arbitrary.extend_from_slice(&self.aux_commitment);
        let arbitrary_framed = encoding::bytes_with_length_header(&arbitrary);

        let region = arbitrary_framed.len() + self.extranonce_reserve;
        if region > MAX_ARBITRARY_REGION {
            return Err(CoinbaseError::ArbitraryRegionTooLarge { size: region });
        }

        let script_len = height_push.len() + 1 + region;
        if script_len > MAX_SCRIPT_SIG_SIZE {
            return Err(CoinbaseError::ScriptSigTooLarge { size: script_len });
        }

        let mut initial = Vec::new();
        initial.extend_from_slice(&TX_VERSION.to_le_bytes());
        initial.push(0x01);
        initial.extend_from_slice(&[0u8; 32]);
        initial.extend_from_slice(&[0xff; 4]);
        initial.extend_from_slice(&encoding::var_uint(script_len as u64));
        initial.extend_from_slice(&height_push);
        initial.push(region as u8);

        let mut final_part = arbitrary_framed;
        final_part.extend_from_slice(&SEQUENCE_FINAL);
        final_part.push(0x01);
        final_part.extend_from_slice(&self.value.to_le_bytes());
        final_part.extend_from_slice(&encoding::bytes_with_length_header(&self.payout_script));
        final_part.extend_from_slice(&LOCK_TIME);

        Ok(CoinbasePieces {
            initial: hex::encode(initial),
            final_part: hex::encode(final_part),
        })
    }

    /// BIP34: minimally encoded script int push of the block height.
    fn height_push(&self) -> Result<Vec<u8>, CoinbaseError> {
        let height = i64::try_from(self.height)
            .map_err(|_| CoinbaseError::HeightOutOfRange { height: self.height })?;

        let mut buf = [0u8; 8];
        let len = write_scriptint(&mut buf, height);

        let mut push = Vec::with_capacity(len + 1);
        push.push(len as u8);
        push.extend_from_slice(&buf[..len]);
        Ok(push)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq as pretty_assert_eq};

    fn payout_script() -> Vec<u8> {
        // P2PKH: OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
        let mut script = vec![0x76, 0xa9, 0x14];
        script.extend_from_slice(&[0x11; 20]);
        script.extend_from_slice(&[0x88, 0xac]);
        script
    }

    fn builder() -> CoinbaseBuilder {
        CoinbaseBuilder::new(5_300_000, 1_000_000_000_000, payout_script())
            .with_signature(*b"/mergepool/")
    }

    #[test]
    fn initial_layout() {
        let pieces = builder().build().unwrap();
        let initial = hex::decode(&pieces.initial).unwrap();

        // version ‖ input count ‖ null outpoint ‖ index
        assert_eq!(&initial[0..4], &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(initial[4], 0x01);
        assert_eq!(&initial[5..37], &[0u8; 32]);
        assert_eq!(&initial[37..41], &[0xff; 4]);
    }

    #[test]
    fn initial_ends_on_region_length_byte() {
        let signature = b"/mergepool/";
        let pieces = builder().build().unwrap();
        let initial = hex::decode(&pieces.initial).unwrap();

        // varint(1 + len(sig)) + sig, plus the reserved extranonce bytes
        let expected_region = 1 + signature.len() + EXTRANONCE_RESERVE;
        assert_eq!(*initial.last().unwrap() as usize, expected_region);
    }

    #[test]
    fn script_length_covers_push_and_region() {
        let pieces = builder().build().unwrap();
        let initial = hex::decode(&pieces.initial).unwrap();

        let script_len = initial[41] as usize;
        let height_push_len = initial[42] as usize + 1;
        let region = *initial.last().unwrap() as usize;
        assert_eq!(script_len, height_push_len + 1 + region);
    }

    #[test]
    fn height_is_bip34_encoded() {
        let pieces = CoinbaseBuilder::new(5_300_000, 0, payout_script())
            .build()
            .unwrap();
        let initial = hex::decode(&pieces.initial).unwrap();

        // 5_300_000 = 0x50DF20, pushed little-endian.
        assert_eq!(initial[42], 3);
        assert_eq!(&initial[43..46], &[0x20, 0xdf, 0x50]);
    }

    #[test]
    fn final_opens_with_length_prefixed_arbitrary_bytes() {
        let pieces = builder().build().unwrap();
        let final_part = hex::decode(&pieces.final_part).unwrap();

        assert_eq!(final_part[0] as usize, b"/mergepool/".len());
        assert_eq!(&final_part[1..12], b"/mergepool/");
        // sequence follows immediately
        assert_eq!(&final_part[12..16], &[0xff; 4]);
    }

    #[test]
    fn aux_commitment_sits_between_signature_and_sequence() {
        let commitment = hex::decode(format!(
            "fabe6d6d{}010000000000000000002632",
            "a".repeat(64)
        ))
        .unwrap();

        let pieces = builder()
            .with_aux_commitment(commitment.clone())
            .build()
            .unwrap();

        let commitment_hex = hex::encode(&commitment);
        assert!(!pieces.initial.contains(&commitment_hex));
        assert!(pieces.final_part.contains(&commitment_hex));

        let final_part = hex::decode(&pieces.final_part).unwrap();
        assert_eq!(
            final_part[0] as usize,
            b"/mergepool/".len() + commitment.len()
        );
    }

    #[test]
    fn payout_output_pays_template_value() {
        let pieces = builder().build().unwrap();
        let final_part = hex::decode(&pieces.final_part).unwrap();

        let value_offset = final_part.len() - 4 - (1 + payout_script().len()) - 8;
        let mut value = [0u8; 8];
        value.copy_from_slice(&final_part[value_offset..value_offset + 8]);
        assert_eq!(u64::from_le_bytes(value), 1_000_000_000_000);

        assert!(final_part.ends_with(&{
            let mut tail = encoding::bytes_with_length_header(&payout_script());
            tail.extend_from_slice(&[0u8; 4]);
            tail
        }));
    }

    #[test]
    fn assembled_length_is_consistent() {
        let pieces = builder().build().unwrap();
        let extranonce = "00".repeat(EXTRANONCE_RESERVE);
        let assembled = pieces.assemble(&extranonce);

        assert_eq!(
            assembled.len(),
            pieces.initial.len() + extranonce.len() + pieces.final_part.len()
        );
        assert!(hex::decode(&assembled).is_ok());
    }

    #[test]
    fn assembled_script_matches_declared_length() {
        let pieces = builder().build().unwrap();
        let assembled =
            hex::decode(pieces.assemble(&"00".repeat(EXTRANONCE_RESERVE))).unwrap();

        let script_len = assembled[41] as usize;
        // script ‖ sequence ‖ output count start right after the length byte
        let after_script = 42 + script_len;
        assert_eq!(&assembled[after_script..after_script + 4], &[0xff; 4]);
        assert_eq!(assembled[after_script + 4], 0x01);
    }

    #[test]
    fn deterministic() {
        let a = builder().build().unwrap();
        let b = builder().build().unwrap();
        pretty_assert_eq!(a, b);
    }

    #[test]
    fn oversized_signature_rejected() {
        let err = CoinbaseBuilder::new(0, 0, payout_script())
            .with_signature(vec![0xAA; 80])
            .build()
            .unwrap_err();
        assert!(matches!(err, CoinbaseError::ArbitraryRegionTooLarge { .. }));
    }

    #[test]
    fn oversized_extranonce_reserve_rejected() {
        let err = CoinbaseBuilder::new(0, 0, payout_script())
            .with_extranonce_reserve(MAX_ARBITRARY_REGION + 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, CoinbaseError::ArbitraryRegionTooLarge { .. }));
    }
}
