use super::*;

/// Previous block hash. Stored in natural big-endian display order as the
/// template reports it; the Stratum wire form swaps the bytes inside every
/// 4-byte word, and headers want the full little-endian reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash([u8; 32]);

impl PrevHash {
    pub fn from_display_hex(s: &str) -> Result<Self, InternalError> {
        if s.len() != 64 {
            return Err(InternalError::InvalidLength {
                expected: 64,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|source| InternalError::HexParse { source })?;
        Ok(PrevHash(bytes))
    }

    pub fn display_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Byte order for the 80-byte header.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

/// The wire form: each 4-byte word reversed internally, word order preserved.
impl Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let wire = encoding::reverse_hex_4bytes(&hex::encode(self.0))
            .expect("32 bytes are word aligned");
        f.write_str(&wire)
    }
}

impl FromStr for PrevHash {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Parse the wire form; the word swap is involutive.
        let wire = Self::from_display_hex(s)?;
        Self::from_display_hex(&wire.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: &str = "00000000440b921e1b77c6c0487ae5616de67f788f44ae2a5af6e2194d16b6f8";

    #[test]
    fn wire_form_swaps_each_word() {
        let prevhash = PrevHash::from_display_hex(DISPLAY).unwrap();
        assert_eq!(
            prevhash.to_string(),
            "000000001e920b44c0c6771b61e57a48787fe66d2aae448f19e2f65af8b6164d"
        );
    }

    #[test]
    fn wire_roundtrip() {
        let prevhash = PrevHash::from_display_hex(DISPLAY).unwrap();
        let wire = prevhash.to_string();
        assert_eq!(wire.parse::<PrevHash>().unwrap(), prevhash);
        assert_eq!(prevhash.display_hex(), DISPLAY);
    }

    #[test]
    fn le_bytes_reverse_display_order() {
        let prevhash = PrevHash::from_display_hex(DISPLAY).unwrap();
        let le = prevhash.to_le_bytes();
        assert_eq!(le[31], 0x00);
        assert_eq!(le[0], 0xf8);
        assert_eq!(hex::encode(le), {
            let mut bytes = hex::decode(DISPLAY).unwrap();
            bytes.reverse();
            hex::encode(bytes)
        });
    }

    #[test]
    fn serde_uses_wire_form() {
        let prevhash = PrevHash::from_display_hex(DISPLAY).unwrap();
        let json = serde_json::to_string(&prevhash).unwrap();
        assert_eq!(json, format!("\"{prevhash}\""));
        assert_eq!(serde_json::from_str::<PrevHash>(&json).unwrap(), prevhash);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(PrevHash::from_display_hex("abcd").is_err());
        assert!(PrevHash::from_display_hex(&"zz".repeat(32)).is_err());
    }
}
