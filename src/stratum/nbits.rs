use super::*;

/// Compact 4-byte target encoding as it appears in headers, templates, and
/// `mining.notify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Nbits(u32);

impl Nbits {
    pub fn to_consensus(self) -> u32 {
        self.0
    }

    pub fn to_target(self) -> Target {
        Target::from_compact(self)
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl FromStr for Nbits {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(InternalError::InvalidLength {
                expected: 8,
                actual: s.len(),
            });
        }
        let bits = u32::from_str_radix(s, 16).map_err(|e| InternalError::Parse {
            message: format!("invalid nbits hex string '{s}': {e}"),
        })?;
        Ok(Nbits(bits))
    }
}

impl Display for Nbits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for Nbits {
    fn from(bits: u32) -> Self {
        Nbits(bits)
    }
}

impl From<Nbits> for u32 {
    fn from(nbits: Nbits) -> u32 {
        nbits.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for s in ["1d00ffff", "1e0ffff0", "207fffff", "1b0404cb"] {
            let nbits = s.parse::<Nbits>().unwrap();
            assert_eq!(nbits.to_string(), s);
            assert_eq!(
                serde_json::to_string(&nbits).unwrap(),
                format!("\"{s}\"")
            );
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<Nbits>().is_err());
        assert!("1d00ff".parse::<Nbits>().is_err());
        assert!("1d00ffffff".parse::<Nbits>().is_err());
        assert!("zzzzzzzz".parse::<Nbits>().is_err());
    }

    #[test]
    fn le_bytes_for_header() {
        let nbits = "1e0ffff0".parse::<Nbits>().unwrap();
        assert_eq!(nbits.to_le_bytes(), [0xf0, 0xff, 0x0f, 0x1e]);
    }
}
