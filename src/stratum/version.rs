use super::*;

/// Block version as the template reports it and the notify serializes it:
/// eight hex digits, consensus byte order handled at header assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Version(u32);

impl Version {
    pub fn to_consensus(self) -> u32 {
        self.0
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl FromStr for Version {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = u32::from_str_radix(s, 16).map_err(|e| InternalError::Parse {
            message: format!("invalid version hex string '{s}': {e}"),
        })?;
        Ok(Version(version))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for Version {
    fn from(v: u32) -> Self {
        Version(v)
    }
}

impl From<Version> for u32 {
    fn from(v: Version) -> u32 {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn case(version_str: &str, expected: u32) {
        let version = version_str.parse::<Version>().unwrap();
        assert_eq!(version.to_consensus(), expected);
        assert_eq!(version.to_string(), version_str);

        let serialized = serde_json::to_string(&version).unwrap();
        assert_eq!(serialized, format!("\"{version_str}\""));
        assert_eq!(
            serde_json::from_str::<Version>(&serialized).unwrap(),
            version
        );
    }

    #[test]
    fn bip9_default() {
        case("20000000", 0x20000000);
    }

    #[test]
    fn auxpow_signalling() {
        // Dogecoin merged-mining blocks carry chain id 0x62 in the high bits.
        case("00620104", 0x00620104);
    }

    #[test]
    fn legacy_versions() {
        case("00000002", 2);
        case("00000004", 4);
    }
}
