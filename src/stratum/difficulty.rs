use super::*;

/// The Bitcoin-family difficulty-1 target: compact bits 1d00ffff expanded,
/// i.e. 0x00000000FFFF followed by 26 zero bytes.
pub static DIFFICULTY_1_TARGET: LazyLock<U256> =
    LazyLock::new(|| U256::from(0xFFFFu64) << 208);

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0f64, |acc, limb| acc * 18446744073709551616.0 + *limb as f64)
}

/// 256-bit upper bound a header hash must not exceed. Wraps the arithmetic
/// shared by the primary target, the aux target, and per-miner pool targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(U256);

impl Target {
    pub const MAX: Target = Target(U256::MAX);

    /// Standard compact expansion: `mantissa · 2^(8·(exponent−3))`, saturating
    /// on nonsense exponents.
    pub fn from_compact(nbits: Nbits) -> Self {
        let bits = nbits.to_consensus();
        let exponent = bits >> 24;
        let mantissa = U256::from(bits & 0x00FF_FFFF);

        if exponent <= 3 {
            Target(mantissa >> (8 * (3 - exponent)))
        } else {
            let shift = 8 * (exponent - 3);
            if shift > 255 {
                return Target(U256::MAX);
            }
            let value = mantissa << shift;
            if value >> shift != mantissa {
                Target(U256::MAX)
            } else {
                Target(value)
            }
        }
    }

    /// Pool target for a miner difficulty: `difficulty_1 / difficulty`.
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let difficulty = difficulty.as_f64();
        assert!(
            difficulty.is_finite() && difficulty > 0.0,
            "difficulty must be finite and > 0"
        );

        // Scale the division so sub-1 difficulties keep their precision; the
        // scale caps at 2^32−1 so difficulty_1 · scale still fits in 256 bits.
        const MAX_SCALE: u64 = 0xFFFF_FFFF;

        let max_by_difficulty = (u64::MAX as f64 / difficulty).floor();
        let scale = max_by_difficulty.min(MAX_SCALE as f64).max(1.0) as u64;

        let numerator = DIFFICULTY_1_TARGET.saturating_mul(U256::from(scale));
        let denominator = (difficulty * scale as f64).round() as u64;

        if denominator == 0 {
            Target(U256::MAX)
        } else {
            Target(numerator / U256::from(denominator))
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, InternalError> {
        let bytes = hex::decode(hex_str).map_err(|source| InternalError::HexParse { source })?;
        if bytes.len() != 32 {
            return Err(InternalError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(Target(U256::from_big_endian(&bytes)))
    }

    /// `difficulty_1 / target` as a float.
    pub fn difficulty(self) -> f64 {
        if self.0.is_zero() {
            return f64::INFINITY;
        }
        u256_to_f64(*DIFFICULTY_1_TARGET) / u256_to_f64(self.0)
    }

    /// Compare a hash, supplied in little-endian byte order as it leaves the
    /// digest function, against this target.
    pub fn is_met_by(self, hash_le: &[u8; 32]) -> bool {
        U256::from_little_endian(hash_le) <= self.0
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_big_endian()
    }
}

/// Share difficulty of a solved header: `difficulty_1 / hash`.
pub fn difficulty_from_hash(hash_le: &[u8; 32]) -> f64 {
    let hash = U256::from_little_endian(hash_le);
    if hash.is_zero() {
        return f64::INFINITY;
    }
    u256_to_f64(*DIFFICULTY_1_TARGET) / u256_to_f64(hash)
}

/// Floating miner difficulty as it travels the Stratum wire. Lossy by nature;
/// every precise comparison goes through [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Difficulty(f64);

impl Difficulty {
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value > 0.0,
            "difficulty must be finite and > 0"
        );
        Difficulty(value)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    pub fn to_target(self) -> Target {
        Target::from_difficulty(self)
    }

    pub fn clamp(self, min: Difficulty, max: Difficulty) -> Self {
        Difficulty(self.0.clamp(min.0, max.0))
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(1.0)
    }
}

impl From<f64> for Difficulty {
    fn from(value: f64) -> Self {
        Difficulty::new(value)
    }
}

impl From<u64> for Difficulty {
    fn from(value: u64) -> Self {
        Difficulty::new(value as f64)
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 >= 1.0 && self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as u64)
        } else {
            let s = format!("{:.8}", self.0);
            f.write_str(s.trim_end_matches('0').trim_end_matches('.'))
        }
    }
}

impl FromStr for Difficulty {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|e| InternalError::Parse {
            message: format!("invalid difficulty '{s}': {e}"),
        })?;

        if !value.is_finite() || value <= 0.0 {
            return Err(InternalError::InvalidValue {
                reason: "difficulty must be finite and > 0".into(),
            });
        }

        Ok(Difficulty(value))
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 >= 1.0 && self.0.fract() == 0.0 {
            serializer.serialize_u64(self.0 as u64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value <= 0.0 {
            return Err(de::Error::custom("difficulty must be finite and > 0"));
        }
        Ok(Difficulty(value))
    }
}
