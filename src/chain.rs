use {super::*, regex::Regex, scrypt::Params};

/// Litecoin-family proof of work: scrypt with N=1024, r=1, p=1, 32-byte output.
static SCRYPT_PARAMS: LazyLock<Params> =
    LazyLock::new(|| Params::new(10, 1, 1, 32).expect("static scrypt parameters are valid"));

macro_rules! address_pattern {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("static address pattern is valid"));
    };
}

address_pattern!(
    BITCOIN_MAINNET,
    "^(1|3)[a-km-zA-HJ-NP-Z1-9]{25,34}$|^bc1[0-9a-z]{39,59}$"
);
address_pattern!(
    BITCOIN_TESTNET,
    "^(m|n|2)[a-km-zA-HJ-NP-Z1-9]{25,34}$|^tb1[0-9a-z]{39,59}$"
);
address_pattern!(DOGECOIN_MAINNET, "^(D|A|9)[a-km-zA-HJ-NP-Z1-9]{33}$");
address_pattern!(DOGECOIN_TESTNET, "^(n|m|2)[a-km-zA-HJ-NP-Z1-9]{33}$");
address_pattern!(
    LITECOIN_MAINNET,
    "^(L|M|3)[a-km-zA-HJ-NP-Z1-9]{26,33}$|^ltc1[0-9A-Za-z]{39}$"
);
address_pattern!(
    LITECOIN_TESTNET,
    "^(m|n|2)[a-km-zA-HJ-NP-Z1-9]{26,33}$|^tltc1[0-9A-Za-z]{39}$"
);
address_pattern!(
    DIGIBYTE_MAINNET,
    "^(D|S)[A-Za-z0-9]{33}$|^dgb1[0-9A-Za-z]{39}$"
);
address_pattern!(DIGIBYTE_TESTNET, "^(n|m|t)[a-km-zA-HJ-NP-Z1-9]{33}$");

/// Which address family a node expects, derived from the `chain` field of
/// its `getblockchaininfo` reply. Everything that is not mainnet takes the
/// testnet address shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Main,
    Test,
}

impl Network {
    pub fn from_chain_info(chain: &str) -> Self {
        match chain {
            "main" => Self::Main,
            _ => Self::Test,
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// Positions of the submit tuple slots. The Bitcoin-family layout is
/// `[worker, job_id, extranonce2, ntime, nonce]`; chains that reorder the
/// tuple supply their own layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitLayout {
    pub worker: usize,
    pub job_id: usize,
    pub extranonce2: usize,
    pub ntime: usize,
    pub nonce: usize,
}

impl Default for SubmitLayout {
    fn default() -> Self {
        Self {
            worker: 0,
            job_id: 1,
            extranonce2: 2,
            ntime: 3,
            nonce: 4,
        }
    }
}

/// Capability set of a supported blockchain: digest functions, share
/// weighting, address shapes, and confirmation depth. Selected by name at
/// configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub enum Chain {
    Bitcoin,
    Dogecoin,
    Litecoin,
    Digibyte,
}

impl Chain {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Dogecoin => "dogecoin",
            Self::Litecoin => "litecoin",
            Self::Digibyte => "digibyte",
        }
    }

    /// Digest used for the coinbase transaction. SHA-256d on every supported
    /// chain, including the scrypt ones.
    pub fn coinbase_digest(self, bytes: &[u8]) -> [u8; 32] {
        sha256d::Hash::hash(bytes).to_byte_array()
    }

    /// Digest used for the block header. Differs from the coinbase digest on
    /// scrypt chains.
    pub fn header_digest(self, bytes: &[u8]) -> [u8; 32] {
        match self {
            Self::Bitcoin | Self::Digibyte => sha256d::Hash::hash(bytes).to_byte_array(),
            Self::Dogecoin | Self::Litecoin => {
                let mut output = [0u8; 32];
                scrypt::scrypt(bytes, bytes, &SCRYPT_PARAMS, &mut output)
                    .expect("output length matches static params");
                output
            }
        }
    }

    pub fn share_multiplier(self) -> f64 {
        match self {
            Self::Bitcoin => 1.0,
            Self::Dogecoin | Self::Litecoin | Self::Digibyte => 65536.0,
        }
    }

    pub fn valid_mainnet_address(self, address: &str) -> bool {
        match self {
            Self::Bitcoin => BITCOIN_MAINNET.is_match(address),
            Self::Dogecoin => DOGECOIN_MAINNET.is_match(address),
            Self::Litecoin => LITECOIN_MAINNET.is_match(address),
            Self::Digibyte => DIGIBYTE_MAINNET.is_match(address),
        }
    }

    pub fn valid_testnet_address(self, address: &str) -> bool {
        match self {
            Self::Bitcoin => BITCOIN_TESTNET.is_match(address),
            Self::Dogecoin => DOGECOIN_TESTNET.is_match(address),
            Self::Litecoin => LITECOIN_TESTNET.is_match(address),
            Self::Digibyte => DIGIBYTE_TESTNET.is_match(address),
        }
    }

    pub fn minimum_confirmations(self) -> u32 {
        match self {
            Self::Bitcoin => 101,
            Self::Dogecoin | Self::Litecoin | Self::Digibyte => 100,
        }
    }

    pub fn submit_layout(self) -> SubmitLayout {
        SubmitLayout::default()
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoin" => Ok(Self::Bitcoin),
            "dogecoin" => Ok(Self::Dogecoin),
            "litecoin" => Ok(Self::Litecoin),
            "digibyte" => Ok(Self::Digibyte),
            other => bail!("unsupported chain `{other}`"),
        }
    }
}
