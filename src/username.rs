use {super::*, chain::Network, snafu::Snafu};

#[derive(Debug, Snafu, PartialEq)]
pub enum LoginError {
    #[snafu(display("login must be addr1[-addr2-..].rigID"))]
    MissingRig,

    #[snafu(display("expected {expected} miner addresses, got {actual}"))]
    AddressCount { expected: usize, actual: usize },

    #[snafu(display("invalid {chain} {network}net miner address: {address}"))]
    InvalidAddress {
        chain: Chain,
        network: Network,
        address: String,
    },
}

/// Parsed login string: `addr1[-addr2-..].rigID`. One address per configured
/// chain, in the primary-first chain order.
#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub addresses: Vec<String>,
    pub rig_id: String,
}

impl Login {
    pub fn parse(login: &str) -> Result<Self, LoginError> {
        let (addresses, rig_id) = login.split_once('.').ok_or(LoginError::MissingRig)?;

        if rig_id.is_empty() || addresses.is_empty() {
            return Err(LoginError::MissingRig);
        }

        Ok(Login {
            addresses: addresses.split('-').map(str::to_string).collect(),
            rig_id: rig_id.to_string(),
        })
    }

    /// Validate the address list against the configured chains, each on the
    /// network its node reports.
    pub fn validate(&self, chains: &[(Chain, Network)]) -> Result<(), LoginError> {
        if self.addresses.len() != chains.len() {
            return Err(LoginError::AddressCount {
                expected: chains.len(),
                actual: self.addresses.len(),
            });
        }

        for (address, (chain, network)) in self.addresses.iter().zip(chains) {
            let valid = match network {
                Network::Main => chain.valid_mainnet_address(address),
                Network::Test => chain.valid_testnet_address(address),
            };

            if !valid {
                return Err(LoginError::InvalidAddress {
                    chain: *chain,
                    network: *network,
                    address: address.clone(),
                });
            }
        }

        Ok(())
    }

    /// The primary-chain payout address, used as the miner identity in
    /// persisted records.
    pub fn miner(&self) -> &str {
        &self.addresses[0]
    }
}

impl Display for Login {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.addresses.join("-"), self.rig_id)
    }
}
