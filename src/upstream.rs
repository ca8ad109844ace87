use {
    super::*,
    bitcoincore_rpc::{Auth, Client, RpcApi},
    chain::Network,
    settings::ChainSettings,
};

/// Rejection reasons `submitblock` reports when a submission just misses the
/// network target; expected for borderline shares and swallowed.
const HIGH_HASH: &str = "high-hash";

fn is_high_hash(reason: &str) -> bool {
    reason.contains(HIGH_HASH)
}

fn payout_script_from_validateaddress(reply: &Value) -> Result<Vec<u8>> {
    ensure!(
        reply.get("isvalid").and_then(Value::as_bool) == Some(true),
        "node reports reward address as invalid"
    );

    let script_hex = reply
        .get("scriptPubKey")
        .and_then(Value::as_str)
        .context("validateaddress reply missing scriptPubKey")?;

    hex::decode(script_hex).context("scriptPubKey is not hex")
}

/// One configured chain's node handle: the primary RPC client, an optional
/// backup, and what the pool learned about the node at connect time. All
/// calls are blocking; callers go through `spawn_blocking`.
pub(crate) struct Node {
    pub(crate) chain: Chain,
    pub(crate) network: Network,
    pub(crate) network_difficulty: f64,
    pub(crate) reward_address: String,
    pub(crate) payout_script: Vec<u8>,
    pub(crate) zmq_endpoint: String,
    clients: Vec<Client>,
    active: AtomicUsize,
}

impl Node {
    pub(crate) fn connect(config: &ChainSettings) -> Result<Self> {
        let mut clients = vec![Self::client(&config.rpc_url, config)?];
        if let Some(backup) = &config.backup_rpc_url {
            clients.push(Self::client(backup, config)?);
        }

        let info: Value = clients[0]
            .call("getblockchaininfo", &[])
            .with_context(|| format!("{} node unreachable at {}", config.name, config.rpc_url))?;

        let network = Network::from_chain_info(
            info.get("chain")
                .and_then(Value::as_str)
                .context("getblockchaininfo reply missing chain")?,
        );

        let network_difficulty = info
            .get("difficulty")
            .and_then(Value::as_f64)
            .unwrap_or_default();

        let reply: Value = clients[0].call(
            "validateaddress",
            &[json!(config.reward_address.clone())],
        )?;
        let payout_script = payout_script_from_validateaddress(&reply)
            .with_context(|| format!("reward address {} rejected", config.reward_address))?;

        info!(
            "Connected to {} node ({}net, difficulty {network_difficulty})",
            config.name, network,
        );

        Ok(Self {
            chain: config.name,
            network,
            network_difficulty,
            reward_address: config.reward_address.clone(),
            payout_script,
            zmq_endpoint: config.zmq_endpoint.clone(),
            clients,
            active: AtomicUsize::new(0),
        })
    }

    fn client(url: &str, config: &ChainSettings) -> Result<Client> {
        let auth = match (&config.rpc_username, &config.rpc_password) {
            (Some(user), Some(pass)) => Auth::UserPass(user.clone(), pass.clone()),
            _ => Auth::None,
        };

        Client::new(url, auth).with_context(|| format!("failed to build RPC client for {url}"))
    }

    fn active_client(&self) -> &Client {
        &self.clients[self.active.load(Ordering::Relaxed) % self.clients.len()]
    }

    /// Fail over to the next responsive node. With a single configured node
    /// this re-probes it.
    pub(crate) fn recover(&self) -> Result<()> {
        let current = self.active.load(Ordering::Relaxed);

        for offset in 1..=self.clients.len() {
            let candidate = (current + offset) % self.clients.len();
            match self.clients[candidate].call::<Value>("getblockchaininfo", &[]) {
                Ok(_) => {
                    if candidate != current % self.clients.len() {
                        warn!("Failing over {} RPC to backup node", self.chain);
                    }
                    self.active.store(candidate, Ordering::Relaxed);
                    return Ok(());
                }
                Err(err) => {
                    warn!("{} RPC candidate {candidate} unresponsive: {err}", self.chain);
                }
            }
        }

        bail!("no responsive {} node", self.chain)
    }

    pub(crate) fn get_block_template(&self) -> Result<BlockTemplate> {
        let params = json!({
            "capabilities": ["coinbasetxn", "workid", "coinbase/append"],
        });

        let template: BlockTemplate = self
            .active_client()
            .call("getblocktemplate", &[params])
            .with_context(|| format!("getblocktemplate failed on {}", self.chain))?;

        debug!(
            "New {} template for height {}",
            self.chain, template.height
        );

        Ok(template)
    }

    pub(crate) fn create_aux_block(&self) -> Result<AuxBlock> {
        self.active_client()
            .call("createauxblock", &[json!(self.reward_address.clone())])
            .with_context(|| format!("createauxblock failed on {}", self.chain))
    }

    /// Submit a serialized block. A `high-hash` rejection means the share
    /// just missed the network target and is not an error.
    pub(crate) fn submit_block(&self, block_hex: &str) -> Result<()> {
        match self
            .active_client()
            .call::<Value>("submitblock", &[json!(block_hex)])
        {
            Ok(Value::Null) => Ok(()),
            Ok(Value::String(reason)) if is_high_hash(&reason) => {
                warn!("{} rejected block for high hash", self.chain);
                Ok(())
            }
            Ok(reason) => bail!("{} rejected block: {reason}", self.chain),
            Err(err) if is_high_hash(&err.to_string()) => {
                warn!("{} rejected block for high hash", self.chain);
                Ok(())
            }
            Err(err) => Err(err).context("submitblock failed"),
        }
    }

    pub(crate) fn submit_aux_block(&self, aux_hash: &str, auxpow_hex: &str) -> Result<()> {
        let accepted: bool = self
            .active_client()
            .call("submitauxblock", &[json!(aux_hash), json!(auxpow_hex)])
            .with_context(|| format!("submitauxblock failed on {}", self.chain))?;

        ensure!(accepted, "{} node refused aux block {aux_hash}", self.chain);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_hash_detection() {
        assert!(is_high_hash("high-hash"));
        assert!(is_high_hash("rejected: high-hash (code -23)"));
        assert!(!is_high_hash("bad-txnmrklroot"));
        assert!(!is_high_hash("duplicate"));
    }

    #[test]
    fn payout_script_requires_validity() {
        let reply = json!({"isvalid": false, "scriptPubKey": "76a914"});
        assert!(payout_script_from_validateaddress(&reply).is_err());

        let reply = json!({"scriptPubKey": "76a914"});
        assert!(payout_script_from_validateaddress(&reply).is_err());
    }

    #[test]
    fn payout_script_decodes_hex() {
        let reply = json!({
            "isvalid": true,
            "scriptPubKey": "76a91411223344556677889900aabbccddeeff0011223388ac",
        });

        let script = payout_script_from_validateaddress(&reply).unwrap();
        assert_eq!(script[0], 0x76);
        assert_eq!(script.len(), 25);
    }

    #[test]
    fn payout_script_rejects_bad_hex() {
        let reply = json!({"isvalid": true, "scriptPubKey": "zz"});
        assert!(payout_script_from_validateaddress(&reply).is_err());
    }
}
