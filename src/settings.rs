use {super::*, options::Options, std::net::IpAddr, vardiff::VardiffConfig};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ChainSettings {
    pub(crate) name: Chain,
    pub(crate) rpc_url: String,
    #[serde(default)]
    pub(crate) rpc_username: Option<String>,
    #[serde(default)]
    pub(crate) rpc_password: Option<String>,
    #[serde(default)]
    pub(crate) backup_rpc_url: Option<String>,
    pub(crate) zmq_endpoint: String,
    pub(crate) reward_address: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct VardiffSettings {
    pub(crate) target_share_time_secs: f64,
    pub(crate) variance_percent: f64,
    pub(crate) retarget_interval_secs: f64,
    pub(crate) min_difficulty: f64,
    pub(crate) max_difficulty: f64,
}

impl Default for VardiffSettings {
    fn default() -> Self {
        Self {
            target_share_time_secs: 10.0,
            variance_percent: 30.0,
            retarget_interval_secs: 90.0,
            min_difficulty: 0.001,
            max_difficulty: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pool_name: String,
    block_signature: String,
    listen_address: String,
    port: u16,
    start_difficulty: f64,
    client_timeout_secs: u64,
    update_interval_secs: u64,
    flush_interval_secs: u64,
    banned_ips: Vec<String>,
    events_file: Option<PathBuf>,
    vardiff: VardiffSettings,
    chains: Vec<ChainSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pool_name: "mergepool".into(),
            block_signature: "/mergepool/".into(),
            listen_address: "0.0.0.0".into(),
            port: 3333,
            start_difficulty: 1.0,
            client_timeout_secs: 600,
            update_interval_secs: 30,
            flush_interval_secs: 5,
            banned_ips: Vec::new(),
            events_file: None,
            vardiff: VardiffSettings::default(),
            chains: vec![ChainSettings {
                name: Chain::Dogecoin,
                rpc_url: "http://127.0.0.1:22555".into(),
                rpc_username: None,
                rpc_password: None,
                backup_rpc_url: None,
                zmq_endpoint: "tcp://127.0.0.1:28332".into(),
                reward_address: "DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L".into(),
            }],
        }
    }
}

impl Settings {
    pub(crate) fn load(options: &Options) -> Result<Self> {
        let path = options
            .config
            .as_ref()
            .context("--config <PATH> is required")?;

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        if let Some(address) = &options.address {
            settings.listen_address = address.clone();
        }
        if let Some(port) = options.port {
            settings.port = port;
        }
        if let Some(start_difficulty) = options.start_difficulty {
            settings.start_difficulty = start_difficulty;
        }
        if let Some(events_file) = &options.events_file {
            settings.events_file = Some(events_file.clone());
        }

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn validate(&self) -> Result {
        ensure!(!self.pool_name.is_empty(), "pool must have a name");
        ensure!(
            (1..=2).contains(&self.chains.len()),
            "pool needs a primary chain and at most one aux chain, got {}",
            self.chains.len()
        );
        ensure!(self.port != 0, "port must be non-zero");
        ensure!(
            self.start_difficulty.is_finite() && self.start_difficulty > 0.0,
            "start_difficulty must be finite and > 0"
        );

        if let [primary, aux] = self.chains.as_slice() {
            ensure!(
                primary.name != aux.name,
                "primary and aux chain must differ, both are {}",
                primary.name
            );
        }

        Ok(())
    }

    pub(crate) fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub(crate) fn block_signature(&self) -> &str {
        &self.block_signature
    }

    pub(crate) fn listen_address(&self) -> &str {
        &self.listen_address
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn start_difficulty(&self) -> Difficulty {
        Difficulty::new(self.start_difficulty)
    }

    pub(crate) fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub(crate) fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub(crate) fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub(crate) fn is_banned(&self, ip: &IpAddr) -> bool {
        let ip = ip.to_string();
        self.banned_ips.iter().any(|banned| *banned == ip)
    }

    pub(crate) fn events_file(&self) -> Option<&PathBuf> {
        self.events_file.as_ref()
    }

    pub(crate) fn primary_chain(&self) -> &ChainSettings {
        &self.chains[0]
    }

    pub(crate) fn aux_chain(&self) -> Option<&ChainSettings> {
        self.chains.get(1)
    }

    pub(crate) fn vardiff_config(&self) -> VardiffConfig {
        VardiffConfig {
            target_share_time: Duration::from_secs_f64(self.vardiff.target_share_time_secs),
            variance_percent: self.vardiff.variance_percent,
            retarget_interval: Duration::from_secs_f64(self.vardiff.retarget_interval_secs),
            min_difficulty: Difficulty::new(self.vardiff.min_difficulty),
            max_difficulty: Difficulty::new(self.vardiff.max_difficulty),
        }
    }
}
