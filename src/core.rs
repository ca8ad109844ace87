use {super::*, chain::Network};

/// Process-scoped state threaded explicitly into every subsystem: settings,
/// node handles, the work cache, the session registry, and the share buffer.
/// No hidden statics anywhere.
pub(crate) struct Core {
    pub(crate) settings: Settings,
    pub(crate) primary: Arc<Node>,
    pub(crate) aux: Option<Arc<Node>>,
    pub(crate) cache: TemplateCache,
    pub(crate) sessions: SessionRegistry,
    pub(crate) shares: ShareBuffer,
}

impl Core {
    pub(crate) async fn connect(settings: Settings) -> Result<Self> {
        let primary_config = settings.primary_chain().clone();
        let primary = task::spawn_blocking(move || Node::connect(&primary_config)).await??;

        let aux = match settings.aux_chain().cloned() {
            Some(aux_config) => Some(Arc::new(
                task::spawn_blocking(move || Node::connect(&aux_config)).await??,
            )),
            None => None,
        };

        Ok(Self {
            settings,
            primary: Arc::new(primary),
            aux,
            cache: TemplateCache::new(),
            sessions: SessionRegistry::new(),
            shares: ShareBuffer::new(),
        })
    }

    /// Chains in login order: primary first, then the aux chain, each with
    /// the network its node reports.
    pub(crate) fn chain_networks(&self) -> Vec<(Chain, Network)> {
        let mut chains = vec![(self.primary.chain, self.primary.network)];
        if let Some(aux) = &self.aux {
            chains.push((aux.chain, aux.network));
        }
        chains
    }

    /// Fetch the primary template, failing over to the backup node once. A
    /// missing aux block degrades to primary-only work rather than failing
    /// the cycle.
    pub(crate) async fn fetch_work(&self) -> Result<(BlockTemplate, Option<AuxBlock>)> {
        let template = {
            let node = self.primary.clone();
            match task::spawn_blocking(move || node.get_block_template()).await? {
                Ok(template) => template,
                Err(err) => {
                    warn!("Primary template fetch failed, recovering RPC: {err}");

                    let node = self.primary.clone();
                    task::spawn_blocking(move || {
                        node.recover()?;
                        node.get_block_template()
                    })
                    .await??
                }
            }
        };

        let aux_block = match &self.aux {
            Some(node) => {
                let node = node.clone();
                match task::spawn_blocking(move || node.create_aux_block()).await? {
                    Ok(aux_block) => Some(aux_block),
                    Err(err) => {
                        warn!("No aux block found: {err}");
                        None
                    }
                }
            }
            None => None,
        };

        Ok((template, aux_block))
    }

    pub(crate) async fn submit_primary(&self, block_hex: String) -> Result<()> {
        let node = self.primary.clone();
        let hex = block_hex.clone();
        match task::spawn_blocking(move || node.submit_block(&hex)).await? {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Primary submission failed, recovering RPC: {err}");

                let node = self.primary.clone();
                task::spawn_blocking(move || {
                    node.recover()?;
                    node.submit_block(&block_hex)
                })
                .await?
            }
        }
    }

    pub(crate) async fn submit_aux(&self, aux_hash: String, auxpow_hex: String) -> Result<()> {
        let node = self
            .aux
            .clone()
            .ok_or_else(|| anyhow!("no aux chain configured"))?;

        let (hash, blob) = (aux_hash.clone(), auxpow_hex.clone());
        let first = {
            let node = node.clone();
            task::spawn_blocking(move || node.submit_aux_block(&hash, &blob)).await?
        };

        match first {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Aux submission failed, recovering RPC: {err}");

                task::spawn_blocking(move || {
                    node.recover()?;
                    node.submit_aux_block(&aux_hash, &auxpow_hex)
                })
                .await?
            }
        }
    }
}
