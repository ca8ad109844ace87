use {super::*, sessions::SessionHandle, vardiff::Vardiff};

const OUTBOUND_QUEUE: usize = 32;

#[derive(Debug, PartialEq, Eq)]
enum State {
    Init,
    Subscribed,
    Working,
}

/// One miner connection: line-framed Stratum requests in, responses and
/// broadcast notifications out, processed strictly in arrival order.
pub(crate) struct Connection<R, W> {
    core: Arc<Core>,
    remote_addr: SocketAddr,
    reader: FramedRead<R, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
    cancel: CancellationToken,
    outbound_tx: mpsc::Sender<Message>,
    outbound_rx: mpsc::Receiver<Message>,
    state: State,
    session_id: String,
    extranonce1: Option<Extranonce>,
    user_agent: Option<String>,
    login: Option<Login>,
    handle: Option<Arc<SessionHandle>>,
    vardiff: Vardiff,
    malformed_strikes: u32,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub(crate) fn new(
        core: Arc<Core>,
        remote_addr: SocketAddr,
        reader: R,
        writer: W,
        cancel: CancellationToken,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let vardiff = Vardiff::new(
            core.settings.vardiff_config(),
            core.settings.start_difficulty(),
            Instant::now(),
        );

        Self {
            core,
            remote_addr,
            reader: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_SIZE)),
            writer: FramedWrite::new(writer, LinesCodec::new()),
            cancel,
            outbound_tx,
            outbound_rx,
            state: State::Init,
            session_id: Extranonce::random(8).to_hex(),
            extranonce1: None,
            user_agent: None,
            login: None,
            handle: None,
            vardiff,
            malformed_strikes: 0,
        }
    }

    pub(crate) async fn serve(&mut self) -> Result {
        let result = self.run().await;

        if self.handle.take().is_some() {
            self.core.sessions.remove(&self.session_id);
            info!(
                "Session {} removed ({} remaining)",
                self.session_id,
                self.core.sessions.len()
            );
        }

        result
    }

    async fn run(&mut self) -> Result {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Disconnecting {}", self.remote_addr);
                    break;
                }

                outbound = self.outbound_rx.recv() => {
                    let Some(message) = outbound else { break };
                    self.send(message).await?;
                }

                // The read deadline refreshes whenever the select loop turns.
                read = timeout(self.core.settings.client_timeout(), self.reader.next()) => {
                    match read {
                        Err(_) => {
                            info!("Deadline expired for {}", self.remote_addr);
                            break;
                        }
                        Ok(None) => {
                            info!("Connection {} closed by peer", self.remote_addr);
                            break;
                        }
                        Ok(Some(Err(err))) => {
                            bail!("read error from {}: {err}", self.remote_addr);
                        }
                        Ok(Some(Ok(line))) => {
                            if !self.handle_line(&line).await? {
                                break;
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns false when the connection should close.
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let message = match serde_json::from_str::<Message>(line) {
            Ok(message) => message,
            Err(err) => {
                self.malformed_strikes += 1;
                warn!(
                    "Malformed request from {} (strike {}): {err}; line={line:?}",
                    self.remote_addr, self.malformed_strikes,
                );

                if self.malformed_strikes >= MALFORMED_REQUEST_LIMIT {
                    return Ok(false);
                }
                return Ok(true);
            }
        };

        let Message::Request { id, method, params } = message else {
            warn!("Ignoring non-request message from {}", self.remote_addr);
            return Ok(true);
        };

        match method.as_str() {
            "mining.configure" => {
                debug!("CONFIGURE from {} with {params}", self.remote_addr);
                self.configure(id, params).await?;
            }
            "mining.subscribe" => {
                debug!("SUBSCRIBE from {} with {params}", self.remote_addr);
                return self.subscribe(id, params).await;
            }
            "mining.authorize" => {
                debug!("AUTHORIZE from {} with {params}", self.remote_addr);
                return self.authorize(id, params).await;
            }
            "mining.submit" => {
                debug!("SUBMIT from {} with {params}", self.remote_addr);
                self.submit(id, params).await?;
            }
            "mining.extranonce.subscribe" => {
                self.send(Message::response(id, StratumResult::Bool(true)))
                    .await?;
            }
            "mining.multi_version" => {}
            method => {
                warn!("UNKNOWN method {method} from {}", self.remote_addr);
                self.send(Message::error(
                    id,
                    StratumError::MalformedRequest.with_detail(format!("unknown method {method}")),
                ))
                .await?;
            }
        }

        Ok(true)
    }

    /// Version rolling is always denied; minimum-difficulty and
    /// subscribe-extranonce are acknowledged.
    async fn configure(&mut self, id: Id, params: Value) -> Result {
        if let Ok(configure) = serde_json::from_value::<Configure>(params) {
            if configure.requests("version-rolling") {
                debug!("Denying version-rolling for {}", self.remote_addr);
            }
        }

        let result = StratumResult::of(&stratum::ConfigureResult::default())?;
        self.send(Message::response(id, result)).await
    }

    async fn subscribe(&mut self, id: Id, params: Value) -> Result<bool> {
        if self.core.settings.is_banned(&self.remote_addr.ip()) {
            self.send(Message::error(id, StratumError::Banned.reply()))
                .await?;
            return Ok(false);
        }

        if self.state != State::Init {
            self.send(Message::error(
                id,
                StratumError::MalformedRequest.with_detail("already subscribed"),
            ))
            .await?;
            return Ok(true);
        }

        let subscribe = serde_json::from_value::<Subscribe>(params)
            .context("failed to deserialize mining.subscribe")?;

        let extranonce1 = Extranonce::random(EXTRANONCE1_SIZE);

        let result = SubscribeResult {
            subscriptions: vec![
                (
                    "mining.set_difficulty".to_string(),
                    self.session_id.clone(),
                ),
                ("mining.notify".to_string(), self.session_id.clone()),
            ],
            extranonce1: extranonce1.clone(),
            extranonce2_size: EXTRANONCE2_SIZE,
        };

        self.send(Message::response(id, StratumResult::of(&result)?))
            .await?;

        self.extranonce1 = Some(extranonce1);
        self.user_agent = subscribe.user_agent;
        self.state = State::Subscribed;

        Ok(true)
    }

    async fn authorize(&mut self, id: Id, params: Value) -> Result<bool> {
        if self.core.settings.is_banned(&self.remote_addr.ip()) {
            self.send(Message::error(id, StratumError::Banned.reply()))
                .await?;
            return Ok(false);
        }

        if self.state != State::Subscribed {
            self.send(Message::error(
                id,
                StratumError::NotSubscribed.reply(),
            ))
            .await?;
            return Ok(true);
        }

        let authorize = serde_json::from_value::<Authorize>(params)
            .context("failed to deserialize mining.authorize")?;

        let login = match Login::parse(&authorize.username)
            .and_then(|login| {
                login.validate(&self.core.chain_networks())?;
                Ok(login)
            }) {
            Ok(login) => login,
            Err(err) => {
                warn!(
                    "Rejected login {} from {}: {err}",
                    authorize.username, self.remote_addr,
                );
                self.send(Message::error(
                    id,
                    StratumError::InvalidAddress.with_detail(err),
                ))
                .await?;
                return Ok(true);
            }
        };

        let extranonce1 = self
            .extranonce1
            .clone()
            .ok_or_else(|| anyhow!("subscribed connection without extranonce1"))?;

        info!(
            "Authorized rig {} from {} mining to {:?}",
            login.rig_id, self.remote_addr, login.addresses,
        );

        let session = Session {
            session_id: self.session_id.clone(),
            login: login.to_string(),
            extranonce1,
            user_agent: self.user_agent.clone(),
            remote_addr: self.remote_addr,
            authorized_at: unix_timestamp(),
        };

        let handle = Arc::new(SessionHandle::new(
            session,
            self.outbound_tx.clone(),
            self.vardiff.difficulty(),
        ));
        self.core.sessions.insert(handle.clone());
        self.handle = Some(handle);
        self.login = Some(login);
        self.state = State::Working;

        // Three packets: the result, the difficulty, the current job.
        self.send(Message::response(id, StratumResult::Bool(true)))
            .await?;

        self.send(Message::notification(
            "mining.set_difficulty",
            SetDifficulty(self.vardiff.difficulty()),
        )?)
        .await?;

        match self.core.cache.current().await {
            Some(job) => {
                self.send(Message::notification(
                    "mining.notify",
                    job.work.notify(false),
                )?)
                .await?;
            }
            None => warn!("No cached job to send {}", self.remote_addr),
        }

        Ok(true)
    }

    async fn submit(&mut self, id: Id, params: Value) -> Result {
        if self.state != State::Working {
            return self
                .send(Message::error(id, StratumError::Unauthorized.reply()))
                .await;
        }

        let submit = match Submit::from_params(&params, self.core.primary.chain.submit_layout()) {
            Ok(submit) => submit,
            Err(err) => {
                return self
                    .send(Message::error(
                        id,
                        StratumError::MalformedRequest.with_detail(err),
                    ))
                    .await;
            }
        };

        let Some(job) = self.core.cache.lookup(&submit.job_id).await else {
            debug!(
                "Stale share for job {} from {}",
                submit.job_id, self.remote_addr,
            );
            return self
                .send(Message::error(
                    id,
                    StratumError::StaleJob.with_detail(submit.job_id),
                ))
                .await;
        };

        if submit.extranonce2.len() != EXTRANONCE2_SIZE {
            return self
                .send(Message::error(
                    id,
                    StratumError::MalformedRequest.with_detail(format!(
                        "extranonce2 must be {EXTRANONCE2_SIZE} bytes, got {}",
                        submit.extranonce2.len(),
                    )),
                ))
                .await;
        }

        let extranonce1 = self
            .extranonce1
            .clone()
            .ok_or_else(|| anyhow!("working connection without extranonce1"))?;

        let key = (
            submit.job_id,
            extranonce1.clone(),
            submit.extranonce2.clone(),
            submit.ntime,
            submit.nonce,
        );

        if self.core.cache.is_duplicate(key).await {
            return self
                .send(Message::error(id, StratumError::DuplicateShare.reply()))
                .await;
        }

        let assessment = match assess_share(
            &job.candidate,
            job.aux.as_ref(),
            &extranonce1,
            &submit.extranonce2,
            submit.ntime,
            submit.nonce,
            self.vardiff.difficulty(),
        ) {
            Ok(assessment) => assessment,
            Err(err) => {
                return self
                    .send(Message::error(
                        id,
                        StratumError::BadHeader.with_detail(err),
                    ))
                    .await;
            }
        };

        if let Some(reason) = assessment.reject_reason {
            debug!(
                "Rejected share from {} ({reason}, hash {})",
                self.remote_addr, assessment.hash,
            );
            return self
                .send(Message::error(
                    id,
                    reason.stratum_error().with_detail(reason),
                ))
                .await;
        }

        info!(
            "{} share for height {} from {} (diff {:.3})",
            assessment.classification,
            job.candidate.template.height,
            self.remote_addr,
            assessment.share_difficulty,
        );

        self.send(Message::response(id, StratumResult::Bool(true)))
            .await?;

        self.record_share(&job, &assessment);

        if assessment.classification >= Classification::AuxCandidate {
            self.dispatch_candidate(&job, &assessment).await;
        }

        if let Some(new_difficulty) = self.vardiff.record_share(Instant::now()) {
            info!(
                "Retargeting {} to difficulty {new_difficulty}",
                self.remote_addr
            );

            if let Some(handle) = &self.handle {
                handle.set_difficulty(new_difficulty);
            }

            self.send(Message::notification(
                "mining.set_difficulty",
                SetDifficulty(new_difficulty),
            )?)
            .await?;
        }

        Ok(())
    }

    fn record_share(&self, job: &CandidateJob, assessment: &Assessment) {
        let Some(login) = &self.login else {
            return;
        };

        let template = &job.candidate.template;
        let network_difficulty =
            template.network_difficulty() * job.candidate.chain.share_multiplier();

        self.core
            .shares
            .push(record_sink::Event::Share(ShareRecord {
                pool_id: self.core.settings.pool_name().to_string(),
                block_height: template.height,
                miner: login.miner().to_string(),
                worker: login.rig_id.clone(),
                user_agent: self.user_agent.clone(),
                difficulty: assessment.share_difficulty,
                network_difficulty,
                ip: self.remote_addr.ip().to_string(),
                created_at: unix_timestamp(),
            }));
    }

    /// Submit a candidate upstream: aux-only solutions go to the aux chain,
    /// primary and dual solutions to the primary, dual to both.
    async fn dispatch_candidate(&self, job: &CandidateJob, assessment: &Assessment) {
        let kind = match assessment.classification {
            Classification::AuxCandidate => FoundKind::Aux1,
            Classification::PrimaryCandidate => FoundKind::Primary,
            Classification::DualCandidate => FoundKind::Dual,
            _ => return,
        };

        let miner = self
            .login
            .as_ref()
            .map(|login| login.miner().to_string())
            .unwrap_or_default();

        if kind != FoundKind::Primary {
            self.submit_aux_candidate(job, assessment, kind, &miner).await;
        }

        if kind != FoundKind::Aux1 {
            self.submit_primary_candidate(job, assessment, kind, &miner)
                .await;
        }
    }

    async fn submit_aux_candidate(
        &self,
        job: &CandidateJob,
        assessment: &Assessment,
        kind: FoundKind,
        miner: &str,
    ) {
        let (Some(node), Some(aux)) = (&self.core.aux, &job.aux) else {
            return;
        };

        let auxpow = AuxPow::new(
            assessment.coinbase.clone(),
            assessment.hash.clone(),
            job.candidate.merkle_steps.clone(),
            hex::encode(assessment.header),
        );

        match self
            .core
            .submit_aux(aux.hash.clone(), auxpow.serialize())
            .await
        {
            Ok(()) => {
                info!(
                    "Submitted {} aux block {} at height {}",
                    node.chain, aux.hash, aux.height,
                );

                let network_difficulty = aux
                    .network_target()
                    .map(|target| target.difficulty())
                    .unwrap_or_default()
                    * node.chain.share_multiplier();

                self.core
                    .shares
                    .push(record_sink::Event::BlockFound(FoundBlock {
                        pool_id: self.core.settings.pool_name().to_string(),
                        chain: node.chain.name().to_string(),
                        kind,
                        hash: aux.hash.clone(),
                        block_height: aux.height,
                        network_difficulty,
                        transaction_confirmation_data: encoding::reverse_hex_bytes(
                            &aux.coinbase_hash,
                        )
                        .unwrap_or_default(),
                        miner: miner.to_string(),
                        status: share::FoundStatus::Pending,
                        created_at: unix_timestamp(),
                    }));
            }
            Err(err) => error!("Aux block submission failed: {err:#}"),
        }
    }

    async fn submit_primary_candidate(
        &self,
        job: &CandidateJob,
        assessment: &Assessment,
        kind: FoundKind,
        miner: &str,
    ) {
        let submission = job
            .candidate
            .submission_hex(&assessment.header, &assessment.coinbase);

        match self.core.submit_primary(submission).await {
            Ok(()) => {
                let template = &job.candidate.template;

                info!(
                    "Submitted {} block {} at height {}",
                    job.candidate.chain, assessment.hash, template.height,
                );

                let confirmation = hex::decode(&assessment.coinbase)
                    .map(|coinbase| hex::encode(job.candidate.chain.coinbase_digest(&coinbase)))
                    .unwrap_or_default();

                self.core
                    .shares
                    .push(record_sink::Event::BlockFound(FoundBlock {
                        pool_id: self.core.settings.pool_name().to_string(),
                        chain: job.candidate.chain.name().to_string(),
                        kind,
                        hash: assessment.hash.clone(),
                        block_height: template.height,
                        network_difficulty: template.network_difficulty()
                            * job.candidate.chain.share_multiplier(),
                        transaction_confirmation_data: confirmation,
                        miner: miner.to_string(),
                        status: share::FoundStatus::Pending,
                        created_at: unix_timestamp(),
                    }));
            }
            Err(err) => error!("Primary block submission failed: {err:#}"),
        }
    }

    async fn send(&mut self, message: Message) -> Result {
        let frame = serde_json::to_string(&message)?;
        self.writer.send(frame).await?;
        Ok(())
    }
}
