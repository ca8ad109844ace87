use {super::*, zmq::Zmq};

const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockNotification {
    pub(crate) chain: Chain,
    pub(crate) block_hash: String,
    pub(crate) counter: u32,
}

/// Counts missed `hashblock` notifications per chain from the sequence
/// counter frame. The first observation of a chain never reports a gap.
#[derive(Debug, Default)]
pub(crate) struct GapTracker {
    counters: HashMap<Chain, u32>,
}

impl GapTracker {
    pub(crate) fn observe(&mut self, chain: Chain, counter: u32) -> u32 {
        let missed = match self.counters.get(&chain) {
            Some(previous) => counter.saturating_sub(previous.wrapping_add(1)),
            None => 0,
        };
        self.counters.insert(chain, counter);
        missed
    }
}

/// Drives the notification cycle: ZMQ readers feed a channel, the
/// orchestrator consumes it serially, so refetch and broadcast for one
/// notification always finish before the next is taken.
pub(crate) struct Orchestrator {
    core: Arc<Core>,
    gaps: GapTracker,
}

impl Orchestrator {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self {
            core,
            gaps: GapTracker::default(),
        }
    }

    pub(crate) async fn run(mut self, cancel: CancellationToken) -> Result {
        let (tx, mut rx) = mpsc::channel(NOTIFICATION_CHANNEL_CAPACITY);

        spawn_reader(
            self.core.primary.chain,
            self.core.primary.zmq_endpoint.clone(),
            tx.clone(),
            cancel.clone(),
        )
        .await?;

        if let Some(aux) = &self.core.aux {
            spawn_reader(aux.chain, aux.zmq_endpoint.clone(), tx, cancel.clone()).await?;
        }

        // Miners need work before the first block arrives.
        if let Err(err) = self.refresh(true).await {
            error!("Initial work generation failed: {err:#}");
        }

        let mut ticker = interval(self.core.settings.update_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.reset();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutting down orchestrator");
                    break;
                }

                notification = rx.recv() => {
                    let Some(notification) = notification else {
                        bail!("all ZMQ readers stopped");
                    };

                    info!(
                        "New {} block {} (seq {})",
                        notification.chain, notification.block_hash, notification.counter,
                    );

                    let missed = self.gaps.observe(notification.chain, notification.counter);
                    if missed > 0 {
                        warn!("missed {missed} {} notifications", notification.chain);
                    }

                    if let Err(err) = self.refresh(true).await {
                        error!("Notification cycle failed, keeping last job: {err:#}");
                    }

                    ticker.reset();
                }

                _ = ticker.tick() => {
                    if let Err(err) = self.refresh(false).await {
                        error!("Periodic refresh failed, keeping last job: {err:#}");
                    }
                }
            }
        }

        Ok(())
    }

    /// One template cycle: fetch, generate, cache, broadcast.
    async fn refresh(&self, clean: bool) -> Result {
        let core = &self.core;
        let (template, aux_block) = core.fetch_work().await?;

        let job_id = core.cache.next_job_id();

        let (candidate, work) = generate_work(
            core.primary.chain,
            Some(Arc::new(template)),
            aux_block.as_ref(),
            core.settings.block_signature().as_bytes(),
            &core.primary.payout_script,
            EXTRANONCE_RESERVE,
            job_id,
        )?;

        let height = candidate.template.height;
        let notify = work.notify(clean);

        core.cache
            .install(
                CandidateJob {
                    job_id,
                    candidate,
                    aux: aux_block,
                    work,
                },
                clean,
            )
            .await;

        let message = Message::notification("mining.notify", notify)?;
        let delivered = core.sessions.broadcast(&message);

        info!(
            "Job {job_id} for height {height} sent to {delivered} session(s) (clean={clean})"
        );

        Ok(())
    }
}

/// One reader task per chain; reconnects with a delay on socket errors so a
/// bouncing node cannot spin the loop.
async fn spawn_reader(
    chain: Chain,
    endpoint: String,
    tx: mpsc::Sender<BlockNotification>,
    cancel: CancellationToken,
) -> Result {
    let mut socket = Zmq::connect(&endpoint).await?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                result = socket.recv_hashblock() => {
                    match result {
                        Ok(hashblock) => {
                            let notification = BlockNotification {
                                chain,
                                block_hash: hashblock.block_hash,
                                counter: hashblock.counter,
                            };

                            if tx.send(notification).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            error!("ZMQ receive error on {}: {err}", socket.endpoint());
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_reports_no_gap() {
        let mut gaps = GapTracker::default();
        assert_eq!(gaps.observe(Chain::Dogecoin, 5), 0);
    }

    #[test]
    fn consecutive_counters_report_no_gap() {
        let mut gaps = GapTracker::default();
        gaps.observe(Chain::Dogecoin, 5);
        assert_eq!(gaps.observe(Chain::Dogecoin, 6), 0);
        assert_eq!(gaps.observe(Chain::Dogecoin, 7), 0);
    }

    #[test]
    fn skipped_counters_report_the_gap() {
        // Counters 5, 6, 9: two notifications went missing.
        let mut gaps = GapTracker::default();
        gaps.observe(Chain::Dogecoin, 5);
        gaps.observe(Chain::Dogecoin, 6);
        assert_eq!(gaps.observe(Chain::Dogecoin, 9), 2);

        // And the tracker continues from the new counter.
        assert_eq!(gaps.observe(Chain::Dogecoin, 10), 0);
    }

    #[test]
    fn chains_are_tracked_independently() {
        let mut gaps = GapTracker::default();
        gaps.observe(Chain::Dogecoin, 5);
        assert_eq!(gaps.observe(Chain::Digibyte, 100), 0);
        assert_eq!(gaps.observe(Chain::Dogecoin, 6), 0);
        assert_eq!(gaps.observe(Chain::Digibyte, 103), 2);
    }

    #[test]
    fn counter_restart_does_not_underflow() {
        let mut gaps = GapTracker::default();
        gaps.observe(Chain::Dogecoin, 500);
        assert_eq!(gaps.observe(Chain::Dogecoin, 1), 0);
    }
}
