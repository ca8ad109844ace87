use {super::*, orchestrator::Orchestrator};

#[derive(Debug, Parser)]
pub(crate) struct Serve {}

impl Serve {
    pub(crate) async fn run(self, settings: Settings, cancel_token: CancellationToken) -> Result {
        let address = settings.listen_address().to_string();
        let port = settings.port();

        let core = Arc::new(Core::connect(settings).await?);

        let sink = record_sink::build_record_sink(&core.settings).await?;
        let flusher = record_sink::spawn_flusher(core.clone(), sink, cancel_token.clone());

        let orchestrator = Orchestrator::new(core.clone());
        let orchestrator_cancel = cancel_token.clone();
        let orchestrator_task = tokio::spawn(async move {
            if let Err(err) = orchestrator.run(orchestrator_cancel.clone()).await {
                // Losing the orchestrator means no fresh work; restart the
                // whole process rather than serving stale jobs forever.
                error!("Orchestrator failed: {err:#}");
                orchestrator_cancel.cancel();
            }
        });

        let listener = TcpListener::bind((address.clone(), port)).await?;
        info!("Listening for miners on {address}:{port}");

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Shutting down pool server");
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, remote_addr) = accepted?;
                    stream.set_nodelay(true)?;

                    info!("Accepted connection from {remote_addr}");

                    let (reader, writer) = stream.into_split();
                    let core = core.clone();
                    let cancel = cancel_token.clone();

                    connections.spawn(async move {
                        let mut connection =
                            Connection::new(core, remote_addr, reader, writer, cancel);

                        if let Err(err) = connection.serve().await {
                            error!("Miner connection error: {err:#}");
                        }
                    });
                }
            }
        }

        connections.shutdown().await;
        let _ = orchestrator_task.await;
        let _ = flusher.await;

        Ok(())
    }
}
