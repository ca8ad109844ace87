use {super::*, async_trait::async_trait};

mod event;
mod file;
mod multi;

pub use {
    event::Event,
    file::{FileFormat, FileSink},
    multi::MultiSink,
};

/// Destination for share and found-block records. The pool treats it as an
/// injected sink; what sits behind it is the accountant's business.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn record(&self, event: &Event) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.flush().await
    }
}

/// Assemble the configured sink, if any.
pub(crate) async fn build_record_sink(settings: &Settings) -> Result<Option<Arc<dyn RecordSink>>> {
    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();

    if let Some(events_file) = settings.events_file() {
        let format = if events_file.extension().is_some_and(|e| e == "csv") {
            FileFormat::Csv
        } else {
            FileFormat::JsonLines
        };

        let sink = FileSink::open(events_file.clone(), format).await?;
        info!("Recording events to {}", events_file.display());
        sinks.push(Box::new(sink));
    }

    Ok(match sinks.len() {
        0 => None,
        1 => Some(Arc::from(sinks.remove(0))),
        _ => Some(Arc::new(MultiSink::new(sinks))),
    })
}

/// Drain the share buffer into the sink on an interval; on cancellation a
/// final drain runs before the sink closes.
pub(crate) fn spawn_flusher(
    core: Arc<Core>,
    sink: Option<Arc<dyn RecordSink>>,
    cancel: CancellationToken,
) -> task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(core.settings.flush_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    flush(&core, sink.as_deref()).await;
                    if let Some(sink) = &sink {
                        if let Err(err) = sink.close().await {
                            warn!("Failed to close record sink: {err}");
                        }
                    }
                    break;
                }

                _ = ticker.tick() => {
                    flush(&core, sink.as_deref()).await;
                }
            }
        }
    })
}

async fn flush(core: &Core, sink: Option<&dyn RecordSink>) {
    let events = core.shares.drain();
    if events.is_empty() {
        return;
    }

    let Some(sink) = sink else {
        debug!("Dropping {} events: no record sink configured", events.len());
        return;
    };

    for event in &events {
        if let Err(err) = sink.record(event).await {
            warn!("Failed to record event: {err}");
        }
    }

    if let Err(err) = sink.flush().await {
        warn!("Failed to flush record sink: {err}");
    }
}
