use {
    super::*,
    tokio::{
        fs::OpenOptions,
        io::{AsyncWriteExt, BufWriter},
        sync::Mutex,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    #[default]
    JsonLines,
    Csv,
}

/// Append-only event log, one record per line.
pub struct FileSink {
    format: FileFormat,
    writer: Mutex<Option<BufWriter<tokio::fs::File>>>,
}

impl FileSink {
    pub async fn open(path: PathBuf, format: FileFormat) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open events file {}", path.display()))?;

        Ok(Self {
            format,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    fn csv_line(event: &Event) -> String {
        fn field(s: &str) -> String {
            if s.contains(',') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.to_string()
            }
        }

        match event {
            Event::Share(share) => format!(
                "{},share,{},{},{},{},{},{},{}",
                share.created_at,
                field(&share.miner),
                field(&share.worker),
                share.block_height,
                share.difficulty,
                share.network_difficulty,
                field(&share.ip),
                field(share.user_agent.as_deref().unwrap_or_default()),
            ),
            Event::BlockFound(block) => format!(
                "{},block_found,{},{},{},{},{},{}",
                block.created_at,
                field(&block.chain),
                block.kind,
                field(&block.hash),
                block.block_height,
                block.network_difficulty,
                field(&block.miner),
            ),
        }
    }
}

#[async_trait]
impl RecordSink for FileSink {
    async fn record(&self, event: &Event) -> Result<()> {
        let line = match self.format {
            FileFormat::JsonLines => serde_json::to_string(event)?,
            FileFormat::Csv => Self::csv_line(event),
        };

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(|| anyhow!("file sink closed"))?;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().await.as_mut() {
            writer.flush().await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer.flush().await?;
        }
        Ok(())
    }
}
