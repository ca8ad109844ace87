use {super::*, record_sink::Event};

/// Accepted share as handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub pool_id: String,
    pub block_height: u64,
    pub miner: String,
    pub worker: String,
    pub user_agent: Option<String>,
    /// Share difficulty, `difficulty_1 / hash`.
    pub difficulty: f64,
    /// Chain difficulty weighted by the chain's share multiplier.
    pub network_difficulty: f64,
    pub ip: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoundKind {
    Primary,
    Aux1,
    Dual,
}

impl Display for FoundKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("Primary"),
            Self::Aux1 => f.write_str("Aux1"),
            Self::Dual => f.write_str("Dual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoundStatus {
    Pending,
    Confirmed,
    Orphaned,
}

/// A block the pool believes it found, pending confirmation by the
/// downstream accountant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundBlock {
    pub pool_id: String,
    pub chain: String,
    pub kind: FoundKind,
    pub hash: String,
    pub block_height: u64,
    pub network_difficulty: f64,
    /// What the accountant needs to locate the coinbase on-chain.
    pub transaction_confirmation_data: String,
    pub miner: String,
    pub status: FoundStatus,
    pub created_at: u64,
}

/// Writer-heavy buffer between the hot submit path and the persistence
/// sink; the flusher drains it on an interval.
pub(crate) struct ShareBuffer {
    entries: std::sync::Mutex<Vec<Event>>,
}

impl ShareBuffer {
    pub(crate) fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, event: Event) {
        self.entries
            .lock()
            .expect("share buffer lock poisoned")
            .push(event);
    }

    pub(crate) fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.entries.lock().expect("share buffer lock poisoned"))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("share buffer lock poisoned")
            .len()
    }
}
