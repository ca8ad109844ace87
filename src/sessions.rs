use super::*;

/// Authorized miner session as the registry sees it.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) session_id: String,
    pub(crate) login: String,
    pub(crate) extranonce1: Extranonce,
    pub(crate) user_agent: Option<String>,
    pub(crate) remote_addr: SocketAddr,
    pub(crate) authorized_at: u64,
}

/// Registry entry: the session record, the connection's outbound queue, and
/// its current difficulty.
#[derive(Debug)]
pub(crate) struct SessionHandle {
    pub(crate) session: Session,
    outbound: mpsc::Sender<Message>,
    difficulty: std::sync::Mutex<Difficulty>,
}

impl SessionHandle {
    pub(crate) fn new(
        session: Session,
        outbound: mpsc::Sender<Message>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            session,
            outbound,
            difficulty: std::sync::Mutex::new(difficulty),
        }
    }

    pub(crate) fn difficulty(&self) -> Difficulty {
        *self.difficulty.lock().expect("difficulty lock poisoned")
    }

    pub(crate) fn set_difficulty(&self, difficulty: Difficulty) {
        *self.difficulty.lock().expect("difficulty lock poisoned") = difficulty;
    }
}

/// All authorized sessions, keyed by session id. Many readers for fan-out,
/// one writer for add/remove.
pub(crate) struct SessionRegistry {
    sessions: std::sync::RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            sessions: std::sync::RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, handle: Arc<SessionHandle>) {
        self.sessions
            .write()
            .expect("session lock poisoned")
            .insert(handle.session.session_id.clone(), handle);
    }

    pub(crate) fn remove(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions
            .write()
            .expect("session lock poisoned")
            .remove(session_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.read().expect("session lock poisoned").len()
    }

    /// Queue a message on every session. A full or closed queue is logged
    /// and skipped; fan-out never aborts half way.
    pub(crate) fn broadcast(&self, message: &Message) -> usize {
        let handles: Vec<Arc<SessionHandle>> = self
            .sessions
            .read()
            .expect("session lock poisoned")
            .values()
            .cloned()
            .collect();

        let mut delivered = 0;
        for handle in handles {
            match handle.outbound.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(
                        "Failed to queue broadcast for session {} ({}): {err}",
                        handle.session.session_id, handle.session.remote_addr,
                    );
                }
            }
        }
        delivered
    }
}
