use {super::*, tokio::sync::RwLock};

/// Process-wide work cache: the job table behind a read-write lock (writers
/// replace wholesale, readers snapshot) and the monotonic job counter.
pub(crate) struct TemplateCache {
    jobs: RwLock<Jobs>,
    job_counter: AtomicU32,
}

impl TemplateCache {
    pub(crate) fn new() -> Self {
        Self {
            jobs: RwLock::new(Jobs::new()),
            job_counter: AtomicU32::new(0),
        }
    }

    /// Allocate the next job id. Strictly increasing for the life of the
    /// process; exhausting the space is an invariant violation, not an error
    /// the caller can handle.
    pub(crate) fn next_job_id(&self) -> JobId {
        let id = self.job_counter.fetch_add(1, Ordering::Relaxed);
        assert!(id != u32::MAX, "job counter exhausted");
        JobId::from(id)
    }

    pub(crate) async fn install(&self, job: CandidateJob, clean: bool) {
        self.jobs.write().await.insert(Arc::new(job), clean);
    }

    pub(crate) async fn current(&self) -> Option<Arc<CandidateJob>> {
        self.jobs.read().await.current()
    }

    pub(crate) async fn lookup(&self, job_id: &JobId) -> Option<Arc<CandidateJob>> {
        self.jobs.read().await.get(job_id)
    }

    pub(crate) async fn is_duplicate(&self, key: SubmissionKey) -> bool {
        self.jobs.write().await.is_duplicate(key)
    }
}
