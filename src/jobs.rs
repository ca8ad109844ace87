use {super::*, lru::LruCache};

/// One submission, as remembered for replay detection.
pub(crate) type SubmissionKey = (JobId, Extranonce, Extranonce, Ntime, Nonce);

/// A generated job: the candidate block, the aux block pinned to it, and the
/// work tuple that was broadcast for it.
#[derive(Debug)]
pub(crate) struct CandidateJob {
    pub(crate) job_id: JobId,
    pub(crate) candidate: CandidateBlock,
    pub(crate) aux: Option<AuxBlock>,
    pub(crate) work: Work,
}

/// Job table: the current job plus any predecessors that were broadcast
/// without `clean_jobs`, and the replay window for duplicate shares.
#[derive(Debug)]
pub(crate) struct Jobs {
    current: Option<Arc<CandidateJob>>,
    valid: HashMap<JobId, Arc<CandidateJob>>,
    seen: LruCache<SubmissionKey, ()>,
}

impl Jobs {
    pub(crate) fn new() -> Self {
        Self {
            current: None,
            valid: HashMap::new(),
            seen: LruCache::new(NonZeroUsize::new(DUPLICATE_WINDOW).expect("window is non-zero")),
        }
    }

    /// Install a new job. With `clean` every prior job becomes stale and the
    /// replay window resets; without it miners may still submit against the
    /// previous jobs.
    pub(crate) fn insert(&mut self, job: Arc<CandidateJob>, clean: bool) {
        if clean {
            self.valid.clear();
            self.seen.clear();
        }
        self.valid.insert(job.job_id, job.clone());
        self.current = Some(job);
    }

    pub(crate) fn current(&self) -> Option<Arc<CandidateJob>> {
        self.current.clone()
    }

    pub(crate) fn get(&self, job_id: &JobId) -> Option<Arc<CandidateJob>> {
        self.valid.get(job_id).cloned()
    }

    pub(crate) fn is_duplicate(&mut self, key: SubmissionKey) -> bool {
        self.seen.put(key, ()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::work::tests::sample_template};

    fn job(id: u32) -> Arc<CandidateJob> {
        let (candidate, work) = generate_work(
            Chain::Dogecoin,
            Some(sample_template()),
            None,
            b"/mergepool/",
            &[0x51],
            EXTRANONCE_RESERVE,
            JobId::from(id),
        )
        .unwrap();

        Arc::new(CandidateJob {
            job_id: JobId::from(id),
            candidate,
            aux: None,
            work,
        })
    }

    fn key(job_id: u32, nonce: u32) -> SubmissionKey {
        (
            JobId::from(job_id),
            "deadbeef".parse().unwrap(),
            "00000001".parse().unwrap(),
            Ntime::from(1_725_000_000),
            Nonce::from(nonce),
        )
    }

    #[test]
    fn empty_table_has_no_current_job() {
        let jobs = Jobs::new();
        assert!(jobs.current().is_none());
        assert!(jobs.get(&JobId::from(1)).is_none());
    }

    #[test]
    fn insert_without_clean_keeps_predecessors() {
        let mut jobs = Jobs::new();
        jobs.insert(job(1), true);
        jobs.insert(job(2), false);

        assert_eq!(jobs.current().unwrap().job_id, JobId::from(2));
        assert!(jobs.get(&JobId::from(1)).is_some());
        assert!(jobs.get(&JobId::from(2)).is_some());
    }

    #[test]
    fn insert_with_clean_invalidates_predecessors() {
        let mut jobs = Jobs::new();
        jobs.insert(job(1), true);
        jobs.insert(job(2), false);
        jobs.insert(job(3), true);

        assert!(jobs.get(&JobId::from(1)).is_none());
        assert!(jobs.get(&JobId::from(2)).is_none());
        assert_eq!(jobs.current().unwrap().job_id, JobId::from(3));
    }

    #[test]
    fn duplicate_detection() {
        let mut jobs = Jobs::new();
        jobs.insert(job(1), true);

        assert!(!jobs.is_duplicate(key(1, 42)));
        assert!(jobs.is_duplicate(key(1, 42)));
        assert!(!jobs.is_duplicate(key(1, 43)));
    }

    #[test]
    fn replay_window_resets_on_clean() {
        let mut jobs = Jobs::new();
        jobs.insert(job(1), true);

        assert!(!jobs.is_duplicate(key(1, 42)));
        jobs.insert(job(2), true);
        assert!(!jobs.is_duplicate(key(1, 42)));
    }

    #[test]
    fn replay_window_survives_unclean_insert() {
        let mut jobs = Jobs::new();
        jobs.insert(job(1), true);

        assert!(!jobs.is_duplicate(key(1, 42)));
        jobs.insert(job(2), false);
        assert!(jobs.is_duplicate(key(1, 42)));
    }

    #[test]
    fn distinct_extranonce_is_not_a_duplicate() {
        let mut jobs = Jobs::new();
        jobs.insert(job(1), true);

        let first = key(1, 42);
        let second = (
            first.0,
            "cafebabe".parse().unwrap(),
            first.2.clone(),
            first.3,
            first.4,
        );

        assert!(!jobs.is_duplicate(first));
        assert!(!jobs.is_duplicate(second));
    }
}
