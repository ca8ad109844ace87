use super::*;

#[derive(Debug, Clone, Copy)]
pub(crate) struct VardiffConfig {
    pub(crate) target_share_time: Duration,
    pub(crate) variance_percent: f64,
    pub(crate) retarget_interval: Duration,
    pub(crate) min_difficulty: Difficulty,
    pub(crate) max_difficulty: Difficulty,
}

impl Default for VardiffConfig {
    fn default() -> Self {
        Self {
            target_share_time: Duration::from_secs(10),
            variance_percent: 30.0,
            retarget_interval: Duration::from_secs(90),
            min_difficulty: Difficulty::new(0.001),
            max_difficulty: Difficulty::new(1_000_000.0),
        }
    }
}

/// Per-miner adaptive difficulty. Every retarget interval the average share
/// spacing is compared against the target; outside the variance band the
/// difficulty doubles or halves, clamped to the configured range.
#[derive(Debug, Clone)]
pub(crate) struct Vardiff {
    config: VardiffConfig,
    difficulty: Difficulty,
    last_share: Option<Instant>,
    last_retarget: Instant,
    share_count: u32,
}

impl Vardiff {
    pub(crate) fn new(config: VardiffConfig, start: Difficulty, now: Instant) -> Self {
        Self {
            config,
            difficulty: start.clamp(config.min_difficulty, config.max_difficulty),
            last_share: None,
            last_retarget: now,
            share_count: 0,
        }
    }

    pub(crate) fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub(crate) fn share_count(&self) -> u32 {
        self.share_count
    }

    /// Record a valid share. Returns the new difficulty when a retarget
    /// fires and actually changes it.
    pub(crate) fn record_share(&mut self, now: Instant) -> Option<Difficulty> {
        self.share_count += 1;
        self.last_share = Some(now);

        let window = now.duration_since(self.last_retarget);
        if window < self.config.retarget_interval {
            return None;
        }

        let average = window.as_secs_f64() / f64::from(self.share_count);
        let target = self.config.target_share_time.as_secs_f64();
        let variance = target * self.config.variance_percent / 100.0;

        let proposed = if average < target - variance {
            self.difficulty.as_f64() * 2.0
        } else if average > target + variance {
            self.difficulty.as_f64() / 2.0
        } else {
            self.reset(now);
            return None;
        };

        let clamped = Difficulty::new(proposed)
            .clamp(self.config.min_difficulty, self.config.max_difficulty);

        self.reset(now);

        if clamped == self.difficulty {
            return None;
        }

        self.difficulty = clamped;
        Some(clamped)
    }

    fn reset(&mut self, now: Instant) {
        self.last_retarget = now;
        self.share_count = 0;
    }
}
