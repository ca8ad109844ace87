use super::*;

/// Share classification lattice, ordered by value: a dual candidate solves
/// both chains, a primary or aux candidate solves one, a valid share only
/// meets the pool target, and an invalid share meets nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Classification {
    Invalid,
    Valid,
    AuxCandidate,
    PrimaryCandidate,
    DualCandidate,
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "Invalid",
            Self::Valid => "Valid",
            Self::AuxCandidate => "Aux1",
            Self::PrimaryCandidate => "Primary",
            Self::DualCandidate => "Dual",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Stale,
    Duplicate,
    LowDifficulty,
    NtimeOutOfRange,
}

impl RejectReason {
    pub fn stratum_error(self) -> StratumError {
        match self {
            Self::Stale => StratumError::StaleJob,
            Self::Duplicate => StratumError::DuplicateShare,
            Self::LowDifficulty => StratumError::LowDifficulty,
            Self::NtimeOutOfRange => StratumError::BadHeader,
        }
    }
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Stale => "stale job",
            Self::Duplicate => "duplicate share",
            Self::LowDifficulty => "low difficulty",
            Self::NtimeOutOfRange => "ntime out of range",
        };
        f.write_str(reason)
    }
}

/// Everything the pool learns from one submitted share.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub classification: Classification,
    pub reject_reason: Option<RejectReason>,
    /// `difficulty_1 / hash`, the share's weight for accounting.
    pub share_difficulty: f64,
    /// Header hash in display order.
    pub hash: String,
    pub header: [u8; 80],
    pub coinbase: String,
}

/// Reconstruct the header a share describes and classify it against the
/// pool, primary-network, and aux-network targets.
pub fn assess_share(
    candidate: &CandidateBlock,
    aux: Option<&AuxBlock>,
    extranonce1: &Extranonce,
    extranonce2: &Extranonce,
    ntime: Ntime,
    nonce: Nonce,
    pool_difficulty: Difficulty,
) -> Result<Assessment, stratum::InternalError> {
    let extranonce_hex = format!("{extranonce1}{extranonce2}");
    let coinbase = candidate.assemble_coinbase(&extranonce_hex);
    let header = candidate.make_header(&extranonce_hex, ntime, nonce)?;

    let digest = candidate.chain.header_digest(&header);
    let hash = {
        let mut display = digest;
        display.reverse();
        hex::encode(display)
    };

    let share_difficulty = stratum::difficulty_from_hash(&digest);

    let mut assessment = Assessment {
        classification: Classification::Invalid,
        reject_reason: None,
        share_difficulty,
        hash,
        header,
        coinbase,
    };

    let template = &candidate.template;
    let submitted = u64::from(u32::from(ntime));
    let current = u64::from(template.current_time);
    if submitted.abs_diff(current) > NTIME_TOLERANCE
        || u32::from(ntime) < template.min_time
    {
        assessment.reject_reason = Some(RejectReason::NtimeOutOfRange);
        return Ok(assessment);
    }

    let pool_target = pool_difficulty.to_target();
    if !pool_target.is_met_by(&digest) {
        assessment.reject_reason = Some(RejectReason::LowDifficulty);
        return Ok(assessment);
    }

    let primary_target = candidate.template.bits.to_target();
    let meets_primary = primary_target.is_met_by(&digest);

    let meets_aux = match aux {
        Some(aux) => aux
            .network_target()
            .map(|target| target.is_met_by(&digest))
            .unwrap_or(false),
        None => false,
    };

    assessment.classification = match (meets_primary, meets_aux) {
        (true, true) => Classification::DualCandidate,
        (true, false) => Classification::PrimaryCandidate,
        (false, true) => Classification::AuxCandidate,
        (false, false) => Classification::Valid,
    };

    Ok(assessment)
}
