use super::*;

/// `mining.notify` parameters: the eight work fields plus the clean-jobs
/// flag appended at broadcast time.
#[derive(Debug, PartialEq, Clone)]
pub struct Notify {
    pub job_id: JobId,
    pub prev_hash: PrevHash,
    pub coinbase_initial: String,
    pub coinbase_final: String,
    pub merkle_steps: Vec<MerkleNode>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
    pub clean_jobs: bool,
}

impl Serialize for Notify {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(9))?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.prev_hash)?;
        seq.serialize_element(&self.coinbase_initial)?;
        seq.serialize_element(&self.coinbase_final)?;
        seq.serialize_element(&self.merkle_steps)?;
        seq.serialize_element(&self.version)?;
        seq.serialize_element(&self.nbits)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.clean_jobs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Notify {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (
            job_id,
            prev_hash,
            coinbase_initial,
            coinbase_final,
            merkle_steps,
            version,
            nbits,
            ntime,
            clean_jobs,
        ) = <(
            JobId,
            PrevHash,
            String,
            String,
            Vec<MerkleNode>,
            Version,
            Nbits,
            Ntime,
            bool,
        )>::deserialize(deserializer)?;

        Ok(Notify {
            job_id,
            prev_hash,
            coinbase_initial,
            coinbase_final,
            merkle_steps,
            version,
            nbits,
            ntime,
            clean_jobs,
        })
    }
}
