use {super::*, coinbase::CoinbaseError, snafu::Snafu};

#[derive(Debug, Snafu)]
pub enum WorkError {
    #[snafu(display("block template missing"))]
    TemplateMissing,

    #[snafu(display("invalid previous block hash hex: {reason}"))]
    InvalidPrevHash { reason: String },

    #[snafu(display("invalid aux commitment hex: {source}"))]
    InvalidCommitment { source: hex::FromHexError },

    #[snafu(display("coinbase: {source}"))]
    Coinbase { source: CoinbaseError },
}

/// Per-job block under construction. Holds a chain identifier, never chain
/// behavior; anything that needs digests receives the adapter by value.
#[derive(Debug, Clone)]
pub struct CandidateBlock {
    pub chain: Chain,
    pub template: Arc<BlockTemplate>,
    pub prev_hash: PrevHash,
    pub coinbase_initial: String,
    pub coinbase_final: String,
    pub merkle_steps: Vec<MerkleNode>,
}

impl CandidateBlock {
    pub fn assemble_coinbase(&self, extranonce_hex: &str) -> String {
        format!(
            "{}{}{}",
            self.coinbase_initial, extranonce_hex, self.coinbase_final
        )
    }

    /// Reassemble the 80-byte header for a submitted extranonce/ntime/nonce.
    pub fn make_header(
        &self,
        extranonce_hex: &str,
        ntime: Ntime,
        nonce: Nonce,
    ) -> Result<[u8; 80], stratum::InternalError> {
        let coinbase = hex::decode(self.assemble_coinbase(extranonce_hex))
            .map_err(|source| stratum::InternalError::HexParse { source })?;

        let coinbase_hash = self.chain.coinbase_digest(&coinbase);
        let merkle_root = stratum::fold_merkle_root(coinbase_hash, &self.merkle_steps);

        let mut header = [0u8; 80];
        header[0..4].copy_from_slice(&self.template.version.to_le_bytes());
        header[4..36].copy_from_slice(&self.prev_hash.to_le_bytes());
        header[36..68].copy_from_slice(&merkle_root);
        header[68..72].copy_from_slice(&ntime.to_le_bytes());
        header[72..76].copy_from_slice(&self.template.bits.to_le_bytes());
        header[76..80].copy_from_slice(&nonce.to_le_bytes());

        Ok(header)
    }

    /// Full block submission: header, transaction count, coinbase, the
    /// template transactions verbatim, and the MimbleWimble trailer when the
    /// template carries one.
    pub fn submission_hex(&self, header: &[u8; 80], coinbase_hex: &str) -> String {
        let mut submission = hex::encode(header);
        submission.push_str(&hex::encode(encoding::var_uint(
            self.template.transactions.len() as u64 + 1,
        )));
        submission.push_str(coinbase_hex);

        for transaction in &self.template.transactions {
            submission.push_str(&transaction.data);
        }

        if let Some(trailer) = &self.template.mimble_wimble {
            submission.push_str("01");
            submission.push_str(trailer);
        }

        submission
    }
}

/// The eight positional fields a miner needs to assemble a valid header.
/// A ninth clean-jobs boolean is appended at broadcast time.
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    pub job_id: JobId,
    pub prev_hash: PrevHash,
    pub coinbase_initial: String,
    pub coinbase_final: String,
    pub merkle_steps: Vec<MerkleNode>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
}

impl Work {
    pub fn notify(&self, clean_jobs: bool) -> Notify {
        Notify {
            job_id: self.job_id,
            prev_hash: self.prev_hash,
            coinbase_initial: self.coinbase_initial.clone(),
            coinbase_final: self.coinbase_final.clone(),
            merkle_steps: self.merkle_steps.clone(),
            version: self.version,
            nbits: self.nbits,
            ntime: self.ntime,
            clean_jobs,
        }
    }
}

/// Turn a fetched template (and optional aux block) into the per-job
/// candidate and the work tuple miners see.
pub fn generate_work(
    chain: Chain,
    template: Option<Arc<BlockTemplate>>,
    aux: Option<&AuxBlock>,
    signature: &[u8],
    payout_script: &[u8],
    extranonce_reserve: usize,
    job_id: JobId,
) -> Result<(CandidateBlock, Work), WorkError> {
    let template = template.ok_or(WorkError::TemplateMissing)?;

    let prev_hash = PrevHash::from_display_hex(&template.previous_block_hash)
        .map_err(|e| WorkError::InvalidPrevHash {
            reason: e.to_string(),
        })?;

    let aux_commitment = match aux {
        Some(aux) => {
            hex::decode(aux.commitment()).map_err(|source| WorkError::InvalidCommitment { source })?
        }
        None => Vec::new(),
    };

    let pieces = CoinbaseBuilder::new(
        template.height,
        template.coinbase_value,
        payout_script.to_vec(),
    )
    .with_signature(signature.to_vec())
    .with_aux_commitment(aux_commitment)
    .with_extranonce_reserve(extranonce_reserve)
    .build()
    .map_err(|source| WorkError::Coinbase { source })?;

    let txids: Vec<Txid> = template
        .transactions
        .iter()
        .map(|transaction| transaction.txid)
        .collect();
    let merkle_steps = stratum::merkle_steps(&txids);

    let candidate = CandidateBlock {
        chain,
        template: template.clone(),
        prev_hash,
        coinbase_initial: pieces.initial.clone(),
        coinbase_final: pieces.final_part.clone(),
        merkle_steps: merkle_steps.clone(),
    };

    let work = Work {
        job_id,
        prev_hash,
        coinbase_initial: pieces.initial,
        coinbase_final: pieces.final_part,
        merkle_steps,
        version: template.version,
        nbits: template.bits,
        ntime: Ntime::from(template.current_time),
    };

    Ok((candidate, work))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auxpow::MERGED_MINING_HEADER;

    pub(crate) fn sample_template() -> Arc<BlockTemplate> {
        Arc::new(BlockTemplate {
            version: Version::from(0x00620104),
            previous_block_hash:
                "00000000440b921e1b77c6c0487ae5616de67f788f44ae2a5af6e2194d16b6f8".into(),
            target: "00000fffff000000000000000000000000000000000000000000000000000000"
                .into(),
            bits: "1e0ffff0".parse().unwrap(),
            current_time: 1_725_000_000,
            min_time: 1_724_990_000,
            height: 5_300_000,
            coinbase_value: 1_000_000_000_000,
            transactions: vec![TemplateTransaction {
                txid: "1111111111111111111111111111111111111111111111111111111111111111"
                    .parse()
                    .unwrap(),
                data: "0100000001aa".into(),
            }],
            mimble_wimble: None,
        })
    }

    fn payout_script() -> Vec<u8> {
        vec![0x76, 0xa9, 0x14, 0x00, 0x88, 0xac]
    }

    fn generate() -> (CandidateBlock, Work) {
        generate_work(
            Chain::Dogecoin,
            Some(sample_template()),
            None,
            b"/mergepool/",
            &payout_script(),
            EXTRANONCE_RESERVE,
            JobId::from(1),
        )
        .unwrap()
    }

    #[test]
    fn missing_template_is_an_error() {
        let err = generate_work(
            Chain::Dogecoin,
            None,
            None,
            b"",
            &payout_script(),
            EXTRANONCE_RESERVE,
            JobId::from(1),
        )
        .unwrap_err();
        assert!(matches!(err, WorkError::TemplateMissing));
    }

    #[test]
    fn malformed_prev_hash_is_an_error() {
        let template = Arc::new(BlockTemplate {
            previous_block_hash: "zz".repeat(32),
            ..(*sample_template()).clone()
        });

        let err = generate_work(
            Chain::Dogecoin,
            Some(template),
            None,
            b"",
            &payout_script(),
            EXTRANONCE_RESERVE,
            JobId::from(1),
        )
        .unwrap_err();
        assert!(matches!(err, WorkError::InvalidPrevHash { .. }));
    }

    #[test]
    fn work_tuple_reflects_template() {
        let (candidate, work) = generate();

        assert_eq!(work.job_id, JobId::from(1));
        assert_eq!(work.version, Version::from(0x00620104));
        assert_eq!(work.nbits, "1e0ffff0".parse().unwrap());
        assert_eq!(work.ntime, Ntime::from(1_725_000_000));
        assert_eq!(work.merkle_steps.len(), 1);
        assert_eq!(work.prev_hash, candidate.prev_hash);
        assert_eq!(work.coinbase_initial, candidate.coinbase_initial);
        assert_eq!(work.coinbase_final, candidate.coinbase_final);
    }

    #[test]
    fn notify_appends_clean_flag() {
        let (_, work) = generate();

        let notify = work.notify(true);
        assert!(notify.clean_jobs);
        assert_eq!(notify.job_id, work.job_id);

        let elements = serde_json::to_value(&notify).unwrap();
        assert_eq!(elements.as_array().unwrap().len(), 9);
        assert_eq!(elements[8], json!(true));
    }

    #[test]
    fn aux_commitment_lands_in_coinbase_final(){
        let aux = crate::auxpow::tests::sample_aux_block();

        let (candidate, _) = generate_work(
            Chain::Dogecoin,
            Some(sample_template()),
            Some(&aux),
            b"/mergepool/",
            &payout_script(),
            EXTRANONCE_RESERVE,
            JobId::from(2),
        )
        .unwrap();

        assert!(candidate.coinbase_final.contains(&aux.commitment()));
        assert!(!candidate.coinbase_initial.contains(MERGED_MINING_HEADER));
    }

    #[test]
    fn header_layout() {
        let (candidate, work) = generate();

        let extranonce = "00".repeat(EXTRANONCE_RESERVE);
        let header = candidate
            .make_header(&extranonce, work.ntime, Nonce::from(0x12345678))
            .unwrap();

        assert_eq!(&header[0..4], &0x00620104u32.to_le_bytes());
        assert_eq!(&header[4..36], &candidate.prev_hash.to_le_bytes());
        assert_eq!(&header[68..72], &1_725_000_000u32.to_le_bytes());
        assert_eq!(&header[72..76], &[0xf0, 0xff, 0x0f, 0x1e]);
        assert_eq!(&header[76..80], &0x12345678u32.to_le_bytes());
    }

    #[test]
    fn header_merkle_root_folds_coinbase() {
        let (candidate, work) = generate();

        let extranonce = "11".repeat(EXTRANONCE_RESERVE);
        let header = candidate
            .make_header(&extranonce, work.ntime, Nonce::from(7))
            .unwrap();

        let coinbase = hex::decode(candidate.assemble_coinbase(&extranonce)).unwrap();
        let expected = stratum::fold_merkle_root(
            candidate.chain.coinbase_digest(&coinbase),
            &candidate.merkle_steps,
        );

        assert_eq!(&header[36..68], &expected);
    }

    #[test]
    fn submission_contains_all_parts_in_order() {
        let (candidate, work) = generate();

        let extranonce = "00".repeat(EXTRANONCE_RESERVE);
        let coinbase = candidate.assemble_coinbase(&extranonce);
        let header = candidate
            .make_header(&extranonce, work.ntime, Nonce::from(0))
            .unwrap();

        let submission = candidate.submission_hex(&header, &coinbase);

        let expected_prefix = format!("{}02{}", hex::encode(header), coinbase);
        assert!(submission.starts_with(&expected_prefix));
        assert!(submission.ends_with("0100000001aa"));
    }

    #[test]
    fn submission_appends_mweb_trailer() {
        let template = Arc::new(BlockTemplate {
            mimble_wimble: Some("cafebabe".into()),
            ..(*sample_template()).clone()
        });

        let (candidate, work) = generate_work(
            Chain::Litecoin,
            Some(template),
            None,
            b"",
            &payout_script(),
            EXTRANONCE_RESERVE,
            JobId::from(3),
        )
        .unwrap();

        let extranonce = "00".repeat(EXTRANONCE_RESERVE);
        let coinbase = candidate.assemble_coinbase(&extranonce);
        let header = candidate
            .make_header(&extranonce, work.ntime, Nonce::from(0))
            .unwrap();

        assert!(
            candidate
                .submission_hex(&header, &coinbase)
                .ends_with("01cafebabe")
        );
    }
}
