use super::*;

mod authorize;
mod configure;
mod difficulty;
mod error;
mod extranonce;
mod job_id;
mod merkle;
mod message;
mod nbits;
mod nonce;
mod notify;
mod ntime;
mod prevhash;
mod set_difficulty;
mod submit;
mod subscribe;
mod version;

pub use {
    authorize::Authorize,
    configure::{Configure, ConfigureResult},
    difficulty::{DIFFICULTY_1_TARGET, Difficulty, Target, difficulty_from_hash},
    error::{ErrorReply, InternalError, StratumError},
    extranonce::Extranonce,
    job_id::JobId,
    merkle::{MerkleNode, fold_merkle_root, merkle_steps},
    message::{Id, Message, StratumResult},
    nbits::Nbits,
    nonce::Nonce,
    notify::Notify,
    ntime::Ntime,
    prevhash::PrevHash,
    set_difficulty::SetDifficulty,
    submit::Submit,
    subscribe::{Subscribe, SubscribeResult},
    version::Version,
};
