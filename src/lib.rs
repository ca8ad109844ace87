use {
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    auxpow::{AuxBlock, AuxPow},
    bitcoin::{
        Txid,
        hashes::{Hash, sha256d},
        script::write_scriptint,
    },
    block_template::{BlockTemplate, TemplateTransaction},
    cache::TemplateCache,
    chain::Chain,
    clap::Parser,
    coinbase::CoinbaseBuilder,
    connection::Connection,
    crate::core::Core,
    futures::{sink::SinkExt, stream::StreamExt},
    jobs::{CandidateJob, Jobs, SubmissionKey},
    primitive_types::U256,
    serde::{
        Deserialize, Serialize,
        de::{self, Deserializer},
        ser::{SerializeSeq, Serializer},
    },
    serde_json::{Value, json},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    sessions::{Session, SessionRegistry},
    settings::Settings,
    share::{FoundBlock, FoundKind, ShareBuffer, ShareRecord},
    std::{
        collections::HashMap,
        env,
        fmt::{self, Display, Formatter},
        fs, io,
        net::SocketAddr,
        num::NonZeroUsize,
        path::PathBuf,
        process,
        str::FromStr,
        sync::{
            Arc, LazyLock,
            atomic::{AtomicU32, AtomicUsize, Ordering},
        },
        time::{Duration, Instant, SystemTime, UNIX_EPOCH},
    },
    stratum::{
        Authorize, Configure, Difficulty, Extranonce, Id, JobId, MerkleNode, Message, Nbits,
        Nonce, Notify, Ntime, PrevHash, SetDifficulty, StratumError, StratumResult, Submit,
        Subscribe, SubscribeResult, Target, Version,
    },
    tokio::{
        io::{AsyncRead, AsyncWrite},
        net::TcpListener,
        runtime::Runtime,
        sync::mpsc,
        task::{self, JoinSet},
        time::{MissedTickBehavior, interval, timeout},
    },
    tokio_util::{
        codec::{FramedRead, FramedWrite, LinesCodec},
        sync::CancellationToken,
    },
    tracing::{debug, error, info, warn},
    tracing_appender::non_blocking,
    tracing_subscriber::EnvFilter,
    upstream::Node,
    username::Login,
    validator::{Assessment, Classification, assess_share},
    work::{CandidateBlock, Work, generate_work},
};

mod arguments;
pub mod auxpow;
pub mod block_template;
mod cache;
pub mod chain;
pub mod coinbase;
mod connection;
mod core;
mod encoding;
mod jobs;
mod options;
mod orchestrator;
pub mod record_sink;
mod sessions;
mod settings;
pub mod share;
mod signal;
pub mod stratum;
pub mod subcommand;
mod upstream;
pub mod username;
pub mod validator;
mod vardiff;
pub mod work;
mod zmq;

pub const USER_AGENT: &str = "mergepool/0.1.0";

/// Pool-assigned and miner-chosen extranonce halves; together they fill the
/// reserved region of the coinbase script.
pub const EXTRANONCE1_SIZE: usize = 4;
pub const EXTRANONCE2_SIZE: usize = 4;
pub const EXTRANONCE_RESERVE: usize = EXTRANONCE1_SIZE + EXTRANONCE2_SIZE;

pub const MAX_MESSAGE_SIZE: usize = 32 * 1024;

/// Submitted ntime may drift at most this many seconds from the template time.
pub const NTIME_TOLERANCE: u64 = 2 * 3600;

pub const DUPLICATE_WINDOW: usize = 4096;

/// Strikes before a session spewing unparseable requests is disconnected.
pub const MALFORMED_REQUEST_LIMIT: u32 = 3;

type Result<T = (), E = Error> = std::result::Result<T, E>;

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn main() {
    let (writer, _guard) = non_blocking(io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(writer)
        .init();

    let args = Arguments::parse();

    Runtime::new()
        .expect("failed to create tokio runtime")
        .block_on(async {
            let cancel_token = signal::setup_signal_handler();

            match args.run(cancel_token).await {
                Err(err) => {
                    error!("error: {err:#}");

                    if env::var_os("RUST_BACKTRACE")
                        .map(|val| val == "1")
                        .unwrap_or_default()
                    {
                        error!("{}", err.backtrace());
                    }
                    process::exit(1);
                }
                Ok(_) => {
                    process::exit(0);
                }
            }
        });
}
