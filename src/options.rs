use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub(crate) struct Options {
    #[arg(long, help = "Load configuration from <CONFIG>.")]
    pub(crate) config: Option<PathBuf>,

    #[arg(long, help = "Listen on <ADDRESS>. Overrides the config file.")]
    pub(crate) address: Option<String>,

    #[arg(long, help = "Listen on <PORT>. Overrides the config file.")]
    pub(crate) port: Option<u16>,

    #[arg(
        long,
        help = "Hand new miners <START_DIFFICULTY>. Overrides the config file."
    )]
    pub(crate) start_difficulty: Option<f64>,

    #[arg(long, help = "Append share and block events to <EVENTS_FILE>.")]
    pub(crate) events_file: Option<PathBuf>,
}
