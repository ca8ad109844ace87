use super::*;

pub mod serve;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Run the merged-mining pool server")]
    Serve(serve::Serve),
}

impl Subcommand {
    pub(crate) async fn run(
        self,
        settings: Settings,
        cancel_token: CancellationToken,
    ) -> Result {
        match self {
            Self::Serve(serve) => serve.run(settings, cancel_token).await,
        }
    }
}
