use crate::prelude::*;
use clap::Parser;

mod dispatch;
mod error;
mod guide;
mod handler;
mod model;
mod prelude;
mod server;

#[cfg(test)]
mod test_support;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Guide-augmented chat proxy in front of the Gemini API"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "GAMESENSE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the generate-content HTTP proxy
    Serve(crate::server::ServeOptions),

    /// Guide page operations
    Guide(crate::guide::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
        SubCommands::Guide(sub_app) => crate::guide::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
