use anyhow::{bail, Result};
use clap::Parser;
use std::io;

use conduct_roster::cli::{resolve_credentials, Cli};
use conduct_roster::export::{FixedChooser, PathChooser, PromptChooser};
use conduct_roster::{logger, App, Config, RunState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration: defaults, file, environment, then flags
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    logger::init(config.verbose_logging);

    let (facilities, credentials) = {
        let mut input = io::stdin().lock();
        let mut stdout = io::stdout();
        let facilities = match cli.select_facilities(&config, &mut input, &mut stdout) {
            Ok(facilities) => facilities,
            Err(e) => bail!("{}: please select at least one facility", e),
        };
        (facilities, resolve_credentials(&config, &mut input, &mut stdout))
    };

    let mut chooser: Box<dyn PathChooser> = match (&cli.output, cli.yes) {
        (Some(path), _) => Box::new(FixedChooser::Path(path.clone())),
        (None, true) => Box::new(FixedChooser::Suggested),
        (None, false) => Box::new(PromptChooser::new(io::stdin().lock(), io::stdout())),
    };

    let state = App::initialize(config, facilities, credentials)
        .run(chooser.as_mut())
        .await?;

    if state == RunState::Failed {
        bail!("login failed, nothing was collected");
    }
    Ok(())
}
