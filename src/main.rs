use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rgedit::logger::LoggerConfig;
use rgedit::{ConsoleSurface, CycleOutcome, EditController, EditSession, EditorConfig};

/// Edit an image with a text instruction and save the result.
#[derive(Debug, Parser)]
#[command(name = "rgedit", version, about)]
struct Cli {
    /// Image to edit
    image: PathBuf,

    /// What to change, e.g. "make the sky purple"
    instruction: String,

    /// Directory for the edited image (overrides RGEDIT_DOWNLOAD_DIR)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let mut log_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::from_env()
    };
    if cli.json_logs {
        log_config = LoggerConfig::production().with_level(log_config.min_level);
    }
    rgedit::logger::init_with_config(log_config)?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }
    rgedit::logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut config = EditorConfig::from_env();
    if let Some(out) = cli.out {
        config = config.with_download_dir(out);
    }
    rgedit::logger::log_config_info(&config);

    let controller = EditController::from_config(&config, Box::new(ConsoleSurface::new()));
    let (session, join) = EditSession::spawn(controller);

    let code = match run(&session, cli.image, cli.instruction).await {
        Ok(Some(path)) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    };

    session.shutdown().await?;
    join.await?;
    Ok(code)
}

async fn run(
    session: &rgedit::SessionHandle,
    image: PathBuf,
    instruction: String,
) -> rgedit::Result<Option<PathBuf>> {
    if !session.upload(&image).await? {
        log::error!("{} could not be read as an image", image.display());
        return Ok(None);
    }
    session.set_instruction(instruction).await?;

    match session.generate().await? {
        Some(CycleOutcome::Succeeded) => session.save().await,
        Some(outcome) => {
            log::warn!("Generation ended without an image: {:?}", outcome);
            Ok(None)
        }
        None => Ok(None),
    }
}
