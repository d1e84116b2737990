use std::error::Error;
use std::process::ExitCode;

use cardlink_pcsc::{
    DEFAULT_CAPACITY, Disposition, PcscConfig, PcscResourceManager, ReaderSelector, Scope,
    Session, ShareMode,
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod commands;
mod utils;

use commands::*;
use utils::HexBytes;

#[derive(Parser, Debug)]
#[command(version, about = "Talk to MIFARE cards through a PC/SC reader")]
struct Cli {
    /// Exact reader name to use (defaults to the first reader)
    #[arg(short, long, global = true, conflicts_with = "reader_contains")]
    reader: Option<String>,

    /// Use the first reader whose name contains this text
    #[arg(long, global = true)]
    reader_contains: Option<String>,

    /// Request exclusive access to the card
    #[arg(long, global = true)]
    exclusive: bool,

    /// Establish the context in system scope
    #[arg(long, global = true)]
    system_scope: bool,

    /// Response buffer size in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// What happens to the card on disconnect
    #[arg(long, global = true, value_enum, default_value_t = DispositionArg::Leave)]
    disposition: DispositionArg,

    /// Debug level output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available readers
    List,

    /// Show reader name, card state, protocol and ATR
    Info,

    /// Query the reader firmware version
    Firmware,

    /// Read the UID of the card in the field
    Uid,

    /// Send a raw APDU
    Send {
        /// APDU in hex (e.g. FFCA000000)
        #[arg(required = true)]
        apdu: HexBytes,
    },

    /// MIFARE Ultralight page operations
    #[command(subcommand)]
    Ultralight(UltralightCommand),

    /// MIFARE Classic block operations
    #[command(subcommand)]
    Classic(ClassicCommand),

    /// Show info and firmware, read page 4, write 00 01 02 03 to page 4
    Demo,
}

/// Card disposition on disconnect
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum DispositionArg {
    /// Leave the card as is
    Leave,
    /// Warm reset
    Reset,
    /// Power down
    Unpower,
    /// Eject, where the reader supports it
    Eject,
}

impl From<DispositionArg> for Disposition {
    fn from(arg: DispositionArg) -> Self {
        match arg {
            DispositionArg::Leave => Self::LeaveCard,
            DispositionArg::Reset => Self::ResetCard,
            DispositionArg::Unpower => Self::UnpowerCard,
            DispositionArg::Eject => Self::EjectCard,
        }
    }
}

impl Cli {
    /// Session configuration from the global flags
    fn config(&self) -> PcscConfig {
        let reader = match (&self.reader, &self.reader_contains) {
            (Some(name), _) => ReaderSelector::Named(name.clone()),
            (None, Some(part)) => ReaderSelector::Containing(part.clone()),
            (None, None) => ReaderSelector::First,
        };
        let scope = if self.system_scope {
            Scope::System
        } else {
            Scope::User
        };
        let share_mode = if self.exclusive {
            ShareMode::Exclusive
        } else {
            ShareMode::Shared
        };

        PcscConfig::new()
            .with_scope(scope)
            .with_share_mode(share_mode)
            .with_response_capacity(self.capacity)
            .with_disposition(self.disposition.into())
            .with_reader(reader)
    }
}

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            if let Some(e) = e.downcast_ref::<cardlink_pcsc::Error>() {
                eprintln!("  stage: {}", e.stage());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.config();

    // Listing needs a context but no card
    let mut session = match cli.command {
        Commands::List => Session::establish(&PcscResourceManager, config)?,
        _ => Session::open(&PcscResourceManager, config)?,
    };

    if let Ok(connection) = session.connection() {
        info!(
            "Using reader: {} ({})",
            connection.reader(),
            connection.protocol()
        );
    }

    match &cli.command {
        Commands::List => list_command(&session)?,
        Commands::Info => info_command(&session)?,
        Commands::Firmware => firmware_command(&mut session)?,
        Commands::Uid => uid_command(&mut session)?,
        Commands::Send { apdu } => send_command(&mut session, apdu)?,
        Commands::Ultralight(command) => ultralight_command(&mut session, command)?,
        Commands::Classic(command) => classic_command(&mut session, command)?,
        Commands::Demo => demo_command(&mut session)?,
    }

    session.close()?;
    Ok(())
}

/// Log filter from the verbosity flag, overridden by any `RUST_LOG` directives
fn log_filter(verbose: bool, directives: &str) -> EnvFilter {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}

fn setup_logging(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, &directives))
        .with_ansi(true)
        .init();
}
