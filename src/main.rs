use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use envelope_crypto::cli::{
    handle_decrypt_command, handle_item_command, handle_key_command, handle_serve_command,
    ItemCommands, KeyArgs, MasterKeyArgs,
};
use envelope_crypto::config::{paths::EnvelopePaths, settings::Settings};
use envelope_crypto::crypto::Sealer;

#[derive(Parser)]
#[command(
    name = "envelope-crypto",
    author = "Kaylee Beyene",
    version,
    about = "Client-side envelope encryption for note and password items",
    long_about = "envelope-crypto stretches passwords into master keys and wraps \
                  items in authenticated envelopes: each item is encrypted under \
                  its own random key, and that key under your master keys."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive master key material from a password
    Key(KeyArgs),

    /// Item encryption commands
    #[command(subcommand)]
    Item(ItemCommands),

    /// Decrypt a single envelope (legacy single-level mode)
    Decrypt {
        /// Envelope text (stdin when omitted)
        #[arg(long)]
        text: Option<String>,

        #[command(flatten)]
        keys: MasterKeyArgs,
    },

    /// Serve JSON-lines requests from stdin
    Serve,

    /// Show current configuration and paths
    Config,
}

fn init_logging(settings: &Settings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = EnvelopePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(&settings);

    let sealer = Sealer::default();

    match cli.command {
        Some(Commands::Key(args)) => handle_key_command(&settings, args)?,
        Some(Commands::Item(cmd)) => handle_item_command(&sealer, cmd)?,
        Some(Commands::Decrypt { text, keys }) => handle_decrypt_command(&sealer, text, &keys)?,
        Some(Commands::Serve) => handle_serve_command(&settings)?,
        Some(Commands::Config) => {
            println!("envelope-crypto Configuration");
            println!("=============================");
            println!("Config directory: {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Default cost:     {}", settings.kdf.default_cost);
            println!("  Minimum cost:     {}", settings.kdf.min_cost);
            println!("  Request timeout:  {}s", settings.service.request_timeout_secs);
            println!("  Max in flight:    {}", settings.service.max_in_flight);
            println!("  Log filter:       {}", settings.log_filter);
        }
        None => {
            println!("envelope-crypto - client-side envelope encryption");
            println!();
            println!("Run 'envelope-crypto --help' for usage information.");
        }
    }

    Ok(())
}
