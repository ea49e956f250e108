//! Point d'entrée CLI pour orquidea-map

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Sinon, à côté du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Carte choroplèthe des cas de violence contre les femmes par département
#[derive(Parser)]
#[command(name = "orquidea-map")]
#[command(author, version)]
#[command(about = "Carte choroplèthe des cas signalés par département (Colombie)")]
#[command(long_about = "Charge les limites départementales (shapefile, ou GeoJSON/TopoJSON en repli), \
associe les noms au jeu de données et écrit la carte en SVG.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Render {
            base,
            output,
            select,
            config,
        } => {
            debug!(output = %output.display(), config = %config, "Render");
            cli::cmd_render(base, &output, select, &config).await?;
        }
        Commands::Ranking { top, config } => cli::cmd_ranking(top, &config)?,
        Commands::Resolve { names, config } => cli::cmd_resolve(&names, &config)?,
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout reste réservé au panneau
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
