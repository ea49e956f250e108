//! Définition et implémentation des commandes CLI
//!
//! - `render`: charge la géométrie et écrit la carte en SVG
//! - `ranking`: classement des départements par cas
//! - `resolve`: diagnostic de la résolution des noms

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::{info, warn};

use orquidea_map::config::MapConfig;
use orquidea_map::loader::{GeometryLoader, MapSession, MapState, SmartFetcher};
use orquidea_map::panel::{self, PanelState};
use orquidea_map::render::{svg, Choropleth, MercatorFit};
use orquidea_map::resolver::{build_table, normalize};

#[derive(Subcommand)]
pub enum Commands {
    /// Load department boundaries and write the choropleth as SVG
    Render {
        /// Base URL or local directory holding the geometry files (overrides config and env)
        #[arg(short, long)]
        base: Option<String>,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,

        /// Department to select in the side panel
        #[arg(long)]
        select: Option<String>,

        /// Config preset name (default/pages/json-only) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,
    },

    /// Print the departments with the most reported cases
    Ranking {
        /// Number of departments (defaults to the config value)
        #[arg(long)]
        top: Option<usize>,

        /// Config preset name or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,
    },

    /// Show the normalized key and matched department for each name
    Resolve {
        /// Raw department names, as published by the geometry source
        #[arg(required = true)]
        names: Vec<String>,

        /// Config preset name or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,
    },
}

fn load_config(preset_or_path: &str) -> Result<MapConfig> {
    let config = MapConfig::resolve(preset_or_path)
        .with_context(|| format!("Invalid config: {}", preset_or_path))?
        .with_env();
    Ok(config)
}

/// Exécute la commande render
pub async fn cmd_render(
    base: Option<String>,
    output: &Path,
    select: Option<String>,
    config_source: &str,
) -> Result<()> {
    let mut config = load_config(config_source)?;
    if let Some(base) = base {
        config.base_url = base;
    }

    let dataset = config.dataset()?;
    let table = build_table(dataset.regions());

    let fetcher = SmartFetcher::from_base(&config.base_url)
        .with_context(|| format!("Cannot use base {}", config.base_url))?;
    info!(
        base = %config.base_url,
        fetcher = fetcher.description(),
        sources = config.sources().len(),
        "Loading map geometry"
    );

    let loader = GeometryLoader::new(fetcher, config.sources()).with_encoding(config.encoding()?);
    let mut session = MapSession::mount(loader);
    let state = session.settled().await;

    let collection = match state {
        MapState::Ready(collection) => collection,
        MapState::Failed(message) => {
            tokio::fs::write(output, svg::message(config.width, config.height, &message))
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            bail!("{}", message);
        }
        MapState::Loading => bail!("Map loading ended without a result"),
    };

    let projection = MercatorFit::fit(&collection, config.width, config.height);
    let rendered = Choropleth::new(&table, projection).render(&collection);

    let unmatched: Vec<String> = rendered
        .iter()
        .filter(|f| f.region.is_none())
        .map(|f| f.selection_label())
        .collect();
    if !unmatched.is_empty() {
        warn!(count = unmatched.len(), names = ?unmatched, "Departments without data");
    }

    let mut panel_state = PanelState::new();
    if let Some(name) = select {
        match table.resolve(&name) {
            Some(region) => panel_state.select_region(region),
            None => panel_state.select(name),
        }
    }

    let document = svg::document(&rendered, config.width, config.height, panel_state.selection());
    tokio::fs::write(output, document)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("=== Mapa ===");
    println!("Departamentos: {}", rendered.len());
    println!("Con datos: {}", rendered.len() - unmatched.len());
    println!("SVG: {}", output.display());
    println!();
    print!("{}", panel_state.detail(&table));
    println!();
    print!("{}", panel::ranking_text(&panel::ranked(&dataset, config.top)));

    Ok(())
}

/// Exécute la commande ranking
pub fn cmd_ranking(top: Option<usize>, config_source: &str) -> Result<()> {
    let config = load_config(config_source)?;
    let dataset = config.dataset()?;
    let n = top.unwrap_or(config.top);

    print!("{}", panel::ranking_text(&panel::ranked(&dataset, n)));
    println!(
        "Total: {} casos en {} departamentos",
        panel::format_count(dataset.total_cases()),
        dataset.len()
    );
    Ok(())
}

/// Exécute la commande resolve
pub fn cmd_resolve(names: &[String], config_source: &str) -> Result<()> {
    let config = load_config(config_source)?;
    let dataset = config.dataset()?;
    let table = build_table(dataset.regions());

    for name in names {
        let key = normalize(name);
        match table.resolve(name) {
            Some(region) => println!(
                "{:?} -> {:?} -> {} ({} casos)",
                name,
                key.as_str(),
                region.name,
                panel::format_count(u64::from(region.cases))
            ),
            None => println!("{:?} -> {:?} -> sin coincidencia", name, key.as_str()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_help_texts_are_english() {
        let command = Harness::command();
        for sub in command.get_subcommands() {
            for arg in sub.get_arguments() {
                let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
                assert!(help.is_ascii(), "{} --{}: {}", sub.get_name(), arg.get_id(), help);
            }
        }

        let ranking = command.find_subcommand("ranking").unwrap();
        let top = ranking.get_arguments().find(|a| a.get_id() == "top").unwrap();
        assert_eq!(
            top.get_help().map(|h| h.to_string()).as_deref(),
            Some("Number of departments (defaults to the config value)")
        );
    }
}
