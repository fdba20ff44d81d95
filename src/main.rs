use anyhow::{Context, Result};
use clap::Parser;

use climate_explorer::cli::{Cli, OutputFormat};
use climate_explorer::data::region::RegionCatalog;
use climate_explorer::data::{loader, reshape};
use climate_explorer::report;
use climate_explorer::state::Session;

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let raw = loader::load_file(&args.file)?;
    let table = reshape::melt(&raw);
    for warning in &table.warnings {
        log::debug!("{warning}");
    }

    let regions = match &args.regions {
        Some(path) => RegionCatalog::from_path(path)?,
        None => RegionCatalog::builtin().context("parsing built-in region table")?,
    };

    let mut session = Session::new(table, regions);
    args.apply(&mut session);
    let snapshot = session.snapshot();

    let rendered = match args.format {
        OutputFormat::Json => report::to_json(&snapshot)?,
        OutputFormat::Text => report::to_text(&snapshot),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote output to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
