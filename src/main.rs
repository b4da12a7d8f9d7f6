use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{warn, Level};

use affective_terrain::catalog::{Catalog, SUGGESTED_MAX_SELECTION};
use affective_terrain::export::{self, DEFAULT_FILE_NAME};
use affective_terrain::table::{format_table, selection_table, table_json};
use affective_terrain::terrain::{self, TerrainParams};
use affective_terrain::viewer::{self, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "affective_terrain")]
#[command(about = "Generate affective terrain maps from selected descriptors")]
struct Args {
    /// Descriptors to blend, by name ("uneasy") or label ("Tension / Unease - uneasy").
    /// Defaults to the first four catalog entries.
    descriptors: Vec<String>,

    /// Width of the map in cells
    #[arg(short = 'W', long, default_value = "100")]
    width: usize,

    /// Height of the map in cells
    #[arg(short = 'H', long, default_value = "100")]
    height: usize,

    /// Random seed for blob placement
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Output PNG path
    #[arg(short, long, default_value = DEFAULT_FILE_NAME)]
    output: PathBuf,

    /// Pixels per cell in the exported PNG
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=64))]
    scale: u32,

    /// Blend descriptors in catalog order (duplicates dropped) instead of the order given
    #[arg(long)]
    catalog_order: bool,

    /// Print the selected (category, descriptor) table
    #[arg(long)]
    table: bool,

    /// Print the selected table (or, with --list, the catalog) as JSON
    #[arg(long)]
    json: bool,

    /// List the descriptor catalog and exit
    #[arg(long)]
    list: bool,

    /// Open the interactive viewer after writing the PNG
    #[arg(long)]
    view: bool,

    /// Window pixels per cell in the viewer
    #[arg(
        long,
        default_value = "6",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=32)
    )]
    view_scale: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let catalog = Catalog::builtin();

    if args.list {
        if args.json {
            println!("{}", catalog.to_json()?);
        } else {
            for label in catalog.labels() {
                println!("{}", label);
            }
        }
        return Ok(());
    }

    // Resolve names and labels up front so a typo fails before any work is done
    let mut selected: Vec<&str> = if args.descriptors.is_empty() {
        catalog.default_selection()
    } else {
        args.descriptors
            .iter()
            .map(|token| catalog.resolve(token).map(|d| d.name))
            .collect::<Result<Vec<_>, _>>()
            .context("resolving descriptors")?
    };
    if args.catalog_order {
        selected = catalog.in_catalog_order(&selected)?;
    }
    if selected.len() > SUGGESTED_MAX_SELECTION {
        warn!(
            selected = selected.len(),
            "more than {} descriptors selected, the map may be crowded", SUGGESTED_MAX_SELECTION
        );
    }

    let params = TerrainParams {
        width: args.width,
        height: args.height,
        seed: args.seed,
        ..Default::default()
    };

    println!("Generating affective terrain with seed: {}", params.seed);
    println!("Map size: {}x{}", params.width, params.height);
    println!("Descriptors: {}", selected.join(", "));

    let terrain = terrain::generate(&selected, catalog, &params).context("generating terrain")?;
    export::export_terrain(&terrain, &args.output, args.scale)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Saved terrain map to {}", args.output.display());

    if args.table || args.json {
        let rows = selection_table(&selected, catalog)?;
        if args.json {
            println!("{}", table_json(&rows)?);
        } else {
            print!("{}", format_table(&rows));
        }
    }

    if args.view {
        let config = ViewerConfig {
            params,
            output: args.output.clone(),
            scale: args.view_scale,
            export_scale: args.scale,
        };
        viewer::run_viewer(catalog, &selected, &config).context("running viewer")?;
    }

    Ok(())
}
