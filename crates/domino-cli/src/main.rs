//! `domino` – command line front end.
//!
//! Loads `domino.toml` (or defaults), then:
//!
//! 1. `plan` turns an image into a mosaic plan (JSON) and an optional PNG
//!    preview.
//! 2. `targets` / `base-station` print the map-frame poses the robot drives
//!    to.
//! 3. `locate` / `track` resolve beacon readings into robot poses.
//! 4. `config` / `schema` manage the configuration file.

mod config;
mod error;
mod telemetry;
mod track;

use std::collections::HashMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use domino_geometry::FieldLayout;
use domino_localization::{BeaconPosition, BeaconResolver, PoseEstimator};
use domino_mosaic::{MosaicPlanner, PixelLayout, render_preview};
use domino_types::{DominoConfig, TileIndex};
use serde::Serialize;
use tracing::info;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "domino")]
#[command(about = "Plan domino mosaics and localize the placement robot")]
#[command(version)]
struct Cli {
    /// Config file (default: $DOMINO_CONFIG, then ./domino.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is unset.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize an image into a tiled domino plan.
    Plan {
        /// Source image.
        #[arg(long)]
        image: PathBuf,

        /// Where to write the plan (JSON).
        #[arg(long)]
        out: PathBuf,

        /// Optional PNG preview of the plan.
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Print tile placement targets (all tiles, or one with --row/--col).
    Targets {
        #[arg(long, requires = "col")]
        row: Option<usize>,

        #[arg(long, requires = "row")]
        col: Option<usize>,
    },

    /// Print the base-station docking poses.
    BaseStation,

    /// Resolve a pose from one set of beacon readings.
    Locate {
        /// JSON object mapping beacon id to {x, y, z}.
        #[arg(long)]
        readings: PathBuf,

        /// Device map entry ("static" or a robot id).
        #[arg(long, default_value = "1")]
        device: String,

        /// Surveyed separation of the static pair (metres).
        #[arg(long)]
        separation: Option<f64>,
    },

    /// Replay a JSON-lines reading log through the pose estimator.
    Track {
        #[arg(long)]
        input: PathBuf,
    },

    /// Manage the config file.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print the JSON schema of the config file.
    Schema,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default config.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config (file, defaults and env overrides).
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            if let CliError::Domino(inner) = &e
                && inner.is_retryable()
            {
                eprintln!("  {}", "Transient reading; retry with a fresh measurement.".yellow());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let path = config::config_path(cli.config.as_deref());

    match cli.command {
        Commands::Config(ConfigCommand::Init { force }) => cmd_config_init(&path, force),
        Commands::Config(ConfigCommand::Show) => {
            let cfg = config::load_or_default(&path)?;
            print!("{}", toml::to_string_pretty(&cfg)?);
            Ok(())
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(DominoConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Commands::Plan {
            image,
            out,
            preview,
        } => cmd_plan(&config::load_or_default(&path)?, &image, &out, preview.as_deref()),
        Commands::Targets { row, col } => cmd_targets(&config::load_or_default(&path)?, row.zip(col)),
        Commands::BaseStation => {
            let cfg = config::load_or_default(&path)?;
            print_json(&FieldLayout::new(&cfg)?.base_station_targets()?)
        }
        Commands::Locate {
            readings,
            device,
            separation,
        } => cmd_locate(&config::load_or_default(&path)?, &readings, &device, separation),
        Commands::Track { input } => cmd_track(&config::load_or_default(&path)?, &input),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_config_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Usage(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    config::save_to(&DominoConfig::default(), path)?;
    println!("  {} {}", "✓ Wrote".green(), path.display().to_string().bold());
    Ok(())
}

fn cmd_plan(cfg: &DominoConfig, image: &Path, out: &Path, preview: Option<&Path>) -> Result<(), CliError> {
    let planner = MosaicPlanner::from_config(cfg)?;
    let plan = planner.plan_file(image)?;
    write_json(out, &plan)?;
    info!(path = %out.display(), plan_id = %plan.id, "plan written");

    if let Some(preview_path) = preview {
        let layout = PixelLayout::from_config(cfg);
        render_preview(&plan, &layout, &cfg.render)?.save(preview_path)?;
        info!(path = %preview_path.display(), "preview written");
    }

    println!(
        "  {} {}x{} dominoes in {} tiles of {}x{}",
        "✓ Planned".green(),
        plan.grid.width(),
        plan.grid.height(),
        plan.tiling.tile_count(),
        plan.tiling.tile_width,
        plan.tiling.tile_height,
    );
    for (name, count) in plan.label_counts() {
        println!("    • {:<8} {}", name.bold(), count);
    }
    Ok(())
}

fn cmd_targets(cfg: &DominoConfig, tile: Option<(usize, usize)>) -> Result<(), CliError> {
    let layout = FieldLayout::new(cfg)?;
    match tile {
        Some((row, col)) => print_json(&layout.placement_target(TileIndex::new(row, col))?),
        None => print_json(&layout.placement_targets()?),
    }
}

fn cmd_locate(
    cfg: &DominoConfig,
    readings_path: &Path,
    device: &str,
    separation: Option<f64>,
) -> Result<(), CliError> {
    let raw = fs::read_to_string(readings_path).map_err(|source| CliError::Io {
        path: readings_path.to_path_buf(),
        source,
    })?;
    let readings: HashMap<u32, BeaconPosition> = serde_json::from_str(&raw)?;

    let resolver = BeaconResolver::new(&cfg.beacons);
    let pair = resolver.pair_for(device, &readings).ok_or_else(|| {
        CliError::Usage(format!("no complete beacon pair for device {device:?}"))
    })?;

    let pose = if device == "static" {
        let sep = separation
            .ok_or_else(|| CliError::Usage("--separation is required for the static pair".into()))?;
        resolver.resolve_static(&pair, sep)?
    } else {
        resolver.resolve(&pair)?
    };
    print_json(&pose)
}

fn cmd_track(cfg: &DominoConfig, input: &Path) -> Result<(), CliError> {
    let file = fs::File::open(input).map_err(|source| CliError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let resolver = BeaconResolver::new(&cfg.beacons);
    let mut estimator = PoseEstimator::new(&cfg.localization);
    let summary = track::replay(BufReader::new(file), &resolver, &mut estimator)?;
    print_json(&summary)
}

// ─────────────────────────────────────────────────────────────────────────────
// Output helpers
// ─────────────────────────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn targets_row_requires_col() {
        assert!(Cli::try_parse_from(["domino", "targets", "--row", "1"]).is_err());
        assert!(Cli::try_parse_from(["domino", "targets", "--row", "1", "--col", "2"]).is_ok());
        assert!(Cli::try_parse_from(["domino", "targets"]).is_ok());
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("domino.toml");
        cmd_config_init(&path, false).expect("first write");
        assert!(matches!(cmd_config_init(&path, false), Err(CliError::Usage(_))));
        cmd_config_init(&path, true).expect("forced write");
    }

    #[test]
    fn plan_writes_json_and_preview() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let img_path = dir.path().join("in.png");
        image::RgbImage::from_pixel(40, 40, image::Rgb([0, 0, 255]))
            .save(&img_path)
            .expect("save image");

        let mut cfg = DominoConfig::default();
        cfg.mosaic.desired_width = 8;
        cfg.mosaic.desired_height = 4;
        cfg.mosaic.tile_width = 4;
        cfg.mosaic.tile_height = 2;

        let out = dir.path().join("plan.json");
        let preview = dir.path().join("preview.png");
        cmd_plan(&cfg, &img_path, &out, Some(&preview)).expect("plan");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).expect("read plan")).expect("json");
        assert_eq!(json["tiling"]["tiles_x"], 2);
        let png = image::open(&preview).expect("open preview");
        assert_eq!((png.width(), png.height()), (32, 16));
    }

    #[test]
    fn locate_static_requires_separation() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("readings.json");
        fs::write(
            &path,
            r#"{"1": {"x": 0.0, "y": 1.0, "z": 0.0}, "2": {"x": 0.0, "y": -1.0, "z": 0.0}}"#,
        )
        .expect("write");
        let cfg = DominoConfig::default();
        assert!(matches!(
            cmd_locate(&cfg, &path, "static", None),
            Err(CliError::Usage(_))
        ));
        assert!(cmd_locate(&cfg, &path, "static", Some(2.0)).is_ok());
        assert!(matches!(
            cmd_locate(&cfg, &path, "1", None),
            Err(CliError::Usage(_))
        ));
    }
}
