use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use world_render::{FieldSet, MapRenderer, MapType, Palette};

#[derive(Parser, Debug)]
#[command(name = "world_render")]
#[command(about = "Render generated world fields to colour map images")]
struct Args {
    /// Field set JSON produced by the world generator
    #[arg(short, long, required_unless_present = "list")]
    fields: Option<PathBuf>,

    /// Map type to render (see --list)
    #[arg(short, long, default_value = "heightmap")]
    map_type: String,

    /// Sea level in percent (0-100); required by sealevel, elevation and rivermap
    #[arg(short, long)]
    sea_level: Option<f32>,

    /// Output PNG path (default: <map-type>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render every map type the field set supports
    #[arg(long)]
    all: bool,

    /// Output directory for --all
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Palette override JSON ({"cobalt": "#0047ab", ...})
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Shade rows in parallel
    #[arg(long)]
    parallel: bool,

    /// List map types and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.list {
        for m in MapType::all() {
            let sea = if m.needs_sea_level() { " (needs --sea-level)" } else { "" };
            println!("{:<18} {}{}", m.name(), m.description(), sea);
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(fields_path) = args.fields.as_deref() else {
        return Err("--fields is required".into());
    };

    let fields = FieldSet::load_json(fields_path)?;
    let (width, height) = fields.dimensions();
    let present: Vec<&str> = fields.present_fields().iter().map(|f| f.name()).collect();
    tracing::info!(width, height, fields = ?present, "Loaded field set from {}", fields_path.display());

    let palette = match &args.palette {
        Some(path) => Palette::load_json(path)?,
        None => Palette::default(),
    };
    let renderer = MapRenderer::with_palette(&fields, &palette);

    if args.all {
        std::fs::create_dir_all(&args.out_dir)?;
        let available = renderer.available_map_types();
        for &map_type in MapType::all() {
            if !available.contains(&map_type) {
                tracing::warn!("Skipping {}: required fields are missing", map_type);
                continue;
            }
            if map_type.needs_sea_level() && args.sea_level.is_none() {
                tracing::warn!("Skipping {}: no --sea-level given", map_type);
                continue;
            }
            let path = args.out_dir.join(format!("{}.png", map_type));
            render_to(&renderer, map_type, args, &path)?;
        }
        return Ok(());
    }

    let map_type: MapType = args.map_type.parse()?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", map_type)));
    render_to(&renderer, map_type, args, &path)
}

fn render_to(
    renderer: &MapRenderer<'_>,
    map_type: MapType,
    args: &Args,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let img = if args.parallel {
        renderer.render_par(map_type, args.sea_level)?
    } else {
        renderer.render_map(map_type, args.sea_level)?
    };
    img.save(path)?;
    tracing::info!("Wrote {} ({}x{}) to {}", map_type, img.width(), img.height(), path.display());
    Ok(())
}
