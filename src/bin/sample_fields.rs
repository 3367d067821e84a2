//! Write a small analytic field set for trying out the renderer
//!
//! The fields are closed-form gradients (a central continent, latitude
//! temperature, banded winds), not a simulation.

use std::f32::consts::PI;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use world_render::{FieldSet, Tilemap};

#[derive(Parser, Debug)]
#[command(name = "sample_fields")]
#[command(about = "Write a sample field set JSON for world_render")]
struct Args {
    #[arg(short = 'W', long, default_value = "256")]
    width: usize,

    #[arg(short = 'H', long, default_value = "128")]
    height: usize,

    #[arg(short, long, default_value = "sample_fields.json")]
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let fields = sample_fields(args.width, args.height);
    match fields.save_json(&args.output) {
        Ok(()) => {
            tracing::info!("Wrote {}x{} field set to {}", args.width, args.height, args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to write field set: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn sample_fields(width: usize, height: usize) -> FieldSet {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;

    // Latitude: 0 at the equator, 1 at either pole
    let latitude = |y: usize| ((y as f32 + 0.5) / h - 0.5).abs() * 2.0;

    let elevation = Tilemap::from_fn(width, height, |x, y| {
        let dx = (x as f32 / w - 0.5) * 2.0;
        let dy = (y as f32 / h - 0.5) * 2.0;
        let dome = 1.0 - (dx * dx + dy * dy).sqrt();
        let ripple = 0.08 * (dx * 9.0).sin() * (dy * 7.0).cos();
        (0.35 + 0.6 * dome + ripple).clamp(0.0, 1.0)
    });

    let temperature = Tilemap::from_fn(width, height, |x, y| {
        let lapse = (*elevation.get(x, y) - 0.5).max(0.0) * 0.6;
        (1.0 - latitude(y).powf(1.5) - lapse).clamp(0.0, 1.0)
    });

    // Trade winds, westerlies and polar easterlies as three bands
    let wind = Tilemap::from_fn(width, height, |_, y| (latitude(y) * 3.0 * PI).sin().abs());

    let rainfall = Tilemap::from_fn(width, height, |x, y| {
        let band = (latitude(y) * 2.0 * PI).cos() * 0.5 + 0.5;
        let shadow = (x as f32 / w * 4.0 * PI).sin() * 0.15;
        (band + shadow).clamp(0.0, 1.0)
    });

    let drainage = elevation.map(|&e| (1.0 - e).clamp(0.0, 1.0));
    let erosion = Tilemap::from_fn(width, height, |x, y| *rainfall.get(x, y) * *elevation.get(x, y) * 0.15);

    let rivers = Tilemap::from_fn(width, height, |x, y| {
        let meander = (y as f32 / h * 3.0 * PI).sin() * w * 0.05;
        if (x as f32 - (w * 0.55 + meander)).abs() < 1.0 { 1.0 } else { 0.0 }
    });

    let lakes = Tilemap::from_fn(width, height, |x, y| {
        let dx = x as f32 - w * 0.4;
        let dy = y as f32 - h * 0.45;
        let radius = (w.min(h) * 0.06).max(1.0);
        if dx * dx + dy * dy < radius * radius { 1.0 } else { 0.0 }
    });

    let biome_colour = Tilemap::from_fn(width, height, |x, y| {
        biome_colour(*elevation.get(x, y), *temperature.get(x, y), *rainfall.get(x, y))
    });

    FieldSet::new(elevation)
        .with_temperature(temperature)
        .with_wind(wind)
        .with_rainfall(rainfall)
        .with_drainage(drainage)
        .with_erosion(erosion)
        .with_rivers(rivers)
        .with_lakes(lakes)
        .with_biome_colour(biome_colour)
}

fn biome_colour(elevation: f32, temperature: f32, rainfall: f32) -> [u8; 3] {
    if elevation <= 0.4 {
        return [30, 60, 140]; // Ocean
    }
    match (temperature, rainfall) {
        (t, _) if t < 0.15 => [235, 240, 245], // Ice
        (t, _) if t < 0.3 => [150, 160, 130],  // Tundra
        (t, r) if t > 0.7 && r < 0.3 => [220, 200, 130], // Desert
        (t, r) if t > 0.7 && r > 0.6 => [30, 110, 40],   // Rainforest
        (_, r) if r < 0.35 => [170, 180, 90],  // Grassland
        _ => [60, 130, 60],                    // Forest
    }
}
