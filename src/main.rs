use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use hiking_terrain::path::load_waypoints;
use hiking_terrain::{GrayLevels, Simulation, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "hiking-terrain", about = "Walks a hiker and a figure over refined terrain")]
struct Args {
    /// JSON configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grayscale heightmap image. Without one a flat seed of `--size` is used.
    #[arg(long)]
    heightmap: Option<PathBuf>,

    /// Waypoint file, one `x y z` triple per line.
    #[arg(long)]
    path: PathBuf,

    #[arg(long, default_value_t = 129)]
    size: usize,

    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Log a status line every this many ticks; 0 disables.
    #[arg(long, default_value_t = 60)]
    report_every: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let levels = match &args.heightmap {
        Some(path) => GrayLevels::open(path)?,
        None => GrayLevels::from_levels(args.size, args.size, vec![0; args.size * args.size])?,
    };
    let waypoints = load_waypoints(&args.path)?;

    let mut rng = Simulation::rng_for(&config.terrain);
    let mut sim = Simulation::build(&config, &levels, &waypoints, &mut rng)?;
    info!(
        "path has {} points, {:.1} long, {:.1} total elevation change",
        sim.path().len(),
        sim.path().total_length(),
        sim.path().elevation_change()
    );

    for tick in 1..=args.ticks {
        sim.tick(args.dt);
        if args.report_every > 0 && tick % args.report_every == 0 {
            info!("tick {tick}: {}", sim.status());
        }
    }

    println!("{}", sim.status());
    Ok(())
}
