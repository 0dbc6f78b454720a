mod fill;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parcel_blocks::{BlockRegistry, BlockState, NoisePattern, Pattern};
use parcel_geom::{BlockPos, BlockRegion};
use parcel_queue::{BlockArrayCache, QueueCoordinator};
use parcel_runtime::Settings;
use parcel_world::ChunkWorld;

#[derive(Parser, Debug)]
#[command(name = "parcel", about = "Regenerate world regions through scoped block caches")]
struct Cli {
    /// Queue and world settings (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Block registry (TOML); built-in blocks when omitted
    #[arg(long, global = true)]
    blocks: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill a region with a block, optionally mixed with an accent by noise
    Fill {
        /// Minimum corner as X,Y,Z
        #[arg(long, value_parser = parse_pos, allow_hyphen_values = true)]
        min: BlockPos,
        /// Maximum corner as X,Y,Z
        #[arg(long, value_parser = parse_pos, allow_hyphen_values = true)]
        max: BlockPos,
        /// Block name from the registry
        #[arg(long)]
        block: String,
        /// Second block placed where the noise exceeds the threshold
        #[arg(long)]
        accent: Option<String>,
        #[arg(long, default_value_t = 0.3, allow_hyphen_values = true)]
        noise_threshold: f32,
        #[arg(long, default_value_t = 1337)]
        seed: i32,
        #[arg(long, default_value_t = 0.05)]
        frequency: f32,
    },
    /// Print the window a block cache covers for a region and offset
    Bounds {
        #[arg(long, value_parser = parse_pos, allow_hyphen_values = true)]
        min: BlockPos,
        #[arg(long, value_parser = parse_pos, allow_hyphen_values = true)]
        max: BlockPos,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset_x: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset_z: i32,
    },
}

fn parse_pos(s: &str) -> Result<BlockPos, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z but got '{}'", s));
    };
    let coord = |v: &str| v.parse::<i32>().map_err(|e| format!("bad coordinate '{}': {}", v, e));
    Ok(BlockPos::new(coord(*x)?, coord(*y)?, coord(*z)?))
}

fn lookup(reg: &BlockRegistry, name: &str) -> Result<BlockState, Box<dyn Error>> {
    reg.state_by_name(name)
        .ok_or_else(|| format!("unknown block '{}'", name).into())
}

#[allow(clippy::too_many_arguments)]
fn run_fill(
    settings: &Settings,
    reg: &BlockRegistry,
    region: BlockRegion,
    block: &str,
    accent: Option<&str>,
    threshold: f32,
    seed: i32,
    frequency: f32,
) -> Result<(), Box<dyn Error>> {
    let base = lookup(reg, block)?;
    let pattern: Box<dyn Pattern> = match accent {
        Some(name) => Box::new(NoisePattern::new(
            seed,
            frequency,
            base,
            lookup(reg, name)?,
            threshold,
        )),
        None => Box::new(base),
    };
    let mut world = ChunkWorld::new(settings.world.min_y, settings.world.max_y)
        .with_max_tiles(settings.chunk_processor.max_tiles);
    let summary = fill::fill_region(
        &mut world,
        region,
        pattern.as_ref(),
        settings,
        Some(fill::logging_subscriber()),
    )?;
    let stats = world.stats();
    println!(
        "filled {} cells over {} chunks in {} ticks ({} caches, {} failed)",
        summary.cells, summary.chunks, summary.ticks, summary.caches, summary.failed
    );
    println!(
        "world: {} chunks loaded, {} stored, {} non-air blocks",
        stats.loaded_chunks, stats.stored_chunks, stats.non_air_blocks
    );
    Ok(())
}

fn run_bounds(min: BlockPos, max: BlockPos, offset_x: i32, offset_z: i32) -> Result<(), Box<dyn Error>> {
    let mut cache = BlockArrayCache::new(min, max)?;
    cache.rebind(offset_x, offset_z)?;
    let (h, w, l) = cache.dimensions();
    let (smx, smz) = cache.scope_min();
    let (sxx, sxz) = cache.scope_max();
    println!("grid      {}x{}x{} ({} cells)", w, h, l, cache.size());
    println!("scope x   [{}, {})", smx, sxx);
    println!("scope z   [{}, {})", smz, sxz);
    println!("y         [{}, {}]", cache.min_y(), cache.max_y());
    println!("offset    ({}, {})", offset_x, offset_z);
    println!("min       {:?}", cache.min());
    println!("max       {:?}", cache.max());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let reg = match &cli.blocks {
        Some(path) => BlockRegistry::load_from_path(path)?,
        None => BlockRegistry::with_defaults(),
    };
    log::debug!("settings: {:?}", settings);

    match cli.command {
        Command::Fill {
            min,
            max,
            block,
            accent,
            noise_threshold,
            seed,
            frequency,
        } => run_fill(
            &settings,
            &reg,
            BlockRegion::new(min, max),
            &block,
            accent.as_deref(),
            noise_threshold,
            seed,
            frequency,
        ),
        Command::Bounds {
            min,
            max,
            offset_x,
            offset_z,
        } => run_bounds(min, max, offset_x, offset_z),
    }
}
