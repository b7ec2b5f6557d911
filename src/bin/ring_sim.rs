//! Ring Sim - Headless Gravity Demo
//!
//! Spawns a few occupants around a ring world and steps the gravity
//! simulation with a fixed timestep, logging every gravity event.
//!
//! # Usage
//!
//! ```bash
//! # Default ring, 10 simulated seconds at 60 Hz
//! ring-sim
//!
//! # Custom config with debug logging
//! ring-sim --config ring.json --log-level debug
//!
//! # Write the default config document and exit
//! ring-sim --write-default-config ring.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glam::Vec3;
use ring_gravity_engine::{BodySet, OccupantId, RingSimulation, RingWorldConfig, SimBody};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Headless ring gravity simulation
#[derive(Parser, Debug)]
#[command(name = "ring-sim")]
#[command(author, version, about = "Ring gravity and orbital mechanics demo", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_default_config: Option<PathBuf>,

    /// Number of fixed steps to run
    #[arg(short, long, default_value = "600")]
    ticks: u32,

    /// Fixed timestep (seconds)
    #[arg(long, default_value = "0.016666668")]
    dt: f32,

    /// Tick at which the grounded occupant flips to its antipode
    #[arg(long, default_value = "120")]
    flip_at: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Ring Sim v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = cli.write_default_config {
        RingWorldConfig::default()
            .save(&path)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        info!(path = %path.display(), "default config written");
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            RingWorldConfig::load(path).with_context(|| format!("loading config from {}", path.display()))?
        }
        None => RingWorldConfig::default(),
    };

    run(config, cli.ticks, cli.dt, cli.flip_at)
}

/// Occupants spawned for the demo
struct Cast {
    grounded: OccupantId,
    floater: OccupantId,
    orbiter: OccupantId,
}

fn spawn_cast(sim: &mut RingSimulation, bodies: &mut BodySet) -> Cast {
    let geometry = sim.field().geometry().clone();
    let center = geometry.center();
    let outward = geometry.axis().any_orthonormal_vector();
    let at_altitude = |altitude: f32| center + outward * (geometry.radius() + altitude);

    let grounded_pos = at_altitude(5.0);
    let grounded = sim.register_occupant(grounded_pos);
    bodies.insert(grounded, SimBody::new(grounded_pos, Vec3::ZERO));

    let float_altitude = sim.config().float_zones.first().map_or(50.0, |zone| zone.altitude);
    let floater_pos = at_altitude(float_altitude);
    let floater = sim.register_occupant(floater_pos);
    bodies.insert(floater, SimBody::new(floater_pos, Vec3::ZERO));

    let orbit = sim.config().orbit;
    let orbit_altitude = 0.5 * (orbit.min_altitude + orbit.max_altitude);
    let orbiter_pos = at_altitude(orbit_altitude);
    let tangent = geometry.orbital_tangent(orbiter_pos);
    let orbiter_vel = sim.orbit().ideal_velocity(sim.field(), orbiter_pos, tangent);
    let orbiter = sim.register_occupant(orbiter_pos);
    bodies.insert(orbiter, SimBody::new(orbiter_pos, orbiter_vel));

    info!(
        grounded = grounded.0,
        floater = floater.0,
        orbiter = orbiter.0,
        float_altitude,
        orbit_altitude,
        "occupants spawned"
    );

    Cast {
        grounded,
        floater,
        orbiter,
    }
}

fn run(config: RingWorldConfig, ticks: u32, dt: f32, flip_at: u32) -> anyhow::Result<()> {
    if !dt.is_finite() || dt <= 0.0 {
        anyhow::bail!("timestep must be positive, got {dt}");
    }

    let mut sim = RingSimulation::new(config);
    let mut bodies = BodySet::new();
    let cast = spawn_cast(&mut sim, &mut bodies);

    for tick in 0..ticks {
        if tick == flip_at && !sim.flip_to_antipode(cast.grounded) {
            warn!(occupant = cast.grounded.0, "antipode flip rejected");
        }

        sim.tick(dt, &mut bodies);
        bodies.integrate(dt);

        for event in sim.drain_events() {
            info!(tick, ?event, "gravity event");
        }
    }

    for (name, id) in [
        ("grounded", cast.grounded),
        ("floater", cast.floater),
        ("orbiter", cast.orbiter),
    ] {
        let (Some(state), Some(body)) = (sim.state(id), bodies.get(id)) else {
            continue;
        };
        info!(
            name,
            altitude = sim.field().distance_from_surface(body.position),
            down = ?state.effective_direction,
            float_blend = state.float_blend,
            in_orbit = state.in_orbit,
            "final state"
        );
    }

    let stats = sim.stats();
    info!(
        ticks = stats.ticks,
        elapsed = stats.elapsed,
        floating = stats.floating,
        orbiting = stats.orbiting,
        "simulation finished"
    );

    Ok(())
}
