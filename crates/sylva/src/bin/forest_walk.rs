//! # Forest Walk
//!
//! Headless run of the whole LOD pipeline:
//!
//! Config → Registry → Scatter → Walk (rebuilds, publishes, captures) →
//! Mid-walk replacement from a spawner thread → Dispose → Report
//!
//! Usage: `forest_walk [config.toml]`. Without a path the bundled
//! `config/forest.toml` is used. All draws go to a recording host.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::process::ExitCode;
use std::time::Instant;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sylva::lod::{DetailMesh, FrameStats, MaterialId, RecordingHost, SceneView, Viewer};
use sylva::{ProxyRegistry, ProxyTypeId, RegistryConfig, RegistryResult, TypeAssets, TypeEntry};

const DEFAULT_CONFIG: &str = include_str!("../../../../config/forest.toml");

/// Frames to simulate.
const FRAMES: u32 = 600;
/// Frame at which a spawner thread replaces one type's positions.
const REPLACE_FRAME: u32 = 300;
/// Instances scattered per type.
const INSTANCES_PER_TYPE: usize = 40_000;
/// Scatter radius around the origin.
const FOREST_RADIUS: f32 = 600.0;
/// Radius of the camera's walk.
const WALK_RADIUS: f32 = 200.0;
/// Camera eye height.
const EYE_HEIGHT: f32 = 1.7;

fn main() -> ExitCode {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     SYLVA FOREST WALK                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("forest_walk failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> RegistryResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            println!("Config: {path}");
            RegistryConfig::from_path(path)?
        }
        None => {
            println!("Config: bundled forest.toml");
            RegistryConfig::from_toml_str(DEFAULT_CONFIG)?
        }
    };

    let assets: BTreeMap<ProxyTypeId, TypeAssets> = config
        .types
        .iter()
        .map(|entry| (entry.id, assets_for(entry)))
        .collect();
    let mut registry = ProxyRegistry::from_config(&config, assets)?;
    let mut host = RecordingHost::new();

    // =========================================================================
    // STEP 1: Scatter and initialize
    // =========================================================================
    let scatter_start = Instant::now();
    let positions: BTreeMap<ProxyTypeId, Vec<Vec3>> = config
        .types
        .iter()
        .map(|entry| {
            let seed = u64::from(entry.id.0);
            (entry.id, scatter(seed, INSTANCES_PER_TYPE, FOREST_RADIUS))
        })
        .collect();

    let mut view = view_at(0);
    registry.initialize_all(&positions, &view, &mut host)?;
    println!(
        "\nInitialized {} types in {:.1} ms ({} batches live)",
        registry.len(),
        scatter_start.elapsed().as_secs_f64() * 1000.0,
        host.live_batches()
    );

    // =========================================================================
    // STEP 2: Walk
    // =========================================================================
    let walk_start = Instant::now();
    let mut total = FrameStats::default();
    let mut rebuilds = 0u32;
    let mut peak_draws = 0u32;
    let replaced = config.types.last().map(|entry| entry.id);

    for frame in 0..FRAMES {
        if frame == REPLACE_FRAME {
            if let Some(id) = replaced {
                let sender = registry.sender();
                let spawner = std::thread::spawn(move || {
                    sender.submit(id, scatter(0xF0_4E57, INSTANCES_PER_TYPE / 2, FOREST_RADIUS))
                });
                if spawner.join().unwrap_or(false) {
                    println!("Frame {frame}: spawner replaced type {id}");
                }
            }
        }

        view = view_at(frame);
        registry.drain_inbox(&view, &mut host)?;
        let stats = registry.tick_all(&view, &mut host)?;

        rebuilds += u32::from(stats.rebuild_started);
        peak_draws = peak_draws.max(stats.draw_calls());
        total.accumulate(&stats);
        host.clear_calls();
    }
    let walk_ms = walk_start.elapsed().as_secs_f64() * 1000.0;

    // =========================================================================
    // STEP 3: Report
    // =========================================================================
    println!("\n┌──────────┬───────────┬─────────┬─────────┬────────┬────────────┐");
    println!("│ type     │ instances │    near │     far │ groups │ generation │");
    println!("├──────────┼───────────┼─────────┼─────────┼────────┼────────────┤");
    for id in registry.ids() {
        let (Some(renderer), Some(name)) = (registry.get(id), registry.name(id)) else {
            continue;
        };
        let counts = renderer.classifier().counts();
        println!(
            "│ {:<8} │ {:>9} │ {:>7} │ {:>7} │ {:>6} │ {:>10} │",
            name,
            renderer.len(),
            counts.near,
            counts.far,
            renderer.scheduler().committed().len(),
            renderer.scheduler().generation()
        );
    }
    println!("└──────────┴───────────┴─────────┴─────────┴────────┴────────────┘");

    println!("\nFrames:            {FRAMES}");
    println!("Walk time:         {walk_ms:.1} ms ({:.3} ms/frame)", walk_ms / f64::from(FRAMES));
    println!("Detailed draws:    {}", total.detailed_draws);
    println!("Proxy draws:       {}", total.proxy_draws);
    println!("Peak draws/frame:  {peak_draws}");
    println!("Frames rebuilding: {rebuilds}");
    println!("Groups published:  {}", total.published_groups);
    println!("Captures:          {}", total.captures);

    // =========================================================================
    // STEP 4: Dispose
    // =========================================================================
    registry.dispose_all(&mut host);
    registry.dispose_all(&mut host);
    println!(
        "\nDisposed: {} batches, {} textures still live",
        host.live_batches(),
        host.live_textures()
    );
    Ok(())
}

/// Camera on a circle around the origin, looking along its path, with the
/// sun turning slowly overhead.
fn view_at(frame: u32) -> SceneView {
    let angle = frame as f32 / FRAMES as f32 * TAU;
    let position = Vec3::new(angle.cos() * WALK_RADIUS, EYE_HEIGHT, angle.sin() * WALK_RADIUS);
    let heading = Vec3::new(-angle.sin(), 0.0, angle.cos());
    let sun = Quat::from_rotation_y(angle * 0.25) * Quat::from_rotation_x(-0.9);

    SceneView::new(Viewer::looking_at(position, position + heading)).with_light(sun)
}

/// Uniform points in a sphere, dropped onto the ground plane.
fn scatter(seed: u64, count: usize, radius: f32) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut positions = Vec::with_capacity(count);
    while positions.len() < count {
        let p = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if p.length_squared() <= 1.0 {
            positions.push(Vec3::new(p.x * radius, 0.0, p.z * radius));
        }
    }
    positions
}

fn assets_for(entry: &TypeEntry) -> TypeAssets {
    let mesh = match entry.name.as_str() {
        "boulder" => block(Vec3::new(-1.2, 0.0, -1.0), Vec3::new(1.2, 1.4, 1.0)),
        "birch" => cone(1.5, 9.0, 6),
        _ => cone(2.5, 12.0, 8),
    };
    TypeAssets {
        mesh,
        materials: vec![MaterialId(entry.id.0 * 10), MaterialId(entry.id.0 * 10 + 1)],
    }
}

fn cone(radius: f32, height: f32, segments: u32) -> DetailMesh {
    let mut vertices = vec![Vec3::new(0.0, height, 0.0)];
    for i in 0..segments {
        let a = i as f32 / segments as f32 * TAU;
        vertices.push(Vec3::new(a.cos() * radius, 0.0, a.sin() * radius));
    }
    let indices = (0..segments)
        .flat_map(|i| [0, 1 + i, 1 + (i + 1) % segments])
        .collect();
    DetailMesh::new(vertices, indices)
}

fn block(min: Vec3, max: Vec3) -> DetailMesh {
    let vertices = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
        .collect();
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 1, 2, 3,
        4, 5, 6, 5, 7, 6,
        0, 1, 4, 1, 5, 4,
        2, 6, 3, 3, 6, 7,
        0, 4, 2, 2, 4, 6,
        1, 3, 5, 3, 7, 5,
    ];
    DetailMesh::new(vertices, indices)
}
