//! Headless симуляция PATHWALKER
//!
//! Несколько агентов с разными locomotion backends ходят по случайным
//! целям; после прибытия получают новую цель.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use pathwalker_simulation::logger::{set_log_level, LogLevel};
use pathwalker_simulation::{
    create_headless_app, integrate_headless_velocity, log_error, log_info, spawn_path_agent,
    spawn_physics_agent, CharacterMotor, DeterministicRng, DirectTranslation, NavigationGoal,
    PathArrived, PathFollower, PathFollowerConfig, SimulationPlugin, FIXED_TICK_HZ,
};
use rand::Rng;

/// Радиус арены для случайных целей (метры)
const ARENA_RADIUS: f32 = 25.0;

/// Параметры follower'а для demo (частичный RON, остальное — default)
const AGENT_CONFIG_RON: &str = "(max_speed: 4.0, turn_rate: 6.0, lookahead_distance: 1.5)";

/// Счётчик прибытий (для финального отчёта)
#[derive(Resource, Default)]
struct ArrivalStats {
    arrivals: u32,
}

/// System: новая случайная цель после прибытия
fn retarget_arrived_agents(
    mut arrived: EventReader<PathArrived>,
    mut goals: Query<&mut NavigationGoal>,
    mut rng: ResMut<DeterministicRng>,
    mut stats: ResMut<ArrivalStats>,
) {
    for event in arrived.read() {
        stats.arrivals += 1;

        let Ok(mut goal) = goals.get_mut(event.entity) else {
            continue;
        };
        let target = random_point(&mut rng);
        *goal = NavigationGoal::MoveToPosition { target };
    }
}

fn random_point(rng: &mut DeterministicRng) -> Vec3 {
    Vec3::new(
        rng.rng.gen_range(-ARENA_RADIUS..ARENA_RADIUS),
        0.0,
        rng.rng.gen_range(-ARENA_RADIUS..ARENA_RADIUS),
    )
}

fn main() {
    let seed = 42;
    println!("Starting PATHWALKER headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    // Per-tick debug логи не нужны в demo
    set_log_level(LogLevel::Info);

    app.add_plugins(SimulationPlugin)
        .init_resource::<ArrivalStats>()
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / FIXED_TICK_HZ,
        )))
        .add_systems(
            FixedUpdate,
            (integrate_headless_velocity, retarget_arrived_agents)
                .after(pathwalker_simulation::navigation::follow_paths),
        );

    // Агенты: прямой сдвиг, character motor (спавн в воздухе), rapier velocity
    let config = PathFollowerConfig::from_ron_str(AGENT_CONFIG_RON).unwrap_or_else(|error| {
        log_error(&format!("Invalid agent config: {}, using defaults", error));
        PathFollowerConfig::default()
    });
    let walker = spawn_path_agent(
        &mut app.world_mut().commands(),
        Vec3::ZERO,
        config.clone(),
        DirectTranslation,
    );
    let jumper = spawn_path_agent(
        &mut app.world_mut().commands(),
        Vec3::new(3.0, 2.0, 0.0),
        config.clone(),
        CharacterMotor::default(),
    );
    let physics = spawn_physics_agent(&mut app.world_mut().commands(), Vec3::new(-3.0, 0.0, 0.0), config);

    for entity in [walker, jumper, physics] {
        let target = random_point(&mut app.world_mut().resource_mut::<DeterministicRng>());
        app.world_mut()
            .commands()
            .entity(entity)
            .insert(NavigationGoal::MoveToPosition { target });
    }

    // Запускаем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let mut followers = app.world_mut().query::<(Entity, &Transform, &PathFollower)>();
            for (entity, transform, follower) in followers.iter(app.world()) {
                println!(
                    "Tick {}: {:?} at {:.2?} ({:?})",
                    tick,
                    entity,
                    transform.translation,
                    follower.state()
                );
            }
        }
    }

    let arrivals = app.world().resource::<ArrivalStats>().arrivals;
    log_info(&format!("Simulation complete: {} arrivals", arrivals));
    println!("Simulation complete! {} arrivals", arrivals);
}
