//! PATHWALKER Simulation Core
//!
//! Path following steering на Bevy 0.16 (headless ECS)
//!
//! Поток данных:
//! - Planner (внешний) → polyline → PathFollower::on_path_ready
//! - FixedUpdate тик → PathFollower::step → SteeringCommand (velocity + facing + arrived)
//! - Locomotion backend → реальное движение (translation / rapier / character motor)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod follower;
pub mod locomotion;
pub mod logger;
pub mod navigation;

// Re-export базовых типов для удобства
pub use follower::{
    ConfigError, FollowState, PathArrival, PathFollower, PathFollowerConfig, SteeringOutput,
};
pub use locomotion::{
    integrate_headless_velocity, spawn_path_agent, spawn_physics_agent, AgentBody, CharacterMotor,
    DirectTranslation, Locomotion, LocomotionBackend, PhysicsVelocity, SteeringCommand,
};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use navigation::{
    NavigationGoal, NavigationPlugin, PathArrived, PathPlanner, PathReady, Planner, RepathTimer,
    StraightLinePlanner,
};

/// Частота симуляционного тика (Hz)
pub const FIXED_TICK_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для steering tick
            .insert_resource(Time::<Fixed>::from_hz(FIXED_TICK_HZ))
            .add_plugins(NavigationPlugin);

        // Детерминистичный RNG (seed по умолчанию), если host не вставил свой
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(FIXED_TICK_HZ));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
