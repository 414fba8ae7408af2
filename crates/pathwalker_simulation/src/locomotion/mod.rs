//! Locomotion — как desired velocity превращается в реальное движение
//!
//! Архитектура (strategy):
//! - PathFollower считает SteeringCommand (velocity + facing)
//! - Locomotion компонент держит ОДИН backend, выбранный при спавне
//! - Backend сам решает: translation, rapier Velocity или character motor
//!
//! Никакого runtime-пробинга компонентов — backend инжектится явно.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

pub mod backends;
pub mod headless;
pub mod spawn;

pub use backends::{CharacterMotor, DirectTranslation, PhysicsVelocity};
pub use headless::integrate_headless_velocity;
pub use spawn::{spawn_path_agent, spawn_physics_agent};

/// Тело агента, доступное backend'у на один тик
pub struct AgentBody<'a> {
    pub transform: &'a mut Transform,
    /// Rapier velocity (есть только у physics агентов)
    pub rapier_velocity: Option<&'a mut Velocity>,
}

/// Backend движения
///
/// Вызывается КАЖДЫЙ тик, включая тики с нулевой velocity (после прибытия) —
/// backend может применить пассивные силы (гравитация).
pub trait LocomotionBackend: Send + Sync + 'static {
    fn apply(&mut self, body: &mut AgentBody<'_>, velocity: Vec3, dt: f32);

    /// Имя для логов
    fn name(&self) -> &'static str;
}

/// Компонент: backend движения агента
#[derive(Component)]
pub struct Locomotion {
    backend: Box<dyn LocomotionBackend>,
}

impl Locomotion {
    pub fn new(backend: impl LocomotionBackend) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn apply(&mut self, body: &mut AgentBody<'_>, velocity: Vec3, dt: f32) {
        self.backend.apply(body, velocity, dt);
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(DirectTranslation)
    }
}

impl std::fmt::Debug for Locomotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Locomotion").field(&self.backend.name()).finish()
    }
}

/// Последний steering output агента (для backend'ов, UI, диагностики)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SteeringCommand {
    /// Желаемая скорость (m/s)
    pub velocity: Vec3,
    /// Желаемое направление взгляда (ноль = не поворачивать)
    pub desired_facing: Vec3,
    /// Конец пути достигнут
    pub arrived: bool,
}
