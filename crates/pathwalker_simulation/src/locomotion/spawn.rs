//! Spawn helpers для агентов с path following

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::{Locomotion, LocomotionBackend, PhysicsVelocity, SteeringCommand};
use crate::follower::{PathFollower, PathFollowerConfig};
use crate::navigation::{NavigationGoal, RepathTimer};

/// Spawn агента с follower'ом и выбранным backend'ом
///
/// Компоненты:
/// - Transform
/// - PathFollower (config) + SteeringCommand
/// - Locomotion (backend)
/// - NavigationGoal::Idle + RepathTimer (default interval)
pub fn spawn_path_agent(
    commands: &mut Commands,
    position: Vec3,
    config: PathFollowerConfig,
    backend: impl LocomotionBackend,
) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            PathFollower::new(config),
            SteeringCommand::default(),
            Locomotion::new(backend),
            NavigationGoal::Idle,
            RepathTimer::default(),
        ))
        .id()
}

/// Spawn агента, движимого rapier'ом (kinematic velocity-based тело)
///
/// Backend пишет только Velocity, интеграцию делает physics step.
pub fn spawn_physics_agent(
    commands: &mut Commands,
    position: Vec3,
    config: PathFollowerConfig,
) -> Entity {
    let entity = spawn_path_agent(commands, position, config, PhysicsVelocity::default());

    commands.entity(entity).insert((
        RigidBody::KinematicVelocityBased,
        Collider::capsule_y(0.5, 0.4), // Высота 1.0m (0.5 + 0.5), радиус 0.4m
        Velocity::default(),
    ));

    entity
}
