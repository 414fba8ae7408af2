//! Интеграция rapier Velocity → Transform без rapier pipeline
//!
//! Для headless режима (тесты, demo), где RapierPhysicsPlugin не подключен.
//! С полноценной физикой эта система НЕ добавляется — позицию двигает rapier.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{RigidBody, Velocity};

/// System: position += linvel * dt для kinematic velocity-based тел
pub fn integrate_headless_velocity(
    mut bodies: Query<(&RigidBody, &Velocity, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (rigid_body, velocity, mut transform) in bodies.iter_mut() {
        if *rigid_body != RigidBody::KinematicVelocityBased {
            continue;
        }
        transform.translation += velocity.linvel * delta;
    }
}
