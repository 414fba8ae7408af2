//! Конкретные locomotion backends

use bevy::prelude::*;

use super::{AgentBody, LocomotionBackend};
use crate::logger;

/// Прямой сдвиг Transform (headless, без физики)
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectTranslation;

impl LocomotionBackend for DirectTranslation {
    fn apply(&mut self, body: &mut AgentBody<'_>, velocity: Vec3, dt: f32) {
        // position += velocity * dt
        body.transform.translation += velocity * dt;
    }

    fn name(&self) -> &'static str {
        "direct_translation"
    }
}

/// Rapier velocity: пишем горизонтальную скорость в `Velocity::linvel`
///
/// Вертикаль не трогаем — гравитацией владеет rapier. Интеграция позиции
/// происходит в physics step, не здесь.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsVelocity {
    /// Уже предупредили что у entity нет Velocity
    warned_missing_body: bool,
}

impl LocomotionBackend for PhysicsVelocity {
    fn apply(&mut self, body: &mut AgentBody<'_>, velocity: Vec3, dt: f32) {
        if let Some(rapier_velocity) = body.rapier_velocity.as_deref_mut() {
            rapier_velocity.linvel.x = velocity.x;
            rapier_velocity.linvel.z = velocity.z;
            return;
        }

        // Нет rigid body → деградируем до прямого сдвига (один warning)
        if !self.warned_missing_body {
            self.warned_missing_body = true;
            logger::log_warning(
                "PhysicsVelocity: entity has no rapier Velocity, falling back to direct translation",
            );
        }
        body.transform.translation += Vec3::new(velocity.x, 0.0, velocity.z) * dt;
    }

    fn name(&self) -> &'static str {
        "physics_velocity"
    }
}

/// Character motor: ground check + гравитация + горизонтальное движение
///
/// Пол — плоскость y = ground_height (без raycast'ов).
#[derive(Debug, Clone, Copy, Reflect)]
pub struct CharacterMotor {
    /// Сила гравитации (m/s²)
    pub gravity: f32,
    /// Высота пола
    pub ground_height: f32,
    /// Текущая вертикальная скорость (m/s)
    pub vertical_speed: f32,
    /// На земле ли персонаж
    pub grounded: bool,
}

impl Default for CharacterMotor {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            ground_height: 0.0,
            vertical_speed: 0.0,
            grounded: false,
        }
    }
}

impl LocomotionBackend for CharacterMotor {
    fn apply(&mut self, body: &mut AgentBody<'_>, velocity: Vec3, dt: f32) {
        const GROUND_EPSILON: f32 = 0.01;

        let translation = &mut body.transform.translation;
        self.grounded = translation.y <= self.ground_height + GROUND_EPSILON;

        if self.grounded {
            self.vertical_speed = 0.0;
        } else {
            self.vertical_speed += self.gravity * dt;
        }

        *translation += Vec3::new(velocity.x, self.vertical_speed, velocity.z) * dt;

        // Не проваливаемся сквозь пол
        if translation.y < self.ground_height {
            translation.y = self.ground_height;
            self.vertical_speed = 0.0;
            self.grounded = true;
        }
    }

    fn name(&self) -> &'static str {
        "character_motor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier3d::prelude::Velocity;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_direct_translation_integrates() {
        let mut transform = Transform::default();
        let mut body = AgentBody {
            transform: &mut transform,
            rapier_velocity: None,
        };

        DirectTranslation.apply(&mut body, Vec3::new(6.0, 0.0, 0.0), 0.5);

        assert_eq!(transform.translation, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_physics_velocity_keeps_vertical() {
        let mut transform = Transform::default();
        let mut velocity = Velocity::linear(Vec3::new(0.0, -4.0, 0.0));
        let mut body = AgentBody {
            transform: &mut transform,
            rapier_velocity: Some(&mut velocity),
        };

        PhysicsVelocity::default().apply(&mut body, Vec3::new(1.0, 7.0, 2.0), DT);

        assert_eq!(velocity.linvel, Vec3::new(1.0, -4.0, 2.0));
        // Позицию двигает rapier, не backend
        assert_eq!(transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_physics_velocity_fallback_without_body() {
        let mut transform = Transform::default();
        let mut backend = PhysicsVelocity::default();
        let mut body = AgentBody {
            transform: &mut transform,
            rapier_velocity: None,
        };

        backend.apply(&mut body, Vec3::new(2.0, 0.0, 0.0), 0.5);
        backend.apply(&mut body, Vec3::new(2.0, 0.0, 0.0), 0.5);

        assert!(backend.warned_missing_body);
        assert_eq!(transform.translation, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_character_motor_falls_on_settle_tick() {
        let mut transform = Transform::from_xyz(0.0, 2.0, 0.0);
        let mut motor = CharacterMotor::default();
        let mut body = AgentBody {
            transform: &mut transform,
            rapier_velocity: None,
        };

        // Нулевая velocity (агент прибыл), но гравитация действует
        LocomotionBackend::apply(&mut motor, &mut body, Vec3::ZERO, DT);

        assert!(!motor.grounded);
        assert!(motor.vertical_speed < -0.15 && motor.vertical_speed > -0.17);
        assert!(transform.translation.y < 2.0);
    }

    #[test]
    fn test_character_motor_lands_on_ground() {
        let mut transform = Transform::from_xyz(0.0, 0.05, 0.0);
        let mut motor = CharacterMotor {
            vertical_speed: -10.0,
            ..default()
        };
        let mut body = AgentBody {
            transform: &mut transform,
            rapier_velocity: None,
        };

        LocomotionBackend::apply(&mut motor, &mut body, Vec3::new(3.0, 0.0, 0.0), 0.1);

        assert_eq!(transform.translation.y, 0.0);
        assert!(motor.grounded);
        assert_eq!(motor.vertical_speed, 0.0);
        assert!((transform.translation.x - 0.3).abs() < 1e-5);
    }
}
