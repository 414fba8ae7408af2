//! Planar геометрия для tracking'а (Y игнорируется везде)

use bevy::prelude::*;

/// Обнуляет вертикальную компоненту
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Квадрат расстояния в плоскости XZ
#[inline]
pub fn planar_distance_squared(a: Vec3, b: Vec3) -> f32 {
    flatten(a - b).length_squared()
}

/// Параметр ближайшей точки отрезка `[start, end]` к `point`, clamp в [0, 1]
///
/// Отрезок нулевой длины → 0 (start).
pub fn closest_parameter(point: Vec3, start: Vec3, end: Vec3) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return 0.0;
    }
    ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0)
}

/// Lookahead aim point на сегменте ("морковка на палке")
///
/// Концы сегмента опускаются/поднимаются до высоты агента, дальше чистая
/// планарная геометрия. Результат всегда лежит на сегменте.
pub fn target_point_on_segment(
    position: Vec3,
    segment_start: Vec3,
    segment_end: Vec3,
    lookahead_distance: f32,
) -> Vec3 {
    let start = Vec3::new(segment_start.x, position.y, segment_start.z);
    let end = Vec3::new(segment_end.x, position.y, segment_end.z);

    let segment_length = start.distance(end);
    if segment_length <= f32::EPSILON {
        return start;
    }

    let t = closest_parameter(position, start, end);
    let closest = start.lerp(end, t);
    let distance_to_closest = position.distance(closest);

    let look_ahead = (lookahead_distance - distance_to_closest).clamp(0.0, lookahead_distance.max(0.0));
    let t = (t + look_ahead / segment_length).clamp(0.0, 1.0);

    start.lerp(end, t)
}

/// Yaw-only поворот к направлению (forward = -Z, как у Transform::looking_to)
pub fn yaw_towards(direction: Vec3) -> Quat {
    let planar = flatten(direction);
    Quat::from_rotation_y(f32::atan2(-planar.x, -planar.z))
}

/// Плавный поворот к `desired` (slerp с фактором turn_rate * dt)
///
/// Pitch/roll результата отбрасываются — вращение только вокруг Y.
/// Нулевое направление → поворот не меняется.
pub fn rotate_towards(current: Quat, desired: Vec3, turn_rate: f32, dt: f32) -> Quat {
    if flatten(desired).length_squared() <= f32::EPSILON {
        return current;
    }

    let factor = (turn_rate * dt).clamp(0.0, 1.0);
    let blended = current.slerp(yaw_towards(desired), factor);

    let (yaw, _pitch, _roll) = blended.to_euler(EulerRot::YXZ);
    Quat::from_rotation_y(yaw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_target_point_leads_by_lookahead() {
        let target = target_point_on_segment(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            1.0,
        );
        assert!(target.distance(Vec3::new(1.0, 0.0, 0.0)) < EPS, "target = {:?}", target);
    }

    #[test]
    fn test_target_point_clamped_to_segment_end() {
        let target = target_point_on_segment(
            Vec3::new(9.85, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            1.0,
        );
        assert!(target.distance(Vec3::new(10.0, 0.0, 0.0)) < EPS);
    }

    #[test]
    fn test_far_from_segment_gets_no_lookahead() {
        // Агент в 3м сбоку — lookahead съеден расстоянием, цель = ближайшая точка
        let target = target_point_on_segment(
            Vec3::new(4.0, 0.0, 3.0),
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            1.0,
        );
        assert!(target.distance(Vec3::new(4.0, 0.0, 0.0)) < EPS);
    }

    #[test]
    fn test_zero_length_segment_returns_start() {
        let start = Vec3::new(2.0, 5.0, 2.0);
        let target = target_point_on_segment(Vec3::new(0.0, 1.0, 0.0), start, start, 1.0);
        // Высота подтягивается к агенту
        assert!(target.distance(Vec3::new(2.0, 1.0, 2.0)) < EPS);
    }

    #[test]
    fn test_target_matches_agent_height() {
        let target = target_point_on_segment(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 7.0, 10.0),
            2.0,
        );
        assert_eq!(target.y, 3.0);
        assert!((target.z - 2.0).abs() < EPS);
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let d = planar_distance_squared(Vec3::new(0.0, 100.0, 0.0), Vec3::new(3.0, -4.0, 4.0));
        assert!((d - 25.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_towards_full_factor_snaps() {
        let rotation = rotate_towards(Quat::IDENTITY, Vec3::X, 10.0, 1.0);
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.distance(Vec3::X) < EPS, "forward = {:?}", forward);
    }

    #[test]
    fn test_rotate_towards_partial_does_not_overshoot() {
        // Поворот на 90° с фактором 0.5 → примерно 45°
        let rotation = rotate_towards(Quat::IDENTITY, Vec3::X, 5.0, 0.1);
        let forward = rotation * Vec3::NEG_Z;
        let angle = forward.angle_between(Vec3::NEG_Z);
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 1e-3, "angle = {}", angle);
        assert!(forward.x > 0.0);
    }

    #[test]
    fn test_rotate_towards_zero_direction_keeps_rotation() {
        let current = Quat::from_rotation_y(0.7);
        let rotation = rotate_towards(current, Vec3::ZERO, 5.0, 0.1);
        assert_eq!(rotation, current);
    }

    #[test]
    fn test_rotate_towards_drops_pitch() {
        let pitched = Quat::from_rotation_x(0.5);
        let rotation = rotate_towards(pitched, Vec3::new(0.0, 5.0, -1.0), 1.0, 0.5);
        let (_, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
        assert!(pitch.abs() < EPS);
        assert!(roll.abs() < EPS);
    }
}
