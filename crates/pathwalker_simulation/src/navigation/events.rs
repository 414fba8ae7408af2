//! Navigation events

use bevy::prelude::*;

/// Event: путь готов (планировщик → follower)
///
/// Генерируется:
/// - collect_planner_results (встроенный Planner resource)
/// - host-движком напрямую, если у него свой планировщик
///
/// Обрабатывается:
/// - apply_ready_paths: PathFollower::on_path_ready
#[derive(Event, Debug, Clone)]
pub struct PathReady {
    pub entity: Entity,
    pub waypoints: Vec<Vec3>,
}

/// Event: агент достиг конца пути (один раз на экземпляр пути)
///
/// Слушатели могут выдать следующую задачу (новый NavigationGoal),
/// но НЕ трогают PathFollower напрямую.
#[derive(Event, Debug, Clone)]
pub struct PathArrived {
    pub entity: Entity,
    /// Позиция агента в момент прибытия
    pub position: Vec3,
    /// Финальная точка пути
    pub destination: Vec3,
}
