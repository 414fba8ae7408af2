//! PathFollower — waypoint tracking + steering по polyline пути
//!
//! Цикл жизни:
//! - Idle → on_path_ready → Following → (достигли конца) → Arrived
//! - Новый путь ВСЕГДА сбрасывает arrived, даже если конечная точка та же
//!
//! Путь, cursor и arrived живут в одном `ActivePath` и заменяются целиком:
//! tick никогда не видит новый путь со старым индексом.

use bevy::prelude::*;

use super::config::PathFollowerConfig;
use super::geometry::{flatten, planar_distance_squared, target_point_on_segment};
use crate::logger;

/// Верхняя граница шагов resnap (защита от микроскопического switch radius)
const MAX_RESNAP_STEPS: usize = 4096;

/// Информация о прибытии (для listeners)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathArrival {
    /// Позиция агента в момент прибытия
    pub position: Vec3,
    /// Финальная точка пути
    pub destination: Vec3,
    /// Номер экземпляра пути (растёт с каждым on_path_ready)
    pub path_revision: u64,
}

/// Listener прибытия. Получает только копию данных — менять follower не может.
pub type ArrivalListener = Box<dyn Fn(&PathArrival) + Send + Sync>;

/// Результат одного тика
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringOutput {
    /// Желаемая скорость (m/s)
    pub velocity: Vec3,
    /// Желаемое направление взгляда (planar, не нормализовано; ноль = не поворачивать)
    pub desired_facing: Vec3,
    /// Конец пути достигнут (sticky до следующего пути)
    pub arrived: bool,
    /// true только в тик перехода arrived false → true
    pub just_arrived: bool,
}

/// Состояние follower'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum FollowState {
    /// Нет пути
    Idle,
    /// Едем по пути
    Following,
    /// Финальная точка достигнута
    Arrived,
}

/// Активный путь: waypoints + cursor + флаг прибытия (одно целое)
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePath {
    pub(crate) waypoints: Vec<Vec3>,
    pub(crate) current_index: usize,
    pub(crate) arrived: bool,
    pub(crate) revision: u64,
}

impl ActivePath {
    fn new(waypoints: Vec<Vec3>, revision: u64) -> Self {
        Self {
            waypoints,
            current_index: 1,
            arrived: false,
            revision,
        }
    }

    fn last_index(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Одна точка → сегмент от агента до неё
    fn normalize_single_point(&mut self, position: Vec3) {
        if self.waypoints.len() == 1 {
            self.waypoints.insert(0, position);
            self.current_index = 1;
        }
    }

    /// Жадно двигает cursor вперёд пока waypoint внутри switch radius
    ///
    /// Возвращает сколько waypoints пропущено.
    fn advance(&mut self, position: Vec3, switch_radius: f32) -> usize {
        let last = self.last_index();
        if last == 0 {
            return 0;
        }

        // Stale cursor (путь мутировали снаружи) → clamp
        self.current_index = self.current_index.clamp(1, last);
        let start = self.current_index;
        let radius_squared = switch_radius * switch_radius;

        while self.current_index < last
            && planar_distance_squared(position, self.waypoints[self.current_index]) < radius_squared
        {
            self.current_index += 1;
        }

        self.current_index - start
    }

    /// Догоняем cursor: идём от начала пути к агенту шагами по switch radius
    ///
    /// Прямая линия от path[0] к агенту, НЕ вдоль пути — дешёвое сглаживание
    /// latency планировщика, а не точная синхронизация.
    fn resnap(&mut self, position: Vec3, switch_radius: f32) -> usize {
        if self.waypoints.len() < 2 || !switch_radius.is_finite() || switch_radius <= 0.0 {
            return 0;
        }

        let origin = self.waypoints[0];
        let offset = flatten(position - origin);
        let distance = offset.length();
        let mut advanced = 0;

        if distance > f32::EPSILON {
            let direction = offset / distance;
            let steps = ((distance / switch_radius).ceil() as usize).min(MAX_RESNAP_STEPS);
            for i in 0..steps {
                let probe = origin + direction * (i as f32 * switch_radius);
                advanced += self.advance(probe, switch_radius);
            }
        }

        advanced + self.advance(position, switch_radius)
    }
}

/// Path follower агента
///
/// Один на агента, живёт всё время жизни агента. Пути приходят асинхронно
/// (через `on_path_ready`), `step` вызывается каждый FixedUpdate тик.
#[derive(Component)]
pub struct PathFollower {
    config: PathFollowerConfig,
    path: Option<ActivePath>,
    /// Запрос к планировщику в полёте
    awaiting_path: bool,
    revision: u64,
    last_target_point: Option<Vec3>,
    last_target_direction: Vec3,
    listeners: Vec<ArrivalListener>,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new(PathFollowerConfig::default())
    }
}

impl std::fmt::Debug for PathFollower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathFollower")
            .field("config", &self.config)
            .field("path", &self.path)
            .field("awaiting_path", &self.awaiting_path)
            .field("last_target_point", &self.last_target_point)
            .field("last_target_direction", &self.last_target_direction)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PathFollower {
    pub fn new(config: PathFollowerConfig) -> Self {
        Self {
            config,
            path: None,
            awaiting_path: false,
            revision: 0,
            last_target_point: None,
            last_target_direction: Vec3::ZERO,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &PathFollowerConfig {
        &self.config
    }

    /// Изменение параметров между тиками
    pub fn config_mut(&mut self) -> &mut PathFollowerConfig {
        &mut self.config
    }

    pub fn state(&self) -> FollowState {
        match &self.path {
            None => FollowState::Idle,
            Some(path) if path.arrived => FollowState::Arrived,
            Some(_) => FollowState::Following,
        }
    }

    pub fn waypoints(&self) -> Option<&[Vec3]> {
        self.path.as_ref().map(|path| path.waypoints.as_slice())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.path.as_ref().map(|path| path.current_index)
    }

    pub fn has_arrived(&self) -> bool {
        self.path.as_ref().is_some_and(|path| path.arrived)
    }

    pub fn path_revision(&self) -> Option<u64> {
        self.path.as_ref().map(|path| path.revision)
    }

    /// Последний aim point (диагностика)
    pub fn last_target_point(&self) -> Option<Vec3> {
        self.last_target_point
    }

    /// Последнее planar направление к aim point (диагностика)
    pub fn last_target_direction(&self) -> Vec3 {
        self.last_target_direction
    }

    #[cfg(test)]
    pub(crate) fn active_path_mut(&mut self) -> Option<&mut ActivePath> {
        self.path.as_mut()
    }

    /// Можно ли отправлять новый запрос планировщику
    pub fn is_ready_for_request(&self) -> bool {
        !self.awaiting_path
    }

    pub fn mark_request_issued(&mut self) {
        self.awaiting_path = true;
    }

    /// Планировщик не смог построить путь: остаёмся на старом, снова готовы к запросу
    pub fn on_path_failed(&mut self) {
        self.awaiting_path = false;
    }

    /// Регистрирует listener прибытия (срабатывает один раз на экземпляр пути)
    pub fn add_arrival_listener(&mut self, listener: impl Fn(&PathArrival) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Сброс пути (агент стоит)
    pub fn clear_path(&mut self) {
        self.path = None;
        self.last_target_point = None;
        self.last_target_direction = Vec3::ZERO;
    }

    /// Новый путь от планировщика
    ///
    /// Пустой путь игнорируется (остаёмся в прежнем состоянии), но флаг
    /// ожидания сбрасывается в любом случае. Возвращает true если путь установлен.
    pub fn on_path_ready(&mut self, waypoints: Vec<Vec3>, position: Vec3) -> bool {
        self.awaiting_path = false;

        if waypoints.is_empty() {
            logger::log_warning("PathFollower: empty path delivered, keeping previous state");
            return false;
        }

        self.revision += 1;
        let mut path = ActivePath::new(waypoints, self.revision);

        if self.config.resnap_on_new_path {
            let skipped = path.resnap(position, self.config.waypoint_switch_radius);
            if skipped > 0 {
                logger::log(&format!(
                    "PathFollower: resnap skipped {} waypoint(s), cursor at {}",
                    skipped, path.current_index
                ));
            }
        }

        self.path = Some(path);
        self.last_target_point = None;
        self.last_target_direction = Vec3::ZERO;
        true
    }

    /// Продвигает cursor для текущей позиции (без steering)
    pub fn advance_cursor(&mut self, position: Vec3) -> usize {
        let switch_radius = self.config.waypoint_switch_radius;
        self.path
            .as_mut()
            .map_or(0, |path| path.advance(position, switch_radius))
    }

    /// Один тик steering'а
    ///
    /// Безопасно вызывать без пути: нулевой output, arrived = false.
    pub fn step(&mut self, position: Vec3, forward: Vec3, dt: f32) -> SteeringOutput {
        let Self {
            config,
            path,
            last_target_point,
            last_target_direction,
            listeners,
            ..
        } = self;

        let Some(path) = path.as_mut() else {
            return SteeringOutput::default();
        };
        if path.waypoints.is_empty() {
            return SteeringOutput::default();
        }

        path.normalize_single_point(position);
        path.advance(position, config.waypoint_switch_radius);

        let index = path.current_index;
        let target = target_point_on_segment(
            position,
            path.waypoints[index - 1],
            path.waypoints[index],
            config.lookahead_distance,
        );

        let direction = flatten(target - position);
        let target_distance = direction.length();

        *last_target_point = Some(target);
        *last_target_direction = direction;

        // Замедление на КАЖДОМ сегменте (мягко проходим острые углы, не только финиш)
        let slowdown = if config.slowdown_radius > 0.0 {
            (target_distance / config.slowdown_radius).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if index == path.last_index() && target_distance <= config.arrival_tolerance {
            let just_arrived = !path.arrived;
            if just_arrived {
                path.arrived = true;

                let arrival = PathArrival {
                    position,
                    destination: path.waypoints[index],
                    path_revision: path.revision,
                };
                for listener in listeners.iter() {
                    listener(&arrival);
                }
            }

            // Не толкаем в цель, backend получит только settle tick
            return SteeringOutput {
                velocity: Vec3::ZERO,
                desired_facing: Vec3::ZERO,
                arrived: true,
                just_arrived,
            };
        }

        // Даже если смотрим не туда — ползём вперёд (без разворота на месте)
        let alignment = direction
            .normalize_or_zero()
            .dot(forward)
            .max(config.min_speed_factor);
        let mut speed = (config.max_speed * alignment * slowdown).max(0.0);

        // Не перелетаем aim point за один тик
        if dt > 0.0 {
            speed = speed.min(target_distance / (2.0 * dt));
        }

        SteeringOutput {
            velocity: forward * speed,
            desired_facing: direction,
            arrived: path.arrived,
            just_arrived: false,
        }
    }
}
