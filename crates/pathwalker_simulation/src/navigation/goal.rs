//! Navigation goal + repath timer компоненты

use bevy::prelude::*;

/// Куда агент хочет попасть (high-level intent)
///
/// - Idle: путь не запрашивается, текущий путь сбрасывается
/// - MoveToPosition: статичная точка
/// - FollowEntity: позиция entity резолвится на каждый запрос (цель двигается)
#[derive(Component, Debug, Clone, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub enum NavigationGoal {
    #[default]
    Idle,
    MoveToPosition { target: Vec3 },
    FollowEntity { target: Entity },
}

impl NavigationGoal {
    /// Мировая позиция цели (None = Idle или entity пропала)
    pub fn resolve(&self, transforms: &Query<&Transform>) -> Option<Vec3> {
        match self {
            NavigationGoal::Idle => None,
            NavigationGoal::MoveToPosition { target } => Some(*target),
            NavigationGoal::FollowEntity { target } => {
                transforms.get(*target).ok().map(|transform| transform.translation)
            }
        }
    }
}

/// Таймер перезапроса пути
///
/// Запрос уходит когда `elapsed >= interval` И follower не ждёт результат.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct RepathTimer {
    /// Минимальный интервал между запросами (секунды)
    pub interval: f32,
    /// Время с последнего запроса (секунды)
    pub elapsed: f32,
}

impl Default for RepathTimer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl RepathTimer {
    /// Первый запрос уходит сразу
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: interval,
        }
    }

    pub fn tick(&mut self, delta: f32) {
        self.elapsed += delta;
    }

    pub fn is_due(&self) -> bool {
        self.elapsed >= self.interval
    }

    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }

    /// Следующая проверка выпустит запрос немедленно
    pub fn expire(&mut self) {
        self.elapsed = self.elapsed.max(self.interval);
    }
}
