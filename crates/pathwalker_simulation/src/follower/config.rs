//! Параметры path follower'а (per-agent, задаются при спавне)
//!
//! Значения можно менять между тиками через `PathFollower::config_mut()`.
//! Загрузка из RON: частичный файл дополняется Default значениями.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки загрузки/валидации конфига
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse follower config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("`{field}` must be finite and >= 0 (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("`{field}` must be finite and > 0 (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("`min_speed_factor` must be within [0, 1] (got {0})")]
    SpeedFactorOutOfRange(f32),
}

/// Конфиг steering'а вдоль пути
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFollowerConfig {
    /// Максимальная скорость (m/s)
    pub max_speed: f32,
    /// Скорость поворота (доля разворота за секунду для slerp)
    pub turn_rate: f32,
    /// Радиус линейного замедления вокруг aim point (метры)
    pub slowdown_radius: f32,
    /// Радиус переключения на следующий waypoint (метры)
    pub waypoint_switch_radius: f32,
    /// Насколько aim point опережает агента вдоль сегмента (метры)
    pub lookahead_distance: f32,
    /// Допуск прибытия к финальной точке (метры)
    pub arrival_tolerance: f32,
    /// Нижняя граница множителя скорости (агент не замирает при развороте)
    pub min_speed_factor: f32,
    /// Догонять cursor при получении нового пути (компенсация latency планировщика)
    pub resnap_on_new_path: bool,
}

impl Default for PathFollowerConfig {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            turn_rate: 5.0,
            slowdown_radius: 0.6,
            waypoint_switch_radius: 2.0,
            lookahead_distance: 1.0,
            arrival_tolerance: 0.2,
            min_speed_factor: 0.2,
            resnap_on_new_path: true,
        }
    }
}

impl PathFollowerConfig {
    /// Парсит RON и валидирует
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validated()
    }

    /// Проверяет значения, возвращает self если всё ок
    pub fn validated(self) -> Result<Self, ConfigError> {
        non_negative("max_speed", self.max_speed)?;
        non_negative("turn_rate", self.turn_rate)?;
        non_negative("lookahead_distance", self.lookahead_distance)?;
        non_negative("arrival_tolerance", self.arrival_tolerance)?;
        positive("slowdown_radius", self.slowdown_radius)?;
        positive("waypoint_switch_radius", self.waypoint_switch_radius)?;

        if !(0.0..=1.0).contains(&self.min_speed_factor) {
            return Err(ConfigError::SpeedFactorOutOfRange(self.min_speed_factor));
        }

        Ok(self)
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}
