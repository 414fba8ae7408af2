//! Navigation domain — goal → запрос пути → follower → locomotion
//!
//! Содержит:
//! - NavigationGoal, RepathTimer (компоненты)
//! - PathPlanner trait + Planner resource + StraightLinePlanner
//! - PathReady / PathArrived (events)
//! - FixedUpdate системы

use bevy::prelude::*;

pub mod events;
pub mod goal;
pub mod planner;
pub mod systems;

pub use events::{PathArrived, PathReady};
pub use goal::{NavigationGoal, RepathTimer};
pub use planner::{PathPlanner, PlanHandle, PlanOutcome, PlanResult, Planner, StraightLinePlanner};
pub use systems::{
    apply_ready_paths, collect_planner_results, follow_paths, react_to_goal_changes,
    schedule_repaths,
};

use crate::follower::{FollowState, PathFollowerConfig};
use crate::locomotion::{CharacterMotor, SteeringCommand};

/// Navigation Plugin
///
/// Регистрирует события, типы и системы в FixedUpdate.
/// Planner resource: если host вставил свой ДО плагина — используется он,
/// иначе StraightLinePlanner.
///
/// Порядок выполнения (chain):
/// 1. react_to_goal_changes
/// 2. schedule_repaths
/// 3. collect_planner_results
/// 4. apply_ready_paths
/// 5. follow_paths
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PathReady>()
            .add_event::<PathArrived>()
            .register_type::<PathFollowerConfig>()
            .register_type::<SteeringCommand>()
            .register_type::<NavigationGoal>()
            .register_type::<RepathTimer>()
            .register_type::<FollowState>()
            .register_type::<CharacterMotor>()
            .init_resource::<Planner>();

        app.add_systems(
            FixedUpdate,
            (
                react_to_goal_changes,
                schedule_repaths,
                collect_planner_results,
                apply_ready_paths,
                follow_paths,
            )
                .chain(), // Последовательное выполнение для детерминизма
        );
    }
}
