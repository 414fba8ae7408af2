//! Navigation systems (FixedUpdate, строго по порядку)
//!
//! 1. react_to_goal_changes — новый goal → сброс таймера / пути
//! 2. schedule_repaths — таймер + ready flag → запрос планировщику
//! 3. collect_planner_results — результаты → PathReady / on_path_failed
//! 4. apply_ready_paths — PathReady → PathFollower::on_path_ready
//! 5. follow_paths — step + поворот + locomotion + PathArrived

use std::sync::atomic::AtomicU32;

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use super::events::{PathArrived, PathReady};
use super::goal::{NavigationGoal, RepathTimer};
use super::planner::{PlanResult, Planner};
use crate::follower::geometry::{planar_distance_squared, rotate_towards};
use crate::follower::PathFollower;
use crate::locomotion::{AgentBody, Locomotion, SteeringCommand};
use crate::logger;

/// Счётчик для throttled per-tick логов
static FOLLOW_LOG_COUNTER: AtomicU32 = AtomicU32::new(0);

/// System: реакция на смену NavigationGoal
///
/// - Idle: путь сбрасывается, агент стоит
/// - Любой другой goal: таймер истекает → запрос уйдёт в этом же тике
pub fn react_to_goal_changes(
    mut agents: Query<
        (Entity, &NavigationGoal, &mut RepathTimer, &mut PathFollower),
        Changed<NavigationGoal>,
    >,
) {
    for (entity, goal, mut timer, mut follower) in agents.iter_mut() {
        match goal {
            NavigationGoal::Idle => {
                if follower.waypoints().is_some() {
                    logger::log(&format!("Entity {:?}: goal → Idle, path cleared", entity));
                }
                follower.clear_path();
            }
            _ => timer.expire(),
        }
    }
}

/// System: перезапрос пути по таймеру
///
/// Условие: таймер истёк И нет запроса в полёте И goal резолвится.
/// Goal, который не резолвится (цель despawn'ута), сбрасывает путь как Idle.
/// После прибытия не перезапрашиваем, пока цель не сдвинулась дальше
/// arrival_tolerance от конца текущего пути (иначе arrival спамит).
pub fn schedule_repaths(
    mut agents: Query<(
        Entity,
        &Transform,
        &NavigationGoal,
        &mut RepathTimer,
        &mut PathFollower,
    )>,
    transforms: Query<&Transform>,
    mut planner: ResMut<Planner>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, transform, goal, mut timer, mut follower) in agents.iter_mut() {
        timer.tick(delta);

        let Some(goal_position) = goal.resolve(&transforms) else {
            // FollowEntity с пропавшей целью ведёт себя как Idle
            if *goal != NavigationGoal::Idle && follower.waypoints().is_some() {
                logger::log(&format!("Entity {:?}: goal target lost, path cleared", entity));
                follower.clear_path();
            }
            continue;
        };

        if !timer.is_due() || !follower.is_ready_for_request() {
            continue;
        }

        if already_arrived_at(&follower, goal_position) {
            continue;
        }

        let handle = planner.request_path(entity, transform.translation, goal_position);
        follower.mark_request_issued();
        timer.restart();

        logger::log(&format!(
            "Entity {:?}: path requested {:?} ({:?} → {:?})",
            entity, handle, transform.translation, goal_position
        ));
    }
}

/// Агент уже стоит в конце пути, и `point` в пределах arrival_tolerance от него
fn already_arrived_at(follower: &PathFollower, point: Vec3) -> bool {
    if !follower.has_arrived() {
        return false;
    }

    let tolerance = follower.config().arrival_tolerance;
    follower
        .waypoints()
        .and_then(|waypoints| waypoints.last().copied())
        .is_some_and(|destination| {
            planar_distance_squared(destination, point) <= tolerance * tolerance
        })
}

/// System: забираем результаты планировщика
///
/// Провал → follower снова готов к запросу, старый путь остаётся.
/// Путь к уже достигнутой точке не ставится (повторного arrival нет).
/// Путь для агента, чей goal стал Idle или больше не резолвится, устарел и отбрасывается.
pub fn collect_planner_results(
    mut planner: ResMut<Planner>,
    mut followers: Query<(&mut PathFollower, Option<&NavigationGoal>)>,
    transforms: Query<&Transform>,
    mut ready_events: EventWriter<PathReady>,
) {
    for outcome in planner.poll_completed() {
        let Ok((mut follower, goal)) = followers.get_mut(outcome.agent) else {
            continue;
        };

        match outcome.result {
            PlanResult::Path(_)
                if goal.is_some_and(|goal| goal.resolve(&transforms).is_none()) =>
            {
                logger::log(&format!(
                    "Entity {:?}: stale path {:?} dropped (goal is Idle or lost)",
                    outcome.agent, outcome.handle
                ));
                follower.on_path_failed();
            }
            // Запрос ушёл до прибытия, а результат пришёл после: цель та же
            PlanResult::Path(waypoints)
                if waypoints
                    .last()
                    .is_some_and(|&end| already_arrived_at(&follower, end)) =>
            {
                follower.on_path_failed();
            }
            PlanResult::Path(waypoints) => {
                ready_events.write(PathReady {
                    entity: outcome.agent,
                    waypoints,
                });
            }
            PlanResult::Failed => {
                logger::log_warning(&format!(
                    "Entity {:?}: planner failed request {:?}, keeping previous path",
                    outcome.agent, outcome.handle
                ));
                follower.on_path_failed();
            }
        }
    }
}

/// System: установка готовых путей
pub fn apply_ready_paths(
    mut ready_events: EventReader<PathReady>,
    mut agents: Query<(&Transform, &mut PathFollower)>,
) {
    for event in ready_events.read() {
        // Агент мог быть despawn'ут пока путь считался
        let Ok((transform, mut follower)) = agents.get_mut(event.entity) else {
            continue;
        };

        if follower.on_path_ready(event.waypoints.clone(), transform.translation) {
            logger::log(&format!(
                "Entity {:?}: path installed ({} waypoints, cursor {:?})",
                event.entity,
                event.waypoints.len(),
                follower.current_index()
            ));
        }
    }
}

/// System: steering tick
///
/// Для каждого агента:
/// - PathFollower::step (velocity + desired facing)
/// - поворот только по yaw (rotate_towards)
/// - backend применяет velocity (в том числе нулевую — settle tick)
/// - PathArrived один раз на экземпляр пути
pub fn follow_paths(
    mut agents: Query<(
        Entity,
        &mut Transform,
        &mut PathFollower,
        &mut Locomotion,
        &mut SteeringCommand,
        Option<&mut Velocity>,
    )>,
    mut arrived_events: EventWriter<PathArrived>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut follower, mut locomotion, mut command, mut rapier_velocity) in
        agents.iter_mut()
    {
        let position = transform.translation;
        let forward = transform.forward().as_vec3();
        let output = follower.step(position, forward, delta);

        if output.just_arrived {
            let destination = follower
                .waypoints()
                .and_then(|waypoints| waypoints.last().copied())
                .unwrap_or(position);

            logger::log_info(&format!(
                "Entity {:?}: arrived at {:?} (destination {:?})",
                entity, position, destination
            ));
            arrived_events.write(PathArrived {
                entity,
                position,
                destination,
            });
        }

        transform.rotation = rotate_towards(
            transform.rotation,
            output.desired_facing,
            follower.config().turn_rate,
            delta,
        );

        let mut body = AgentBody {
            transform: &mut *transform,
            rapier_velocity: rapier_velocity.as_deref_mut(),
        };
        locomotion.apply(&mut body, output.velocity, delta);

        *command = SteeringCommand {
            velocity: output.velocity,
            desired_facing: output.desired_facing,
            arrived: output.arrived,
        };

        logger::log_every_n(&FOLLOW_LOG_COUNTER, 120, || {
            format!(
                "[Follow] {:?} via {}: cursor {:?}, target {:?}, speed {:.2}",
                entity,
                locomotion.backend_name(),
                follower.current_index(),
                follower.last_target_point(),
                output.velocity.length()
            )
        });
    }
}
