//! Planner seam — асинхронный запрос пути
//!
//! Планировщик внешний (navmesh, grid A*, host-движок). Контракт:
//! - `request_path` принимает запрос и сразу возвращает handle
//! - `poll_completed` отдаёт каждый принятый запрос РОВНО ОДИН раз, на любом будущем тике
//! - Провал = `PlanResult::Failed` (follower остаётся на старом пути)
//!
//! `StraightLinePlanner` — тривиальная реализация для headless demo/тестов.

use std::collections::VecDeque;

use bevy::prelude::*;

/// Максимум waypoints в прямой линии
const MAX_STRAIGHT_LINE_SEGMENTS: usize = 1024;

/// Идентификатор запроса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanHandle(pub u64);

/// Результат планирования
#[derive(Debug, Clone, PartialEq)]
pub enum PlanResult {
    Path(Vec<Vec3>),
    Failed,
}

/// Завершённый запрос
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub handle: PlanHandle,
    pub agent: Entity,
    pub result: PlanResult,
}

/// Внешний планировщик пути
pub trait PathPlanner: Send + Sync + 'static {
    fn request_path(&mut self, agent: Entity, start: Vec3, goal: Vec3) -> PlanHandle;

    /// Забрать завершённые запросы (каждый — один раз)
    fn poll_completed(&mut self) -> Vec<PlanOutcome>;
}

/// Resource: активный планировщик
#[derive(Resource)]
pub struct Planner {
    inner: Box<dyn PathPlanner>,
}

impl Planner {
    pub fn new(planner: impl PathPlanner) -> Self {
        Self {
            inner: Box::new(planner),
        }
    }

    pub fn request_path(&mut self, agent: Entity, start: Vec3, goal: Vec3) -> PlanHandle {
        self.inner.request_path(agent, start, goal)
    }

    pub fn poll_completed(&mut self) -> Vec<PlanOutcome> {
        self.inner.poll_completed()
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(StraightLinePlanner::default())
    }
}

#[derive(Debug, Clone)]
struct PendingPlan {
    handle: PlanHandle,
    agent: Entity,
    start: Vec3,
    goal: Vec3,
    ticks_left: u32,
}

/// Прямая линия start → goal с промежуточными waypoints
///
/// Latency в тиках (poll_completed вызывается раз в тик) имитирует
/// асинхронный планировщик.
#[derive(Debug, Clone)]
pub struct StraightLinePlanner {
    /// Сколько poll'ов запрос "считается"
    pub latency_ticks: u32,
    /// Расстояние между waypoints (метры)
    pub waypoint_spacing: f32,
    next_handle: u64,
    pending: VecDeque<PendingPlan>,
}

impl Default for StraightLinePlanner {
    fn default() -> Self {
        Self::new(2, 2.0)
    }
}

impl StraightLinePlanner {
    pub fn new(latency_ticks: u32, waypoint_spacing: f32) -> Self {
        Self {
            latency_ticks,
            waypoint_spacing,
            next_handle: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn build_path(&self, start: Vec3, goal: Vec3) -> PlanResult {
        if !start.is_finite() || !goal.is_finite() {
            return PlanResult::Failed;
        }

        let distance = start.distance(goal);
        let segments = if self.waypoint_spacing > 0.0 {
            ((distance / self.waypoint_spacing).ceil() as usize).clamp(1, MAX_STRAIGHT_LINE_SEGMENTS)
        } else {
            1
        };

        let waypoints = (0..=segments)
            .map(|i| start.lerp(goal, i as f32 / segments as f32))
            .collect();

        PlanResult::Path(waypoints)
    }
}

impl PathPlanner for StraightLinePlanner {
    fn request_path(&mut self, agent: Entity, start: Vec3, goal: Vec3) -> PlanHandle {
        let handle = PlanHandle(self.next_handle);
        self.next_handle += 1;

        self.pending.push_back(PendingPlan {
            handle,
            agent,
            start,
            goal,
            ticks_left: self.latency_ticks,
        });

        handle
    }

    fn poll_completed(&mut self) -> Vec<PlanOutcome> {
        let mut completed = Vec::new();
        let mut still_pending = VecDeque::with_capacity(self.pending.len());

        while let Some(mut plan) = self.pending.pop_front() {
            if plan.ticks_left == 0 {
                completed.push(PlanOutcome {
                    handle: plan.handle,
                    agent: plan.agent,
                    result: self.build_path(plan.start, plan.goal),
                });
            } else {
                plan.ticks_left -= 1;
                still_pending.push_back(plan);
            }
        }

        self.pending = still_pending;
        completed
    }
}
