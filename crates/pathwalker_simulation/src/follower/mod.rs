//! Follower domain — steering вдоль готового polyline пути
//!
//! Содержит:
//! - PathFollowerConfig (параметры, RON загрузка)
//! - PathFollower (cursor, lookahead, скорость, прибытие)
//! - geometry (planar helpers, rotate_towards)

pub mod config;
pub mod geometry;
pub mod path_follower;


pub use config::{ConfigError, PathFollowerConfig};
pub use geometry::{rotate_towards, target_point_on_segment};
pub use path_follower::{
    ActivePath, ArrivalListener, FollowState, PathArrival, PathFollower, SteeringOutput,
};
