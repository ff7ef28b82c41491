//!
//! Motion control for a 3RRR planar parallel drawing robot
//!
//! A touch on the panel becomes a platform position request, inverse kinematics turns
//! the request into three joint angles, and one PI loop per joint drives its motor
//! until the encoder agrees. Every piece runs as a cooperative task on a fixed period.
//!

pub mod channel;
pub mod config;
pub mod control;
pub mod hardware;
pub mod input;
pub mod kinematics;
pub mod sim;
pub mod task;
