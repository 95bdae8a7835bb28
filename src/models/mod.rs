//! Data models for the IoT device dashboard.
//!
//! These models match the frontend JSON contract exactly for seamless interoperability.

mod dashboard;
mod device;
mod user;

pub use dashboard::*;
pub use device::*;
pub use user::*;
