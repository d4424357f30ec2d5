//! Actor implementations

pub mod group;
pub mod supervisor;

pub use group::{GroupActor, GroupActorArgs};
pub use supervisor::{SupervisorActor, SupervisorActorArgs};
