//! API route handlers

pub mod error;
pub mod groups;
pub mod system;
