//! API handlers

pub mod health;
pub mod properties;
pub mod reviews;
pub mod token;
pub mod users;
