//! API Routes
//!
//! Route handlers organized by functionality.

pub mod commentary;
pub mod health;
pub mod matches;
