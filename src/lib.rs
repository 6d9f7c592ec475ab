//! Hunter Quest: a gamified habit tracker.
//!
//! Quests are completed for XP; XP drives level and hunter rank through the
//! pure functions in [`xp`]. The same functions back the HTTP server
//! ([`api`]) and the terminal renderer ([`display`]).

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod models;
pub mod notifications;
pub mod rewards;
pub mod xp;
