//! Hitwindow - Distributed Rate Limiting
//!
//! This crate records hits against named resources and answers how many hits
//! remain before a threshold is reached. Counters live in a shared Redis store,
//! so every process pointed at the same store enforces the same limit. Two
//! algorithms are available: a fixed-window counter and a sliding-window log.

pub mod config;
pub mod error;
pub mod ratelimit;
