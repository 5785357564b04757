//! Container loading simulator.
//!
//! Places carton instances into a single shipping container with an
//! extreme-point heuristic. The engine (`types` through `orchestrator`) has no
//! I/O dependency; `worker` and `api` host it for callers.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extreme_points;
pub mod geometry;
pub mod model;
pub mod orchestrator;
pub mod search;
pub mod types;
pub mod validator;
pub mod worker;
