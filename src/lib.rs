// ABOUTME: Library root for cutover - a blue/green scale-set rollout core.
// ABOUTME: Phases dispatch delegate tasks and resume from correlated async responses.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod phase;
pub mod types;
