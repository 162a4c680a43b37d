//! State module for tracking spider job progress
//!
//! - `SpiderState`: the coordinator's lifecycle state machine

mod spider_state;

pub use spider_state::SpiderState;
