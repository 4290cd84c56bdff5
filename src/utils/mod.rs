pub mod jitter;
pub mod logging;
