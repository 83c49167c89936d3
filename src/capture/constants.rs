//! Capture system constants - defaults used when a round file leaves a value out
//!
//! All durations are in simulation seconds.

// Region defaults
pub const DEFAULT_CAPTURE_DURATION: f32 = 300.0; // 5 minutes of uncontested hold
pub const DEFAULT_CAPTURE_RADIUS: f32 = 4.0;
pub const DEFAULT_CONTESTED_RESET_WINDOW: f32 = 10.0;

// Asymmetric mode
pub const DEFAULT_DEFENDER_TIMEOUT: f32 = 40.0 * 60.0; // 40 minutes

// Countdown warnings (seconds of capture remaining)
pub const TWO_MINUTE_WARNING: f32 = 120.0;
pub const ONE_MINUTE_WARNING: f32 = 60.0;

