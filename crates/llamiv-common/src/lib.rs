#![deny(clippy::all)]

mod color;
mod sync;
mod telemetry;

pub use color::Colors;
pub use color::init as color_init;
pub use sync::mutex_lock_or_recover;
pub use sync::poison_recovery_count;
pub use telemetry::LOG_FILE_ENV;
pub use telemetry::TelemetryConfig;
pub use telemetry::TelemetryGuard;
pub use telemetry::init_tracing;
