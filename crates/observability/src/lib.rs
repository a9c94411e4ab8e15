//! Process-wide logging setup shared by the stockroom binaries.

pub mod logging;

pub use logging::LogFormat;

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
