//! Logging setup shared by the server and the CLI.

/// Subscriber configuration (filters, formats).
pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize process-wide logging in the given format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    subscriber::init(format);
}

/// JSON logs unless `LOG_FORMAT` names another format.
pub fn init_default() {
    init(format_from_env(LogFormat::Json));
}

/// Format named by `LOG_FORMAT`, or `default` when unset or unrecognized.
pub fn format_from_env(default: LogFormat) -> LogFormat {
    subscriber::format_or(std::env::var("LOG_FORMAT").ok().as_deref(), default)
}
