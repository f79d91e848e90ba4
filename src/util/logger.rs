use log::SetLoggerError;

/// The filter used when `RUST_LOG` is not set: collection summaries from this crate only.
const DEFAULT_FILTER: &str = "cellgc=info";

/// Install `env_logger` as the global logger, filtered by `RUST_LOG` or [`DEFAULT_FILTER`].
/// Fails if a logger is already installed, and does nothing without the
/// `builtin_env_logger` feature.
pub fn try_init() -> Result<(), SetLoggerError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            env_logger::try_init_from_env(
                env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, DEFAULT_FILTER),
            )
        } else {
            Ok(())
        }
    }
}
