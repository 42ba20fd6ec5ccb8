use anyhow::{Context, Result};
use muchfun_core::LogConfig;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, Registry,
};

/// Crates that flood DEBUG output with per-frame GPU chatter
const NOISY_TARGETS: [&str; 4] = ["wgpu_core=warn", "wgpu_hal=warn", "naga=warn", "winit=info"];

/// Keeps the file writer alive and allows switching verbosity at runtime
pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
    base_level: LevelFilter,
    // Kept alive until dropped
    _guard: Option<WorkerGuard>,
}

impl LogHandle {
    /// Switch between the configured level and DEBUG
    pub fn set_verbose(&self, verbose: bool) {
        let level = if verbose {
            LevelFilter::DEBUG
        } else {
            self.base_level
        };
        match self.reload.reload(build_filter(level)) {
            Ok(()) => tracing::info!("Log level set to {}", level),
            Err(e) => tracing::warn!("Failed to change log level: {}", e),
        }
    }
}

fn build_filter(level: LevelFilter) -> EnvFilter {
    // RUST_LOG takes precedence over the configured level
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    for target in NOISY_TARGETS {
        if let Ok(directive) = target.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Initialize the logging system
pub fn init(config: &LogConfig, verbose: bool) -> Result<LogHandle> {
    let base_level = config.parse_level();
    let initial = if verbose {
        LevelFilter::DEBUG
    } else {
        base_level
    };
    let (filter_layer, reload_handle) = reload::Layer::new(build_filter(initial));

    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    let (file_layer, guard) = if config.file_output {
        let log_path = config.current_log_path();
        let (file, cleanup) = config
            .create_session_log()
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        match cleanup {
            Ok(0) => {}
            Ok(removed) => eprintln!("Removed {} old log file(s)", removed),
            Err(e) => eprintln!("Warning: Failed to cleanup old log files: {}", e),
        }
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file);

        eprintln!("Logging to file: {:?}", log_path);

        let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        (Some(layer), Some(worker_guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized at level: {}", initial);
    if config.file_output {
        tracing::info!("Log file path: {:?}", config.current_log_path());
    }

    Ok(LogHandle {
        reload: reload_handle,
        base_level,
        _guard: guard,
    })
}
