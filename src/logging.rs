use std::path::Path;

use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

/// Set to a file path to log there instead of stderr.
pub const LOG_FILE_ENV: &str = "TIDEPOOL_LOG_FILE";

/// Installs the process logger: the file logger when [`LOG_FILE_ENV`] is set,
/// `env_logger` otherwise.
pub fn init() {
    quiet_gpu_crates();
    match std::env::var_os(LOG_FILE_ENV) {
        Some(path) => init_tracing(Path::new(&path)),
        None => env_logger::init(),
    }
}

fn quiet_gpu_crates() {
    // Silence wgpu log spam (https://github.com/gfx-rs/wgpu/issues/3206)
    let mut rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    for loud_crate in ["naga", "wgpu_core", "wgpu_hal"] {
        if !rust_log.contains(&format!("{loud_crate}=")) {
            rust_log += &format!(",{loud_crate}=warn");
        }
    }
    std::env::set_var("RUST_LOG", rust_log);
}

/// File logger. `log` records from the library are forwarded too.
pub fn init_tracing(path: &Path) {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file = path.file_name().map_or_else(|| "tidepool.log".into(), |f| f.to_owned());
    let writer = tracing_appender::rolling::never(dir, file).with_max_level(Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(LevelFilter::DEBUG)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(EnvFilter::from_env("RUST_LOG"))
        .init();

    tracing::debug!("logging to {}", path.display());
}
