use anyhow::{anyhow, Context};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// The environment variable log filters are read from.
const LOG_ENV: &str = "WHEELSPIN_LOG";

/// Where log lines go.
pub(crate) enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Disabled,
}

/// Configure the global tracing subscriber.
pub(crate) fn init(target: LogTarget) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = match target {
        LogTarget::File(path) => {
            let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::Disabled => return Ok(()),
    };
    result.map_err(|e| anyhow!("initializing logging: {e}"))
}
