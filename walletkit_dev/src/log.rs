use {
    std::io::IsTerminal as _,
    tracing_appender::non_blocking::WorkerGuard,
    tracing_subscriber::{
        layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
        EnvFilter,
        Layer as _,
    },
};

/// Installs the stderr subscriber filtered by `directives` (`--log`). Colors
/// are only used on a terminal. Keep the guard alive until the process exits.
pub fn init(directives: &str) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::builder().parse(directives)?;

    let stderr = std::io::stderr();
    let ansi = stderr.is_terminal();
    let (writer, guard) = tracing_appender::non_blocking(stderr);

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(ansi)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directives_are_refused() {
        assert!(init("dev_proxy=loud").is_err());
    }
}
