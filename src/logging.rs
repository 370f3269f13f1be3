use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Install the global tracing subscriber.
///
/// Debug mode logs at `debug` to stdout, interleaved with the command's own
/// output. Otherwise only warnings reach stderr. `RUST_LOG` overrides both.
pub fn init(debug: bool) -> anyhow::Result<()> {
    let (level, writer) = if debug {
        (LevelFilter::DEBUG, BoxMakeWriter::new(std::io::stdout))
    } else {
        (LevelFilter::WARN, BoxMakeWriter::new(std::io::stderr))
    };

    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env()?;
    tracing_subscriber::fmt()
        .with_timer(timer)
        .with_target(debug)
        .with_writer(writer)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;
    Ok(())
}
