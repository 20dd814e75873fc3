use std::io::IsTerminal;
use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt::MakeWriter, util::SubscriberInitExt};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Install the global subscriber on stderr. `RUST_LOG` filters (default
/// `info`); `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let ansi = std::io::stderr().is_terminal();
    subscriber(std::io::stderr, json, ansi).init();
}

/// Stdout is left to program output.
fn subscriber<W>(writer: W, json: bool, ansi: bool) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi);

    if json {
        Box::new(builder.json().finish())
    } else {
        Box::new(builder.finish())
    }
}
