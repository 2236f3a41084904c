use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crate log level for a verbosity offset: negative is quieter, positive is louder.
fn default_directive(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "upd_merge=warn",
        0 => "upd_merge=info",
        1 => "upd_merge=debug",
        _ => "upd_merge=trace",
    }
}

/// Initializes console logging on stderr.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at the level chosen by
/// `verbosity`. Calling it twice is harmless.
pub fn init_logging(verbosity: i8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_directive(-1), "upd_merge=warn");
        assert_eq!(default_directive(0), "upd_merge=info");
        assert_eq!(default_directive(1), "upd_merge=debug");
        assert_eq!(default_directive(4), "upd_merge=trace");
    }
}
