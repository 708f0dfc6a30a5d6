use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: [&str; 2] = ["ledger_service=info", "ledger_client=info"];

/// Install the global fmt subscriber. `RUST_LOG` adds to the defaults; a
/// second call is a no-op.
pub fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
