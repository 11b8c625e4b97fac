/// Installs `env_logger` once per test binary. `RUST_LOG` overrides the
/// default `debug` level.
pub fn init_default_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("debug"),
    )
    .is_test(true)
    .try_init();
}
