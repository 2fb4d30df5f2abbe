use tracing_subscriber::EnvFilter;

/// グローバルなtracing subscriberを初期化する。
///
/// `RUST_LOG` を尊重し、未設定なら `info`。stdoutはページ出力とMCPが使うのでstderrに書く。
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
