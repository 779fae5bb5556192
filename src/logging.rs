use tracing_subscriber::EnvFilter;

/// Initialize tracing and bridge `log` to `tracing`.
/// Calling this multiple times is safe (subsequent attempts are ignored).
pub fn init_tracing(enable_debug: bool) {
    let _ = tracing_log::LogTracer::init();

    // Explicit debug flag wins over RUST_LOG; default is warn.
    // Debug is scoped to this crate so egui/winit/wgpu frame chatter stays out.
    let env_filter = if enable_debug {
        EnvFilter::new("slideshow_item=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .ok();
}
