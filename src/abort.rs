use tokio_util::sync::CancellationToken;

/// Trip the returned token on the first Ctrl-C. The tracking loop watches it
/// at every suspend and before every dispatch.
pub fn on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::warn!("Interrupted");
                trigger.cancel();
            }
            Err(e) => log::error!("Cannot listen for Ctrl-C: {}", e),
        }
    });
    token
}
