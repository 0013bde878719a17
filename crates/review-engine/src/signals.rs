use tokio::sync::watch;

/// Spawns a task that flips the shutdown signal on SIGINT (and SIGTERM,
/// unix only). The returned `JoinHandle` should be aborted once the
/// engine run completes so the listener doesn't outlive it.
pub fn install_signal_handlers() -> (watch::Sender<bool>, watch::Receiver<bool>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = watch::channel(false);
    let sender = tx.clone();
    let handle = tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(_) => return,
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        let _ = sender.send(true);
    });
    (tx, rx, handle)
}
