// Shutdown signalling for the control loop
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sender flips to `true` to request a stop
pub fn create_shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolve once a stop has been requested. Never resolves if every sender
/// is dropped without requesting one.
pub async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Spawn a task that requests a stop once `signal` resolves with `Ok`.
///
/// Yields before returning so the task is polled once on a current-thread
/// runtime; `tokio::signal::ctrl_c` installs its handler on that first poll.
pub async fn spawn_shutdown_listener<F>(signal: F, shutdown: watch::Sender<bool>) -> JoinHandle<()>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                log::info!("🛑 Stop signal received");
                let _ = shutdown.send(true);
            }
            Err(e) => log::warn!("⚠️ Cannot listen for the stop signal: {e}"),
        }
    });
    tokio::task::yield_now().await;
    handle
}
