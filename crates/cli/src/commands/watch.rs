//! Stream realtime notifications to stdout.

use shopfront_client::Storefront;
use tokio::sync::broadcast::error::RecvError;

use super::CommandError;

/// Print each realtime event until Ctrl-C or the channel closes.
#[allow(clippy::print_stdout)]
pub async fn run(storefront: &Storefront, refresh: bool) -> Result<(), CommandError> {
    if !storefront.realtime().is_connected() {
        return Err(CommandError::NotLoggedIn);
    }

    let mut events = storefront.realtime().subscribe();
    let refresher = refresh.then(|| storefront.spawn_event_refresh());
    tracing::info!("Watching realtime events; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    let note = event.to_notification();
                    println!("[{}] {}: {}", event.name, note.title, note.message);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed realtime events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    if let Some(handle) = refresher {
        handle.abort();
    }
    let feed = storefront.notifications().snapshot();
    println!("{} notifications, {} unread", feed.items.len(), feed.unread);
    Ok(())
}
