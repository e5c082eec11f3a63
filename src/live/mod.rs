//! Live store: the latest snapshot of each collection, pushed to subscribers.
//!
//! Every collection (guest list, dashboard, and each guest's responses) is a
//! watch channel holding its current snapshot. Writers call the matching
//! `*_changed` method after a successful write; the collection is reloaded
//! and subscribers are only woken when the snapshot actually differs.
//!
//! Subscriptions are children of the store's root cancellation token, so a
//! subscription ends when it is cancelled, dropped, or the server shuts down.
//! Response channels exist only for registered guests and are removed once
//! their last subscriber is gone.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Dashboard, Guest, RsvpResponse};

/// A live view of one collection.
///
/// The first call to [`Subscription::next`] yields the current snapshot;
/// later calls wait for the next change.
pub struct Subscription<T> {
    rx: watch::Receiver<Arc<T>>,
    lifetime: CancellationToken,
    primed: bool,
}

impl<T> Subscription<T> {
    fn new(rx: watch::Receiver<Arc<T>>, lifetime: CancellationToken) -> Self {
        Self {
            rx,
            lifetime,
            primed: false,
        }
    }

    /// Wait for the next snapshot. `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Arc<T>> {
        if self.lifetime.is_cancelled() {
            return None;
        }
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }

        let changed = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => return None,
            changed = self.rx.changed() => changed,
        };
        changed.ok()?;

        // Cancellation may have raced the change notification.
        if self.lifetime.is_cancelled() {
            return None;
        }
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn cancel(&self) {
        self.lifetime.cancel();
    }

    /// Turn the subscription into a stream of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        stream::unfold(self, |mut sub| async move {
            let snapshot = sub.next().await?;
            Some((snapshot, sub))
        })
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// Replace the watched value when it differs from the new snapshot.
fn publish<T: PartialEq>(tx: &watch::Sender<Arc<T>>, next: T) -> bool {
    tx.send_if_modified(|current| {
        if **current == next {
            false
        } else {
            *current = Arc::new(next);
            true
        }
    })
}

/// Reactive state container shared by all handlers.
///
/// Each collection's reload and publish run under that collection's lock, so
/// a slow reader cannot publish over a snapshot taken after a later write.
pub struct LiveStore {
    guests: watch::Sender<Arc<Vec<Guest>>>,
    guests_refresh: Mutex<()>,
    dashboard: watch::Sender<Arc<Dashboard>>,
    dashboard_refresh: Mutex<()>,
    responses: Mutex<HashMap<String, watch::Sender<Arc<Vec<RsvpResponse>>>>>,
    shutdown: CancellationToken,
}

impl LiveStore {
    pub fn new() -> Self {
        let (guests, _) = watch::channel(Arc::new(Vec::new()));
        let (dashboard, _) = watch::channel(Arc::new(Dashboard::default()));

        Self {
            guests,
            guests_refresh: Mutex::new(()),
            dashboard,
            dashboard_refresh: Mutex::new(()),
            responses: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Load the initial snapshots.
    pub async fn prime(&self, repo: &Repository) -> Result<(), AppError> {
        {
            let _guard = self.guests_refresh.lock().await;
            publish(&self.guests, repo.list_guests().await?);
        }
        let _guard = self.dashboard_refresh.lock().await;
        publish(&self.dashboard, repo.load_dashboard().await?);
        Ok(())
    }

    /// Reload the guest list and the dashboard after a guest write.
    pub async fn guests_changed(&self, repo: &Repository) {
        {
            let _guard = self.guests_refresh.lock().await;
            match repo.list_guests().await {
                Ok(guests) => {
                    if publish(&self.guests, guests) {
                        tracing::debug!("Pushed new guest list snapshot");
                    }
                }
                Err(e) => tracing::warn!("Failed to refresh guest list: {}", e),
            }
        }
        self.refresh_dashboard(repo).await;
    }

    /// Reload one guest's responses and the dashboard after an RSVP.
    pub async fn responses_changed(&self, repo: &Repository, slug: &str) {
        {
            let mut channels = self.responses.lock().await;
            evict_idle(&mut channels);

            if let Some(tx) = channels.get(slug) {
                match repo.list_responses(slug).await {
                    Ok(responses) => {
                        publish(tx, responses);
                    }
                    Err(e) => tracing::warn!("Failed to refresh responses of {}: {}", slug, e),
                }
            }
        }
        self.refresh_dashboard(repo).await;
    }

    async fn refresh_dashboard(&self, repo: &Repository) {
        let _guard = self.dashboard_refresh.lock().await;
        match repo.load_dashboard().await {
            Ok(dashboard) => {
                if publish(&self.dashboard, dashboard) {
                    tracing::debug!("Pushed new dashboard snapshot");
                }
            }
            Err(e) => tracing::warn!("Failed to refresh dashboard: {}", e),
        }
    }

    pub fn subscribe_guests(&self) -> Subscription<Vec<Guest>> {
        Subscription::new(self.guests.subscribe(), self.shutdown.child_token())
    }

    pub fn subscribe_dashboard(&self) -> Subscription<Dashboard> {
        Subscription::new(self.dashboard.subscribe(), self.shutdown.child_token())
    }

    /// Subscribe to one guest's responses, creating the channel on first use.
    ///
    /// Only registered guests get a channel; unknown slugs are `NotFound`.
    pub async fn subscribe_responses(
        &self,
        repo: &Repository,
        slug: &str,
    ) -> Result<Subscription<Vec<RsvpResponse>>, AppError> {
        let mut channels = self.responses.lock().await;
        evict_idle(&mut channels);

        if let Some(tx) = channels.get(slug) {
            return Ok(Subscription::new(tx.subscribe(), self.shutdown.child_token()));
        }

        if repo.get_guest(slug).await?.is_none() {
            return Err(AppError::guest_not_found(slug));
        }

        // Read under the lock so a concurrent RSVP publishes after seeding.
        let initial = repo.list_responses(slug).await?;
        let (tx, rx) = watch::channel(Arc::new(initial));
        channels.insert(slug.to_string(), tx);

        Ok(Subscription::new(rx, self.shutdown.child_token()))
    }

    #[cfg(test)]
    async fn response_channels(&self) -> usize {
        let mut channels = self.responses.lock().await;
        evict_idle(&mut channels);
        channels.len()
    }

    /// End every open subscription.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Drop response channels nobody listens to any more.
fn evict_idle<T>(channels: &mut HashMap<String, watch::Sender<T>>) {
    channels.retain(|_, tx| tx.receiver_count() > 0);
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::new()
    }
}
