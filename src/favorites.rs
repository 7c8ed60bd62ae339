//! Favorite-state overlay.
//!
//! Keeps the viewer's favorite set next to the listing pipeline and applies
//! add/remove optimistically: the local set changes first, the request runs,
//! and the change is rolled back if the request fails. Every failure is
//! reported through the [`Notifier`] before it is returned.

use crate::api::{BearerToken, FavoritesApi};
use crate::error::{ApiError, Result};
use crate::models::{FavoriteSummary, ListingId};
use crate::notify::Notifier;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct State {
    favorites: BTreeSet<ListingId>,
    in_flight: HashSet<ListingId>,
}

/// Result of an add/remove/toggle that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Removed,
    /// Already in the requested state, nothing was sent
    Unchanged,
}

pub struct FavoriteOverlay<A> {
    api: Arc<A>,
    token: BearerToken,
    notifier: Notifier,
    state: Mutex<State>,
}

impl<A: FavoritesApi> FavoriteOverlay<A> {
    pub fn new(api: Arc<A>, token: BearerToken, notifier: Notifier) -> Self {
        Self {
            api,
            token,
            notifier,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_favorite(&self, id: ListingId) -> bool {
        self.state().favorites.contains(&id)
    }

    pub fn is_pending(&self, id: ListingId) -> bool {
        self.state().in_flight.contains(&id)
    }

    /// Current favorite ids, ascending
    pub fn ids(&self) -> Vec<ListingId> {
        self.state().favorites.iter().copied().collect()
    }

    /// Replace the local set with the server's view and return it
    pub async fn load(&self) -> Result<Vec<FavoriteSummary>> {
        self.require_login()?;

        let summaries = match self.api.favorites().await {
            Ok(summaries) => summaries,
            Err(err) => {
                self.notifier
                    .error(format!("Could not load favorites: {}", err.user_message()));
                return Err(err);
            }
        };

        let mut state = self.state();
        state.favorites = summaries.iter().map(|s| s.id).collect();
        info!(count = state.favorites.len(), "Loaded favorites");
        Ok(summaries)
    }

    /// Like [`load`](Self::load), keeping only the count
    pub async fn hydrate(&self) -> Result<usize> {
        self.load().await.map(|summaries| summaries.len())
    }

    /// Forget everything (on logout)
    pub fn clear(&self) {
        let mut state = self.state();
        state.favorites.clear();
        state.in_flight.clear();
    }

    pub async fn add(&self, id: ListingId) -> Result<Change> {
        self.set(id, true).await
    }

    pub async fn remove(&self, id: ListingId) -> Result<Change> {
        self.set(id, false).await
    }

    pub async fn toggle(&self, id: ListingId) -> Result<Change> {
        let wanted = !self.is_favorite(id);
        self.set(id, wanted).await
    }

    async fn set(&self, id: ListingId, wanted: bool) -> Result<Change> {
        self.require_login()?;

        {
            let mut state = self.state();
            if state.in_flight.contains(&id) {
                debug!(%id, "Favorite update already in flight");
                drop(state);
                let err = ApiError::InFlight(id);
                self.notifier.info(err.to_string());
                return Err(err);
            }
            if state.favorites.contains(&id) == wanted {
                return Ok(Change::Unchanged);
            }

            state.in_flight.insert(id);
            apply(&mut state.favorites, id, wanted);
        }

        let result = if wanted {
            self.api.add_favorite(id).await
        } else {
            self.api.remove_favorite(id).await
        };

        let mut state = self.state();
        state.in_flight.remove(&id);

        match result {
            Ok(()) => {
                drop(state);
                if wanted {
                    self.notifier.success("Added to favorites");
                    Ok(Change::Added)
                } else {
                    self.notifier.success("Removed from favorites");
                    Ok(Change::Removed)
                }
            }
            Err(err) => {
                apply(&mut state.favorites, id, !wanted);
                drop(state);
                self.notifier.error(format!(
                    "Could not update favorites for listing {}: {}",
                    id,
                    err.user_message()
                ));
                Err(err)
            }
        }
    }

    fn require_login(&self) -> Result<()> {
        if self.token.is_present() {
            Ok(())
        } else {
            self.notifier.info("Please log in to save favorites");
            Err(ApiError::AuthenticationRequired)
        }
    }
}

fn apply(favorites: &mut BTreeSet<ListingId>, id: ListingId, present: bool) {
    if present {
        favorites.insert(id);
    } else {
        favorites.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{self, Level, Notifications};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory favorites endpoint that can be told to fail
    #[derive(Default)]
    struct FakeFavorites {
        server: Mutex<BTreeSet<ListingId>>,
        fail: std::sync::atomic::AtomicBool,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FakeFavorites {
        fn failing() -> Self {
            let fake = Self::default();
            fake.fail.store(true, Ordering::SeqCst);
            fake
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        async fn call(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                Err(ApiError::Api {
                    status: 503,
                    message: "Service unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl FavoritesApi for FakeFavorites {
        async fn favorites(&self) -> Result<Vec<FavoriteSummary>> {
            Ok(self
                .server
                .lock()
                .unwrap()
                .iter()
                .map(|id| FavoriteSummary {
                    id: *id,
                    title: format!("Room {}", id),
                    monthly_rent: 9000.0,
                    city: "Pune".to_string(),
                    state: "Maharashtra".to_string(),
                    main_image_url: None,
                })
                .collect())
        }

        async fn add_favorite(&self, id: ListingId) -> Result<()> {
            self.call().await?;
            self.server.lock().unwrap().insert(id);
            Ok(())
        }

        async fn remove_favorite(&self, id: ListingId) -> Result<()> {
            self.call().await?;
            self.server.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn overlay(
        api: FakeFavorites,
        logged_in: bool,
    ) -> (FavoriteOverlay<FakeFavorites>, Arc<FakeFavorites>, Notifications) {
        let api = Arc::new(api);
        let token = BearerToken::default();
        if logged_in {
            token.set("token");
        }
        let (notifier, rx) = notify::channel();
        (FavoriteOverlay::new(api.clone(), token, notifier), api, rx)
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_original_set() {
        let (favorites, api, _rx) = overlay(FakeFavorites::default(), true);
        let before = favorites.ids();

        assert_eq!(favorites.toggle(ListingId(3)).await.unwrap(), Change::Added);
        assert!(favorites.is_favorite(ListingId(3)));
        assert!(api.server.lock().unwrap().contains(&ListingId(3)));

        assert_eq!(favorites.toggle(ListingId(3)).await.unwrap(), Change::Removed);
        assert_eq!(favorites.ids(), before);
        assert!(api.server.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_toggle_reverts_and_notifies() {
        let (favorites, _api, mut rx) = overlay(FakeFavorites::failing(), true);

        let err = favorites.toggle(ListingId(8)).await.unwrap_err();

        assert!(matches!(err, ApiError::Api { status: 503, .. }));
        assert!(!favorites.is_favorite(ListingId(8)));
        assert!(!favorites.is_pending(ListingId(8)));

        let shown = notify::drain(&mut rx);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].level, Level::Error);
        assert!(shown[0].message.contains("Service unavailable"));
    }

    #[tokio::test]
    async fn test_failed_remove_puts_favorite_back() {
        let (favorites, api, _rx) = overlay(FakeFavorites::default(), true);
        favorites.add(ListingId(2)).await.unwrap();
        api.fail.store(true, Ordering::SeqCst);

        assert!(favorites.remove(ListingId(2)).await.is_err());
        assert!(favorites.is_favorite(ListingId(2)));
    }

    #[tokio::test]
    async fn test_logged_out_viewer_rejected_before_request() {
        let (favorites, api, mut rx) = overlay(FakeFavorites::default(), false);

        let err = favorites.toggle(ListingId(1)).await.unwrap_err();

        assert!(matches!(err, ApiError::AuthenticationRequired));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(!favorites.is_favorite(ListingId(1)));
        let shown = notify::drain(&mut rx);
        assert_eq!(shown[0].level, Level::Info);
        assert!(shown[0].message.contains("log in"));
    }

    #[tokio::test]
    async fn test_second_toggle_while_in_flight_is_rejected() {
        let (favorites, api, _rx) = overlay(FakeFavorites::slow(Duration::from_millis(50)), true);

        let (first, second) = tokio::join!(favorites.toggle(ListingId(5)), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            favorites.toggle(ListingId(5)).await
        });

        assert_eq!(first.unwrap(), Change::Added);
        assert!(matches!(second, Err(ApiError::InFlight(ListingId(5)))));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(favorites.is_favorite(ListingId(5)));
    }

    #[tokio::test]
    async fn test_distinct_listings_toggle_concurrently() {
        let (favorites, api, _rx) = overlay(FakeFavorites::slow(Duration::from_millis(20)), true);

        let (a, b) = tokio::join!(favorites.add(ListingId(1)), favorites.add(ListingId(2)));

        assert_eq!(a.unwrap(), Change::Added);
        assert_eq!(b.unwrap(), Change::Added);
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert_eq!(favorites.ids(), vec![ListingId(1), ListingId(2)]);
    }

    #[tokio::test]
    async fn test_adding_existing_favorite_sends_nothing() {
        let (favorites, api, _rx) = overlay(FakeFavorites::default(), true);
        favorites.add(ListingId(4)).await.unwrap();

        assert_eq!(favorites.add(ListingId(4)).await.unwrap(), Change::Unchanged);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(favorites.ids(), vec![ListingId(4)]);
    }

    #[tokio::test]
    async fn test_hydrate_loads_server_set() {
        let (favorites, api, _rx) = overlay(FakeFavorites::default(), true);
        api.server.lock().unwrap().extend([ListingId(9), ListingId(7)]);

        assert_eq!(favorites.hydrate().await.unwrap(), 2);
        assert_eq!(favorites.ids(), vec![ListingId(7), ListingId(9)]);

        favorites.clear();
        assert!(favorites.ids().is_empty());
    }
}
