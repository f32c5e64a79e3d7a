//! Shared client cart state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument, warn};

use heritage_core::{Cart, CartLineId, Quantity, VariantId};

use crate::backend::CartBackend;
use crate::error::ClientError;
use crate::line::LineState;

/// Capacity of the notice channel; slow listeners miss the oldest notices.
const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message for the shopper (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// How a quantity change was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Sent and settled by the server.
    Applied,
    /// Another request for the line is in flight; this intent replaced any
    /// queued one and is sent when that request completes.
    Coalesced,
    /// Nothing to do.
    Ignored,
}

/// What every consumer renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Last cart confirmed by the server.
    pub cart: Option<Cart>,
    /// Optimistic state of each line in `cart`.
    pub lines: HashMap<CartLineId, LineState>,
}

impl CartSnapshot {
    #[must_use]
    pub fn line_state(&self, line: &CartLineId) -> Option<LineState> {
        self.lines.get(line).copied()
    }

    /// Quantity to show for a line, optimistic value first.
    #[must_use]
    pub fn displayed_quantity(&self, line: &CartLineId) -> Option<Quantity> {
        self.line_state(line).map(LineState::displayed).or_else(|| {
            self.cart
                .as_ref()
                .and_then(|cart| cart.line(line))
                .map(|l| l.quantity)
        })
    }

    /// Item count including pending changes.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, |cart| {
            cart.lines
                .iter()
                .filter_map(|l| self.displayed_quantity(&l.id))
                .map(Quantity::get)
                .sum()
        })
    }

    /// Whether any line awaits the server.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lines.values().any(|s| s.is_pending())
    }
}

/// Where a server cart came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// A plain read; loses to anything sent after it.
    Fetch,
    /// The cart the server returned for one of our writes. The server applies
    /// writes to a cart in order, so the response to a write reflects it and
    /// everything before it.
    Write,
}

#[derive(Default)]
struct Inner {
    cart: Option<Cart>,
    lines: HashMap<CartLineId, LineState>,
    in_flight: HashSet<CartLineId>,
    queued: HashMap<CartLineId, Quantity>,
    /// Sequence number of the last request sent.
    sent: u64,
    /// Highest sequence number whose cart was adopted.
    applied: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.sent += 1;
        self.sent
    }

    /// Adopt a server cart. Write responses always win; a fetch is dropped
    /// when a later request already answered.
    fn apply(&mut self, seq: u64, origin: Origin, cart: Option<Cart>) {
        if origin == Origin::Fetch && seq <= self.applied {
            debug!(seq, applied = self.applied, "Ignoring stale cart");
            return;
        }
        self.applied = self.applied.max(seq);

        let mut lines = HashMap::new();
        if let Some(cart) = &cart {
            for line in &cart.lines {
                let state = self
                    .lines
                    .get(&line.id)
                    .map_or(LineState::Stable(line.quantity), |s| s.rebase(line.quantity));
                lines.insert(line.id.clone(), state);
            }
        }
        self.queued.retain(|id, _| lines.contains_key(id));
        self.lines = lines;
        self.cart = cart;
    }

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            cart: self.cart.clone(),
            lines: self.lines.clone(),
        }
    }
}

/// Client cart store.
///
/// Cheap to clone; clones share state, so UI handlers can each hold one.
/// At most one update per line is in flight; later intents for that line are
/// coalesced into a single follow-up request.
pub struct CartStore<B> {
    backend: Arc<B>,
    inner: Arc<Mutex<Inner>>,
    snapshot: Arc<watch::Sender<CartSnapshot>>,
    notices: broadcast::Sender<Notice>,
}

impl<B> Clone for CartStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            inner: Arc::clone(&self.inner),
            snapshot: Arc::clone(&self.snapshot),
            notices: self.notices.clone(),
        }
    }
}

impl<B: CartBackend> CartStore<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        let (snapshot, _) = watch::channel(CartSnapshot::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            backend: Arc::new(backend),
            inner: Arc::new(Mutex::new(Inner::default())),
            snapshot: Arc::new(snapshot),
            notices,
        }
    }

    /// Receive every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot.subscribe()
    }

    /// Receive shopper-facing notices.
    #[must_use]
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshot.borrow().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot.send_replace(inner.snapshot());
    }

    fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        // No listeners is fine.
        let _ = self.notices.send(Notice {
            kind,
            message: message.into(),
        });
    }

    /// Reload the cart. On failure the last known cart is kept.
    ///
    /// # Errors
    ///
    /// Returns the backend error after logging it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let seq = self.lock().next_seq();
        match self.backend.fetch().await {
            Ok(cart) => {
                let mut inner = self.lock();
                inner.apply(seq, Origin::Fetch, cart);
                self.publish(&inner);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Cart refresh failed; keeping last known cart");
                Err(e)
            }
        }
    }

    /// Add a variant.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a bad variant or quantity (nothing is
    /// sent), otherwise the backend error.
    #[instrument(skip(self))]
    pub async fn add_item(&self, variant: &str, quantity: i64) -> Result<(), ClientError> {
        let variant = VariantId::parse(variant)?;
        let quantity = Quantity::new(quantity)?;

        let seq = self.lock().next_seq();
        match self.backend.add_item(variant.as_str(), quantity).await {
            Ok(cart) => {
                let mut inner = self.lock();
                inner.apply(seq, Origin::Write, Some(cart));
                self.publish(&inner);
                drop(inner);
                self.notify(NoticeKind::Success, "Added to cart.");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Add to cart failed");
                self.notify(NoticeKind::Error, "Could not add item. Please try again.");
                Err(e)
            }
        }
    }

    /// Set a line's quantity optimistically.
    ///
    /// Returns once the server settled this line, or immediately with
    /// [`Dispatch::Coalesced`] when another request for the line is in
    /// flight.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a quantity below one or an unknown line
    /// (nothing is sent). A backend error rolls the line back to its last
    /// confirmed quantity and drops any queued intent.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        line: &CartLineId,
        quantity: i64,
    ) -> Result<Dispatch, ClientError> {
        let quantity = Quantity::new(quantity)?;

        {
            let mut inner = self.lock();
            let state = inner
                .lines
                .get(line)
                .copied()
                .ok_or_else(|| ClientError::Validation("line is not in the cart".to_string()))?;

            if inner.in_flight.contains(line) {
                // Latest intent wins; the in-flight response decides whether
                // it still needs sending.
                inner.queued.insert(line.clone(), quantity);
                inner.lines.insert(line.clone(), state.request(quantity));
                self.publish(&inner);
                return Ok(Dispatch::Coalesced);
            }
            if state == LineState::Stable(quantity) {
                return Ok(Dispatch::Ignored);
            }

            inner.lines.insert(line.clone(), state.request(quantity));
            inner.in_flight.insert(line.clone());
            self.publish(&inner);
        }

        self.drive(line, quantity).await?;
        Ok(Dispatch::Applied)
    }

    /// Send updates for `line` until no intent is queued.
    async fn drive(&self, line: &CartLineId, mut quantity: Quantity) -> Result<(), ClientError> {
        loop {
            let seq = self.lock().next_seq();
            let result = self.backend.update_line(line, quantity).await;

            let mut inner = self.lock();
            match result {
                Ok(cart) => {
                    let server = cart.line(line).map(|l| l.quantity);
                    inner.apply(seq, Origin::Write, Some(cart));
                    let Some(server) = server.filter(|_| inner.lines.contains_key(line)) else {
                        // Removed while the update was in flight.
                        inner.in_flight.remove(line);
                        inner.queued.remove(line);
                        self.publish(&inner);
                        return Ok(());
                    };

                    match inner.queued.remove(line) {
                        Some(next) if next != server => {
                            inner.lines.insert(
                                line.clone(),
                                LineState::Pending {
                                    confirmed: server,
                                    requested: next,
                                },
                            );
                            self.publish(&inner);
                            quantity = next;
                        }
                        _ => {
                            inner.lines.insert(line.clone(), LineState::confirm(server));
                            inner.in_flight.remove(line);
                            self.publish(&inner);
                            drop(inner);
                            self.notify(
                                NoticeKind::Success,
                                format!("Updated to quantity {server}"),
                            );
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    if let Some(state) = inner.lines.get_mut(line) {
                        *state = state.rollback();
                    }
                    inner.queued.remove(line);
                    inner.in_flight.remove(line);
                    self.publish(&inner);
                    drop(inner);
                    warn!(
                        line = %line,
                        error = %e,
                        retryable = !e.is_client_error(),
                        "Quantity update failed; rolled back"
                    );
                    self.notify(
                        NoticeKind::Error,
                        "Could not update quantity. Please try again.",
                    );
                    return Err(e);
                }
            }
        }
    }

    /// One more than the displayed quantity.
    ///
    /// # Errors
    ///
    /// See [`Self::set_quantity`].
    pub async fn increment(&self, line: &CartLineId) -> Result<Dispatch, ClientError> {
        let current = self.displayed(line)?;
        self.set_quantity(line, i64::from(current.increment().get()))
            .await
    }

    /// One less than the displayed quantity; ignored at one.
    ///
    /// # Errors
    ///
    /// See [`Self::set_quantity`].
    pub async fn decrement(&self, line: &CartLineId) -> Result<Dispatch, ClientError> {
        let current = self.displayed(line)?;
        match current.decrement() {
            Some(next) => self.set_quantity(line, i64::from(next.get())).await,
            None => Ok(Dispatch::Ignored),
        }
    }

    fn displayed(&self, line: &CartLineId) -> Result<Quantity, ClientError> {
        self.lock()
            .lines
            .get(line)
            .map(|s| s.displayed())
            .ok_or_else(|| ClientError::Validation("line is not in the cart".to_string()))
    }

    /// Remove a line. Any queued quantity change for it is dropped.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for an unknown line, otherwise the backend
    /// error.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, line: &CartLineId) -> Result<(), ClientError> {
        let seq = {
            let mut inner = self.lock();
            if !inner.lines.contains_key(line) {
                return Err(ClientError::Validation(
                    "line is not in the cart".to_string(),
                ));
            }
            inner.queued.remove(line);
            inner.next_seq()
        };

        match self.backend.remove_lines(std::slice::from_ref(line)).await {
            Ok(cart) => {
                let mut inner = self.lock();
                inner.apply(seq, Origin::Write, Some(cart));
                self.publish(&inner);
                drop(inner);
                self.notify(NoticeKind::Success, "Item removed from cart.");
                Ok(())
            }
            Err(e) => {
                warn!(line = %line, error = %e, "Remove failed");
                self.notify(NoticeKind::Error, "Could not remove item. Please try again.");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use heritage_core::Money;
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::{Call, FakeBackend, cart_with};
    use crate::views::{BadgeView, CartPageView};

    fn q(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    async fn loaded(backend: FakeBackend) -> (CartStore<FakeBackend>, CartLineId) {
        let store = CartStore::new(backend);
        store.refresh().await.unwrap();
        (store, CartLineId::parse("line-1").unwrap())
    }

    #[tokio::test]
    async fn test_refresh_without_cart() {
        let store = CartStore::new(FakeBackend::new());
        store.refresh().await.unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.cart.is_none());
        assert_eq!(snapshot.item_count(), 0);
    }

    #[tokio::test]
    async fn test_rapid_changes_coalesce_into_two_updates() {
        let backend = FakeBackend::with_lines(&[("line-1", 1)]).gated();
        let (store, line) = loaded(backend.clone()).await;

        let first = tokio::spawn({
            let store = store.clone();
            let line = line.clone();
            async move { store.set_quantity(&line, 2).await }
        });
        backend.wait_for_updates(1).await;

        assert_eq!(store.set_quantity(&line, 3).await.unwrap(), Dispatch::Coalesced);
        assert_eq!(store.set_quantity(&line, 4).await.unwrap(), Dispatch::Coalesced);
        assert_eq!(store.snapshot().displayed_quantity(&line), Some(q(4)));
        assert!(store.snapshot().is_pending());

        backend.release(2);
        assert_eq!(first.await.unwrap().unwrap(), Dispatch::Applied);

        assert_eq!(backend.updates(), vec![q(2), q(4)]);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.line_state(&line), Some(LineState::Stable(q(4))));
        assert_eq!(snapshot.cart.unwrap().total_quantity, 4);
    }

    #[tokio::test]
    async fn test_queued_intent_matching_server_is_dropped() {
        let backend = FakeBackend::with_lines(&[("line-1", 1)]).gated();
        let (store, line) = loaded(backend.clone()).await;

        let first = tokio::spawn({
            let store = store.clone();
            let line = line.clone();
            async move { store.set_quantity(&line, 2).await }
        });
        backend.wait_for_updates(1).await;
        store.set_quantity(&line, 3).await.unwrap();
        store.set_quantity(&line, 2).await.unwrap();

        backend.release(1);
        first.await.unwrap().unwrap();
        assert_eq!(backend.updates(), vec![q(2)]);
        assert_eq!(store.snapshot().line_state(&line), Some(LineState::Stable(q(2))));
    }

    #[tokio::test]
    async fn test_failure_rolls_back_to_confirmed() {
        let backend = FakeBackend::with_lines(&[("line-1", 2)]);
        let (store, line) = loaded(backend.clone()).await;
        let mut notices = store.notices();

        backend.fail_next(1);
        let err = store.set_quantity(&line, 5).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 502, .. }));

        assert_eq!(store.snapshot().line_state(&line), Some(LineState::Stable(q(2))));
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Could not update quantity. Please try again.");
    }

    #[tokio::test]
    async fn test_update_emits_success_notice() {
        let (store, line) = loaded(FakeBackend::with_lines(&[("line-1", 1)])).await;
        let mut notices = store.notices();

        assert_eq!(store.increment(&line).await.unwrap(), Dispatch::Applied);
        assert_eq!(notices.recv().await.unwrap().message, "Updated to quantity 2");
    }

    #[tokio::test]
    async fn test_decrement_at_one_is_ignored() {
        let backend = FakeBackend::with_lines(&[("line-1", 1)]);
        let (store, line) = loaded(backend.clone()).await;

        assert_eq!(store.decrement(&line).await.unwrap(), Dispatch::Ignored);
        assert!(backend.updates().is_empty());
    }

    #[tokio::test]
    async fn test_same_quantity_is_ignored() {
        let backend = FakeBackend::with_lines(&[("line-1", 3)]);
        let (store, line) = loaded(backend.clone()).await;

        assert_eq!(store.set_quantity(&line, 3).await.unwrap(), Dispatch::Ignored);
        assert!(backend.updates().is_empty());
    }

    #[tokio::test]
    async fn test_zero_is_rejected_without_a_request() {
        let backend = FakeBackend::with_lines(&[("line-1", 3)]);
        let (store, line) = loaded(backend.clone()).await;

        let err = store.set_quantity(&line, 0).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(backend.updates().is_empty());
        assert_eq!(store.snapshot().displayed_quantity(&line), Some(q(3)));
    }

    #[tokio::test]
    async fn test_remove_drops_queued_intent() {
        let backend = FakeBackend::with_lines(&[("line-1", 1), ("line-2", 1)]).gated();
        let (store, line) = loaded(backend.clone()).await;

        let first = tokio::spawn({
            let store = store.clone();
            let line = line.clone();
            async move { store.set_quantity(&line, 2).await }
        });
        backend.wait_for_updates(1).await;
        store.set_quantity(&line, 5).await.unwrap();

        store.remove_line(&line).await.unwrap();
        backend.release(1);
        first.await.unwrap().unwrap();

        assert_eq!(backend.updates(), vec![q(2)]);
        let snapshot = store.snapshot();
        assert!(snapshot.line_state(&line).is_none());
        assert_eq!(snapshot.item_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_last_cart() {
        let backend = FakeBackend::with_lines(&[("line-1", 2)]);
        let (store, _) = loaded(backend.clone()).await;

        backend.fail_next(1);
        assert!(store.refresh().await.is_err());
        assert_eq!(store.snapshot().item_count(), 2);
    }

    #[tokio::test]
    async fn test_add_item_normalizes_variant() {
        let backend = FakeBackend::new();
        let store = CartStore::new(backend.clone());
        let mut snapshots = store.subscribe();

        store.add_item("42", 2).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::Add("gid://shopify/ProductVariant/42".to_string(), q(2))]
        );
        assert!(snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update().item_count(), 2);
    }

    #[tokio::test]
    async fn test_add_item_rejects_bad_input() {
        let backend = FakeBackend::new();
        let store = CartStore::new(backend.clone());

        assert!(matches!(
            store.add_item("gid://shopify/Product/1", 1).await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            store.add_item("42", 0).await,
            Err(ClientError::Validation(_))
        ));
        assert!(backend.calls().is_empty());
    }

    /// Every consumer agrees with the held cart once nothing is pending.
    fn assert_settled(snapshot: &CartSnapshot) {
        let cart = snapshot.cart.as_ref().unwrap();
        assert!(!snapshot.is_pending());
        assert_eq!(BadgeView::from(snapshot).count, cart.total_quantity);

        let page = CartPageView::from(snapshot);
        for (shown, line) in page.drawer.lines.iter().zip(&cart.lines) {
            assert_eq!(shown.quantity, line.quantity);
            assert_eq!(shown.line_total, line.line_total);
        }
        assert!(!page.drawer.subtotal_pending);
        assert_eq!(page.drawer.subtotal.as_ref(), Some(&cart.cost.subtotal));
        assert_eq!(page.checkout_url.as_deref(), Some(cart.checkout_url.as_str()));
    }

    #[tokio::test]
    async fn test_refresh_during_update_does_not_hide_the_update() {
        let backend = FakeBackend::with_lines(&[("line-1", 1)]).gated();
        let (store, line) = loaded(backend.clone()).await;

        let update = tokio::spawn({
            let store = store.clone();
            let line = line.clone();
            async move { store.set_quantity(&line, 3).await }
        });
        backend.wait_for_updates(1).await;

        // Answers with the cart as it was before the update.
        store.refresh().await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.cart.as_ref().unwrap().total_quantity, 1);
        assert_eq!(
            snapshot.line_state(&line),
            Some(LineState::Pending {
                confirmed: q(1),
                requested: q(3)
            })
        );
        assert!(CartPageView::from(&snapshot).checkout_url.is_none());

        backend.release(1);
        assert_eq!(update.await.unwrap().unwrap(), Dispatch::Applied);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.line_state(&line), Some(LineState::Stable(q(3))));
        assert_eq!(snapshot.cart.as_ref().unwrap().total_quantity, 3);
        let drawer = CartPageView::from(&snapshot).drawer;
        assert_eq!(drawer.lines[0].line_total, Money::new(Decimal::new(3000, 2), "USD"));
        assert_settled(&snapshot);
    }

    #[tokio::test]
    async fn test_add_during_update_keeps_both_changes() {
        let backend = FakeBackend::with_lines(&[("line-1", 1)]).gated();
        let (store, line) = loaded(backend.clone()).await;

        let update = tokio::spawn({
            let store = store.clone();
            let line = line.clone();
            async move { store.set_quantity(&line, 3).await }
        });
        backend.wait_for_updates(1).await;

        store.add_item("99", 2).await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.cart.as_ref().unwrap().lines.len(), 2);
        assert!(snapshot.line_state(&line).unwrap().is_pending());
        assert_eq!(snapshot.item_count(), 5);

        backend.release(1);
        update.await.unwrap().unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.cart.as_ref().unwrap().total_quantity, 5);
        assert_settled(&snapshot);
    }

    #[test]
    fn test_stale_refresh_is_ignored() {
        let backend = FakeBackend::with_lines(&[("line-1", 1)]);
        let store = CartStore::new(backend);
        let line = CartLineId::parse("line-1").unwrap();

        let mut inner = store.lock();
        let fetch = inner.next_seq();
        let write = inner.next_seq();
        inner.apply(write, Origin::Write, Some(cart_with(&[("line-1", 4)])));
        inner.apply(fetch, Origin::Fetch, Some(cart_with(&[("line-1", 1)])));

        assert_eq!(inner.lines.get(&line), Some(&LineState::Stable(q(4))));
        assert_eq!(inner.cart.as_ref().unwrap().total_quantity, 4);
    }
}
