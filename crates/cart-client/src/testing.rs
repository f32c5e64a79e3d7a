//! In-memory [`CartBackend`] for tests.
//!
//! Every unit costs $10.00 USD. Updates can be held at a gate so tests can
//! issue changes while a request is in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use heritage_core::{
    Cart, CartCost, CartId, CartLine, CartLineId, Merchandise, MerchandiseProduct, Money,
    ProductId, Quantity, VariantId,
};

use crate::backend::CartBackend;
use crate::error::ClientError;

const UNIT_PRICE_CENTS: i64 = 1000;
const CURRENCY: &str = "USD";

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch,
    Add(String, Quantity),
    Update(CartLineId, Quantity),
    Remove(Vec<CartLineId>),
}

#[derive(Debug, Clone)]
struct FakeLine {
    id: CartLineId,
    variant: String,
    quantity: Quantity,
}

#[derive(Default)]
struct FakeState {
    cart_exists: bool,
    lines: Vec<FakeLine>,
    calls: Vec<Call>,
    failures: usize,
    next_line: usize,
}

impl FakeState {
    fn take_failure(&mut self) -> Result<(), ClientError> {
        if self.failures == 0 {
            return Ok(());
        }
        self.failures -= 1;
        Err(ClientError::Rejected {
            status: 502,
            message: "Cart service unavailable".to_string(),
            user_errors: Vec::new(),
        })
    }

    fn cart(&self) -> Cart {
        build_cart(&self.lines)
    }
}

/// Scripted cart backend.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    gate: Option<Arc<Semaphore>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// No cart yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            gate: None,
        }
    }

    /// An existing cart holding `lines` as `(line id, quantity)`.
    #[must_use]
    pub fn with_lines(lines: &[(&str, i64)]) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.lock();
            state.cart_exists = true;
            state.lines = cart_with(lines)
                .lines
                .into_iter()
                .map(|l| FakeLine {
                    id: l.id,
                    variant: l.merchandise.id.to_string(),
                    quantity: l.quantity,
                })
                .collect();
            state.next_line = lines.len();
        }
        backend
    }

    /// Hold every `update_line` call until [`Self::release`] grants a permit.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held updates proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Fail the next `n` calls.
    pub fn fail_next(&self, n: usize) {
        self.lock().failures = n;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Quantities sent by `update_line`, in order.
    #[must_use]
    pub fn updates(&self) -> Vec<Quantity> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Update(_, q) => Some(*q),
                _ => None,
            })
            .collect()
    }

    /// Yield until `n` updates have been received.
    ///
    /// # Panics
    ///
    /// Panics if they never arrive.
    pub async fn wait_for_updates(&self, n: usize) {
        for _ in 0..10_000 {
            if self.updates().len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} updates, saw {:?}", self.updates());
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartBackend for FakeBackend {
    async fn fetch(&self) -> Result<Option<Cart>, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::Fetch);
        state.take_failure()?;
        Ok(state.cart_exists.then(|| state.cart()))
    }

    async fn add_item(&self, variant: &str, quantity: Quantity) -> Result<Cart, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::Add(variant.to_string(), quantity));
        state.take_failure()?;

        state.cart_exists = true;
        if let Some(line) = state.lines.iter_mut().find(|l| l.variant == variant) {
            line.quantity = quantity_of(i64::from(line.quantity.get()) + i64::from(quantity.get()));
        } else {
            state.next_line += 1;
            let id = line_id(&format!("line-{}", state.next_line));
            state.lines.push(FakeLine {
                id,
                variant: variant.to_string(),
                quantity,
            });
        }
        Ok(state.cart())
    }

    async fn update_line(&self, line: &CartLineId, quantity: Quantity) -> Result<Cart, ClientError> {
        self.lock().calls.push(Call::Update(line.clone(), quantity));

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| ClientError::Unexpected(e.to_string()))?;
            permit.forget();
        }

        let mut state = self.lock();
        state.take_failure()?;
        if let Some(l) = state.lines.iter_mut().find(|l| &l.id == line) {
            l.quantity = quantity;
        }
        Ok(state.cart())
    }

    async fn remove_lines(&self, lines: &[CartLineId]) -> Result<Cart, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call::Remove(lines.to_vec()));
        state.take_failure()?;
        state.lines.retain(|l| !lines.contains(&l.id));
        Ok(state.cart())
    }
}

/// A cart with `lines` as `(line id, quantity)` at $10.00 per unit.
///
/// # Panics
///
/// Panics on a blank line id or a quantity below one.
#[must_use]
pub fn cart_with(lines: &[(&str, i64)]) -> Cart {
    let lines: Vec<FakeLine> = lines
        .iter()
        .enumerate()
        .map(|(i, (id, quantity))| FakeLine {
            id: line_id(id),
            variant: variant_gid(i + 1),
            quantity: quantity_of(*quantity),
        })
        .collect();
    build_cart(&lines)
}

fn build_cart(lines: &[FakeLine]) -> Cart {
    let unit = Decimal::new(UNIT_PRICE_CENTS, 2);
    let lines: Vec<CartLine> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| CartLine {
            id: line.id.clone(),
            quantity: line.quantity,
            merchandise: Merchandise {
                id: VariantId::parse(&line.variant).unwrap_or_else(|e| panic!("{e}")),
                title: "Default Title".to_string(),
                price: Money::new(unit, CURRENCY),
                product: MerchandiseProduct {
                    id: ProductId::parse(&format!("gid://shopify/Product/{}", i + 1))
                        .unwrap_or_else(|e| panic!("{e}")),
                    handle: format!("product-{}", i + 1),
                    title: format!("Product {}", i + 1),
                    featured_image: None,
                },
            },
            line_total: Money::new(unit * Decimal::from(line.quantity.get()), CURRENCY),
        })
        .collect();

    let total_quantity = lines.iter().map(|l| l.quantity.get()).sum::<u32>();
    let subtotal = Money::new(unit * Decimal::from(total_quantity), CURRENCY);
    Cart {
        id: CartId::parse("gid://shopify/Cart/test").unwrap_or_else(|e| panic!("{e}")),
        checkout_url: "https://checkout.example/cart/test".to_string(),
        total_quantity,
        cost: CartCost {
            subtotal: subtotal.clone(),
            total: subtotal,
        },
        lines,
    }
}

fn line_id(id: &str) -> CartLineId {
    CartLineId::parse(id).unwrap_or_else(|e| panic!("{e}"))
}

fn quantity_of(n: i64) -> Quantity {
    Quantity::new(n).unwrap_or_else(|e| panic!("{e}"))
}

fn variant_gid(n: usize) -> String {
    format!("gid://shopify/ProductVariant/{n}")
}
