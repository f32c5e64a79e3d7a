//! Per-line optimistic quantity state.

use heritage_core::Quantity;

/// What the shopper sees for one cart line.
///
/// ```text
/// Stable(q) --request(r)--> Pending { confirmed: q, requested: r }
/// Pending   --confirm(s)--> Stable(s)
/// Pending   --rollback()--> Stable(confirmed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Stable(Quantity),
    Pending {
        confirmed: Quantity,
        requested: Quantity,
    },
}

impl LineState {
    /// The quantity to display.
    #[must_use]
    pub const fn displayed(self) -> Quantity {
        match self {
            Self::Stable(q) | Self::Pending { requested: q, .. } => q,
        }
    }

    /// The last quantity the server confirmed.
    #[must_use]
    pub const fn confirmed(self) -> Quantity {
        match self {
            Self::Stable(q) | Self::Pending { confirmed: q, .. } => q,
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Show `requested` while keeping the confirmed quantity for rollback.
    #[must_use]
    pub const fn request(self, requested: Quantity) -> Self {
        Self::Pending {
            confirmed: self.confirmed(),
            requested,
        }
    }

    /// The server settled on `server`.
    #[must_use]
    pub const fn confirm(server: Quantity) -> Self {
        Self::Stable(server)
    }

    /// The request failed; fall back to the confirmed quantity.
    #[must_use]
    pub const fn rollback(self) -> Self {
        Self::Stable(self.confirmed())
    }

    /// Server state changed underneath a line. A pending request keeps its
    /// displayed intent but rolls back to the new confirmed quantity.
    #[must_use]
    pub const fn rebase(self, server: Quantity) -> Self {
        match self {
            Self::Stable(_) => Self::Stable(server),
            Self::Pending { requested, .. } => Self::Pending {
                confirmed: server,
                requested,
            },
        }
    }
}
