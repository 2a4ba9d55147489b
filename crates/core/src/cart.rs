//! Cart snapshots and the optimistic cart projection.
//!
//! Shopify owns the cart. The storefront keeps the last snapshot it received
//! and, while a mutation is in flight, shows that snapshot with the
//! mutation's expected effect applied. Once Shopify answers, its cart always
//! replaces the projection; if the mutation fails, the projection falls back
//! to the last snapshot.
//!
//! ```text
//! Idle ──begin──▶ Pending(delta) ──confirm──▶ Confirmed
//!                       │
//!                       └──rollback──▶ RolledBack
//! ```

use serde::{Deserialize, Serialize};

/// Errors from driving the [`OptimisticCart`] state machine out of order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimisticError {
    /// A mutation is already in flight.
    #[error("a cart mutation is already pending")]
    AlreadyPending,
    /// There is no in-flight mutation to roll back.
    #[error("no cart mutation is pending")]
    NotPending,
}

/// One line of a cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineSnapshot {
    /// Shopify cart line ID. `None` for a line that only exists optimistically.
    pub line_id: Option<String>,
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity on the line.
    pub quantity: u32,
}

/// The parts of a Shopify cart the storefront projects optimistically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Shopify cart ID, absent until the first line is added.
    pub id: Option<String>,
    /// Cart lines in Shopify order.
    pub lines: Vec<CartLineSnapshot>,
}

impl CartSnapshot {
    /// An empty cart with no Shopify ID yet.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            id: None,
            lines: Vec::new(),
        }
    }

    /// Total item quantity across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The expected effect of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartDelta {
    /// Add `quantity` units of a variant. Shopify merges into an existing line
    /// for the same variant.
    AddLine {
        merchandise_id: String,
        quantity: u32,
    },
    /// Set a line's quantity. Zero removes the line.
    UpdateQuantity { line_id: String, quantity: u32 },
    /// Remove a line.
    RemoveLine { line_id: String },
}

impl CartDelta {
    /// Apply this delta to a snapshot, producing the expected cart.
    ///
    /// Deltas that reference unknown lines leave the snapshot unchanged.
    #[must_use]
    pub fn apply(&self, snapshot: &CartSnapshot) -> CartSnapshot {
        let mut next = snapshot.clone();
        match self {
            Self::AddLine {
                merchandise_id,
                quantity,
            } => {
                if let Some(line) = next
                    .lines
                    .iter_mut()
                    .find(|line| &line.merchandise_id == merchandise_id)
                {
                    line.quantity = line.quantity.saturating_add(*quantity);
                } else {
                    next.lines.push(CartLineSnapshot {
                        line_id: None,
                        merchandise_id: merchandise_id.clone(),
                        quantity: *quantity,
                    });
                }
            }
            Self::UpdateQuantity { line_id, quantity } if *quantity == 0 => {
                next.lines
                    .retain(|line| line.line_id.as_deref() != Some(line_id.as_str()));
            }
            Self::UpdateQuantity { line_id, quantity } => {
                if let Some(line) = next
                    .lines
                    .iter_mut()
                    .find(|line| line.line_id.as_deref() == Some(line_id.as_str()))
                {
                    line.quantity = *quantity;
                }
            }
            Self::RemoveLine { line_id } => {
                next.lines
                    .retain(|line| line.line_id.as_deref() != Some(line_id.as_str()));
            }
        }
        next
    }
}

/// Externally visible phase of an [`OptimisticCart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimisticPhase {
    Idle,
    Pending,
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Pending(CartDelta),
    Confirmed,
    RolledBack,
}

/// Local projection of a cart reconciled against Shopify's answers.
#[derive(Debug, Clone)]
pub struct OptimisticCart {
    authoritative: CartSnapshot,
    state: State,
}

impl OptimisticCart {
    /// Start from the last snapshot received from Shopify.
    #[must_use]
    pub const fn new(authoritative: CartSnapshot) -> Self {
        Self {
            authoritative,
            state: State::Idle,
        }
    }

    /// Record an in-flight mutation.
    ///
    /// # Errors
    ///
    /// Returns [`OptimisticError::AlreadyPending`] if another mutation has not
    /// settled yet.
    pub fn begin(&mut self, delta: CartDelta) -> Result<(), OptimisticError> {
        if matches!(self.state, State::Pending(_)) {
            return Err(OptimisticError::AlreadyPending);
        }
        self.state = State::Pending(delta);
        Ok(())
    }

    /// Accept Shopify's cart. It replaces whatever was projected.
    pub fn confirm(&mut self, server: CartSnapshot) {
        self.authoritative = server;
        self.state = State::Confirmed;
    }

    /// Drop the in-flight mutation after it failed.
    ///
    /// # Errors
    ///
    /// Returns [`OptimisticError::NotPending`] if nothing is in flight.
    pub fn rollback(&mut self) -> Result<(), OptimisticError> {
        if !matches!(self.state, State::Pending(_)) {
            return Err(OptimisticError::NotPending);
        }
        self.state = State::RolledBack;
        Ok(())
    }

    /// The cart the UI should show right now.
    #[must_use]
    pub fn projection(&self) -> CartSnapshot {
        match &self.state {
            State::Pending(delta) => delta.apply(&self.authoritative),
            State::Idle | State::Confirmed | State::RolledBack => self.authoritative.clone(),
        }
    }

    /// The last snapshot Shopify confirmed.
    #[must_use]
    pub const fn authoritative(&self) -> &CartSnapshot {
        &self.authoritative
    }

    /// The in-flight mutation, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&CartDelta> {
        match &self.state {
            State::Pending(delta) => Some(delta),
            _ => None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> OptimisticPhase {
        match self.state {
            State::Idle => OptimisticPhase::Idle,
            State::Pending(_) => OptimisticPhase::Pending,
            State::Confirmed => OptimisticPhase::Confirmed,
            State::RolledBack => OptimisticPhase::RolledBack,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, merchandise: &str, quantity: u32) -> CartLineSnapshot {
        CartLineSnapshot {
            line_id: Some(id.to_string()),
            merchandise_id: merchandise.to_string(),
            quantity,
        }
    }

    fn snapshot() -> CartSnapshot {
        CartSnapshot {
            id: Some("gid://shopify/Cart/1".to_string()),
            lines: vec![line("L1", "V1", 2), line("L2", "V2", 1)],
        }
    }

    #[test]
    fn test_add_line_merges_same_variant() {
        let next = CartDelta::AddLine {
            merchandise_id: "V1".to_string(),
            quantity: 3,
        }
        .apply(&snapshot());
        assert_eq!(next.lines.len(), 2);
        assert_eq!(next.total_quantity(), 6);
    }

    #[test]
    fn test_add_line_appends_new_variant() {
        let next = CartDelta::AddLine {
            merchandise_id: "V3".to_string(),
            quantity: 1,
        }
        .apply(&CartSnapshot::empty());
        assert_eq!(next.lines.len(), 1);
        assert_eq!(next.lines[0].line_id, None);
        assert_eq!(next.total_quantity(), 1);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let next = CartDelta::UpdateQuantity {
            line_id: "L1".to_string(),
            quantity: 0,
        }
        .apply(&snapshot());
        assert_eq!(next.lines, vec![line("L2", "V2", 1)]);
    }

    #[test]
    fn test_unknown_line_is_noop() {
        let next = CartDelta::RemoveLine {
            line_id: "missing".to_string(),
        }
        .apply(&snapshot());
        assert_eq!(next, snapshot());
    }

    #[test]
    fn test_pending_projection_then_confirm() {
        let mut cart = OptimisticCart::new(snapshot());
        assert_eq!(cart.phase(), OptimisticPhase::Idle);

        cart.begin(CartDelta::RemoveLine {
            line_id: "L2".to_string(),
        })
        .unwrap();
        assert_eq!(cart.phase(), OptimisticPhase::Pending);
        assert_eq!(cart.projection().total_quantity(), 2);
        assert_eq!(cart.authoritative().total_quantity(), 3);

        // Shopify's answer wins even when it disagrees with the projection.
        let server = CartSnapshot {
            id: Some("gid://shopify/Cart/1".to_string()),
            lines: vec![line("L1", "V1", 5)],
        };
        cart.confirm(server.clone());
        assert_eq!(cart.phase(), OptimisticPhase::Confirmed);
        assert_eq!(cart.projection(), server);
        assert!(cart.pending().is_none());
    }

    #[test]
    fn test_rollback_restores_previous_snapshot() {
        let mut cart = OptimisticCart::new(snapshot());
        cart.begin(CartDelta::AddLine {
            merchandise_id: "V9".to_string(),
            quantity: 4,
        })
        .unwrap();
        assert_eq!(cart.projection().total_quantity(), 7);

        cart.rollback().unwrap();
        assert_eq!(cart.phase(), OptimisticPhase::RolledBack);
        assert_eq!(cart.projection(), snapshot());
    }

    #[test]
    fn test_out_of_order_transitions() {
        let mut cart = OptimisticCart::new(CartSnapshot::empty());
        assert_eq!(cart.rollback(), Err(OptimisticError::NotPending));

        let delta = CartDelta::AddLine {
            merchandise_id: "V1".to_string(),
            quantity: 1,
        };
        cart.begin(delta.clone()).unwrap();
        assert_eq!(cart.begin(delta.clone()), Err(OptimisticError::AlreadyPending));

        cart.rollback().unwrap();
        // A settled cart accepts the next mutation.
        assert!(cart.begin(delta).is_ok());
    }
}
