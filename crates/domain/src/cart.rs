use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One product entry in a customer's cart. `price` is a snapshot taken at
/// add time, not a live catalog reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("product not in cart")]
    ProductNotInCart,
}

/// The cart aggregate: an ordered list of lines and a derived total.
///
/// Invariants held after every mutation:
/// - `total == Σ price × quantity` over all lines (recomputed, never trusted
///   from storage);
/// - at most one line per distinct product id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl Cart {
    /// The shape returned for customers that have no cart yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Merges a line into the cart. An existing line for the same product id
    /// gains the added quantity, and its name/price/image are overwritten
    /// with the supplied values ("latest wins" for display attributes,
    /// cumulative for quantity — intentional price-refresh behavior, pending
    /// product-owner confirmation). Unknown product ids append a new line.
    pub fn add_or_update_line(&mut self, line: CartLine) {
        match self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            Some(existing) => {
                existing.quantity += line.quantity;
                existing.name = line.name;
                existing.price = line.price;
                existing.image = line.image;
            }
            None => self.lines.push(line),
        }
        self.recompute_total();
    }

    /// Overwrites a line's quantity. A quantity of zero or less removes the
    /// line instead.
    pub fn set_line_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::ProductNotInCart)?;

        if quantity <= 0 {
            self.lines.retain(|l| l.product_id != product_id);
        } else {
            line.quantity = quantity as u32;
        }
        self.recompute_total();
        Ok(())
    }

    /// Filters out the matching line. Removing a product that is not in the
    /// cart is a no-op; the caller decides whether the now-empty cart should
    /// be deleted from storage.
    pub fn remove_line(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total = self.lines.iter().map(CartLine::line_total).sum();
    }
}
