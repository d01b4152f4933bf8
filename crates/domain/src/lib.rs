//! Pure business logic for the Gearstore storefront.
//!
//! Everything in this crate is I/O-free: the cart aggregate, the checkout
//! form validation, order payload validation and payment redaction, and the
//! review statistics aggregation. The gateway crate wires these into HTTP
//! handlers and PostgreSQL persistence.

pub mod cart;
pub mod checkout;
pub mod order;
pub mod review;

pub use cart::{Cart, CartError, CartLine};
pub use checkout::{CheckoutErrors, CheckoutForm};
pub use order::{OrderPayload, OrderStatus, PayloadError, StoredPayment};
pub use review::ReviewStatistics;
