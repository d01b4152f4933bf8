pub mod carts;
pub mod orders;
pub mod products;
pub mod reviews;
