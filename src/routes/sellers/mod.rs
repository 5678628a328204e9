pub mod account;
pub mod orders;
pub mod products;
