pub mod account;
pub mod orders;
pub mod riders;
pub mod sellers;
