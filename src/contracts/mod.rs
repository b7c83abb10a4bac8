// Contracts Module - Public ABIs Only

pub mod erc20;
pub mod greeter;

// Public exports
pub use erc20::Erc20;
pub use greeter::{Greeter, GreetingUpdatedFilter};
