pub mod models;
pub mod provider;

pub use models::{LineItemPlayerRef, Order, OrderLineItem, OrderStatus};
pub use provider::{InMemoryOrderProvider, OrderProvider};
