pub mod allocator;
pub mod chat;
pub mod filter;
pub mod poc_ops;
pub mod session;
pub mod stats;
pub mod ticket_ops;
