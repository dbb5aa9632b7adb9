pub mod config;
pub mod desk;
pub mod poc;
pub mod ticket;

pub use config::*;
pub use desk::*;
pub use poc::*;
pub use ticket::*;
