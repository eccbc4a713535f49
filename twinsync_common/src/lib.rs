pub mod config;
pub mod error;
pub mod filter;
pub mod side;
pub mod types;

pub use config::*;
pub use error::*;
pub use filter::*;
pub use side::*;
pub use types::*;
