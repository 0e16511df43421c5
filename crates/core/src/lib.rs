// crates/core/src/lib.rs
pub mod cases;
pub mod classifier;
pub mod command;
pub mod error;
pub mod request;
pub mod settings;
pub mod store;
pub mod tally;
pub mod types;
pub mod views;

pub use cases::*;
pub use classifier::*;
pub use command::*;
pub use error::*;
pub use request::*;
pub use settings::*;
pub use store::*;
pub use tally::*;
pub use types::*;
