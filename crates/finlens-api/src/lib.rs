pub mod client;
pub mod contracts;
pub mod error;
pub mod fixture;

pub use client::*;
pub use contracts::*;
pub use error::*;
pub use fixture::*;
