//! Core types for Dirgate

mod credential;
mod identity;

pub use credential::*;
pub use identity::*;
