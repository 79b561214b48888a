mod async_fallible;
mod fallible;
mod provider;
mod service;
mod slot;
mod value;

pub use async_fallible::*;
pub use fallible::*;
pub use provider::*;
pub use service::*;
pub use value::*;
