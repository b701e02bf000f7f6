//! Security module
//!
//! Authorization proxies wrapping the engine services. Every exposed call
//! path goes through a proxy; a rejected call never reaches the wrapped
//! implementation's mutation logic.

mod guard;

pub use guard::Secured;
