//! Embedded JavaScript sandbox for controller scripts.
//!
//! Scripts run inside a [`boa_engine`] context with exactly three injected
//! names: the `engine` facade, the `script` helper, and the raw `midi`
//! transport handle. All state-changing calls land in a shared buffer owned
//! by the host instead of taking effect directly.

mod facade;
mod sandbox;
mod timers;

pub use sandbox::Sandbox;
