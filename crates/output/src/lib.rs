//! # Output
//!
//! A single-assignment async value carrying a `PropertyValue` together with
//! three pieces of metadata: whether it is known, whether it is secret, and
//! which resources it depends on.
//!
//! ## Philosophy
//!
//! - **Resolve Once**: The first `resolve` or `reject` wins. Later attempts
//!   report `false` and change nothing.
//! - **Broadcast**: Any number of waiters, present or future, observe the same
//!   resolution.
//! - **Untyped Storage**: The slot always holds a `PropertyValue`. `Output<T>`
//!   is a typed view; converting between views shares the slot.
//!
//! ## Cancellation
//!
//! Waiting never hangs past the owning call: `resolution_or_cancel` returns
//! `Error::Cancelled` as soon as the call's token fires.

pub mod error;
pub mod output;
pub mod value;


pub use error::Error;
pub use error::Result;
pub use output::AnyOutput;
pub use output::Output;
pub use output::Resolved;
pub use output::Settled;
pub use value::OutputValue;
