//! # WireRPC
//!
//! A strict request/response envelope over Wirepack, plus the component
//! construction messages a provider answers.
//!
//! ## Architecture
//!
//! - **Frames** (`frame`): `Call`, `Cancel` and `Reply` envelopes correlated by sequence number.
//! - **Messages** (`message`): `ConstructRequest` and `ConstructResponse` bodies.
//! - **Errors** (`error`): transport-side failures versus remote failure reasons.

pub mod error;
pub mod frame;
pub mod message;


pub use error::Error;
pub use error::FailureReason;
pub use error::Result;
pub use frame::CallDecoder;
pub use frame::CallEncoder;
pub use frame::CancelEncoder;
pub use frame::ReplyDecoder;
pub use frame::ReplyErrEncoder;
pub use frame::ReplyOkEncoder;
pub use frame::RpcFrame;
pub use frame::decode_seq;
pub use message::ConstructRequest;
pub use message::ConstructResponse;
pub use message::Message;

/// Method name of the component construction call.
pub const CONSTRUCT_METHOD: &str = "Construct";
