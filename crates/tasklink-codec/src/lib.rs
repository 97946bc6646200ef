//! Tasklink Codec
//!
//! The payload object model ([`Value`]) and the [`PayloadCodec`] capability the
//! HTTP transport depends on. A codec must be symmetric: the bytes it encodes
//! for a request are the bytes it expects to decode from a reply.

mod codec;
mod de;
mod error;
mod value;

pub use codec::{BincodeCodec, JsonCodec, PayloadCodec};
pub use error::CodecError;
pub use value::Value;
