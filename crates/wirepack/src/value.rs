//! # Value Codec
//!
//! Translation between `serde_json::Value` (the wire-neutral tree) and the TLV stream.
//!
//! ## Invariants
//! - **Recursion Safety**: Encoding and decoding are bounded by `MAX_DEPTH`.
//! - **Numbers**: Every number travels as `F64`; `U64` is accepted on decode.
//! - **Objects**: Encoded as a Map of Variants, one Variant per key.

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::Decoder;
use crate::Encoder;
use crate::Error;
use crate::Result;
use crate::Tag;

/// The maximum nesting depth of a value tree.
pub const MAX_DEPTH: usize = 64;

/// Encodes a value tree into the encoder stream.
pub fn encode_value(enc: &mut Encoder, value: &Value) -> Result<()> {
    encode_value_impl(enc, value, 0)
}

fn encode_value_impl(enc: &mut Encoder, value: &Value, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthLimitExceeded(MAX_DEPTH));
    }

    match value {
        Value::Null => enc.null(),
        Value::Bool(b) => enc.bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => enc.f64(f),
            None => Err(Error::NonFiniteNumber(f64::NAN)),
        },
        Value::String(s) => enc.str(s),
        Value::Array(items) => {
            enc.list_begin()?;
            for item in items {
                encode_value_impl(enc, item, depth + 1)?;
            }
            enc.list_end()
        }
        Value::Object(fields) => {
            enc.map_begin()?;
            for (key, item) in fields {
                enc.variant_begin(key)?;
                encode_value_impl(enc, item, depth + 1)?;
                enc.variant_end()?;
            }
            enc.map_end()
        }
    }
}

/// Decodes a single value tree from the decoder.
pub fn decode_value(dec: &mut Decoder) -> Result<Value> {
    decode_value_impl(dec, 0)
}

fn decode_value_impl(dec: &mut Decoder, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthLimitExceeded(MAX_DEPTH));
    }

    match dec.peek_tag()? {
        Tag::Null => {
            dec.null()?;
            Ok(Value::Null)
        }
        Tag::BoolTrue | Tag::BoolFalse => Ok(Value::Bool(dec.bool()?)),
        Tag::U64 => Ok(Value::Number(Number::from(dec.u64()?))),
        Tag::F64 => {
            let f = dec.f64()?;
            Number::from_f64(f).map(Value::Number).ok_or(Error::NonFiniteNumber(f))
        }
        Tag::String => Ok(Value::String(dec.str()?.to_string())),
        Tag::List => {
            let mut iter = dec.list()?;
            let mut items = Vec::new();
            while let Some(mut item) = iter.next()? {
                items.push(decode_value_impl(&mut item, depth + 1)?);
            }
            Ok(Value::Array(items))
        }
        Tag::Map => {
            let mut iter = dec.map()?;
            let mut fields = Map::new();
            while let Some((key, mut item)) = iter.next()? {
                fields.insert(key.to_string(), decode_value_impl(&mut item, depth + 1)?);
            }
            Ok(Value::Object(fields))
        }
        found => Err(Error::UnexpectedTag { expected: Tag::Map, found }),
    }
}
