//! # Protocol Frames
//!
//! Defines the structure of the RPC envelope (Call, Cancel, Reply).
//!
//! ## Wire Shape
//! - `Call`:   `Variant("Call", Map{seq, method, body})`
//! - `Cancel`: `Variant("Cancel", Map{seq})`
//! - `Reply`:  `Variant("Reply", Variant("Ok", Map{seq, body}))` or
//!             `Variant("Reply", Variant("Err", Map{seq, reason: Variant(tag, message)}))`
//!
//! ## Invariants
//! - **Panic Safety**: All decoding paths return `Result`, never panicking on unknown data.
//! - **Forward Compatibility**: Unknown header fields are safely skipped.

use wirepack::Decoder;
use wirepack::Encoder;

use crate::error::Error;
use crate::error::FailureReason;
use crate::error::Result;
use crate::message::Message;

/// Encodes an outbound Call frame.
pub struct CallEncoder<'a, M: Message> {
    pub seq: u64,
    pub method: &'a str,
    pub body: &'a M,
}

impl<'a, M: Message> CallEncoder<'a, M> {
    pub fn new(seq: u64, method: &'a str, body: &'a M) -> Self {
        Self { seq, method, body }
    }

    /// Encode this call into the encoder.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Call")?;
        enc.map_begin()?;

        write_map_u64(enc, "seq", self.seq)?;
        write_map_str(enc, "method", self.method)?;

        enc.variant_begin("body")?;
        self.body.encode(enc)?;
        enc.variant_end()?;

        enc.map_end()?;
        enc.variant_end()?;
        Ok(())
    }

    /// Encode this call into a fresh byte vector.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Decodes an inbound Call frame.
///
/// The `body` decoder is positioned at the message body; decode it with the
/// `Message` type that `method` names.
pub struct CallDecoder<'a> {
    pub seq: u64,
    pub method: &'a str,
    pub body: Decoder<'a>,
}

impl<'a> CallDecoder<'a> {
    /// Decode a Call frame from the decoder.
    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let mut map = dec.map()?;
        let mut seq = None;
        let mut method = None;
        let mut body = None;

        while let Some((key, mut val)) = map.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "method" => method = Some(val.str()?),
                "body" => body = Some(val),
                _ => val.skip()?,
            }
        }

        Ok(CallDecoder {
            seq: seq.ok_or(Error::MissingField("seq"))?,
            method: method.ok_or(Error::MissingField("method"))?,
            body: body.ok_or(Error::MissingField("body"))?,
        })
    }
}

/// Encodes an outbound Cancel frame for an earlier Call.
pub struct CancelEncoder {
    pub seq: u64,
}

impl CancelEncoder {
    pub fn new(seq: u64) -> Self {
        Self { seq }
    }

    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Cancel")?;
        enc.map_begin()?;
        write_map_u64(enc, "seq", self.seq)?;
        enc.map_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Encodes an outbound Reply frame (success).
pub struct ReplyOkEncoder<'a, M: Message> {
    pub seq: u64,
    pub body: &'a M,
}

impl<'a, M: Message> ReplyOkEncoder<'a, M> {
    pub fn new(seq: u64, body: &'a M) -> Self {
        Self { seq, body }
    }

    /// Encode this success reply into the encoder.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Reply")?;
        enc.variant_begin("Ok")?;
        enc.map_begin()?;

        write_map_u64(enc, "seq", self.seq)?;
        enc.variant_begin("body")?;
        self.body.encode(enc)?;
        enc.variant_end()?;

        enc.map_end()?;
        enc.variant_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Encodes an outbound Reply frame (failure).
pub struct ReplyErrEncoder {
    pub seq: u64,
    pub reason: FailureReason,
}

impl ReplyErrEncoder {
    pub fn new(seq: u64, reason: FailureReason) -> Self {
        Self { seq, reason }
    }

    /// Encode this failure reply into the encoder.
    pub fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.variant_begin("Reply")?;
        enc.variant_begin("Err")?;
        enc.map_begin()?;

        write_map_u64(enc, "seq", self.seq)?;
        enc.variant_begin("reason")?;
        enc.variant_begin(self.reason.as_tag())?;
        enc.str(self.reason.message())?;
        enc.variant_end()?;
        enc.variant_end()?;

        enc.map_end()?;
        enc.variant_end()?;
        enc.variant_end()?;
        Ok(())
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes()?)
    }
}

/// Decodes an inbound Reply frame.
pub struct ReplyDecoder<'a> {
    pub seq: u64,
    /// - `Ok(Decoder)`: Success. Points at the message body.
    /// - `Err(FailureReason)`: Remote failure.
    pub status: std::result::Result<Decoder<'a>, FailureReason>,
}

impl<'a> ReplyDecoder<'a> {
    /// Decode a Reply frame from the decoder.
    pub fn decode(mut dec: Decoder<'a>) -> Result<Self> {
        let (outcome, body) = dec.variant()?;
        match outcome {
            "Ok" => Self::decode_success(body),
            "Err" => Self::decode_failure(body),
            other => Err(Error::UnknownVariant(format!("reply outcome: {}", other))),
        }
    }

    fn decode_success(mut ok_body: Decoder<'a>) -> Result<Self> {
        let mut map = ok_body.map()?;
        let mut seq = None;
        let mut body = None;

        while let Some((key, mut val)) = map.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "body" => body = Some(val),
                _ => val.skip()?,
            }
        }

        Ok(ReplyDecoder {
            seq: seq.ok_or(Error::MissingField("seq"))?,
            status: Ok(body.ok_or(Error::MissingField("body"))?),
        })
    }

    fn decode_failure(mut err_body: Decoder<'a>) -> Result<Self> {
        let mut map = err_body.map()?;
        let mut seq = None;
        let mut reason = None;

        while let Some((key, mut val)) = map.next()? {
            match key {
                "seq" => seq = Some(val.u64()?),
                "reason" => {
                    let (tag, mut message) = val.variant()?;
                    reason = Some(FailureReason::from_tag(tag, message.str()?.to_string())?);
                }
                _ => val.skip()?,
            }
        }

        Ok(ReplyDecoder {
            seq: seq.ok_or(Error::MissingField("seq"))?,
            status: Err(reason.ok_or(Error::MissingField("reason"))?),
        })
    }
}

/// Top-level frame decoder.
pub enum RpcFrame<'a> {
    Call(CallDecoder<'a>),
    Cancel { seq: u64 },
    Reply(ReplyDecoder<'a>),
}

impl<'a> RpcFrame<'a> {
    /// Decode an RPC frame from the decoder.
    pub fn decode(dec: &mut Decoder<'a>) -> Result<Self> {
        let (kind, body) = dec.variant()?;
        match kind {
            "Call" => Ok(RpcFrame::Call(CallDecoder::decode(body)?)),
            "Cancel" => Ok(RpcFrame::Cancel { seq: decode_header_seq(body)? }),
            "Reply" => Ok(RpcFrame::Reply(ReplyDecoder::decode(body)?)),
            _ => Err(Error::UnknownVariant(format!("top-level frame: {}", kind))),
        }
    }
}

/// Decodes just the sequence number from a raw frame.
/// Useful for answering frames whose bodies fail to decode.
pub fn decode_seq(bytes: &[u8]) -> Result<u64> {
    let mut dec = Decoder::new(bytes);
    let (kind, mut body) = dec.variant()?;
    match kind {
        "Call" | "Cancel" => decode_header_seq(body),
        "Reply" => {
            let (_, inner) = body.variant()?;
            decode_header_seq(inner)
        }
        _ => Err(Error::UnknownVariant(format!("top-level frame: {}", kind))),
    }
}

fn decode_header_seq(mut dec: Decoder) -> Result<u64> {
    let mut map = dec.map()?;
    while let Some((key, mut val)) = map.next()? {
        if key == "seq" {
            return Ok(val.u64()?);
        }
        val.skip()?;
    }
    Err(Error::MissingField("seq"))
}

fn write_map_u64(enc: &mut Encoder, key: &str, val: u64) -> Result<()> {
    enc.variant_begin(key)?;
    enc.u64(val)?;
    enc.variant_end()?;
    Ok(())
}

fn write_map_str(enc: &mut Encoder, key: &str, val: &str) -> Result<()> {
    enc.variant_begin(key)?;
    enc.str(val)?;
    enc.variant_end()?;
    Ok(())
}
