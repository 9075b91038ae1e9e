//! # Wirepack
//!
//! A small, bounded TLV encoding for the wire-neutral value tree that travels
//! between the engine and a provider.
//!
//! ## Philosophy
//!
//! - **Explicit State**: The encoder tracks open scopes on a stack and back-patches lengths.
//! - **TLV Architecture**: `[Tag][Length?][Value]` lets a reader skip fields it does not know.
//! - **Bounded**: Decoders are zero-copy, bounds-checked views. Value trees are depth-limited.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Containers**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers are Little-Endian.

mod value;

#[cfg(test)]
mod tests;

pub use value::decode_value;
pub use value::encode_value;
pub use value::MAX_DEPTH;

/// Wirepack serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Byte does not correspond to a valid `Tag`.
    #[error("invalid tag byte: {0:#04x}")]
    InvalidTag(u8),
    /// A valid tag appeared where another was required.
    #[error("unexpected tag: expected {expected:?}, found {found:?}")]
    UnexpectedTag { expected: Tag, found: Tag },
    /// String data is not valid UTF-8.
    #[error("string data is not valid utf-8")]
    InvalidUtf8,
    /// Closing a scope that does not match the active scope.
    #[error("scope mismatch: expected {expected:?}, found {actual:?}")]
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Attempted to close a scope when only the Root remains.
    #[error("attempted to close the root scope")]
    ScopeUnderflow,
    /// Attempted to finalize the buffer with open scopes.
    #[error("buffer finalized with open scopes")]
    ScopeStillOpen,
    /// Buffer exhausted while reading.
    #[error("unexpected end of buffer")]
    UnexpectedEnd,
    /// Blob or container length exceeds `u32::MAX`.
    #[error("blob of {0} bytes exceeds u32::MAX")]
    BlobTooLarge(usize),
    /// Attempted to write a second payload into a Variant.
    #[error("too many items in variant; expected exactly 1")]
    TooManyItems,
    /// Closed a Variant without writing its payload.
    #[error("empty variant; expected exactly 1 payload item")]
    EmptyVariant,
    /// Attempted to write a non-Variant directly into a Map.
    #[error("map entries must be variants")]
    InvalidMapEntry,
    /// A number that has no JSON representation (NaN or infinite).
    #[error("number {0} has no wire representation")]
    NonFiniteNumber(f64),
    /// A value tree nested deeper than `MAX_DEPTH`.
    #[error("value nesting exceeds {0} levels")]
    DepthLimitExceeded(usize),
}

/// Specialized `Result` for Wirepack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    BoolTrue = 0x01,
    BoolFalse = 0x02,
    U64 = 0x06,
    F64 = 0x0C,
    Null = 0x0E,

    // Blobs (Tag + u32 Len + Bytes)
    String = 0x10,

    // Containers (Tag + u32 Len + Body)
    List = 0x20,
    Map = 0x21,

    // Named payload (Tag + u32 Len + Name + exactly one item)
    Variant = 0x33,
}

impl Tag {
    /// Returns the Tag variant for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Tag::BoolTrue),
            0x02 => Some(Tag::BoolFalse),
            0x06 => Some(Tag::U64),
            0x0C => Some(Tag::F64),
            0x0E => Some(Tag::Null),
            0x10 => Some(Tag::String),
            0x20 => Some(Tag::List),
            0x21 => Some(Tag::Map),
            0x33 => Some(Tag::Variant),
            _ => None,
        }
    }
}

/// Open container kinds on the `Encoder` stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The virtual root; allows any item.
    Root,
    /// Ordered sequence; allows any number of items.
    List,
    /// Key-Value container; strictly allows only `Tag::Variant` items.
    Map,
    /// Strict container; allows exactly one item after the name.
    Variant,
}

struct Frame {
    start: usize,
    scope: Scope,
    count: usize,
}

/// A state-machine driven encoder.
///
/// # Structural Invariants
///
/// 1.  **Map Scopes**: Only `Tag::Variant` items may be written.
/// 2.  **Variant Scopes**: Exactly one payload item must be written.
/// 3.  **Root Scope**: The encoder must end in the Root scope to finalize bytes.
pub struct Encoder {
    buf: Vec<u8>,
    /// Bottom is always `Scope::Root`.
    stack: Vec<Frame>,
}

impl Encoder {
    /// Creates a new encoder with default capacity.
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(1024),
            stack: vec![Frame { start: 0, scope: Scope::Root, count: 0 }],
        }
    }

    /// Consumes the encoder and returns the final byte vector.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    fn frame(&mut self) -> Result<&mut Frame> {
        self.stack.last_mut().ok_or(Error::ScopeUnderflow)
    }

    fn check_write(&mut self, tag: Tag) -> Result<()> {
        let frame = self.frame()?;
        match frame.scope {
            Scope::Root | Scope::List => Ok(()),
            Scope::Map if tag != Tag::Variant => Err(Error::InvalidMapEntry),
            Scope::Map => Ok(()),
            Scope::Variant if frame.count >= 1 => Err(Error::TooManyItems),
            Scope::Variant => Ok(()),
        }
    }

    fn on_item_written(&mut self) -> Result<()> {
        self.frame()?.count += 1;
        Ok(())
    }

    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        Ok(())
    }

    fn begin_scope(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.write_tag(tag)?;
        self.buf.extend_from_slice(&[0, 0, 0, 0]); // Length placeholder
        self.stack.push(Frame { start: self.buf.len(), scope, count: 0 });
        Ok(())
    }

    fn end_scope(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }

        let frame = self.frame()?;
        if frame.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: frame.scope });
        }
        if frame.scope == Scope::Variant && frame.count == 0 {
            return Err(Error::EmptyVariant);
        }

        let Some(frame) = self.stack.pop() else {
            return Err(Error::ScopeUnderflow);
        };
        let body_len = self.buf.len() - frame.start;
        let len = u32::try_from(body_len).map_err(|_| Error::BlobTooLarge(body_len))?;
        self.buf[frame.start - 4..frame.start].copy_from_slice(&len.to_le_bytes());

        self.on_item_written()
    }

    /// Encodes `null`.
    pub fn null(&mut self) -> Result<()> {
        self.write_tag(Tag::Null)?;
        self.on_item_written()
    }

    /// Encodes a boolean value.
    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.write_tag(if v { Tag::BoolTrue } else { Tag::BoolFalse })?;
        self.on_item_written()
    }

    /// Encodes an unsigned 64-bit integer (LE).
    pub fn u64(&mut self, v: u64) -> Result<()> {
        self.write_tag(Tag::U64)?;
        self.buf.extend_from_slice(&v.to_le_bytes());
        self.on_item_written()
    }

    /// Encodes a 64-bit float (LE).
    pub fn f64(&mut self, v: f64) -> Result<()> {
        self.write_tag(Tag::F64)?;
        self.buf.extend_from_slice(&v.to_le_bytes());
        self.on_item_written()
    }

    /// Encodes a UTF-8 string blob.
    pub fn str(&mut self, v: &str) -> Result<()> {
        let len = u32::try_from(v.len()).map_err(|_| Error::BlobTooLarge(v.len()))?;
        self.write_tag(Tag::String)?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(v.as_bytes());
        self.on_item_written()
    }

    /// Begins a List container. Must be closed via `list_end()`.
    pub fn list_begin(&mut self) -> Result<()> { self.begin_scope(Tag::List, Scope::List) }
    /// Ends a List container.
    pub fn list_end(&mut self) -> Result<()> { self.end_scope(Scope::List) }

    /// Begins a Map container. Only `variant_begin()` is allowed as a direct child.
    pub fn map_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Map, Scope::Map) }
    /// Ends a Map container.
    pub fn map_end(&mut self) -> Result<()> { self.end_scope(Scope::Map) }

    /// Begins a Variant (named payload). Exactly one item must follow.
    pub fn variant_begin(&mut self, name: &str) -> Result<()> {
        self.begin_scope(Tag::Variant, Scope::Variant)?;
        self.str(name)?;
        // The name is metadata, not payload.
        self.frame()?.count = 0;
        Ok(())
    }
    /// Ends a Variant.
    pub fn variant_end(&mut self) -> Result<()> { self.end_scope(Scope::Variant) }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Container reads return new `Decoder` instances restricted to the container's body.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let Some(&b) = self.buf.first() else {
            return Err(Error::UnexpectedEnd);
        };
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_len(&mut self) -> Result<usize> {
        Ok(u32::from_le_bytes(self.read_array()?) as usize)
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<()> {
        let found = self.peek_tag()?;
        if found != expected {
            return Err(Error::UnexpectedTag { expected, found });
        }
        self.read_bytes(1)?;
        Ok(())
    }

    /// Skips the next item and its nested children.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.read_bytes(1)?;
        match tag {
            Tag::BoolTrue | Tag::BoolFalse | Tag::Null => {}
            Tag::U64 | Tag::F64 => { self.read_bytes(8)?; }
            Tag::String | Tag::List | Tag::Map | Tag::Variant => {
                let len = self.read_len()?;
                self.read_bytes(len)?;
            }
        }
        Ok(())
    }

    /// Decodes `null`.
    pub fn null(&mut self) -> Result<()> { self.expect_tag(Tag::Null) }

    /// Decodes a bool.
    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_tag()? {
            Tag::BoolTrue => { self.read_bytes(1)?; Ok(true) }
            Tag::BoolFalse => { self.read_bytes(1)?; Ok(false) }
            found => Err(Error::UnexpectedTag { expected: Tag::BoolTrue, found }),
        }
    }

    /// Decodes u64 (LE).
    pub fn u64(&mut self) -> Result<u64> {
        self.expect_tag(Tag::U64)?;
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Decodes f64 (LE).
    pub fn f64(&mut self) -> Result<f64> {
        self.expect_tag(Tag::F64)?;
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        self.expect_tag(Tag::String)?;
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    fn enter_container(&mut self, expected: Tag) -> Result<Decoder<'a>> {
        self.expect_tag(expected)?;
        let len = self.read_len()?;
        Ok(Decoder::new(self.read_bytes(len)?))
    }

    /// Decodes a List into an iterator.
    pub fn list(&mut self) -> Result<ListIter<'a>> {
        Ok(ListIter { dec: self.enter_container(Tag::List)? })
    }

    /// Decodes a Map into an iterator.
    pub fn map(&mut self) -> Result<MapIter<'a>> {
        Ok(MapIter { dec: self.enter_container(Tag::Map)? })
    }

    /// Decodes a Variant, returning `(Name, PayloadDecoder)`.
    pub fn variant(&mut self) -> Result<(&'a str, Decoder<'a>)> {
        let mut inner = self.enter_container(Tag::Variant)?;
        let name = inner.str()?;
        Ok((name, inner))
    }
}

/// Iterator for items within a List.
#[derive(Debug)]
pub struct ListIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> ListIter<'a> {
    /// Returns a Decoder scoped to the next item, or `None` at the end.
    pub fn next(&mut self) -> Result<Option<Decoder<'a>>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let mut probe = self.dec.clone();
        probe.skip()?;
        let len = self.dec.remaining() - probe.remaining();
        Ok(Some(Decoder::new(self.dec.read_bytes(len)?)))
    }
}

/// Iterator for Key-Value pairs (Variants) within a Map.
#[derive(Debug)]
pub struct MapIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> MapIter<'a> {
    /// Returns `(Key, ValueDecoder)` for the next entry, or `None` at the end.
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let found = self.dec.peek_tag()?;
        if found != Tag::Variant {
            return Err(Error::UnexpectedTag { expected: Tag::Variant, found });
        }
        Ok(Some(self.dec.variant()?))
    }
}
