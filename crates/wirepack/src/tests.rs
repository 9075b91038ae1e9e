use crate::*;
use serde_json::json;

// ============================================================================
//  SCALARS
// ============================================================================

#[test]
fn test_scalars_roundtrip() -> Result<()> {
    let mut enc = Encoder::new();
    enc.bool(true)?;
    enc.bool(false)?;
    enc.null()?;
    enc.u64(u64::MAX)?;
    enc.f64(-2.5)?;
    enc.str("héllo")?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert!(dec.bool()?);
    assert!(!dec.bool()?);
    dec.null()?;
    assert_eq!(dec.u64()?, u64::MAX);
    assert_eq!(dec.f64()?, -2.5);
    assert_eq!(dec.str()?, "héllo");
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

#[test]
fn test_wrong_tag_is_reported() -> Result<()> {
    let mut enc = Encoder::new();
    enc.str("x")?;
    let bytes = enc.into_bytes()?;

    let err = Decoder::new(&bytes).u64().unwrap_err();
    assert_eq!(err, Error::UnexpectedTag { expected: Tag::U64, found: Tag::String });
    Ok(())
}

#[test]
fn test_invalid_tag_byte() {
    let err = Decoder::new(&[0xFF]).peek_tag().unwrap_err();
    assert_eq!(err, Error::InvalidTag(0xFF));
}

#[test]
fn test_truncated_string() -> Result<()> {
    let mut enc = Encoder::new();
    enc.str("truncate me")?;
    let bytes = enc.into_bytes()?;

    let err = Decoder::new(&bytes[..bytes.len() - 3]).str().unwrap_err();
    assert_eq!(err, Error::UnexpectedEnd);
    Ok(())
}

// ============================================================================
//  STRUCTURAL RULES
// ============================================================================

#[test]
fn test_map_rejects_bare_items() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    assert_eq!(enc.u64(1).unwrap_err(), Error::InvalidMapEntry);
    Ok(())
}

#[test]
fn test_variant_requires_exactly_one_item() -> Result<()> {
    let mut enc = Encoder::new();
    enc.variant_begin("v")?;
    assert_eq!(enc.variant_end().unwrap_err(), Error::EmptyVariant);

    let mut enc = Encoder::new();
    enc.variant_begin("v")?;
    enc.u64(1)?;
    assert_eq!(enc.u64(2).unwrap_err(), Error::TooManyItems);
    Ok(())
}

#[test]
fn test_unclosed_scope_cannot_finalize() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    assert_eq!(enc.into_bytes().unwrap_err(), Error::ScopeStillOpen);
    Ok(())
}

#[test]
fn test_scope_mismatch() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    let err = enc.map_end().unwrap_err();
    assert_eq!(err, Error::ScopeMismatch { expected: Scope::Map, actual: Scope::List });
    assert_eq!(Encoder::new().list_end().unwrap_err(), Error::ScopeUnderflow);
    Ok(())
}

#[test]
fn test_skip_unknown_map_entries() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.variant_begin("unknown")?;
    enc.list_begin()?;
    enc.str("ignored")?;
    enc.list_end()?;
    enc.variant_end()?;
    enc.variant_begin("known")?;
    enc.u64(7)?;
    enc.variant_end()?;
    enc.map_end()?;
    let bytes = enc.into_bytes()?;

    let mut dec = Decoder::new(&bytes);
    let mut map = dec.map()?;
    let mut known = None;
    while let Some((key, mut val)) = map.next()? {
        match key {
            "known" => known = Some(val.u64()?),
            _ => val.skip()?,
        }
    }
    assert_eq!(known, Some(7));
    Ok(())
}

// ============================================================================
//  VALUE TREES
// ============================================================================

fn roundtrip(value: &serde_json::Value) -> Result<serde_json::Value> {
    let mut enc = Encoder::new();
    encode_value(&mut enc, value)?;
    let bytes = enc.into_bytes()?;
    decode_value(&mut Decoder::new(&bytes))
}

#[test]
fn test_value_tree_roundtrip() -> Result<()> {
    let value = json!({
        "name": "bucket",
        "size": 3.5,
        "tags": ["a", null, true],
        "nested": { "deep": { "deeper": [] } },
        "empty": {},
    });
    assert_eq!(roundtrip(&value)?, value);
    Ok(())
}

#[test]
fn test_integers_come_back_as_floats() -> Result<()> {
    let decoded = roundtrip(&json!(42))?;
    assert_eq!(decoded.as_f64(), Some(42.0));
    Ok(())
}

#[test]
fn test_depth_limit() {
    let mut value = json!(null);
    for _ in 0..(MAX_DEPTH + 2) {
        value = json!([value]);
    }
    let mut enc = Encoder::new();
    assert_eq!(encode_value(&mut enc, &value).unwrap_err(), Error::DepthLimitExceeded(MAX_DEPTH));
}

#[test]
fn test_non_finite_float_is_rejected_on_decode() -> Result<()> {
    let mut enc = Encoder::new();
    enc.f64(f64::INFINITY)?;
    let bytes = enc.into_bytes()?;
    let err = decode_value(&mut Decoder::new(&bytes)).unwrap_err();
    assert!(matches!(err, Error::NonFiniteNumber(f) if f.is_infinite()));
    Ok(())
}
