//! Configuration digests.
//!
//! A [`ConfigDigest`] is a 128-bit SipHash-2-4 of a configuration's
//! canonical serialization, rendered as 32 lowercase hex digits. Two
//! configurations that are field-wise equal produce the same digest
//! regardless of field declaration order or map insertion order:
//!
//! - object keys (struct fields and map entries) are sorted
//!   lexicographically at every nesting level,
//! - sequences and tuples are serialized by position,
//! - numbers use Rust's shortest-round-trip formatting,
//! - strings are UTF-8 with JSON-style escaping.
//!
//! The digest is an identity key for cache slots, not a security
//! boundary — the hash keys are fixed so digests are stable across
//! process restarts.

use std::fmt::{self, Write as _};
use std::hash::Hasher as _;

use serde::ser::{self, Serialize};
use siphasher::sip128::{Hasher128, SipHasher24};

use crate::types::CacheError;

// Fixed keys so digests are comparable across sessions.
const SIP_KEY_0: u64 = 0x6669_6c6d_6c61_6230;
const SIP_KEY_1: u64 = 0x6669_6c6d_6c61_6231;

/// A stable content hash of a canonicalized configuration.
///
/// Always 32 lowercase hex digits. Construct via [`digest_config`],
/// [`digest_display`], or [`ConfigDigest::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigDigest(String);

impl ConfigDigest {
    /// Parse a digest from its hex form.
    ///
    /// Accepts any non-empty lowercase hex string so digests recorded
    /// by earlier versions (or sidecar files) remain readable.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidEntry`] if `hex` is empty or
    /// contains anything other than lowercase hex digits.
    pub fn parse(hex: &str) -> Result<Self, CacheError> {
        if hex.is_empty() {
            return Err(CacheError::InvalidEntry(
                "digest must not be empty".to_string(),
            ));
        }
        if !hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(CacheError::InvalidEntry(format!(
                "digest must be lowercase hex, got {hex:?}"
            )));
        }
        Ok(Self(hex.to_string()))
    }

    /// The digest as a hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the digest of a configuration via its canonical field export.
///
/// The configuration's `Serialize` impl is the "export canonical
/// fields" capability: the hasher sees only the structural key-value
/// view, never the concrete type. Pure — identical field values always
/// yield an identical digest, across calls and across process restarts.
///
/// # Errors
///
/// Returns [`CacheError::UnhashableConfig`] when the configuration
/// contains a value with no deterministic serialization: a non-finite
/// float, a map with non-string keys, or anything the `Serialize` impl
/// itself refuses to export.
pub fn digest_config<C: Serialize + ?Sized>(config: &C) -> Result<ConfigDigest, CacheError> {
    let canonical = config
        .serialize(CanonicalSerializer)
        .map_err(|e| CacheError::UnhashableConfig(e.0))?;
    Ok(ConfigDigest(sip_hex(canonical.as_bytes())))
}

/// Compute a digest from a value's `Display` form.
///
/// Last-resort path for configurations without structured field export.
/// The result is only as stable as the `Display` impl — formatting
/// changes or non-deterministic ordering in the rendered string silently
/// change the digest. Do not rely on this for correctness-critical
/// configurations; prefer [`digest_config`].
#[must_use]
pub fn digest_display<T: fmt::Display + ?Sized>(value: &T) -> ConfigDigest {
    ConfigDigest(sip_hex(value.to_string().as_bytes()))
}

fn sip_hex(bytes: &[u8]) -> String {
    let mut hasher = SipHasher24::new_with_keys(SIP_KEY_0, SIP_KEY_1);
    hasher.write(bytes);
    format!("{:032x}", hasher.finish128().as_u128())
}

// ─────────────────── canonical serialization ─────────────────────────

#[derive(Debug)]
struct CanonError(String);

impl fmt::Display for CanonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CanonError {}

impl ser::Error for CanonError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn join_entries(open: char, entries: &[(String, String)], close: char) -> String {
    let mut out = String::new();
    out.push(open);
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push(':');
        out.push_str(value);
    }
    out.push(close);
    out
}

fn join_items(items: &[String]) -> String {
    let mut out = String::new();
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(item);
    }
    out.push(']');
    out
}

/// Serializes any `Serialize` value into a canonical JSON-like string.
///
/// Struct fields and map entries are sorted lexicographically by their
/// serialized key, so field declaration order and insertion order never
/// reach the hash.
struct CanonicalSerializer;

struct CanonSeq {
    items: Vec<String>,
}

struct CanonVariantSeq {
    variant: &'static str,
    items: Vec<String>,
}

struct CanonMap {
    entries: Vec<(String, String)>,
    pending_key: Option<String>,
}

struct CanonStruct {
    fields: Vec<(String, String)>,
}

struct CanonVariantStruct {
    variant: &'static str,
    fields: Vec<(String, String)>,
}

impl ser::Serializer for CanonicalSerializer {
    type Ok = String;
    type Error = CanonError;
    type SerializeSeq = CanonSeq;
    type SerializeTuple = CanonSeq;
    type SerializeTupleStruct = CanonSeq;
    type SerializeTupleVariant = CanonVariantSeq;
    type SerializeMap = CanonMap;
    type SerializeStruct = CanonStruct;
    type SerializeStructVariant = CanonVariantStruct;

    fn serialize_bool(self, v: bool) -> Result<String, CanonError> {
        Ok(if v { "true" } else { "false" }.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> Result<String, CanonError> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<String, CanonError> {
        if v.is_finite() {
            Ok(v.to_string())
        } else {
            Err(ser::Error::custom(format!(
                "non-finite float {v} has no canonical form"
            )))
        }
    }

    fn serialize_f64(self, v: f64) -> Result<String, CanonError> {
        if v.is_finite() {
            Ok(v.to_string())
        } else {
            Err(ser::Error::custom(format!(
                "non-finite float {v} has no canonical form"
            )))
        }
    }

    fn serialize_char(self, v: char) -> Result<String, CanonError> {
        Ok(escape_str(&v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<String, CanonError> {
        Ok(escape_str(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<String, CanonError> {
        let items: Vec<String> = v.iter().map(ToString::to_string).collect();
        Ok(join_items(&items))
    }

    fn serialize_none(self) -> Result<String, CanonError> {
        Ok("null".to_string())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<String, CanonError> {
        value.serialize(Self)
    }

    fn serialize_unit(self) -> Result<String, CanonError> {
        Ok("null".to_string())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, CanonError> {
        Ok("null".to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String, CanonError> {
        Ok(escape_str(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, CanonError> {
        value.serialize(Self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<String, CanonError> {
        let inner = value.serialize(Self)?;
        Ok(join_entries('{', &[(escape_str(variant), inner)], '}'))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<CanonSeq, CanonError> {
        Ok(CanonSeq {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<CanonSeq, CanonError> {
        Ok(CanonSeq {
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<CanonSeq, CanonError> {
        Ok(CanonSeq {
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<CanonVariantSeq, CanonError> {
        Ok(CanonVariantSeq {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<CanonMap, CanonError> {
        Ok(CanonMap {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<CanonStruct, CanonError> {
        Ok(CanonStruct {
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<CanonVariantStruct, CanonError> {
        Ok(CanonVariantStruct {
            variant,
            fields: Vec::with_capacity(len),
        })
    }
}

impl ser::SerializeSeq for CanonSeq {
    type Ok = String;
    type Error = CanonError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CanonError> {
        self.items.push(value.serialize(CanonicalSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<String, CanonError> {
        Ok(join_items(&self.items))
    }
}

impl ser::SerializeTuple for CanonSeq {
    type Ok = String;
    type Error = CanonError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CanonError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<String, CanonError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for CanonSeq {
    type Ok = String;
    type Error = CanonError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CanonError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<String, CanonError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for CanonVariantSeq {
    type Ok = String;
    type Error = CanonError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CanonError> {
        self.items.push(value.serialize(CanonicalSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<String, CanonError> {
        Ok(join_entries(
            '{',
            &[(escape_str(self.variant), join_items(&self.items))],
            '}',
        ))
    }
}

impl ser::SerializeMap for CanonMap {
    type Ok = String;
    type Error = CanonError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), CanonError> {
        let serialized = key.serialize(CanonicalSerializer)?;
        if !serialized.starts_with('"') {
            return Err(ser::Error::custom(format!(
                "map key {serialized} is not a string"
            )));
        }
        self.pending_key = Some(serialized);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CanonError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| ser::Error::custom("map value serialized before its key"))?;
        self.entries.push((key, value.serialize(CanonicalSerializer)?));
        Ok(())
    }

    fn end(mut self) -> Result<String, CanonError> {
        self.entries.sort();
        Ok(join_entries('{', &self.entries, '}'))
    }
}

impl ser::SerializeStruct for CanonStruct {
    type Ok = String;
    type Error = CanonError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CanonError> {
        self.fields
            .push((escape_str(key), value.serialize(CanonicalSerializer)?));
        Ok(())
    }

    fn end(mut self) -> Result<String, CanonError> {
        self.fields.sort();
        Ok(join_entries('{', &self.fields, '}'))
    }
}

impl ser::SerializeStructVariant for CanonVariantStruct {
    type Ok = String;
    type Error = CanonError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CanonError> {
        self.fields
            .push((escape_str(key), value.serialize(CanonicalSerializer)?));
        Ok(())
    }

    fn end(mut self) -> Result<String, CanonError> {
        self.fields.sort();
        Ok(join_entries(
            '{',
            &[(escape_str(self.variant), join_entries('{', &self.fields, '}'))],
            '}',
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Sample {
        exposure_floor: f32,
        exposure_ceiling: f32,
        average: bool,
        label: Option<String>,
    }

    fn sample() -> Sample {
        Sample {
            exposure_floor: 0.02,
            exposure_ceiling: 0.98,
            average: false,
            label: None,
        }
    }

    #[test]
    fn digest_is_32_lowercase_hex_digits() {
        let digest = digest_config(&sample()).unwrap();
        assert_eq!(digest.as_str().len(), 32);
        assert!(digest
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn digest_is_deterministic_across_calls() {
        assert_eq!(
            digest_config(&sample()).unwrap(),
            digest_config(&sample()).unwrap(),
        );
    }

    #[test]
    fn field_declaration_order_does_not_matter() {
        #[derive(Serialize)]
        struct Forward {
            alpha: u32,
            beta: String,
        }
        #[derive(Serialize)]
        struct Reversed {
            beta: String,
            alpha: u32,
        }

        let forward = Forward {
            alpha: 7,
            beta: "clip".to_string(),
        };
        let reversed = Reversed {
            beta: "clip".to_string(),
            alpha: 7,
        };
        assert_eq!(
            digest_config(&forward).unwrap(),
            digest_config(&reversed).unwrap(),
        );
    }

    #[test]
    fn map_insertion_order_does_not_matter() {
        let mut first = HashMap::new();
        first.insert("red".to_string(), 0.1_f64);
        first.insert("green".to_string(), 0.2);
        first.insert("blue".to_string(), 0.3);

        let mut second = HashMap::new();
        second.insert("blue".to_string(), 0.3_f64);
        second.insert("red".to_string(), 0.1);
        second.insert("green".to_string(), 0.2);

        assert_eq!(
            digest_config(&first).unwrap(),
            digest_config(&second).unwrap(),
        );
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let base = digest_config(&sample()).unwrap();

        let mut changed = sample();
        changed.exposure_floor = 0.03;
        assert_ne!(base, digest_config(&changed).unwrap());

        let mut changed = sample();
        changed.average = true;
        assert_ne!(base, digest_config(&changed).unwrap());

        let mut changed = sample();
        changed.label = Some("push +1".to_string());
        assert_ne!(base, digest_config(&changed).unwrap());
    }

    #[test]
    fn none_is_distinguished_from_zero_and_empty() {
        #[derive(Serialize)]
        struct Opt {
            value: Option<f64>,
        }
        let unset = digest_config(&Opt { value: None }).unwrap();
        let zero = digest_config(&Opt { value: Some(0.0) }).unwrap();
        assert_ne!(unset, zero);

        #[derive(Serialize)]
        struct OptStr {
            value: Option<String>,
        }
        let unset = digest_config(&OptStr { value: None }).unwrap();
        let empty = digest_config(&OptStr {
            value: Some(String::new()),
        })
        .unwrap();
        assert_ne!(unset, empty);
    }

    #[test]
    fn tuples_are_position_sensitive() {
        #[derive(Serialize)]
        struct Pair {
            bounds: (f32, f32),
        }
        let a = digest_config(&Pair { bounds: (0.1, 0.9) }).unwrap();
        let b = digest_config(&Pair { bounds: (0.9, 0.1) }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn enum_variants_are_distinguished() {
        #[derive(Serialize)]
        enum Mode {
            Negative,
            Positive,
            Scaled(f32),
            Curve { gamma: f32, toe: f32 },
        }
        let digests = [
            digest_config(&Mode::Negative).unwrap(),
            digest_config(&Mode::Positive).unwrap(),
            digest_config(&Mode::Scaled(1.0)).unwrap(),
            digest_config(&Mode::Curve {
                gamma: 2.2,
                toe: 0.01,
            })
            .unwrap(),
        ];
        for (i, a) in digests.iter().enumerate() {
            for b in &digests[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn non_finite_floats_are_unhashable() {
        #[derive(Serialize)]
        struct Bad {
            gamma: f64,
        }
        let result = digest_config(&Bad { gamma: f64::NAN });
        assert!(matches!(result, Err(CacheError::UnhashableConfig(_))));
        let result = digest_config(&Bad {
            gamma: f64::INFINITY,
        });
        assert!(matches!(result, Err(CacheError::UnhashableConfig(_))));
    }

    #[test]
    fn non_string_map_keys_are_unhashable() {
        let mut map = HashMap::new();
        map.insert(3_u32, "red");
        assert!(matches!(
            digest_config(&map),
            Err(CacheError::UnhashableConfig(_)),
        ));
    }

    #[test]
    fn strings_with_quotes_and_separators_do_not_collide() {
        #[derive(Serialize)]
        struct Two {
            a: String,
            b: String,
        }
        let first = Two {
            a: "x\",\"b\":\"y".to_string(),
            b: String::new(),
        };
        let second = Two {
            a: "x".to_string(),
            b: "y".to_string(),
        };
        assert_ne!(
            digest_config(&first).unwrap(),
            digest_config(&second).unwrap(),
        );
    }

    #[test]
    fn parse_accepts_valid_hex() {
        let digest = ConfigDigest::parse("00ff12abcd").unwrap();
        assert_eq!(digest.as_str(), "00ff12abcd");
        assert_eq!(digest.to_string(), "00ff12abcd");
    }

    #[test]
    fn parse_rejects_empty_and_non_hex() {
        assert!(matches!(
            ConfigDigest::parse(""),
            Err(CacheError::InvalidEntry(_)),
        ));
        assert!(matches!(
            ConfigDigest::parse("ABCDEF"),
            Err(CacheError::InvalidEntry(_)),
        ));
        assert!(matches!(
            ConfigDigest::parse("xyz"),
            Err(CacheError::InvalidEntry(_)),
        ));
    }

    #[test]
    fn display_fallback_is_deterministic_but_distinct() {
        let a = digest_display("process=negative floor=0.02");
        let b = digest_display("process=negative floor=0.02");
        let c = digest_display("process=negative floor=0.03");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
