//! Aggregate serializer: deep-copy a value into plain data and back
//!
//! `to_plain` walks any `Serialize` value into a `PlainValue` tree and
//! `from_plain` rebuilds a typed value from that tree. The round trip yields
//! a detached, depth-complete copy and fails on anything that has no plain
//! representation: non-finite floats, non-string map keys, raw bytes.

use super::types::AnalysisAggregate;
use crate::events::{EventSink, PipelineEvent};
use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use serde::ser::{self, Serialize, SerializeMap as _, SerializeSeq as _, Serializer as _};
use std::fmt;
use std::sync::Arc;

/// A plain data tree. Map entries keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<PlainValue>),
    Map(Vec<(String, PlainValue)>),
}

impl PlainValue {
    /// Look up a map entry by key
    pub fn get(&self, key: &str) -> Option<&PlainValue> {
        match self {
            PlainValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PlainValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SerializationError {
    #[error("non-finite float: {0}")]
    NonFiniteFloat(String),

    #[error("map key is not a string")]
    NonStringKey,

    #[error("unsupported value: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Custom(String),
}

impl ser::Error for SerializationError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerializationError::Custom(msg.to_string())
    }
}

impl de::Error for SerializationError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerializationError::Custom(msg.to_string())
    }
}

pub fn to_plain<T: Serialize + ?Sized>(value: &T) -> Result<PlainValue, SerializationError> {
    value.serialize(PlainSerializer)
}

pub fn from_plain<T: DeserializeOwned>(value: PlainValue) -> Result<T, SerializationError> {
    T::deserialize(value)
}

/// Copy `value` through the plain tree. Idempotent on its own output.
pub fn normalize<T: Serialize + DeserializeOwned>(value: &T) -> Result<T, SerializationError> {
    from_plain(to_plain(value)?)
}

/// Normalizes pipeline results before they leave the crate.
#[derive(Clone)]
pub struct AggregateSerializer {
    sink: Arc<dyn EventSink>,
}

impl AggregateSerializer {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Normalize `value`, or replace it with `fallback(value, error)`.
    ///
    /// A fallback emits `AggregateDegraded`; nothing is raised.
    pub fn normalize_or<T, F>(&self, value: T, fallback: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(T, SerializationError) -> T,
    {
        match normalize(&value) {
            Ok(normalized) => normalized,
            Err(e) => {
                self.sink.emit(PipelineEvent::AggregateDegraded {
                    reason: e.to_string(),
                });
                fallback(value, e)
            }
        }
    }

    /// Normalize a finished aggregate. On failure only the transcript survives.
    ///
    /// Every leaf of today's aggregate is a string, so the degrade branch is
    /// unreachable until a field gains a number or an untyped value.
    pub fn finalize(&self, aggregate: AnalysisAggregate) -> AnalysisAggregate {
        self.normalize_or(aggregate, degrade_aggregate)
    }
}

fn degrade_aggregate(aggregate: AnalysisAggregate, error: SerializationError) -> AnalysisAggregate {
    AnalysisAggregate::serialization_failure(aggregate.original_conversation_text, error)
}

// ---------------------------------------------------------------------------
// Serialize: Rust value -> PlainValue
// ---------------------------------------------------------------------------

struct PlainSerializer;

fn finite(v: f64) -> Result<PlainValue, SerializationError> {
    if v.is_finite() {
        Ok(PlainValue::Float(v))
    } else {
        Err(SerializationError::NonFiniteFloat(v.to_string()))
    }
}

fn plain_key(key: PlainValue) -> Result<String, SerializationError> {
    match key {
        PlainValue::String(s) => Ok(s),
        _ => Err(SerializationError::NonStringKey),
    }
}

impl ser::Serializer for PlainSerializer {
    type Ok = PlainValue;
    type Error = SerializationError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantMapBuilder;

    fn serialize_bool(self, v: bool) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::UInt(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::UInt(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::UInt(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::UInt(v))
    }

    fn serialize_f32(self, v: f32) -> Result<PlainValue, Self::Error> {
        finite(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<PlainValue, Self::Error> {
        finite(v)
    }

    fn serialize_char(self, v: char) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::String(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<PlainValue, Self::Error> {
        Err(SerializationError::Unsupported("raw byte buffer"))
    }

    fn serialize_none(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<PlainValue, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<PlainValue, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Map(vec![(
            variant.to_string(),
            value.serialize(PlainSerializer)?,
        )]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, Self::Error> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqBuilder, Self::Error> {
        Ok(VariantSeqBuilder {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, Self::Error> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder, Self::Error> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantMapBuilder, Self::Error> {
        Ok(VariantMapBuilder {
            variant,
            entries: Vec::with_capacity(len),
        })
    }
}

struct SeqBuilder {
    items: Vec<PlainValue>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.items.push(value.serialize(PlainSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::List(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

struct VariantSeqBuilder {
    variant: &'static str,
    items: Vec<PlainValue>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.items.push(value.serialize(PlainSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Map(vec![(
            self.variant.to_string(),
            PlainValue::List(self.items),
        )]))
    }
}

struct MapBuilder {
    entries: Vec<(String, PlainValue)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.pending_key = Some(plain_key(key.serialize(PlainSerializer)?)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| SerializationError::Custom("map value without a key".into()))?;
        self.entries.push((key, value.serialize(PlainSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Map(self.entries))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.entries
            .push((key.to_string(), value.serialize(PlainSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Map(self.entries))
    }
}

struct VariantMapBuilder {
    variant: &'static str,
    entries: Vec<(String, PlainValue)>,
}

impl ser::SerializeStructVariant for VariantMapBuilder {
    type Ok = PlainValue;
    type Error = SerializationError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.entries
            .push((key.to_string(), value.serialize(PlainSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<PlainValue, Self::Error> {
        Ok(PlainValue::Map(vec![(
            self.variant.to_string(),
            PlainValue::Map(self.entries),
        )]))
    }
}

impl Serialize for PlainValue {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlainValue::Null => serializer.serialize_unit(),
            PlainValue::Bool(b) => serializer.serialize_bool(*b),
            PlainValue::Int(i) => serializer.serialize_i64(*i),
            PlainValue::UInt(u) => serializer.serialize_u64(*u),
            PlainValue::Float(f) => serializer.serialize_f64(*f),
            PlainValue::String(s) => serializer.serialize_str(s),
            PlainValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PlainValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deserialize: PlainValue -> Rust value
// ---------------------------------------------------------------------------

impl<'de> IntoDeserializer<'de, SerializationError> for PlainValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> de::Deserializer<'de> for PlainValue {
    type Error = SerializationError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            PlainValue::Null => visitor.visit_unit(),
            PlainValue::Bool(b) => visitor.visit_bool(b),
            PlainValue::Int(i) => visitor.visit_i64(i),
            PlainValue::UInt(u) => visitor.visit_u64(u),
            PlainValue::Float(f) => visitor.visit_f64(f),
            PlainValue::String(s) => visitor.visit_string(s),
            PlainValue::List(items) => {
                let mut seq: SeqDeserializer<_, SerializationError> =
                    SeqDeserializer::new(items.into_iter());
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            PlainValue::Map(entries) => {
                let mut map: MapDeserializer<'de, _, SerializationError> =
                    MapDeserializer::new(entries.into_iter());
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(value)
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            PlainValue::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let (variant, value) = match self {
            PlainValue::String(variant) => (variant, None),
            PlainValue::Map(mut entries) if entries.len() == 1 => {
                let (variant, value) = entries.remove(0);
                (variant, Some(value))
            }
            _ => {
                return Err(SerializationError::Custom(
                    "expected a variant name or a single-entry map".into(),
                ))
            }
        };
        visitor.visit_enum(EnumAccessor { variant, value })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

struct EnumAccessor {
    variant: String,
    value: Option<PlainValue>,
}

impl<'de> de::EnumAccess<'de> for EnumAccessor {
    type Error = SerializationError;
    type Variant = VariantAccessor;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantAccessor), Self::Error> {
        let name: StringDeserializer<SerializationError> = self.variant.into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((variant, VariantAccessor { value: self.value }))
    }
}

struct VariantAccessor {
    value: Option<PlainValue>,
}

impl VariantAccessor {
    fn payload(self) -> Result<PlainValue, SerializationError> {
        self.value
            .ok_or_else(|| SerializationError::Custom("variant payload missing".into()))
    }
}

impl<'de> de::VariantAccess<'de> for VariantAccessor {
    type Error = SerializationError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None | Some(PlainValue::Null) => Ok(()),
            Some(_) => Err(SerializationError::Custom(
                "unexpected payload for unit variant".into(),
            )),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, Self::Error> {
        seed.deserialize(self.payload()?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_any(self.payload()?, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        de::Deserializer::deserialize_any(self.payload()?, visitor)
    }
}
