//! Polymorphic JSON wire codec.
//!
//! Entities travel as JSON objects whose first property is the type tag
//! (`complexType`); decode picks the concrete type from that tag through the
//! [`TypeRegistry`]. Unrecognized fields go into the entity's unknown-field
//! bag instead of failing the call. Scalar adapters live in [`scalars`].

use serde_json::Value;

use crate::descriptor::TypeSpec;
use crate::entity::{ApiType, JsonMap, Poly, TypedEntity};
use crate::error::CodecError;
use crate::nullable::NullableOption;
use crate::registry::TypeRegistry;

pub mod scalars;

/// The discriminator property naming an entity's concrete type. Always the
/// first property written, and required to be the first property read.
pub const TYPE_TAG_FIELD: &str = "complexType";

/// The single key of the request body envelope.
pub const PARAMETERS_FIELD: &str = "parameters";

/// Types that encode themselves to a wire value.
pub trait ToWire {
    fn to_wire(&self) -> Result<Value, CodecError>;
}

/// Types that decode themselves from a wire value.
///
/// The registry parameter is threaded through so nested entity slots can
/// resolve wire tags; scalar implementations ignore it.
pub trait FromWire: Sized + Send + 'static {
    fn from_wire(value: Value, registry: &TypeRegistry) -> Result<Self, CodecError>;
}

/// Encode an entity as a wire object, type tag first.
///
/// Fields come from [`ApiType::encode_fields`]; the unknown-field bag is
/// never written back.
pub fn encode_entity(entity: &dyn ApiType) -> Result<Value, CodecError> {
    let mut map = JsonMap::new();
    map.insert(
        TYPE_TAG_FIELD.to_owned(),
        Value::String(entity.type_spec().tag.to_owned()),
    );
    entity.encode_fields(&mut map)?;
    Ok(Value::Object(map))
}

/// Decode a wire object into the concrete type named by its tag.
///
/// The tag must be the first property. A registered tag must name `expected`
/// or a subtype of it; an unregistered tag falls back to `expected` itself so
/// newer peer types decode as their nearest known supertype. Fields the
/// chosen type does not declare are captured in its unknown-field bag.
pub fn decode_entity(
    value: Value,
    expected: &'static TypeSpec,
    registry: &TypeRegistry,
) -> Result<Box<dyn ApiType>, CodecError> {
    let kind = json_kind_of(&value);
    let Value::Object(map) = value else {
        return Err(CodecError::Malformed(format!(
            "expected an entity object, got {kind}"
        )));
    };
    let mut entries = map.into_iter();
    let Some((first_name, first_value)) = entries.next() else {
        return Err(CodecError::TagNotFirst);
    };
    if first_name != TYPE_TAG_FIELD {
        return Err(CodecError::TagNotFirst);
    }
    let Value::String(tag) = first_value else {
        return Err(CodecError::Malformed(
            "entity type tag is not a string".to_owned(),
        ));
    };

    let spec = match registry.resolve(&tag) {
        Some(spec) if spec.is_subtype_of(expected) => spec,
        Some(spec) => {
            return Err(CodecError::NotSubtype {
                expected: expected.tag,
                actual: spec.tag.to_owned(),
            });
        }
        None => expected,
    };

    let mut entity = (spec.construct)();
    for (name, value) in entries {
        if let Some(unrecognized) = entity.decode_field(&name, value, registry)? {
            entity.unknown_fields_mut().insert(name, unrecognized);
        }
    }
    Ok(entity)
}

/// Decode a wire object into exactly `T`.
///
/// Used by generated `FromWire` implementations for slots declared with a
/// concrete type. A wire tag naming a strict subtype cannot be stored here
/// and is an error; declare such slots as [`Poly`] instead.
pub fn decode_exact<T: TypedEntity + 'static>(
    value: Value,
    registry: &TypeRegistry,
) -> Result<T, CodecError> {
    let boxed = decode_entity(value, T::spec(), registry)?;
    let actual = boxed.type_spec().tag;
    match boxed.into_any().downcast::<T>() {
        Ok(entity) => Ok(*entity),
        Err(_) => Err(CodecError::UnexpectedSubtype {
            expected: T::spec().tag,
            actual,
        }),
    }
}

/// Build the request body envelope from encoded arguments, in declaration
/// order.
pub fn encode_request(params: Vec<Value>) -> Value {
    let mut map = JsonMap::new();
    map.insert(PARAMETERS_FIELD.to_owned(), Value::Array(params));
    Value::Object(map)
}

/// Write a plain optional field: omitted when `None`, encoded otherwise.
pub fn write_field<T: ToWire>(
    out: &mut JsonMap,
    name: &str,
    value: &Option<T>,
) -> Result<(), CodecError> {
    if let Some(value) = value {
        out.insert(name.to_owned(), value.to_wire()?);
    }
    Ok(())
}

/// Write a tri-state field: omitted when unset, `null` when explicitly null,
/// encoded otherwise.
pub fn write_nullable<T: ToWire>(
    out: &mut JsonMap,
    name: &str,
    value: &NullableOption<T>,
) -> Result<(), CodecError> {
    match value {
        NullableOption::Unset => {}
        NullableOption::Null => {
            out.insert(name.to_owned(), Value::Null);
        }
        NullableOption::Set(value) => {
            out.insert(name.to_owned(), value.to_wire()?);
        }
    }
    Ok(())
}

fn json_kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn type_mismatch(expected: &str, value: &Value) -> CodecError {
    CodecError::Malformed(format!("expected {expected}, got {}", json_kind_of(value)))
}

// --- FromWire implementations ---------------------------------------------

impl FromWire for () {
    fn from_wire(_value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        Ok(())
    }
}

// Raw JSON passes through untouched, for callers that want the undecoded
// result.
impl FromWire for Value {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        Ok(value)
    }
}

impl FromWire for bool {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch("a boolean", &other)),
        }
    }
}

impl FromWire for i64 {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| CodecError::Scalar(format!("number {n} does not fit in i64"))),
            other => Err(type_mismatch("a number", &other)),
        }
    }
}

impl FromWire for f64 {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| CodecError::Scalar(format!("number {n} is not representable"))),
            other => Err(type_mismatch("a number", &other)),
        }
    }
}

impl FromWire for String {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(type_mismatch("a string", &other)),
        }
    }
}

impl FromWire for chrono::DateTime<chrono::FixedOffset> {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => scalars::decode_date_time(&s),
            other => Err(type_mismatch("a date-time string", &other)),
        }
    }
}

impl FromWire for num_bigint::BigInt {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        scalars::decode_big_integer(&value)
    }
}

impl FromWire for bytes::Bytes {
    fn from_wire(value: Value, _registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => scalars::decode_binary(&s),
            other => Err(type_mismatch("a base64 string", &other)),
        }
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: Value, registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::from_wire(item, registry))
                .collect(),
            // The peer collapses a one-element result into a bare object;
            // normalize it back to a list. Decode-only.
            object @ Value::Object(_) => Ok(vec![T::from_wire(object, registry)?]),
            other => Err(type_mismatch("an array", &other)),
        }
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn from_wire(value: Value, registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(T::from_wire(other, registry)?)),
        }
    }
}

impl<T: FromWire> FromWire for NullableOption<T> {
    fn from_wire(value: Value, registry: &TypeRegistry) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(NullableOption::Null),
            other => Ok(NullableOption::Set(T::from_wire(other, registry)?)),
        }
    }
}

impl<T: TypedEntity + 'static> FromWire for Poly<T> {
    fn from_wire(value: Value, registry: &TypeRegistry) -> Result<Self, CodecError> {
        let inner = decode_entity(value, T::spec(), registry)?;
        Poly::from_boxed(inner)
    }
}

// --- ToWire implementations -----------------------------------------------

impl ToWire for () {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::Null)
    }
}

impl ToWire for Value {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(self.clone())
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::Bool(*self))
    }
}

impl ToWire for i64 {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::from(*self))
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::from(*self))
    }
}

impl ToWire for String {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::String(self.clone()))
    }
}

impl ToWire for &str {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::String((*self).to_owned()))
    }
}

impl ToWire for chrono::DateTime<chrono::FixedOffset> {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::String(scalars::encode_date_time(self)))
    }
}

impl ToWire for num_bigint::BigInt {
    fn to_wire(&self) -> Result<Value, CodecError> {
        scalars::encode_big_integer(self)
    }
}

impl ToWire for bytes::Bytes {
    fn to_wire(&self) -> Result<Value, CodecError> {
        Ok(Value::String(scalars::encode_binary(self)))
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> Result<Value, CodecError> {
        self.iter()
            .map(ToWire::to_wire)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> Result<Value, CodecError> {
        match self {
            Some(value) => value.to_wire(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: TypedEntity + 'static> ToWire for Poly<T> {
    fn to_wire(&self) -> Result<Value, CodecError> {
        encode_entity(self.get())
    }
}
