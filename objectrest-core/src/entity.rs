//! The entity object model.
//!
//! Decoded wire objects form a typed, possibly cyclic graph. Every node
//! implements [`ApiType`]; generated code provides the implementations, the
//! codec drives them. Unrecognized wire fields are captured per instance in
//! an [`UnknownFields`] bag and are never written back on re-encode.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::descriptor::TypeSpec;
use crate::error::CodecError;
use crate::registry::TypeRegistry;

/// An insertion-ordered JSON object map.
///
/// Key order is meaningful on the wire: the type tag must be the first
/// property of every entity object.
pub type JsonMap = serde_json::Map<String, Value>;

/// A node in the remote object graph.
///
/// Implemented by generated entity types. The methods are the minimal
/// surface the codec needs: identify the type, write fields out, take
/// decoded fields in, and hold unrecognized fields.
pub trait ApiType: fmt::Debug + Send + Any {
    /// The static descriptor of this entity's concrete type.
    fn type_spec(&self) -> &'static TypeSpec;

    /// Append this entity's fields to `out`, excluding the type tag.
    ///
    /// A field is written when its value is non-null or when it was
    /// explicitly set to null (see [`NullableOption`](crate::NullableOption));
    /// never-set fields are omitted entirely.
    fn encode_fields(&self, out: &mut JsonMap) -> Result<(), CodecError>;

    /// Consume one decoded wire field.
    ///
    /// Returns `Ok(None)` when the field was recognized and stored, or
    /// `Ok(Some(value))` handing the value back for the unknown-field bag.
    fn decode_field(
        &mut self,
        name: &str,
        value: Value,
        registry: &TypeRegistry,
    ) -> Result<Option<Value>, CodecError>;

    /// Wire fields that did not match any declared property.
    fn unknown_fields(&self) -> &UnknownFields;

    /// Mutable access to the unknown-field bag; used by the codec.
    fn unknown_fields_mut(&mut self) -> &mut UnknownFields;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Implemented by every generated entity type in addition to [`ApiType`],
/// tying the type to its static descriptor without a value at hand.
pub trait TypedEntity: ApiType + Sized {
    fn spec() -> &'static TypeSpec;
}

/// Wire fields captured during decode that matched no declared property.
///
/// Kept for forward compatibility so a newer peer does not break older
/// generated code. The bag is observational only: re-encoding the entity
/// does not emit these fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnknownFields {
    fields: JsonMap,
}

impl UnknownFields {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn insert(&mut self, name: String, value: Value) {
        self.fields.insert(name, value);
    }
}

/// A decoded entity statically expected to be `T`, dynamically possibly a
/// registered subtype of it.
///
/// This is the slot type for polymorphic relations and return values: the
/// concrete type is chosen purely by the wire tag, so a `Poly<Thing>` may
/// hold any registered subtype of `Thing`. Use [`downcast_ref`] or
/// [`downcast`] to recover the concrete type.
///
/// [`downcast_ref`]: Poly::downcast_ref
/// [`downcast`]: Poly::downcast
pub struct Poly<T: TypedEntity> {
    inner: Box<dyn ApiType>,
    _expected: PhantomData<fn() -> T>,
}

impl<T: TypedEntity + 'static> Poly<T> {
    /// Wrap an exact instance of the expected type.
    pub fn new(entity: T) -> Self {
        Poly {
            inner: Box::new(entity),
            _expected: PhantomData,
        }
    }

    /// Wrap an already-boxed entity, verifying it is `T` or a subtype.
    pub fn from_boxed(inner: Box<dyn ApiType>) -> Result<Self, CodecError> {
        if !inner.type_spec().is_subtype_of(T::spec()) {
            return Err(CodecError::NotSubtype {
                expected: T::spec().tag,
                actual: inner.type_spec().tag.to_owned(),
            });
        }
        Ok(Poly {
            inner,
            _expected: PhantomData,
        })
    }

    /// The wire tag of the concrete type held.
    pub fn tag(&self) -> &'static str {
        self.inner.type_spec().tag
    }

    /// The descriptor of the concrete type held.
    pub fn type_spec(&self) -> &'static TypeSpec {
        self.inner.type_spec()
    }

    /// Borrow the held entity through the object-safe trait.
    pub fn get(&self) -> &dyn ApiType {
        self.inner.as_ref()
    }

    /// Borrow the held entity as a concrete type, if it is exactly `S`.
    pub fn downcast_ref<S: TypedEntity + 'static>(&self) -> Option<&S> {
        self.inner.as_any().downcast_ref::<S>()
    }

    /// Take the held entity as a concrete type, if it is exactly `S`.
    pub fn downcast<S: TypedEntity + 'static>(self) -> Result<S, Self> {
        if self.inner.as_any().is::<S>() {
            let any = self.inner.into_any();
            match any.downcast::<S>() {
                Ok(boxed) => Ok(*boxed),
                Err(_) => unreachable!("checked by is::<S>() above"),
            }
        } else {
            Err(self)
        }
    }

    /// Give up the typed wrapper and return the boxed entity.
    pub fn into_inner(self) -> Box<dyn ApiType> {
        self.inner
    }
}

impl<T: TypedEntity + 'static> fmt::Debug for Poly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Poly").field(&self.inner).finish()
    }
}
