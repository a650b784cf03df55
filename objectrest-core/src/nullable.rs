//! Tri-state nullable-optional fields.

/// A field whose wire presence has three states: absent, explicit null, or a
/// value.
///
/// The peer distinguishes "never set" (key omitted) from "explicitly set to
/// null" (`"field": null`), and both must round-trip. Encoding a
/// [`NullableOption::Unset`] field omits the key entirely; decoding an absent
/// key leaves the field `Unset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NullableOption<T> {
    /// The field was never set; it does not appear on the wire.
    #[default]
    Unset,
    /// The field was explicitly set to null.
    Null,
    /// The field holds a value.
    Set(T),
}

impl<T> NullableOption<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, NullableOption::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NullableOption::Null)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, NullableOption::Set(_))
    }

    /// The held value, if any. `Unset` and `Null` both yield `None`.
    pub fn value(&self) -> Option<&T> {
        match self {
            NullableOption::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            NullableOption::Set(value) => Some(value),
            _ => None,
        }
    }

    /// Build from an option, mapping `None` to an explicit null.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => NullableOption::Set(value),
            None => NullableOption::Null,
        }
    }

    pub fn as_ref(&self) -> NullableOption<&T> {
        match self {
            NullableOption::Unset => NullableOption::Unset,
            NullableOption::Null => NullableOption::Null,
            NullableOption::Set(value) => NullableOption::Set(value),
        }
    }
}
