//! Generator-produced descriptors.
//!
//! The offline generator turns API metadata into static tables of these
//! descriptors; the runtime treats them as opaque input. A generated entity
//! type carries a [`TypeSpec`], a generated service carries a [`ServiceSpec`]
//! plus one [`MethodSpec`] per remote operation.

use crate::entity::ApiType;

/// Static descriptor of a generated entity type.
///
/// `parent` encodes the subtype chain the peer's type system defines; the
/// codec walks it when deciding whether a wire tag may satisfy a statically
/// expected type.
#[derive(Debug)]
pub struct TypeSpec {
    /// The wire type tag, e.g. `"Acme_Virtual_Guest"`.
    pub tag: &'static str,
    /// The direct supertype, if any.
    pub parent: Option<&'static TypeSpec>,
    /// Construct an empty boxed instance for the codec to fill.
    pub construct: fn() -> Box<dyn ApiType>,
}

impl TypeSpec {
    /// Whether this type equals `other` or has it anywhere in its parent
    /// chain. Descriptors are compared by identity: the generator emits one
    /// static per type.
    pub fn is_subtype_of(&self, other: &'static TypeSpec) -> bool {
        let mut current = Some(self);
        while let Some(spec) = current {
            if std::ptr::eq(spec, other) {
                return true;
            }
            current = spec.parent;
        }
        false
    }
}

/// Static descriptor of a generated service.
#[derive(Clone, Copy, Debug)]
pub struct ServiceSpec {
    /// The service's path segment, e.g. `"Acme_Virtual_Guest"`.
    pub name: &'static str,
}

/// Static descriptor of a remote method on a service.
#[derive(Clone, Copy, Debug)]
pub struct MethodSpec {
    /// The remote method name (after any generator rename), e.g.
    /// `"getObject"` or `"powerOn"`. The HTTP verb and path segment are
    /// derived from this name by the dispatcher.
    pub name: &'static str,
    /// Whether the method operates on a bound instance and therefore
    /// requires the handle to carry an instance id.
    pub instance_required: bool,
}
