//! The wire-tag → type descriptor registry.
//!
//! Polymorphic decode resolves the embedded type tag of every entity object
//! through a registry built once from the generated type table. The registry
//! can be held per client or installed process-wide.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::descriptor::TypeSpec;

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Maps wire type tags to their static descriptors.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    by_tag: HashMap<&'static str, &'static TypeSpec>,
}

impl TypeRegistry {
    /// Build a registry from a generated type table.
    pub fn new(specs: &[&'static TypeSpec]) -> Self {
        let mut by_tag = HashMap::with_capacity(specs.len());
        for spec in specs {
            by_tag.insert(spec.tag, *spec);
        }
        TypeRegistry { by_tag }
    }

    /// Look up the descriptor for a wire tag.
    ///
    /// An unrecognized tag is not an error: the codec falls back to the
    /// statically expected type so newer peer types decode as their nearest
    /// known supertype.
    pub fn resolve(&self, tag: &str) -> Option<&'static TypeSpec> {
        self.by_tag.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Install the process-wide registry. The first call wins; later calls
    /// return the already-installed registry unchanged.
    ///
    /// Generated SDK crates call this once from their entry point so clients
    /// built without an explicit type table still resolve tags.
    pub fn install(specs: &[&'static TypeSpec]) -> &'static TypeRegistry {
        GLOBAL.get_or_init(|| TypeRegistry::new(specs))
    }

    /// The process-wide registry; empty when nothing was installed.
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(TypeRegistry::default)
    }
}
