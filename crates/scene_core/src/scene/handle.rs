//! Stable typed handles
//!
//! A handle is an opaque integer identifying a logical scene object
//! independently of where its record currently sits in the dense pool.
//! The record type is part of the handle type, so a `LightHandle` can never
//! be passed where a `MaterialHandle` is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// The four kinds of object a scene manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Renderable geometry instance
    Primitive,
    /// Point or directional light
    Light,
    /// Surface description referencing textures
    Material,
    /// Reference to a GPU image
    Texture,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Primitive => "primitive",
            ObjectKind::Light => "light",
            ObjectKind::Material => "material",
            ObjectKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

/// Record types that can be stored in an object pool
pub trait PoolRecord {
    /// Kind tag used in errors and logs
    const KIND: ObjectKind;
}

/// Typed handle for stable references into an object pool
///
/// Id `0` of primitives, materials and textures names the default object
/// created with the scene. Lights have no default.
pub struct Handle<T> {
    id: u32,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Id 0; the always-present default object for kinds that have one
    pub const DEFAULT: Self = Self::from_id(0);

    pub(crate) const fn from_id(id: u32) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }

    /// Get the raw id
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Whether this handle names the reserved default object
    pub const fn is_default(self) -> bool {
        self.id == 0
    }
}

// Manual impls: the marker type never needs to be Copy/Eq itself.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<T: PoolRecord> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::KIND, self.id)
    }
}

/// Handle to a [`Primitive`](super::Primitive)
pub type PrimitiveHandle = Handle<super::Primitive>;

/// Handle to a [`Light`](super::Light)
pub type LightHandle = Handle<super::Light>;

/// Handle to a [`Material`](super::Material)
pub type MaterialHandle = Handle<super::Material>;

/// Handle to a [`Texture`](super::Texture)
pub type TextureHandle = Handle<super::Texture>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_handle_is_id_zero() {
        assert_eq!(MaterialHandle::DEFAULT.id(), 0);
        assert!(TextureHandle::default().is_default());
        assert!(!PrimitiveHandle::from_id(3).is_default());
    }

    #[test]
    fn test_debug_names_kind() {
        assert_eq!(format!("{:?}", LightHandle::from_id(7)), "light#7");
        assert_eq!(format!("{:?}", PrimitiveHandle::from_id(2)), "primitive#2");
    }
}
