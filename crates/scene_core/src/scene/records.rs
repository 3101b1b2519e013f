//! Scene object records
//!
//! Plain value types stored in the object pools. Records hold only data and
//! handles; every mutation goes through [`Scene`](super::Scene) so the dirty
//! state stays consistent.

use super::dirty::PrimitiveDirt;
use super::handle::{MaterialHandle, ObjectKind, PoolRecord, TextureHandle};
use super::resources::{GeometryRef, ImageRef};
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// A renderable instance of some geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Externally owned vertex/index buffers
    pub geometry: GeometryRef,
    /// Object-to-world transform
    pub xform: Mat4,
    /// Surface description
    pub material: MaterialHandle,
    /// Hidden primitives stay in the pool but are skipped when drawing
    pub visible: bool,
    /// What happened to this primitive during the current frame
    pub dirt: PrimitiveDirt,
}

impl PoolRecord for Primitive {
    const KIND: ObjectKind = ObjectKind::Primitive;
}

impl Primitive {
    /// Create a visible primitive with no pending changes
    pub fn new(geometry: GeometryRef, xform: Mat4, material: MaterialHandle) -> Self {
        Self {
            geometry,
            xform,
            material,
            visible: true,
            dirt: PrimitiveDirt::empty(),
        }
    }

    /// Whether the primitive is marked for removal at the end of the frame
    pub fn is_removed(&self) -> bool {
        self.dirt.contains(PrimitiveDirt::REMOVED)
    }
}

/// Light types and their type-specific payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Light radiating in all directions from a position
    Point {
        /// World-space position
        position: Vec3,
    },
    /// Light with parallel rays (like sunlight)
    Directional {
        /// Normalized world-space direction the light travels in
        direction: Vec3,
    },
}

impl LightKind {
    /// Create a point light payload
    pub fn point(position: Vec3) -> Self {
        Self::Point { position }
    }

    /// Create a directional light payload; `direction` is normalized
    ///
    /// A zero-length direction has no orientation and falls back to straight
    /// down (-Y).
    pub fn directional(direction: Vec3) -> Self {
        let direction = direction.try_normalize(f32::EPSILON).unwrap_or_else(|| {
            log::warn!("Directional light created with zero direction; pointing it down");
            -Vec3::y()
        });
        Self::Directional { direction }
    }

    /// Numeric tag shared with shaders
    pub fn tag(&self) -> u32 {
        match self {
            Self::Point { .. } => 0,
            Self::Directional { .. } => 1,
        }
    }
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Type and payload
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl PoolRecord for Light {
    const KIND: ObjectKind = ObjectKind::Light;
}

impl Light {
    /// Create a light
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self { kind, color, intensity }
    }
}

/// Texture slots of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialSlot {
    /// Albedo texture
    BaseColor = 0,
    /// Tangent-space normal map
    Normal = 1,
    /// Metallic in B, roughness in G
    MetallicRoughness = 2,
}

/// Number of texture slots per material
pub const MATERIAL_TEXTURE_SLOTS: usize = 3;

/// Surface description
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color with alpha
    pub base_color: Vec4,
    /// Roughness factor
    pub roughness: f32,
    /// Texture per [`MaterialSlot`]; unused slots point at the default texture
    pub textures: [TextureHandle; MATERIAL_TEXTURE_SLOTS],
}

impl PoolRecord for Material {
    const KIND: ObjectKind = ObjectKind::Material;
}

impl Material {
    /// Create an untextured material
    pub fn new(base_color: Vec4, roughness: f32) -> Self {
        Self {
            base_color,
            roughness,
            textures: [TextureHandle::DEFAULT; MATERIAL_TEXTURE_SLOTS],
        }
    }

    /// Attach a texture to a slot
    pub fn with_texture(mut self, slot: MaterialSlot, texture: TextureHandle) -> Self {
        self.textures[slot as usize] = texture;
        self
    }

    /// Texture bound to a slot
    pub fn texture(&self, slot: MaterialSlot) -> TextureHandle {
        self.textures[slot as usize]
    }
}

/// Reference to a GPU image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    /// Externally owned image
    pub image: ImageRef,
}

impl PoolRecord for Texture {
    const KIND: ObjectKind = ObjectKind::Texture;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_light_is_normalized() {
        let kind = LightKind::directional(Vec3::new(0.0, -3.0, 4.0));
        match kind {
            LightKind::Directional { direction } => {
                assert_relative_eq!(direction.norm(), 1.0, epsilon = 1e-6);
                assert_relative_eq!(direction.y, -0.6, epsilon = 1e-6);
            }
            LightKind::Point { .. } => panic!("expected directional light"),
        }
        assert_eq!(kind.tag(), 1);
    }

    #[test]
    fn test_zero_direction_falls_back_to_down() {
        let kind = LightKind::directional(Vec3::zeros());
        assert_eq!(kind, LightKind::Directional { direction: -Vec3::y() });
    }

    #[test]
    fn test_material_slots_default_to_texture_zero() {
        let tex = TextureHandle::from_id(5);
        let material = Material::new(Vec4::new(1.0, 1.0, 1.0, 1.0), 0.5)
            .with_texture(MaterialSlot::Normal, tex);

        assert!(material.texture(MaterialSlot::BaseColor).is_default());
        assert_eq!(material.texture(MaterialSlot::Normal), tex);
        assert!(material.texture(MaterialSlot::MetallicRoughness).is_default());
    }
}
