//! Incremental GPU-state synchronization
//!
//! [`FrameSync`] is the renderer side of the frame protocol. It keeps
//! CPU mirrors of the buffers a Vulkan renderer uploads (instance buffer,
//! light buffer, material buffer, bindless texture view array, camera
//! uniforms) and patches them from one [`FrameChanges`] per frame:
//!
//! - camera matrices are copied only when their bit is set
//! - lights are re-packed wholesale when `LIGHTS` is set (order is
//!   shader-visible and removal shifts it)
//! - materials and texture views are re-packed on `MATERIALS` / `TEXTURES`
//! - instances are patched one by one from the dirty primitive list
//!
//! The instance buffer is unordered: a released instance is swap-removed and
//! the moved instance's slot is re-pointed.

use std::collections::HashMap;

use ash::vk;
use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Mat4;
use crate::scene::{
    DirtyFlags, FrameChanges, LightKind, MaterialSlot, Primitive, PrimitiveDirt, PrimitiveHandle, Scene,
    MATERIAL_TEXTURE_SLOTS,
};

/// Instance flag: primitive is visible
pub const INSTANCE_VISIBLE: u32 = 1 << 0;
/// Instance flag: geometry uses an index buffer
pub const INSTANCE_INDEXED: u32 = 1 << 1;

/// Per-instance data as laid out in the instance buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuInstance {
    /// Model matrix, column-major
    pub model: [[f32; 4]; 4],
    /// Slot in the material buffer
    pub material_index: u32,
    /// `INSTANCE_*` bits
    pub flags: u32,
    /// Scene primitive id, for picking
    pub primitive_id: u32,
    /// std430 padding
    pub _pad: u32,
}

/// Light data as laid out in the light buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz: position (w = 1) or direction (w = 0)
    pub position_or_direction: [f32; 4],
    /// rgb: color, a: intensity
    pub color_intensity: [f32; 4],
}

/// Material data as laid out in the material buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    /// Base color with alpha
    pub base_color: [f32; 4],
    /// Index into the texture view array per slot
    pub texture_indices: [u32; MATERIAL_TEXTURE_SLOTS],
    /// Roughness factor
    pub roughness: f32,
}

/// Work done by one or more sync passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Instances written (new or patched)
    pub instances_written: usize,
    /// Instances released because their primitive was removed
    pub instances_released: usize,
    /// Light buffer re-uploads
    pub light_uploads: usize,
    /// Material buffer re-uploads
    pub material_uploads: usize,
    /// Texture descriptor array rewrites
    pub texture_uploads: usize,
    /// Camera uniform uploads (view and projection counted separately)
    pub camera_uploads: usize,
}

impl SyncStats {
    fn accumulate(&mut self, other: &Self) {
        self.instances_written += other.instances_written;
        self.instances_released += other.instances_released;
        self.light_uploads += other.light_uploads;
        self.material_uploads += other.material_uploads;
        self.texture_uploads += other.texture_uploads;
        self.camera_uploads += other.camera_uploads;
    }
}

/// CPU mirror of renderer GPU state, patched once per frame
#[derive(Debug, Default)]
pub struct FrameSync {
    instances: Vec<GpuInstance>,
    instance_owners: Vec<PrimitiveHandle>,
    instance_slots: HashMap<PrimitiveHandle, usize>,
    lights: Vec<GpuLight>,
    materials: Vec<GpuMaterial>,
    texture_views: Vec<vk::ImageView>,
    view: Mat4,
    projection: Mat4,
    frames: u64,
    totals: SyncStats,
}

impl FrameSync {
    /// Create an empty mirror
    pub fn new() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            ..Default::default()
        }
    }

    /// Apply one frame of scene changes; returns the work done
    pub fn apply(&mut self, changes: &FrameChanges<'_>) -> SyncStats {
        let scene = changes.scene();
        let mut stats = SyncStats::default();

        if changes.intersects(DirtyFlags::CAMERA_VIEW) {
            self.view = scene.camera().view;
            stats.camera_uploads += 1;
        }
        if changes.intersects(DirtyFlags::CAMERA_PROJ) {
            self.projection = scene.camera().projection;
            stats.camera_uploads += 1;
        }

        if changes.intersects(DirtyFlags::LIGHTS) {
            self.lights = scene.lights().iter().map(pack_light).collect();
            stats.light_uploads += 1;
        }

        if changes.intersects(DirtyFlags::TEXTURES) {
            self.texture_views = scene.textures().iter().map(|t| t.image.view).collect();
            stats.texture_uploads += 1;
        }

        // Texture removal shifts texture indices, so materials re-pack too.
        let repack_materials = changes.intersects(DirtyFlags::MATERIALS | DirtyFlags::TEXTURES);
        if repack_materials {
            self.materials = scene.materials().iter().map(|m| pack_material(scene, m)).collect();
            stats.material_uploads += 1;
        }

        for (handle, primitive) in changes.changed_primitives() {
            if primitive.dirt.contains(PrimitiveDirt::REMOVED) {
                if self.release_instance(handle) {
                    stats.instances_released += 1;
                }
            } else {
                self.write_instance(scene, handle, primitive);
                stats.instances_written += 1;
            }
        }

        // Material removal shifts material slots of untouched instances.
        if repack_materials {
            for (slot, owner) in self.instance_owners.iter().enumerate() {
                if let Ok(primitive) = scene.primitive(*owner) {
                    self.instances[slot].material_index = material_slot(scene, primitive);
                }
            }
        }

        self.frames += 1;
        self.totals.accumulate(&stats);
        log::trace!("Sync frame {}: {:?}", self.frames, stats);
        stats
    }

    /// Instance data for a primitive, if it has been synced
    pub fn instance(&self, handle: PrimitiveHandle) -> Option<&GpuInstance> {
        self.instance_slots.get(&handle).map(|&slot| &self.instances[slot])
    }

    /// Instance buffer contents
    pub fn instances(&self) -> &[GpuInstance] {
        &self.instances
    }

    /// Instance buffer contents as bytes, ready for a staging copy
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Light buffer contents, in scene light order
    pub fn lights(&self) -> &[GpuLight] {
        &self.lights
    }

    /// Light buffer contents as bytes
    pub fn light_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lights)
    }

    /// Material buffer contents, in scene material order
    pub fn materials(&self) -> &[GpuMaterial] {
        &self.materials
    }

    /// Texture view array, in scene texture order
    pub fn texture_views(&self) -> &[vk::ImageView] {
        &self.texture_views
    }

    /// Last synced view matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Last synced projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Number of sync passes applied
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Work done over all sync passes
    pub fn totals(&self) -> SyncStats {
        self.totals
    }

    fn write_instance(&mut self, scene: &Scene, handle: PrimitiveHandle, primitive: &Primitive) {
        let instance = pack_instance(scene, handle, primitive);
        if let Some(&slot) = self.instance_slots.get(&handle) {
            self.instances[slot] = instance;
        } else {
            self.instance_slots.insert(handle, self.instances.len());
            self.instances.push(instance);
            self.instance_owners.push(handle);
        }
    }

    fn release_instance(&mut self, handle: PrimitiveHandle) -> bool {
        let Some(slot) = self.instance_slots.remove(&handle) else {
            // Added and removed within the same frame: never written.
            return false;
        };
        self.instances.swap_remove(slot);
        self.instance_owners.swap_remove(slot);
        if let Some(&moved) = self.instance_owners.get(slot) {
            self.instance_slots.insert(moved, slot);
        }
        true
    }
}

fn material_slot(scene: &Scene, primitive: &Primitive) -> u32 {
    let index = scene.material_index(primitive.material).unwrap_or(0);
    u32::try_from(index).unwrap_or(0)
}

fn pack_instance(scene: &Scene, handle: PrimitiveHandle, primitive: &Primitive) -> GpuInstance {
    let mut flags = 0;
    if primitive.visible {
        flags |= INSTANCE_VISIBLE;
    }
    if primitive.geometry.is_indexed() {
        flags |= INSTANCE_INDEXED;
    }

    GpuInstance {
        model: primitive.xform.into(),
        material_index: material_slot(scene, primitive),
        flags,
        primitive_id: handle.id(),
        _pad: 0,
    }
}

fn pack_light(light: &crate::scene::Light) -> GpuLight {
    let position_or_direction = match light.kind {
        LightKind::Point { position } => [position.x, position.y, position.z, 1.0],
        LightKind::Directional { direction } => [direction.x, direction.y, direction.z, 0.0],
    };
    GpuLight {
        position_or_direction,
        color_intensity: [light.color.x, light.color.y, light.color.z, light.intensity],
    }
}

fn pack_material(scene: &Scene, material: &crate::scene::Material) -> GpuMaterial {
    let texture_index = |slot: MaterialSlot| {
        let index = scene.texture_index(material.texture(slot)).unwrap_or(0);
        u32::try_from(index).unwrap_or(0)
    };

    GpuMaterial {
        base_color: material.base_color.into(),
        texture_indices: [
            texture_index(MaterialSlot::BaseColor),
            texture_index(MaterialSlot::Normal),
            texture_index(MaterialSlot::MetallicRoughness),
        ],
        roughness: material.roughness,
    }
}
