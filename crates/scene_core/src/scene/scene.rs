//! Scene aggregate
//!
//! Owns one object pool per kind, the camera, the global dirty mask and the
//! frame dirty tracker, and exposes every mutation the rest of the engine is
//! allowed to make.
//!
//! Primitive removal is deferred: [`Scene::remove_primitive`] only marks the
//! record, and [`Scene::end_frame`] compacts it. For one frame the renderer
//! can still resolve the handle and see [`PrimitiveDirt::REMOVED`], which it
//! needs to release per-instance GPU state. Lights, materials and textures are
//! removed immediately.

use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::dirty::{DirtyFlags, FrameDirtyTracker, PrimitiveDirt};
use super::error::{SceneError, SceneResult};
use super::handle::{LightHandle, MaterialHandle, PrimitiveHandle, TextureHandle};
use super::object_pool::ObjectPool;
use super::records::{Light, LightKind, Material, MaterialSlot, Primitive, Texture};
use super::resources::{GeometryRef, GpuResources, ImageRef};
use crate::config::Config;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Scene creation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Initial primitive pool capacity
    pub initial_primitive_capacity: usize,
    /// Initial light pool capacity
    pub initial_light_capacity: usize,
    /// Initial material pool capacity
    pub initial_material_capacity: usize,
    /// Initial texture pool capacity
    pub initial_texture_capacity: usize,
    /// RGBA8 color of the default texture
    pub default_texture_color: [u8; 4],
    /// Edge length of the square default texture
    pub default_texture_size: u32,
    /// Roughness of the default material
    pub default_material_roughness: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            initial_primitive_capacity: 16,
            initial_light_capacity: 8,
            initial_material_capacity: 8,
            initial_texture_capacity: 8,
            default_texture_color: [255, 255, 255, 255],
            default_texture_size: 1,
            default_material_roughness: 1.0,
        }
    }
}

impl Config for SceneConfig {}

/// Where the scene is in the frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Mutations append to the tracker and OR into the mask
    Accumulating,
    /// The renderer has read this frame's changes and will call `end_frame`
    Drained,
}

/// Read-only view of one frame's changes, handed to the renderer
///
/// Holding it borrows the scene, so no mutation can interleave with the
/// renderer's read pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameChanges<'a> {
    scene: &'a Scene,
}

impl<'a> FrameChanges<'a> {
    /// Categories that changed this frame
    pub fn flags(&self) -> DirtyFlags {
        self.scene.dirt
    }

    /// Whether any bit in `flags` is set
    pub fn intersects(&self, flags: DirtyFlags) -> bool {
        self.scene.dirt.intersects(flags)
    }

    /// Primitives touched this frame, in first-touch order
    pub fn dirty_primitives(&self) -> &'a [PrimitiveHandle] {
        self.scene.tracker.handles()
    }

    /// Touched primitives together with their records
    ///
    /// Primitives removed this frame are still included, flagged
    /// [`PrimitiveDirt::REMOVED`].
    pub fn changed_primitives(&self) -> impl Iterator<Item = (PrimitiveHandle, &'a Primitive)> + 'a {
        let scene = self.scene;
        scene
            .tracker
            .handles()
            .iter()
            .filter_map(move |&handle| scene.primitives.get(handle).ok().map(|p| (handle, p)))
    }

    /// Whether nothing changed this frame
    pub fn is_empty(&self) -> bool {
        self.scene.dirt.is_empty() && self.scene.tracker.is_empty()
    }

    /// The full scene, for kinds the renderer re-uploads wholesale
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }
}

/// Scene aggregate: pools, camera and dirty state
#[derive(Debug)]
pub struct Scene {
    primitives: ObjectPool<Primitive>,
    lights: ObjectPool<Light>,
    materials: ObjectPool<Material>,
    textures: ObjectPool<Texture>,
    camera: Camera,
    dirt: DirtyFlags,
    tracker: FrameDirtyTracker,
    state: FrameState,
    frame_index: u64,
    /// Resources the scene created itself and must hand back on destroy
    default_image: ImageRef,
    default_geometry: GeometryRef,
}

impl Scene {
    /// Create a scene and its default texture, material and primitive
    ///
    /// The defaults occupy id 0 of their pools and are reported as added in
    /// the first frame, together with both camera bits.
    pub fn new(config: SceneConfig, gpu: &mut dyn GpuResources) -> SceneResult<Self> {
        log::info!("Creating scene...");

        let size = config.default_texture_size.max(1);
        let pixels = image::RgbaImage::from_pixel(size, size, image::Rgba(config.default_texture_color));
        let default_image = gpu.create_image(&pixels)?;
        let default_geometry = match gpu.create_placeholder_geometry() {
            Ok(geometry) => geometry,
            Err(e) => {
                gpu.destroy_image(default_image);
                return Err(e.into());
            }
        };

        let mut scene = Self {
            primitives: ObjectPool::with_capacity(config.initial_primitive_capacity),
            lights: ObjectPool::with_capacity(config.initial_light_capacity),
            materials: ObjectPool::with_capacity(config.initial_material_capacity),
            textures: ObjectPool::with_capacity(config.initial_texture_capacity),
            camera: Camera::default(),
            dirt: DirtyFlags::CAMERA_VIEW | DirtyFlags::CAMERA_PROJ,
            tracker: FrameDirtyTracker::new(),
            state: FrameState::Accumulating,
            frame_index: 0,
            default_image,
            default_geometry,
        };

        let texture = scene.add_texture(default_image);
        let material = scene.add_material(Material::new(
            Vec4::new(1.0, 1.0, 1.0, 1.0),
            config.default_material_roughness,
        ));
        let primitive = scene.add_primitive(default_geometry, Mat4::identity(), material);
        scene.primitives.get_mut(primitive)?.visible = false;

        debug_assert!(texture.is_default() && material.is_default() && primitive.is_default());

        log::info!(
            "Scene created (capacities: {} primitives, {} lights, {} materials, {} textures)",
            scene.primitives.capacity(),
            scene.lights.capacity(),
            scene.materials.capacity(),
            scene.textures.capacity(),
        );
        Ok(scene)
    }

    /// Release the resources the scene created and drop it
    ///
    /// Geometry and images supplied by callers stay owned by the caller.
    pub fn destroy(self, gpu: &mut dyn GpuResources) {
        log::info!(
            "Destroying scene ({} primitives, {} lights, {} materials, {} textures)",
            self.primitives.len(),
            self.lights.len(),
            self.materials.len(),
            self.textures.len(),
        );
        gpu.destroy_geometry(self.default_geometry);
        gpu.destroy_image(self.default_image);
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Add a primitive; it is reported with [`PrimitiveDirt::ADDED`] this frame
    pub fn add_primitive(&mut self, geometry: GeometryRef, xform: Mat4, material: MaterialHandle) -> PrimitiveHandle {
        if !self.materials.contains(material) {
            log::warn!("Primitive added with unresolved {:?}; renderer will fall back to the default", material);
        }

        let mut primitive = Primitive::new(geometry, xform, material);
        primitive.dirt = PrimitiveDirt::ADDED;
        let handle = self.primitives.add(primitive);

        self.touch(DirtyFlags::PRIMS);
        self.tracker.push(handle);
        log::debug!("Added {:?}", handle);
        handle
    }

    /// Mark a primitive for removal at the end of the frame
    ///
    /// Until [`Scene::end_frame`] the handle still resolves to the record,
    /// flagged [`PrimitiveDirt::REMOVED`].
    pub fn remove_primitive(&mut self, handle: PrimitiveHandle) -> SceneResult<()> {
        if handle.is_default() {
            return Err(SceneError::InvalidOperation("the default primitive cannot be removed".to_string()));
        }

        let primitive = self.primitives.get_mut(handle)?;
        if primitive.is_removed() {
            return Err(SceneError::InvalidOperation(format!("{handle:?} is already pending removal")));
        }
        primitive.dirt |= PrimitiveDirt::REMOVED;

        self.touch(DirtyFlags::PRIMS);
        self.tracker.push(handle);
        log::debug!("Marked {:?} for removal", handle);
        Ok(())
    }

    /// Replace a primitive's transform
    pub fn set_xform(&mut self, handle: PrimitiveHandle, xform: Mat4) -> SceneResult<()> {
        self.mutate_primitive(handle, PrimitiveDirt::XFORM, DirtyFlags::XFORMS, |p| p.xform = xform)
    }

    /// Apply `delta` in the primitive's local space (`xform * delta`)
    pub fn update_xform(&mut self, handle: PrimitiveHandle, delta: &Mat4) -> SceneResult<()> {
        self.mutate_primitive(handle, PrimitiveDirt::XFORM, DirtyFlags::XFORMS, |p| p.xform *= delta)
    }

    /// Bind a primitive to another material
    pub fn bind_primitive_to_material(&mut self, handle: PrimitiveHandle, material: MaterialHandle) -> SceneResult<()> {
        self.materials.get(material)?;
        self.mutate_primitive(
            handle,
            PrimitiveDirt::MATERIAL,
            DirtyFlags::PRIMS | DirtyFlags::MATERIALS,
            |p| p.material = material,
        )
    }

    /// Point a primitive at different geometry
    pub fn set_primitive_geometry(&mut self, handle: PrimitiveHandle, geometry: GeometryRef) -> SceneResult<()> {
        self.mutate_primitive(handle, PrimitiveDirt::GEOMETRY, DirtyFlags::PRIMS, |p| p.geometry = geometry)
    }

    /// Show or hide a primitive
    pub fn set_primitive_visible(&mut self, handle: PrimitiveHandle, visible: bool) -> SceneResult<()> {
        self.mutate_primitive(handle, PrimitiveDirt::VISIBILITY, DirtyFlags::PRIMS, |p| p.visible = visible)
    }

    /// Look up a primitive
    pub fn primitive(&self, handle: PrimitiveHandle) -> SceneResult<&Primitive> {
        self.primitives.get(handle)
    }

    /// Live primitives in dense order, including ones pending removal
    pub fn primitives(&self) -> &[Primitive] {
        self.primitives.as_slice()
    }

    /// Primitive handles and records in dense order
    pub fn iter_primitives(&self) -> impl Iterator<Item = (PrimitiveHandle, &Primitive)> + '_ {
        self.primitives.iter()
    }

    /// Number of live primitives, including the default one
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    // ------------------------------------------------------------------
    // Lights
    // ------------------------------------------------------------------

    /// Add a light
    pub fn add_light(&mut self, kind: LightKind, color: Vec3, intensity: f32) -> LightHandle {
        let handle = self.lights.add(Light::new(kind, color, intensity));
        self.touch(DirtyFlags::LIGHTS);
        log::debug!("Added {:?}", handle);
        handle
    }

    /// Remove a light immediately; later lights shift down one slot
    pub fn remove_light(&mut self, handle: LightHandle) -> SceneResult<Light> {
        let light = self.lights.remove(handle)?;
        self.touch(DirtyFlags::LIGHTS);
        log::debug!("Removed {:?}", handle);
        Ok(light)
    }

    /// Change a light's intensity
    pub fn update_light_intensity(&mut self, handle: LightHandle, intensity: f32) -> SceneResult<()> {
        self.lights.get_mut(handle)?.intensity = intensity;
        self.touch(DirtyFlags::LIGHTS);
        Ok(())
    }

    /// Change a light's color
    pub fn update_light_color(&mut self, handle: LightHandle, color: Vec3) -> SceneResult<()> {
        self.lights.get_mut(handle)?.color = color;
        self.touch(DirtyFlags::LIGHTS);
        Ok(())
    }

    /// Move a point light
    pub fn update_light_position(&mut self, handle: LightHandle, position: Vec3) -> SceneResult<()> {
        let light = self.lights.get_mut(handle)?;
        match &mut light.kind {
            LightKind::Point { position: p } => *p = position,
            LightKind::Directional { .. } => {
                return Err(SceneError::InvalidOperation(format!("{handle:?} is directional and has no position")));
            }
        }
        self.touch(DirtyFlags::LIGHTS);
        Ok(())
    }

    /// Re-aim a directional light; `direction` is normalized and must not be zero
    pub fn update_light_direction(&mut self, handle: LightHandle, direction: Vec3) -> SceneResult<()> {
        let light = self.lights.get_mut(handle)?;
        match &mut light.kind {
            LightKind::Directional { direction: d } => {
                *d = direction.try_normalize(f32::EPSILON).ok_or_else(|| {
                    SceneError::InvalidOperation(format!("{handle:?} cannot point along a zero-length direction"))
                })?;
            }
            LightKind::Point { .. } => {
                return Err(SceneError::InvalidOperation(format!("{handle:?} is a point light and has no direction")));
            }
        }
        self.touch(DirtyFlags::LIGHTS);
        Ok(())
    }

    /// Look up a light
    pub fn light(&self, handle: LightHandle) -> SceneResult<&Light> {
        self.lights.get(handle)
    }

    /// Lights in shader order
    pub fn lights(&self) -> &[Light] {
        self.lights.as_slice()
    }

    /// Shader-visible slot of a light
    pub fn light_index(&self, handle: LightHandle) -> SceneResult<usize> {
        self.lights.index_of(handle)
    }

    /// Number of lights
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    // ------------------------------------------------------------------
    // Materials
    // ------------------------------------------------------------------

    /// Add a material
    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        let handle = self.materials.add(material);
        self.touch(DirtyFlags::MATERIALS);
        log::debug!("Added {:?}", handle);
        handle
    }

    /// Remove a material immediately
    ///
    /// Primitives still bound to it are rebound to the default material and
    /// reported with [`PrimitiveDirt::MATERIAL`].
    pub fn remove_material(&mut self, handle: MaterialHandle) -> SceneResult<Material> {
        if handle.is_default() {
            return Err(SceneError::InvalidOperation("the default material cannot be removed".to_string()));
        }
        let material = self.materials.remove(handle)?;
        self.touch(DirtyFlags::MATERIALS);

        let orphans: Vec<PrimitiveHandle> = self
            .primitives
            .iter()
            .filter(|(_, p)| p.material == handle)
            .map(|(h, _)| h)
            .collect();
        for prim in orphans {
            self.mutate_primitive_unchecked(prim, PrimitiveDirt::MATERIAL, DirtyFlags::PRIMS, |p| {
                p.material = MaterialHandle::DEFAULT;
            })?;
        }

        log::debug!("Removed {:?}", handle);
        Ok(material)
    }

    /// Change a material's base color
    pub fn update_material_color(&mut self, handle: MaterialHandle, base_color: Vec4) -> SceneResult<()> {
        self.materials.get_mut(handle)?.base_color = base_color;
        self.touch(DirtyFlags::MATERIALS);
        Ok(())
    }

    /// Change a material's roughness
    pub fn update_material_roughness(&mut self, handle: MaterialHandle, roughness: f32) -> SceneResult<()> {
        self.materials.get_mut(handle)?.roughness = roughness;
        self.touch(DirtyFlags::MATERIALS);
        Ok(())
    }

    /// Bind a texture to one of a material's slots
    pub fn set_material_texture(&mut self, handle: MaterialHandle, slot: MaterialSlot, texture: TextureHandle) -> SceneResult<()> {
        self.textures.get(texture)?;
        self.materials.get_mut(handle)?.textures[slot as usize] = texture;
        self.touch(DirtyFlags::MATERIALS);
        Ok(())
    }

    /// Look up a material
    pub fn material(&self, handle: MaterialHandle) -> SceneResult<&Material> {
        self.materials.get(handle)
    }

    /// Materials in dense order
    pub fn materials(&self) -> &[Material] {
        self.materials.as_slice()
    }

    /// Dense slot of a material
    pub fn material_index(&self, handle: MaterialHandle) -> SceneResult<usize> {
        self.materials.index_of(handle)
    }

    /// Number of materials, including the default one
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    /// Add a texture referencing an externally owned image
    pub fn add_texture(&mut self, image: ImageRef) -> TextureHandle {
        let handle = self.textures.add(Texture { image });
        self.touch(DirtyFlags::TEXTURES);
        log::debug!("Added {:?}", handle);
        handle
    }

    /// Remove a texture immediately
    ///
    /// Material slots still referencing it fall back to the default texture.
    pub fn remove_texture(&mut self, handle: TextureHandle) -> SceneResult<Texture> {
        if handle.is_default() {
            return Err(SceneError::InvalidOperation("the default texture cannot be removed".to_string()));
        }
        let texture = self.textures.remove(handle)?;
        self.touch(DirtyFlags::TEXTURES);

        let mut rebound = false;
        for material in self.materials.as_mut_slice() {
            for slot in &mut material.textures {
                if *slot == handle {
                    *slot = TextureHandle::DEFAULT;
                    rebound = true;
                }
            }
        }
        if rebound {
            self.touch(DirtyFlags::MATERIALS);
        }

        log::debug!("Removed {:?}", handle);
        Ok(texture)
    }

    /// Look up a texture
    pub fn texture(&self, handle: TextureHandle) -> SceneResult<&Texture> {
        self.textures.get(handle)
    }

    /// Textures in dense order
    pub fn textures(&self) -> &[Texture] {
        self.textures.as_slice()
    }

    /// Dense slot of a texture
    pub fn texture_index(&self, handle: TextureHandle) -> SceneResult<usize> {
        self.textures.index_of(handle)
    }

    /// Number of textures, including the default one
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------

    /// Replace the view matrix
    pub fn set_camera_view(&mut self, view: Mat4) {
        self.camera.view = view;
        self.touch(DirtyFlags::CAMERA_VIEW);
    }

    /// Replace the projection matrix
    pub fn set_camera_projection(&mut self, projection: Mat4) {
        self.camera.projection = projection;
        self.touch(DirtyFlags::CAMERA_PROJ);
    }

    /// Current camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    // ------------------------------------------------------------------
    // Frame protocol
    // ------------------------------------------------------------------

    /// Categories changed since the last frame boundary
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirt
    }

    /// Primitives touched since the last frame boundary
    pub fn dirty_primitives(&self) -> &[PrimitiveHandle] {
        self.tracker.handles()
    }

    /// Current protocol state
    pub fn frame_state(&self) -> FrameState {
        self.state
    }

    /// Number of completed frames
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Hand this frame's changes to the renderer
    pub fn begin_sync(&mut self) -> FrameChanges<'_> {
        self.state = FrameState::Drained;
        FrameChanges { scene: self }
    }

    /// Close the frame
    ///
    /// Clears the dirty mask, compacts primitives marked for removal, clears
    /// the per-object dirt of every other touched primitive and empties the
    /// tracker. Returns the number of primitives compacted.
    pub fn end_frame(&mut self) -> usize {
        self.dirt = DirtyFlags::empty();

        let mut removed = 0;
        for handle in self.tracker.drain() {
            let pending_removal = match self.primitives.get_mut(handle) {
                Ok(primitive) if primitive.is_removed() => true,
                Ok(primitive) => {
                    primitive.dirt = PrimitiveDirt::empty();
                    false
                }
                Err(_) => {
                    log::warn!("Tracked {:?} no longer resolves at end of frame", handle);
                    false
                }
            };
            if pending_removal && self.primitives.remove(handle).is_ok() {
                removed += 1;
            }
        }

        self.state = FrameState::Accumulating;
        self.frame_index += 1;
        log::debug!("Frame {} ended, {} primitive(s) compacted", self.frame_index, removed);
        removed
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn touch(&mut self, flags: DirtyFlags) {
        if self.state == FrameState::Drained {
            log::warn!("Scene mutated after sync and before end_frame; changes carry over to the next frame");
            self.state = FrameState::Accumulating;
        }
        self.dirt |= flags;
    }

    fn mutate_primitive(
        &mut self,
        handle: PrimitiveHandle,
        dirt: PrimitiveDirt,
        flags: DirtyFlags,
        apply: impl FnOnce(&mut Primitive),
    ) -> SceneResult<()> {
        if self.primitives.get(handle)?.is_removed() {
            return Err(SceneError::InvalidOperation(format!("{handle:?} is pending removal")));
        }
        if handle.is_default() {
            log::warn!("Mutating the default primitive");
        }
        self.mutate_primitive_unchecked(handle, dirt, flags, apply)
    }

    fn mutate_primitive_unchecked(
        &mut self,
        handle: PrimitiveHandle,
        dirt: PrimitiveDirt,
        flags: DirtyFlags,
        apply: impl FnOnce(&mut Primitive),
    ) -> SceneResult<()> {
        let primitive = self.primitives.get_mut(handle)?;
        apply(primitive);
        primitive.dirt |= dirt;

        self.touch(flags);
        self.tracker.push(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::resources::HeadlessResources;

    fn new_scene() -> (Scene, HeadlessResources) {
        let mut gpu = HeadlessResources::new();
        let mut scene = Scene::new(SceneConfig::default(), &mut gpu).unwrap();
        scene.end_frame();
        (scene, gpu)
    }

    #[test]
    fn test_first_frame_reports_defaults() {
        let mut gpu = HeadlessResources::new();
        let scene = Scene::new(SceneConfig::default(), &mut gpu).unwrap();

        assert_eq!(
            scene.dirty_flags(),
            DirtyFlags::CAMERA_VIEW | DirtyFlags::CAMERA_PROJ | DirtyFlags::TEXTURES | DirtyFlags::MATERIALS | DirtyFlags::PRIMS
        );
        assert_eq!(scene.dirty_primitives(), &[PrimitiveHandle::DEFAULT]);
        assert_eq!(scene.primitive(PrimitiveHandle::DEFAULT).unwrap().dirt, PrimitiveDirt::ADDED);
        assert!(!scene.primitive(PrimitiveHandle::DEFAULT).unwrap().visible);
        assert_eq!(scene.material(MaterialHandle::DEFAULT).unwrap().texture(MaterialSlot::BaseColor), TextureHandle::DEFAULT);
        assert_eq!(gpu.live_image_count(), 1);
    }

    #[test]
    fn test_sync_then_end_frame_cycles_state() {
        let (mut scene, _gpu) = new_scene();
        assert_eq!(scene.frame_state(), FrameState::Accumulating);

        let changes = scene.begin_sync();
        assert!(changes.is_empty());
        assert_eq!(scene.frame_state(), FrameState::Drained);

        scene.end_frame();
        assert_eq!(scene.frame_state(), FrameState::Accumulating);
        assert_eq!(scene.frame_index(), 2);
    }

    #[test]
    fn test_mutation_after_sync_returns_to_accumulating() {
        let (mut scene, _gpu) = new_scene();
        let _ = scene.begin_sync();
        scene.set_camera_view(Mat4::identity());
        assert_eq!(scene.frame_state(), FrameState::Accumulating);
        assert_eq!(scene.dirty_flags(), DirtyFlags::CAMERA_VIEW);
    }

    #[test]
    fn test_mutating_pending_removal_is_rejected() {
        let (mut scene, mut gpu) = new_scene();
        let geometry = gpu.create_geometry(3, 3).unwrap();
        let prim = scene.add_primitive(geometry, Mat4::identity(), MaterialHandle::DEFAULT);
        scene.remove_primitive(prim).unwrap();

        assert!(matches!(scene.set_xform(prim, Mat4::identity()), Err(SceneError::InvalidOperation(_))));
        assert!(matches!(scene.remove_primitive(prim), Err(SceneError::InvalidOperation(_))));
    }

    #[test]
    fn test_zero_light_direction_is_rejected() {
        let (mut scene, _gpu) = new_scene();
        let sun = scene.add_light(LightKind::directional(Vec3::new(0.0, -1.0, 0.0)), Vec3::x(), 1.0);
        scene.end_frame();

        assert!(matches!(
            scene.update_light_direction(sun, Vec3::zeros()),
            Err(SceneError::InvalidOperation(_))
        ));
        assert_eq!(scene.light(sun).unwrap().kind, LightKind::Directional { direction: -Vec3::y() });
        assert!(scene.dirty_flags().is_empty());
    }

    #[test]
    fn test_creation_failure_releases_partial_resources() {
        let mut failing = FailGeometry(HeadlessResources::new());
        let result = Scene::new(SceneConfig::default(), &mut failing);
        assert!(matches!(result, Err(SceneError::Resource(_))));
        assert_eq!(failing.0.live_image_count(), 0);
    }

    struct FailGeometry(HeadlessResources);

    impl GpuResources for FailGeometry {
        fn create_image(&mut self, pixels: &image::RgbaImage) -> Result<ImageRef, crate::scene::ResourceError> {
            self.0.create_image(pixels)
        }

        fn create_placeholder_geometry(&mut self) -> Result<GeometryRef, crate::scene::ResourceError> {
            Err(crate::scene::ResourceError::AllocationFailed("no vertex memory".to_string()))
        }

        fn destroy_image(&mut self, image: ImageRef) {
            self.0.destroy_image(image);
        }

        fn destroy_geometry(&mut self, geometry: GeometryRef) {
            self.0.destroy_geometry(geometry);
        }
    }
}
