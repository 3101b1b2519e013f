//! Renderer-side sync driven by real scene frames

use scene_core::prelude::*;
use scene_core::render::sync::INSTANCE_VISIBLE;

struct Harness {
    scene: Scene,
    gpu: HeadlessResources,
    sync: FrameSync,
}

impl Harness {
    fn new() -> Self {
        let mut gpu = HeadlessResources::new();
        let scene = Scene::new(SceneConfig::default(), &mut gpu).unwrap();
        Self {
            scene,
            gpu,
            sync: FrameSync::new(),
        }
    }

    fn frame(&mut self) -> SyncStats {
        let stats = self.sync.apply(&self.scene.begin_sync());
        self.scene.end_frame();
        stats
    }
}

#[test]
fn test_each_change_is_synced_exactly_once() {
    let mut h = Harness::new();
    h.frame();

    let geometry = h.gpu.create_geometry(8, 36).unwrap();
    let prim = h.scene.add_primitive(geometry, Mat4::identity(), MaterialHandle::DEFAULT);
    h.scene.set_xform(prim, Mat4::new_scaling(2.0)).unwrap();

    let stats = h.frame();
    assert_eq!(stats.instances_written, 1);
    assert_eq!(h.sync.instance(prim).unwrap().model[0][0], 2.0);
    assert_eq!(h.sync.instance(prim).unwrap().primitive_id, prim.id());

    assert_eq!(h.frame(), SyncStats::default());
}

#[test]
fn test_removed_instance_is_released_and_id_reused() {
    let mut h = Harness::new();
    let geometry = h.gpu.create_geometry(3, 3).unwrap();
    let p1 = h.scene.add_primitive(geometry, Mat4::identity(), MaterialHandle::DEFAULT);
    let p2 = h.scene.add_primitive(geometry, Mat4::new_scaling(2.0), MaterialHandle::DEFAULT);
    let p3 = h.scene.add_primitive(geometry, Mat4::new_scaling(3.0), MaterialHandle::DEFAULT);
    h.frame();
    assert_eq!(h.sync.instances().len(), 4);

    h.scene.remove_primitive(p2).unwrap();
    let stats = h.frame();
    assert_eq!(stats.instances_released, 1);
    assert_eq!(h.sync.instances().len(), 3);
    assert!(h.sync.instance(p2).is_none());
    assert_eq!(h.sync.instance(p3).unwrap().model[0][0], 3.0);
    assert_eq!(h.sync.instance(p1).unwrap().model[0][0], 1.0);

    let p4 = h.scene.add_primitive(geometry, Mat4::new_scaling(4.0), MaterialHandle::DEFAULT);
    assert_eq!(p4, p2);
    h.frame();
    assert_eq!(h.sync.instance(p4).unwrap().model[0][0], 4.0);
    assert_eq!(h.sync.instance_bytes().len(), 4 * std::mem::size_of::<GpuInstance>());
}

#[test]
fn test_visibility_and_camera_reach_the_mirror() {
    let mut h = Harness::new();
    let geometry = h.gpu.create_geometry(3, 3).unwrap();
    let prim = h.scene.add_primitive(geometry, Mat4::identity(), MaterialHandle::DEFAULT);
    h.frame();
    assert_ne!(h.sync.instance(prim).unwrap().flags & INSTANCE_VISIBLE, 0);

    let view = Camera::look_at(Vec3::new(0.0, 2.0, 8.0), Vec3::zeros(), Vec3::y());
    h.scene.set_camera_view(view);
    h.scene.set_primitive_visible(prim, false).unwrap();
    let stats = h.frame();

    assert_eq!(stats.camera_uploads, 1);
    assert_eq!(h.sync.view(), &view);
    assert_eq!(h.sync.projection(), &Mat4::identity());
    assert_eq!(h.sync.instance(prim).unwrap().flags & INSTANCE_VISIBLE, 0);
}

#[test]
fn test_texture_removal_repacks_materials() {
    let mut h = Harness::new();
    let a = h.gpu.create_image(&image::RgbaImage::new(2, 2)).unwrap();
    let b = h.gpu.create_image(&image::RgbaImage::new(2, 2)).unwrap();
    let tex_a = h.scene.add_texture(a);
    let tex_b = h.scene.add_texture(b);
    h.scene.add_material(
        Material::new(Vec4::new(1.0, 1.0, 1.0, 1.0), 0.5).with_texture(MaterialSlot::BaseColor, tex_b),
    );
    h.frame();
    assert_eq!(h.sync.materials()[1].texture_indices[0], 2);

    h.scene.remove_texture(tex_a).unwrap();
    let stats = h.frame();

    assert_eq!(stats.texture_uploads, 1);
    assert_eq!(stats.material_uploads, 1);
    assert_eq!(h.sync.texture_views(), [h.scene.textures()[0].image.view, b.view]);
    assert_eq!(h.sync.materials()[1].texture_indices[0], 1);
    assert_eq!(h.scene.texture_index(tex_b).unwrap(), 1);
}
