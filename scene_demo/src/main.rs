//! Headless asteroid field
//!
//! Drives a scene through a few hundred frames the way the game loop would:
//! asteroids spin and drift, get destroyed and respawned, a light orbits the
//! field and the camera slowly pulls back. A `FrameSync` stands in for the
//! Vulkan renderer and the per-frame upload work is logged.
//!
//! Usage: `asteroid_field [scene.toml|scene.ron]`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_core::config::ConfigError;
use scene_core::foundation::logging::{self, LevelFilter};
use scene_core::foundation::math::{Quat, Transform};
use scene_core::prelude::*;
use thiserror::Error;

const FRAMES: u64 = 300;
const FIELD_SIZE: usize = 40;
const RESPAWN_INTERVAL: u64 = 15;
const REPORT_INTERVAL: u64 = 60;

#[derive(Debug, Error)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

struct Asteroid {
    handle: PrimitiveHandle,
    spin: Mat4,
}

struct AsteroidField {
    scene: Scene,
    gpu: HeadlessResources,
    sync: FrameSync,
    rng: StdRng,
    rock_geometry: GeometryRef,
    rock_images: Vec<ImageRef>,
    rock_materials: Vec<MaterialHandle>,
    asteroids: Vec<Asteroid>,
    sun: LightHandle,
    destroyed: usize,
}

impl AsteroidField {
    fn new(config: SceneConfig) -> Result<Self, DemoError> {
        let mut gpu = HeadlessResources::new();
        let mut scene = Scene::new(config, &mut gpu)?;
        let rock_geometry = gpu.create_geometry(482, 2880)?;

        let shades = [[120, 110, 100, 255], [90, 85, 80, 255], [150, 140, 120, 255]];
        let mut rock_images = Vec::with_capacity(shades.len());
        let mut rock_materials = Vec::with_capacity(shades.len());
        for (i, shade) in shades.into_iter().enumerate() {
            let image = gpu.create_image(&image::RgbaImage::from_pixel(16, 16, image::Rgba(shade)))?;
            let texture = scene.add_texture(image);
            let roughness = 0.6 + 0.1 * i as f32;
            rock_images.push(image);
            rock_materials.push(scene.add_material(
                Material::new(Vec4::new(1.0, 1.0, 1.0, 1.0), roughness).with_texture(MaterialSlot::BaseColor, texture),
            ));
        }

        let sun = scene.add_light(
            LightKind::directional(Vec3::new(-0.7, -1.0, 0.3)),
            Vec3::new(1.0, 0.95, 0.9),
            1.0,
        );
        scene.add_light(LightKind::point(Vec3::new(0.0, 5.0, 0.0)), Vec3::new(0.3, 0.4, 1.0), 4.0);

        scene.set_camera_projection(Camera::perspective(45.0, 16.0 / 9.0, 0.1, 500.0));

        let mut field = Self {
            scene,
            gpu,
            sync: FrameSync::new(),
            rng: StdRng::seed_from_u64(0x5eed),
            rock_geometry,
            rock_images,
            rock_materials,
            asteroids: Vec::with_capacity(FIELD_SIZE),
            sun,
            destroyed: 0,
        };
        for _ in 0..FIELD_SIZE {
            field.spawn_asteroid();
        }
        Ok(field)
    }

    fn spawn_asteroid(&mut self) {
        let position = Vec3::new(
            self.rng.gen_range(-50.0..50.0),
            self.rng.gen_range(-10.0..10.0),
            self.rng.gen_range(-50.0..50.0),
        );
        let rotation = Quat::from_euler_angles(0.0, self.rng.gen_range(0.0..std::f32::consts::TAU), 0.0);
        let material = self.rock_materials[self.rng.gen_range(0..self.rock_materials.len())];

        let handle = self.scene.add_primitive(
            self.rock_geometry,
            Transform::from_position_rotation(position, rotation).to_matrix(),
            material,
        );
        let spin = Mat4::rotation_y(self.rng.gen_range(-0.05..0.05));
        self.asteroids.push(Asteroid { handle, spin });
    }

    fn update(&mut self, frame: u64) -> Result<(), DemoError> {
        for asteroid in &self.asteroids {
            self.scene.update_xform(asteroid.handle, &asteroid.spin)?;
        }

        if frame % RESPAWN_INTERVAL == 0 && !self.asteroids.is_empty() {
            let victim = self.asteroids.swap_remove(self.rng.gen_range(0..self.asteroids.len()));
            self.scene.remove_primitive(victim.handle)?;
            self.destroyed += 1;
            self.spawn_asteroid();
        }

        let angle = frame as f32 * 0.01;
        self.scene.update_light_direction(self.sun, Vec3::new(angle.cos(), -1.0, angle.sin()))?;

        let distance = 60.0 + frame as f32 * 0.1;
        self.scene.set_camera_view(Camera::look_at(
            Vec3::new(0.0, distance * 0.5, distance),
            Vec3::zeros(),
            Vec3::y(),
        ));
        Ok(())
    }

    fn render(&mut self) -> SyncStats {
        let stats = self.sync.apply(&self.scene.begin_sync());
        let compacted = self.scene.end_frame();
        if compacted > 0 {
            log::debug!("Compacted {} destroyed asteroid(s)", compacted);
        }
        stats
    }

    fn shutdown(self) {
        let Self {
            scene,
            mut gpu,
            sync,
            rock_geometry,
            rock_images,
            destroyed,
            ..
        } = self;

        let totals = sync.totals();
        log::info!(
            "{} frames synced, {} asteroids destroyed: {} instance writes, {} releases, {} light uploads, {} material uploads, {} texture uploads, {} camera uploads",
            sync.frames(),
            destroyed,
            totals.instances_written,
            totals.instances_released,
            totals.light_uploads,
            totals.material_uploads,
            totals.texture_uploads,
            totals.camera_uploads,
        );

        scene.destroy(&mut gpu);
        gpu.destroy_geometry(rock_geometry);
        for image in rock_images {
            gpu.destroy_image(image);
        }
        log::info!(
            "Resources still live after shutdown: {} images, {} buffers",
            gpu.live_image_count(),
            gpu.live_buffer_count()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(LevelFilter::Info);
    log::info!("Starting asteroid field demo");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene config from {}", path);
            SceneConfig::load_from_file(&path).map_err(DemoError::from)?
        }
        None => SceneConfig::default(),
    };

    let mut field = AsteroidField::new(config)?;
    for frame in 1..=FRAMES {
        field.update(frame)?;
        let stats = field.render();

        if frame % REPORT_INTERVAL == 0 {
            log::info!(
                "Frame {}: {} primitives, {} instance writes, {} released",
                field.scene.frame_index(),
                field.scene.primitive_count(),
                stats.instances_written,
                stats.instances_released,
            );
        }
    }

    field.shutdown();
    log::info!("Asteroid field demo finished");
    Ok(())
}
