//! # Scene Core
//!
//! Scene-object management for a real-time Vulkan renderer.
//!
//! Every renderable primitive, light, material and texture lives in a dense,
//! per-kind pool and is referred to from the outside through a stable typed
//! handle. The scene records what changed since the last frame so a renderer
//! can perform incremental GPU updates instead of re-uploading everything.
//!
//! ## Frame protocol
//!
//! 1. Producers (asset loaders, animation, UI) call the mutation operations on
//!    [`Scene`]. Each one updates a pool, ORs bits into the global
//!    [`DirtyFlags`] mask and, for primitives, pushes the handle onto the
//!    frame dirty tracker.
//! 2. Once per frame the renderer calls [`Scene::begin_sync`] and reads the
//!    returned [`FrameChanges`].
//! 3. The renderer calls [`Scene::end_frame`], which clears the mask,
//!    finalizes deferred primitive removals and empties the tracker.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_core::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut gpu = HeadlessResources::new();
//!     let mut scene = Scene::new(SceneConfig::default(), &mut gpu)?;
//!
//!     let geometry = gpu.create_placeholder_geometry()?;
//!     let prim = scene.add_primitive(geometry, Mat4::identity(), MaterialHandle::DEFAULT);
//!
//!     let mut sync = FrameSync::new();
//!     sync.apply(&scene.begin_sync());
//!     scene.end_frame();
//!
//!     scene.remove_primitive(prim)?;
//!     scene.destroy(&mut gpu);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod render;

pub use scene::{Scene, SceneConfig, SceneError, FrameChanges, FrameState, DirtyFlags};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        foundation::math::{Vec3, Vec4, Mat4, Mat4Ext},
        config::{Config, ConfigError},
        scene::{
            Scene, SceneConfig, SceneError, FrameChanges, FrameState,
            DirtyFlags, PrimitiveDirt,
            Camera,
            Handle, ObjectKind, PrimitiveHandle, LightHandle, MaterialHandle, TextureHandle,
            Primitive, Light, LightKind, Material, MaterialSlot, Texture,
            GeometryRef, ImageRef, GpuResources, HeadlessResources, ResourceError,
        },
        render::sync::{FrameSync, SyncStats, GpuInstance, GpuLight, GpuMaterial},
    };
}
