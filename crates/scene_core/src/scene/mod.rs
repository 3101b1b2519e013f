//! Scene object management
//!
//! Handles, pools and the scene aggregate with its frame-scoped dirty
//! tracking.
//!
//! ```text
//! Scene
//!   ├── ObjectPool<Primitive> ─┐
//!   ├── ObjectPool<Light>      │  dense Vec<T> + ObjectMap (id → slot, free ids)
//!   ├── ObjectPool<Material>   │
//!   ├── ObjectPool<Texture>  ──┘
//!   ├── Camera
//!   ├── DirtyFlags           (scene-wide categories)
//!   └── FrameDirtyTracker    (primitives touched this frame)
//! ```

pub mod handle;
pub mod object_map;
pub mod object_pool;
pub mod records;
pub mod dirty;
pub mod camera;
pub mod resources;
pub mod error;
#[allow(clippy::module_inception)]
pub mod scene;

pub use handle::{Handle, ObjectKind, PoolRecord, PrimitiveHandle, LightHandle, MaterialHandle, TextureHandle};
pub use object_map::ObjectMap;
pub use object_pool::ObjectPool;
pub use records::{Primitive, Light, LightKind, Material, MaterialSlot, Texture, MATERIAL_TEXTURE_SLOTS};
pub use dirty::{DirtyFlags, PrimitiveDirt, FrameDirtyTracker};
pub use camera::Camera;
pub use resources::{GeometryRef, ImageRef, GpuResources, HeadlessResources, ResourceError};
pub use error::{SceneError, SceneResult};
pub use scene::{Scene, SceneConfig, FrameChanges, FrameState};
