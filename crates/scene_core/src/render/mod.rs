//! Renderer-side consumers of the scene's frame protocol

pub mod sync;

pub use sync::{FrameSync, GpuInstance, GpuLight, GpuMaterial, SyncStats};
