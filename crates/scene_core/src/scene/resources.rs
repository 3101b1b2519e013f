//! GPU resource references and the resource collaborator interface
//!
//! The scene never allocates or frees GPU memory on its own. Geometry and
//! images are created by a [`GpuResources`] implementation and the scene only
//! value-copies the Vulkan handles it is given. The one exception is the set
//! of default objects: the scene asks the collaborator for them at creation
//! and hands them back at [`Scene::destroy`](super::Scene::destroy).

use ash::vk::{self, Handle as _};
use thiserror::Error;

/// Resource collaborator errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Image data was rejected
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The device could not satisfy the allocation
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),
}

/// Reference to externally owned vertex/index buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryRef {
    /// Vertex buffer
    pub vertex_buffer: vk::Buffer,
    /// Index buffer (null for non-indexed geometry)
    pub index_buffer: vk::Buffer,
    /// Number of vertices in the vertex buffer
    pub vertex_count: u32,
    /// Number of indices in the index buffer
    pub index_count: u32,
}

impl GeometryRef {
    /// Whether draws should use the index buffer
    pub fn is_indexed(&self) -> bool {
        self.index_buffer != vk::Buffer::null() && self.index_count > 0
    }
}

/// Reference to an externally owned sampled image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    /// Image
    pub image: vk::Image,
    /// View used for sampling
    pub view: vk::ImageView,
    /// Pixel format
    pub format: vk::Format,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
}

impl ImageRef {
    /// Image size as a Vulkan extent
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }
}

/// GPU resource module owning geometry and image lifetimes
pub trait GpuResources {
    /// Upload RGBA8 pixels into a sampled image
    fn create_image(&mut self, pixels: &image::RgbaImage) -> Result<ImageRef, ResourceError>;

    /// Create the shape used by the default primitive
    fn create_placeholder_geometry(&mut self) -> Result<GeometryRef, ResourceError>;

    /// Release an image created by this module
    fn destroy_image(&mut self, image: ImageRef);

    /// Release geometry created by this module
    fn destroy_geometry(&mut self, geometry: GeometryRef);
}

/// Vertex and index counts of the placeholder cube (4 vertices per face)
const PLACEHOLDER_VERTICES: u32 = 24;
const PLACEHOLDER_INDICES: u32 = 36;

/// Device-less resource module
///
/// Mints unique raw Vulkan handle values and remembers which ones are live.
/// Used by tests, tools and the headless demo.
#[derive(Debug, Default)]
pub struct HeadlessResources {
    next_raw: u64,
    live_images: Vec<vk::Image>,
    live_buffers: Vec<vk::Buffer>,
    images_created: usize,
    images_destroyed: usize,
    fail_allocations: bool,
}

impl HeadlessResources {
    /// Create an empty resource module
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following allocation fail with [`ResourceError::AllocationFailed`]
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Create indexed geometry with the given counts
    pub fn create_geometry(&mut self, vertex_count: u32, index_count: u32) -> Result<GeometryRef, ResourceError> {
        self.check_allocations()?;
        let vertex_buffer = vk::Buffer::from_raw(self.mint());
        let index_buffer = if index_count > 0 {
            vk::Buffer::from_raw(self.mint())
        } else {
            vk::Buffer::null()
        };

        self.live_buffers.push(vertex_buffer);
        if index_buffer != vk::Buffer::null() {
            self.live_buffers.push(index_buffer);
        }

        Ok(GeometryRef {
            vertex_buffer,
            index_buffer,
            vertex_count,
            index_count,
        })
    }

    /// Whether `image` was created here and not destroyed yet
    pub fn is_image_live(&self, image: &ImageRef) -> bool {
        self.live_images.contains(&image.image)
    }

    /// Whether `geometry`'s vertex buffer was created here and not destroyed yet
    pub fn is_geometry_live(&self, geometry: &GeometryRef) -> bool {
        self.live_buffers.contains(&geometry.vertex_buffer)
    }

    /// Number of images currently alive
    pub fn live_image_count(&self) -> usize {
        self.live_images.len()
    }

    /// Number of buffers currently alive
    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    /// Images created and destroyed over the module's lifetime
    pub fn image_totals(&self) -> (usize, usize) {
        (self.images_created, self.images_destroyed)
    }

    fn mint(&mut self) -> u64 {
        self.next_raw += 1;
        self.next_raw
    }

    fn check_allocations(&self) -> Result<(), ResourceError> {
        if self.fail_allocations {
            return Err(ResourceError::AllocationFailed("headless allocation disabled".to_string()));
        }
        Ok(())
    }
}

impl GpuResources for HeadlessResources {
    fn create_image(&mut self, pixels: &image::RgbaImage) -> Result<ImageRef, ResourceError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidImage(format!("empty image {width}x{height}")));
        }
        self.check_allocations()?;

        let image = vk::Image::from_raw(self.mint());
        let view = vk::ImageView::from_raw(self.mint());
        self.live_images.push(image);
        self.images_created += 1;

        Ok(ImageRef {
            image,
            view,
            format: vk::Format::R8G8B8A8_UNORM,
            width,
            height,
        })
    }

    fn create_placeholder_geometry(&mut self) -> Result<GeometryRef, ResourceError> {
        self.create_geometry(PLACEHOLDER_VERTICES, PLACEHOLDER_INDICES)
    }

    fn destroy_image(&mut self, image: ImageRef) {
        if let Some(pos) = self.live_images.iter().position(|&i| i == image.image) {
            self.live_images.swap_remove(pos);
            self.images_destroyed += 1;
        } else {
            log::warn!("Destroying unknown image {:?}", image.image);
        }
    }

    fn destroy_geometry(&mut self, geometry: GeometryRef) {
        for buffer in [geometry.vertex_buffer, geometry.index_buffer] {
            if buffer == vk::Buffer::null() {
                continue;
            }
            if let Some(pos) = self.live_buffers.iter().position(|&b| b == buffer) {
                self.live_buffers.swap_remove(pos);
            } else {
                log::warn!("Destroying unknown buffer {:?}", buffer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_images_are_unique_and_tracked() {
        let mut gpu = HeadlessResources::new();
        let pixels = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));

        let a = gpu.create_image(&pixels).unwrap();
        let b = gpu.create_image(&pixels).unwrap();
        assert_ne!(a.image, b.image);
        assert_eq!(a.extent().width, 2);
        assert_eq!(gpu.live_image_count(), 2);

        gpu.destroy_image(a);
        assert!(!gpu.is_image_live(&a));
        assert!(gpu.is_image_live(&b));
        assert_eq!(gpu.image_totals(), (2, 1));
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut gpu = HeadlessResources::new();
        let pixels = image::RgbaImage::new(0, 4);
        assert!(matches!(gpu.create_image(&pixels), Err(ResourceError::InvalidImage(_))));
    }

    #[test]
    fn test_geometry_buffers_released() {
        let mut gpu = HeadlessResources::new();
        let cube = gpu.create_placeholder_geometry().unwrap();
        let points = gpu.create_geometry(8, 0).unwrap();
        assert!(cube.is_indexed());
        assert!(!points.is_indexed());
        assert_eq!(gpu.live_buffer_count(), 3);

        gpu.destroy_geometry(cube);
        assert!(!gpu.is_geometry_live(&cube));
        assert_eq!(gpu.live_buffer_count(), 1);
    }

    #[test]
    fn test_failure_injection() {
        let mut gpu = HeadlessResources::new();
        gpu.set_fail_allocations(true);
        assert!(matches!(
            gpu.create_placeholder_geometry(),
            Err(ResourceError::AllocationFailed(_))
        ));
    }
}
