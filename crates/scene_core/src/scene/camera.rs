//! # Scene camera state
//!
//! The scene stores the camera as two matrices. Producers compute them however
//! they like (orbit controls, scripted paths); the helpers here cover the
//! common look-at / perspective case using the engine's Vulkan conventions:
//! right-handed Y-up view space looking down -Z, clip space with Y pointing
//! down and depth mapped to [0, 1].
//!
//! The view-to-Vulkan axis flip is folded into [`Camera::perspective`], so
//! `projection * view` is the complete world-to-clip transform.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// View and projection matrices
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World-to-view transform
    pub view: Mat4,
    /// View-to-clip transform
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }
}

impl Camera {
    /// Build a view matrix looking from `eye` towards `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at(eye, target, up)
    }

    /// Build a perspective projection for a right-handed Y-up view space
    ///
    /// Includes the Y/Z flip into Vulkan's clip-space orientation.
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Viewport width / height
    /// * `near` - Near plane distance (must be > 0)
    /// * `far` - Far plane distance (must be > near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(fov_degrees), aspect, near, far) * Mat4::vulkan_coordinate_transform()
    }

    /// Combined projection × view
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position recovered from the view matrix
    pub fn eye(&self) -> Option<Vec3> {
        let inverse = self.view.try_inverse()?;
        Some(Vec3::new(inverse.m14, inverse.m24, inverse.m34))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_identity() {
        let camera = Camera::default();
        assert_eq!(camera.view_projection(), Mat4::identity());
    }

    fn looking_at_origin_from(eye: Vec3) -> Camera {
        Camera {
            view: Camera::look_at(eye, Vec3::zeros(), Vec3::y()),
            projection: Camera::perspective(45.0, 1.0, 0.1, 100.0),
        }
    }

    #[test]
    fn test_target_in_front_of_eye_is_visible() {
        let camera = looking_at_origin_from(Vec3::new(0.0, 0.0, 10.0));
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);

        assert!(clip.w > 0.0, "w = {}", clip.w);
        assert_relative_eq!(clip.w, 10.0, epsilon = 1e-4);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth), "depth = {depth}");
    }

    #[test]
    fn test_point_behind_eye_is_clipped() {
        let camera = looking_at_origin_from(Vec3::new(0.0, 0.0, 10.0));
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 20.0, 1.0);
        assert!(clip.w < 0.0);
    }

    #[test]
    fn test_world_up_maps_to_clip_y_down() {
        let camera = looking_at_origin_from(Vec3::new(0.0, 0.0, 10.0));
        let clip = camera.view_projection() * Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!(clip.y / clip.w < 0.0);
    }

    #[test]
    fn test_near_and_far_planes_map_to_depth_range() {
        let camera = Camera {
            view: Camera::look_at(Vec3::zeros(), -Vec3::z(), Vec3::y()),
            projection: Camera::perspective(45.0, 1.0, 0.1, 100.0),
        };
        let near = camera.view_projection() * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = camera.view_projection() * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_eye_round_trips_through_view() {
        let eye = Vec3::new(2.0, 2.0, 10.0);
        let camera = Camera {
            view: Camera::look_at(eye, Vec3::zeros(), Vec3::y()),
            projection: Camera::perspective(45.0, 800.0 / 600.0, 0.1, 100.0),
        };
        let recovered = camera.eye().unwrap();
        assert_relative_eq!(recovered, eye, epsilon = 1e-4);
    }
}
