//! Orbit camera with inertial damping

use app_core::ViewerConfig;
use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3};
use std::f32::consts::{PI, TAU};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu wants 0..1
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const EPS: f32 = 1e-6;

/// Residual motion below this is treated as settled
const SETTLE_EPS: f32 = 1e-5;

/// Vertical field of view accepted by the projection, in degrees
pub const FOV_RANGE: std::ops::RangeInclusive<f32> = 1.0..=179.0;

const DEFAULT_FOV: f32 = 70.0;
const DEFAULT_FAR: f32 = 2000.0;

/// Tunables for [`OrbitCamera`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
    pub zoom_speed: f32,
    pub enable_pan: bool,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV,
            near: 0.1,
            far: DEFAULT_FAR,
            enable_damping: true,
            damping_factor: 0.3,
            rotate_speed: 1.0,
            enable_zoom: false,
            zoom_speed: 1.0,
            enable_pan: true,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

impl From<&ViewerConfig> for OrbitSettings {
    fn from(config: &ViewerConfig) -> Self {
        let fov = clamp_fov(config.fov);
        if fov != config.fov {
            tracing::warn!("viewer.fov = {} is out of range, using {}", config.fov, fov);
        }

        // Keep the eye inside the sphere
        let max_distance = config.sphere_radius * 0.9;

        Self {
            fov,
            // The far wall is at most one radius beyond the eye
            far: (config.sphere_radius * 2.0 + max_distance).max(DEFAULT_FAR),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            enable_zoom: config.enable_zoom,
            enable_pan: config.enable_pan,
            max_distance,
            ..Self::default()
        }
    }
}

/// `fov` limited to [`FOV_RANGE`]; NaN falls back to the default
fn clamp_fov(fov: f32) -> f32 {
    if fov.is_nan() {
        DEFAULT_FOV
    } else {
        fov.clamp(*FOV_RANGE.start(), *FOV_RANGE.end())
    }
}

/// Camera orbiting a target point.
///
/// Input accumulates into pending deltas; [`update`](Self::update) applies a
/// fraction of them each frame when damping is on, which gives the drag its
/// inertia.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    settings: OrbitSettings,
    target: Point3<f32>,
    radius: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
    /// Polar angle from +Y
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vector3<f32>,
    scale: f32,
}

impl OrbitCamera {
    /// Camera at `(0, 0, 20)` looking at the origin
    pub fn new(settings: OrbitSettings) -> Self {
        Self::looking_from(settings, Point3::new(0.0, 0.0, 20.0), Point3::new(0.0, 0.0, 0.0))
    }

    pub fn looking_from(settings: OrbitSettings, eye: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = eye - target;
        let radius = offset.magnitude();
        let (theta, phi) = if radius < EPS {
            (0.0, PI / 2.0)
        } else {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        };

        Self {
            settings,
            target,
            radius,
            theta,
            phi,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    /// Drag by `(dx, dy)` pixels in a viewport `viewport_height` pixels tall
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let speed = self.settings.rotate_speed;
        self.delta_theta -= TAU * dx / viewport_height * speed;
        self.delta_phi -= TAU * dy / viewport_height * speed;
    }

    /// Move the target in the view plane. Returns false when panning is disabled.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) -> bool {
        if !self.settings.enable_pan || viewport_height <= 0.0 {
            return false;
        }

        let half_fov = Rad::from(Deg(self.settings.fov)).0 / 2.0;
        let target_distance = self.radius * half_fov.tan();
        let (right, up) = self.screen_axes();
        let speed = self.settings.pan_speed;

        self.pan_offset -= right * (2.0 * dx * target_distance / viewport_height * speed);
        self.pan_offset += up * (2.0 * dy * target_distance / viewport_height * speed);
        true
    }

    /// Scroll-wheel zoom; positive `steps` move closer. Returns false when zoom is disabled.
    pub fn zoom(&mut self, steps: f32) -> bool {
        if !self.settings.enable_zoom || steps == 0.0 {
            return false;
        }
        let factor = 0.95f32.powf(self.settings.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= factor;
        } else {
            self.scale /= factor;
        }
        true
    }

    /// Advance one frame. Returns true while the camera is still moving.
    pub fn update(&mut self) -> bool {
        let factor = if self.settings.enable_damping {
            self.settings.damping_factor
        } else {
            1.0
        };

        self.theta += self.delta_theta * factor;
        self.phi += self.delta_phi * factor;
        self.phi = self.phi.clamp(EPS, PI - EPS);

        self.radius = (self.radius * self.scale)
            .min(self.settings.max_distance)
            .max(self.settings.min_distance);
        self.target += self.pan_offset * factor;

        if self.settings.enable_damping {
            self.delta_theta *= 1.0 - factor;
            self.delta_phi *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        self.is_moving()
    }

    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > SETTLE_EPS
            || self.delta_phi.abs() > SETTLE_EPS
            || self.pan_offset.magnitude2() > SETTLE_EPS * SETTLE_EPS
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn azimuth(&self) -> f32 {
        self.theta
    }

    pub fn polar(&self) -> f32 {
        self.phi
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target
            + Vector3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            )
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        let near = self.settings.near;
        let far = if self.settings.far > near { self.settings.far } else { DEFAULT_FAR.max(near * 2.0) };
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(clamp_fov(self.settings.fov)), aspect, near, far)
    }

    pub fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Camera right and up vectors in world space
    fn screen_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(Vector3::unit_y());
        let right = if right.magnitude2() < EPS {
            Vector3::unit_x()
        } else {
            right.normalize()
        };
        let up = right.cross(forward).normalize();
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(camera: &mut OrbitCamera) -> usize {
        let mut frames = 0;
        while camera.update() {
            frames += 1;
            assert!(frames < 1000, "camera never settled");
        }
        frames
    }

    #[test]
    fn test_initial_pose() {
        let camera = OrbitCamera::new(OrbitSettings::default());
        let eye = camera.position();
        assert!((eye.x).abs() < 1e-4);
        assert!((eye.y).abs() < 1e-4);
        assert!((eye.z - 20.0).abs() < 1e-4);
        assert!((camera.polar() - PI / 2.0).abs() < 1e-6);
        assert_eq!(camera.target(), Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_damped_rotation_converges_to_full_drag() {
        let mut damped = OrbitCamera::new(OrbitSettings::default());
        damped.rotate(100.0, 0.0, 800.0);

        // First frame applies only the damping fraction
        damped.update();
        let expected = -TAU * 100.0 / 800.0;
        assert!((damped.azimuth() - expected * 0.3).abs() < 1e-5);

        let frames = settle(&mut damped);
        assert!(frames > 1);
        assert!((damped.azimuth() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_undamped_rotation_is_immediate() {
        let mut camera = OrbitCamera::new(OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        });
        camera.rotate(0.0, 50.0, 500.0);
        assert!(!camera.update());
        assert!((camera.polar() - (PI / 2.0 - TAU * 0.1)).abs() < 1e-5);
    }

    #[test]
    fn test_polar_angle_clamped_at_poles() {
        let mut camera = OrbitCamera::new(OrbitSettings::default());
        camera.rotate(0.0, 10_000.0, 100.0);
        settle(&mut camera);
        assert!(camera.polar() > 0.0);
        assert!(camera.position().y < 20.0 + 1e-3);

        camera.rotate(0.0, -20_000.0, 100.0);
        settle(&mut camera);
        assert!(camera.polar() < PI);
    }

    #[test]
    fn test_zoom_disabled_ignores_scroll() {
        let mut camera = OrbitCamera::new(OrbitSettings::default());
        assert!(!camera.zoom(3.0));
        settle(&mut camera);
        assert!((camera.distance() - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_zoom_enabled_moves_closer() {
        let mut camera = OrbitCamera::new(OrbitSettings {
            enable_zoom: true,
            ..OrbitSettings::default()
        });
        assert!(camera.zoom(1.0));
        camera.update();
        assert!(camera.distance() < 20.0);
    }

    #[test]
    fn test_pan_moves_target_sideways() {
        let mut camera = OrbitCamera::new(OrbitSettings::default());
        assert!(camera.pan(40.0, 0.0, 400.0));
        settle(&mut camera);

        // Dragging right moves the target left (-X when looking down -Z)
        let target = camera.target();
        assert!(target.x < 0.0);
        assert!(target.y.abs() < 1e-4);
        assert!(target.z.abs() < 1e-4);

        let mut locked = OrbitCamera::new(OrbitSettings {
            enable_pan: false,
            ..OrbitSettings::default()
        });
        assert!(!locked.pan(40.0, 0.0, 400.0));
    }

    #[test]
    fn test_settings_from_config() {
        let config = ViewerConfig::default();
        let settings = OrbitSettings::from(&config);
        assert_eq!(settings.fov, 70.0);
        assert_eq!(settings.damping_factor, 0.3);
        assert!(!settings.enable_zoom);
        assert!(settings.enable_pan);
        assert!(settings.max_distance < config.sphere_radius);
    }

    #[test]
    fn test_out_of_range_fov_is_clamped() {
        for fov in [180.0, 0.0, -30.0, 1000.0, f32::NAN] {
            let config = ViewerConfig {
                fov,
                ..ViewerConfig::default()
            };
            let settings = OrbitSettings::from(&config);
            assert!(FOV_RANGE.contains(&settings.fov), "fov {} -> {}", fov, settings.fov);

            let camera = OrbitCamera::new(settings);
            let m = camera.view_projection(1.5);
            assert!(m.x.x.is_finite() && m.y.y.is_finite());
        }

        // Settings built by hand bypass the conversion
        let camera = OrbitCamera::new(OrbitSettings {
            fov: 180.0,
            ..OrbitSettings::default()
        });
        assert!(camera.view_projection(1.0).y.y.is_finite());
    }

    #[test]
    fn test_large_sphere_wall_inside_far_plane() {
        use cgmath::Vector4;
        let config = ViewerConfig {
            sphere_radius: 3000.0,
            ..ViewerConfig::default()
        };
        let settings = OrbitSettings::from(&config);
        assert!(settings.far >= config.sphere_radius + settings.max_distance);

        let camera = OrbitCamera::new(settings);
        for wall in [Vector4::new(0.0, 0.0, -3000.0, 1.0), Vector4::new(0.0, 0.0, 3000.0, 1.0)] {
            let clip = camera.view_projection(1.0) * wall;
            if clip.w <= 0.0 {
                // Behind the eye
                continue;
            }
            let z = clip.z / clip.w;
            assert!((0.0..=1.0).contains(&z), "wall depth {}", z);
        }
    }

    #[test]
    fn test_origin_projects_to_centre() {
        use cgmath::Vector4;
        let camera = OrbitCamera::new(OrbitSettings::default());
        let clip = camera.view_projection(16.0 / 9.0) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
