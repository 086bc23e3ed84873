//! Fly-to trajectory
//!
//! Implements the "optimal path" camera flight from:
//!
//! Van Wijk, Jarke J.; Nuij, Wim A. A. "Smooth and efficient zooming and
//! panning." INFOVIS '03. pp. 15-22.
//!
//! The camera pulls back while it pans and dives in towards the
//! destination. The ground position follows the great circle between the
//! two centers, advanced by van Wijk's ground-distance profile `u(s)`.
//! Symbols in this module follow the paper: `w` is the visible span, `u`
//! the ground distance, `S` the path length in ρ-screenfuls.

use std::f64::consts::PI;
use std::time::Duration;

use meridian_core::{
    mercator, shortest_angle_delta, CameraBounds, CameraPose, CameraState, Coordinate, EdgeInsets,
    Size,
};

use crate::config::AnimationConfig;
use crate::interpolate::{interpolate_coordinate, Interpolate};

/// Below this ground distance (points at the source scale) the path is a
/// pure zoom
const CLOSE_DISTANCE: f64 = 1e-6;

/// Computes a fly-to camera path between two camera states
#[derive(Clone, Debug, PartialEq)]
pub struct FlyToInterpolator {
    source_center: Coordinate,
    dest_center: Coordinate,
    source_zoom: f64,
    dest_zoom: f64,
    source_bearing: f64,
    /// Continuous with `source_bearing`
    dest_bearing: f64,
    source_pitch: f64,
    dest_pitch: f64,
    source_padding: EdgeInsets,
    dest_padding: EdgeInsets,
    /// World scale at the source zoom, used for the Mercator fallback
    source_scale: f64,
    path: Path,
    rho: f64,
    velocity: f64,
    min_duration: Duration,
    max_duration: Duration,
}

/// Shape of the zoom/pan curve
#[derive(Clone, Copy, Debug, PartialEq)]
enum Path {
    /// Ascent and descent
    Optimal { r0: f64, w0: f64, u1: f64, s: f64 },
    /// No meaningful ground distance: exponential zoom only
    Close { w_sign: f64, s: f64 },
    /// Degenerate input: straight interpolation of every field
    Direct,
}

impl FlyToInterpolator {
    /// Build a path with the standard tuning
    ///
    /// Fields missing from `dest` keep the source value. The destination
    /// zoom and pitch are clamped to `bounds`; the source is used as is.
    pub fn new(source: &CameraState, dest: &CameraPose, bounds: &CameraBounds, size: Size) -> Self {
        Self::with_config(source, dest, bounds, size, &AnimationConfig::standard())
    }

    pub fn with_config(
        source: &CameraState,
        dest: &CameraPose,
        bounds: &CameraBounds,
        size: Size,
        config: &AnimationConfig,
    ) -> Self {
        let source_center = source.center;
        let dest_center = dest.center.filter(Coordinate::is_finite).unwrap_or(source_center);
        let source_zoom = source.zoom;
        let dest_zoom =
            bounds.clamp_zoom(dest.zoom.filter(|z| z.is_finite()).unwrap_or(source_zoom));
        let source_pitch = source.pitch;
        let dest_pitch =
            bounds.clamp_pitch(dest.pitch.filter(|p| p.is_finite()).unwrap_or(source_pitch));
        let source_bearing = source.bearing;
        let dest_bearing = dest
            .bearing
            .filter(|b| b.is_finite())
            .map(|b| source_bearing + shortest_angle_delta(source_bearing, b))
            .unwrap_or(source_bearing);
        let source_padding = source.padding;
        let dest_padding = dest.padding.unwrap_or(source_padding);

        let source_scale = 2f64.powf(source_zoom);
        let rho = config.fly_to_rho;

        // w₀: visible span at the start, one "screenful"
        let w0 = (size.width - dest_padding.left - dest_padding.right)
            .max(size.height - dest_padding.top - dest_padding.bottom);
        // w₁: visible span at the end, measured at the source scale
        let w1 = w0 / 2f64.powf(dest_zoom - source_zoom);
        // u₁: ground distance between the centers at the source scale
        let unwrapped = source_center.unwrap_for_shortest_path(&dest_center);
        let start = mercator::project(&unwrapped, source_scale);
        let end = mercator::project(&dest_center, source_scale);
        let u1 = (end.x - start.x).hypot(end.y - start.y);

        let path = Self::solve_path(w0, w1, u1, rho);
        tracing::trace!(
            "FlyToInterpolator: w0={:.1} w1={:.1} u1={:.1} path={:?}",
            w0,
            w1,
            u1,
            path
        );

        Self {
            source_center,
            dest_center,
            source_zoom,
            dest_zoom,
            source_bearing,
            dest_bearing,
            source_pitch,
            dest_pitch,
            source_padding,
            dest_padding,
            source_scale,
            path,
            rho,
            velocity: config.fly_to_velocity,
            min_duration: config.fly_to_min_duration(),
            // An inverted range collapses to its minimum
            max_duration: config.fly_to_max_duration().max(config.fly_to_min_duration()),
        }
    }

    fn solve_path(w0: f64, w1: f64, u1: f64, rho: f64) -> Path {
        if !(w0.is_finite() && w0 > 0.0 && w1.is_finite() && w1 > 0.0 && u1.is_finite()) {
            return Path::Direct;
        }

        let rho2 = rho * rho;
        // rᵢ: zoom-out factor at one end of the flight. ln(√(b²+1) - b) is
        // written as -asinh(b), which stays finite for large b.
        let r = |i: u8| {
            let (sign, wi) = if i == 0 { (1.0, w0) } else { (-1.0, w1) };
            let b = (w1 * w1 - w0 * w0 + sign * rho2 * rho2 * u1 * u1) / (2.0 * wi * rho2 * u1);
            -b.asinh()
        };

        let (r0, r1) = if u1 != 0.0 {
            (r(0), r(1))
        } else {
            (f64::INFINITY, f64::INFINITY)
        };
        let is_close = u1.abs() < CLOSE_DISTANCE || !r0.is_finite() || !r1.is_finite();

        if is_close {
            let s = (w1 / w0).ln().abs() / rho;
            let w_sign = if w1 < w0 { -1.0 } else { 1.0 };
            if s.is_finite() {
                Path::Close { w_sign, s }
            } else {
                Path::Direct
            }
        } else {
            let s = (r1 - r0) / rho;
            if s.is_finite() && s >= 0.0 {
                Path::Optimal { r0, w0, u1, s }
            } else {
                Path::Direct
            }
        }
    }

    /// S: total path length in ρ-screenfuls
    pub fn path_length(&self) -> f64 {
        match self.path {
            Path::Optimal { s, .. } | Path::Close { s, .. } => s,
            Path::Direct => 0.0,
        }
    }

    /// w(s): visible span relative to the start
    fn w(&self, s: f64) -> f64 {
        match self.path {
            Path::Optimal { r0, .. } => r0.cosh() / (r0 + self.rho * s).cosh(),
            Path::Close { w_sign, .. } => (w_sign * self.rho * s).exp(),
            Path::Direct => 1.0,
        }
    }

    /// Fraction of the ground distance covered at linear time `t`
    fn ground_fraction(&self, t: f64) -> f64 {
        match self.path {
            Path::Optimal { r0, w0, u1, s } => {
                let s = t * s;
                let rho2 = self.rho * self.rho;
                w0 * (r0.cosh() * (r0 + self.rho * s).tanh() - r0.sinh()) / rho2 / u1
            }
            // Nothing to cover on the ground; progress linearly in case the
            // path was declared close for numerical reasons
            Path::Close { .. } | Path::Direct => t,
        }
    }

    /// Camera center at `t ∈ [0, 1]`
    pub fn coordinate(&self, t: f64) -> Coordinate {
        if t.is_nan() || t >= 1.0 {
            return self.dest_center;
        }
        if t <= 0.0 {
            return self.source_center;
        }
        let fraction = self.ground_fraction(t);
        if !fraction.is_finite() {
            return interpolate_coordinate(&self.source_center, &self.dest_center, t);
        }
        self.great_circle(fraction.clamp(0.0, 1.0))
    }

    /// Point `fraction` of the way along the great circle between the centers
    fn great_circle(&self, fraction: f64) -> Coordinate {
        let a = to_unit_vector(&self.source_center);
        let b = to_unit_vector(&self.dest_center);
        let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
        let cross = [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ];
        let omega = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2])
            .sqrt()
            .atan2(dot);

        if omega < 1e-12 {
            return interpolate_coordinate(&self.source_center, &self.dest_center, fraction);
        }
        if PI - omega < 1e-9 {
            // Antipodal: every great circle qualifies, fall back to the map plane
            return self.mercator_line(fraction);
        }

        let sin_omega = omega.sin();
        let ka = ((1.0 - fraction) * omega).sin() / sin_omega;
        let kb = (fraction * omega).sin() / sin_omega;
        let p = [
            ka * a[0] + kb * b[0],
            ka * a[1] + kb * b[1],
            ka * a[2] + kb * b[2],
        ];
        from_unit_vector(p)
    }

    fn mercator_line(&self, fraction: f64) -> Coordinate {
        let start = self.source_center.unwrap_for_shortest_path(&self.dest_center);
        let a = mercator::project(&start, self.source_scale);
        let b = mercator::project(&self.dest_center, self.source_scale);
        mercator::unproject(&a.lerp(&b, fraction), self.source_scale).wrapped()
    }

    /// Zoom at `t`, never above the larger endpoint zoom
    pub fn zoom(&self, t: f64) -> f64 {
        if t.is_nan() || t >= 1.0 {
            return self.dest_zoom;
        }
        if t <= 0.0 {
            return self.source_zoom;
        }
        let ceiling = self.source_zoom.max(self.dest_zoom);
        let zoom = match self.path {
            Path::Direct => self.source_zoom.lerp(&self.dest_zoom, t),
            _ => self.source_zoom + (1.0 / self.w(t * self.path_length())).log2(),
        };
        if zoom.is_finite() {
            zoom.min(ceiling)
        } else {
            self.source_zoom.lerp(&self.dest_zoom, t)
        }
    }

    /// Bearing at `t`; the destination is expressed relative to the source
    /// so the camera turns the short way
    pub fn bearing(&self, t: f64) -> f64 {
        self.source_bearing.lerp(&self.dest_bearing, unit(t))
    }

    pub fn pitch(&self, t: f64) -> f64 {
        self.source_pitch.lerp(&self.dest_pitch, unit(t))
    }

    pub fn padding(&self, t: f64) -> EdgeInsets {
        self.source_padding.lerp(&self.dest_padding, unit(t))
    }

    /// Full camera pose at `t`
    pub fn pose(&self, t: f64) -> CameraPose {
        CameraPose::new()
            .with_center(self.coordinate(t))
            .with_zoom(self.zoom(t))
            .with_bearing(self.bearing(t))
            .with_pitch(self.pitch(t))
            .with_padding(self.padding(t))
    }

    /// Exact destination pose
    pub fn destination(&self) -> CameraPose {
        self.pose(1.0)
    }

    /// Ideal duration for the flight
    ///
    /// Without a velocity the configured average (ρ-screenfuls per second)
    /// is used; a caller velocity is scaled by ρ. The result is clamped to
    /// the configured range, and degenerate paths take the minimum.
    pub fn duration(&self, velocity: Option<f64>) -> Duration {
        let seconds = match velocity {
            Some(v) => self.path_length() * self.rho / v,
            None => self.path_length() / self.velocity,
        };
        if !seconds.is_finite() || seconds <= 0.0 {
            return self.min_duration;
        }
        Duration::from_secs_f64(seconds).clamp(self.min_duration, self.max_duration)
    }
}

fn unit(t: f64) -> f64 {
    if t.is_nan() {
        1.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

fn to_unit_vector(coordinate: &Coordinate) -> [f64; 3] {
    let lat = coordinate.latitude.to_radians();
    let lon = coordinate.longitude.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_unit_vector(p: [f64; 3]) -> Coordinate {
    let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    let latitude = (p[2] / norm).clamp(-1.0, 1.0).asin().to_degrees();
    let longitude = p[1].atan2(p[0]).to_degrees();
    Coordinate::new(latitude, longitude)
}
