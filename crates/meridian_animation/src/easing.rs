//! Timing curves
//!
//! Every curve is a pure function from linear time `t ∈ [0, 1]` to eased
//! progress, with exact endpoints. Cubic-bezier curves are solved with the
//! classic unit-bezier Newton/bisection solver.

use crate::spring::SpringCurve;

/// Default precision for solving bezier curves
pub const DEFAULT_BEZIER_EPSILON: f64 = 1e-6;

/// An easing curve applied to linear animation time
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimingCurve {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Cubic bezier through `(0, 0)`, `(x1, y1)`, `(x2, y2)`, `(1, 1)`
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Damped spring settling at `t = 1`
    Spring { damping_ratio: f64 },
}

impl Default for TimingCurve {
    fn default() -> Self {
        TimingCurve::EaseInOut
    }
}

impl TimingCurve {
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        TimingCurve::CubicBezier { x1, y1, x2, y2 }
    }

    pub fn spring(damping_ratio: f64) -> Self {
        TimingCurve::Spring { damping_ratio }
    }

    /// The control points of the bezier form of this curve, if it has one
    pub fn control_points(&self) -> Option<(f64, f64, f64, f64)> {
        match *self {
            TimingCurve::Linear => Some((0.0, 0.0, 1.0, 1.0)),
            TimingCurve::EaseIn => Some((0.42, 0.0, 1.0, 1.0)),
            TimingCurve::EaseOut => Some((0.0, 0.0, 0.58, 1.0)),
            TimingCurve::EaseInOut => Some((0.42, 0.0, 0.58, 1.0)),
            TimingCurve::CubicBezier { x1, y1, x2, y2 } => Some((x1, y1, x2, y2)),
            TimingCurve::Spring { .. } => None,
        }
    }

    /// Eased progress for linear time `t`, using the default solver precision
    pub fn progress(&self, t: f64) -> f64 {
        self.progress_with_epsilon(t, DEFAULT_BEZIER_EPSILON)
    }

    /// Eased progress for linear time `t`
    ///
    /// `t` is clamped to `[0, 1]`; NaN counts as finished.
    pub fn progress_with_epsilon(&self, t: f64, epsilon: f64) -> f64 {
        if t.is_nan() || t >= 1.0 {
            return 1.0;
        }
        if t <= 0.0 {
            return 0.0;
        }
        match *self {
            TimingCurve::Linear => t,
            TimingCurve::Spring { damping_ratio } => SpringCurve::new(damping_ratio).progress(t),
            _ => match self.control_points() {
                Some((x1, y1, x2, y2)) => UnitBezier::new(x1, y1, x2, y2).solve(t, epsilon),
                None => t,
            },
        }
    }
}

/// A cubic bezier with implicit endpoints `(0, 0)` and `(1, 1)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitBezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl UnitBezier {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        // x must stay monotonic for the curve to be a function of time
        let x1 = sanitize_control(x1).clamp(0.0, 1.0);
        let x2 = sanitize_control(x2).clamp(0.0, 1.0);
        let y1 = sanitize_control(y1);
        let y2 = sanitize_control(y2);

        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Find the curve parameter whose x equals `x`
    fn solve_x(&self, x: f64, epsilon: f64) -> f64 {
        // Newton's method first; it converges in a few steps for most curves
        let mut t = x;
        for _ in 0..8 {
            let error = self.sample_x(t) - x;
            if error.abs() < epsilon {
                return t;
            }
            let derivative = self.sample_derivative_x(t);
            if derivative.abs() < 1e-6 {
                break;
            }
            t -= error / derivative;
        }

        // Bisection fallback
        let (mut low, mut high) = (0.0, 1.0);
        t = x;
        while low < high {
            let value = self.sample_x(t);
            if (value - x).abs() < epsilon {
                return t;
            }
            if x > value {
                low = t;
            } else {
                high = t;
            }
            let next = (high - low) * 0.5 + low;
            if next == t {
                break;
            }
            t = next;
        }
        t
    }

    /// Eased y for linear time `x ∈ [0, 1]`
    pub fn solve(&self, x: f64, epsilon: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        self.sample_y(self.solve_x(x, epsilon))
    }
}

fn sanitize_control(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_have_exact_endpoints() {
        let curves = [
            TimingCurve::Linear,
            TimingCurve::EaseIn,
            TimingCurve::EaseOut,
            TimingCurve::EaseInOut,
            TimingCurve::cubic_bezier(0.1, 0.7, 0.3, 1.4),
            TimingCurve::spring(0.5),
        ];
        for curve in curves {
            assert_eq!(curve.progress(0.0), 0.0, "{curve:?}");
            assert_eq!(curve.progress(1.0), 1.0, "{curve:?}");
            assert_eq!(curve.progress(-2.0), 0.0, "{curve:?}");
            assert_eq!(curve.progress(3.0), 1.0, "{curve:?}");
            assert_eq!(curve.progress(f64::NAN), 1.0, "{curve:?}");
        }
    }

    #[test]
    fn test_linear_bezier_is_identity() {
        let bezier = UnitBezier::new(0.0, 0.0, 1.0, 1.0);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!((bezier.solve(t, 1e-6) - t).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let curve = TimingCurve::EaseInOut;
        assert!((curve.progress(0.5) - 0.5).abs() < 1e-5);
        let a = curve.progress(0.25);
        let b = curve.progress(0.75);
        assert!((a + b - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ease_in_starts_slow_and_ease_out_starts_fast() {
        assert!(TimingCurve::EaseIn.progress(0.25) < 0.25);
        assert!(TimingCurve::EaseOut.progress(0.25) > 0.25);
    }

    #[test]
    fn test_bezier_is_monotonic_for_monotonic_controls() {
        let curve = TimingCurve::cubic_bezier(0.25, 0.1, 0.25, 1.0);
        let mut previous = 0.0;
        for i in 1..=50 {
            let value = curve.progress(i as f64 / 50.0);
            assert!(value >= previous - 1e-9);
            previous = value;
        }
    }
}
