//! Spring timing
//!
//! Closed-form damped-oscillator step response used as a timing curve. The
//! natural frequency is tuned so the motion settles at normalized time 1,
//! which lets a spring be driven by a fixed duration like any other curve.

/// Residual amplitude considered "settled" at `t = 1`
const SETTLE_RESIDUAL: f64 = 1e-3;

/// Lowest accepted damping ratio; lower values oscillate too fast to sample
const MIN_DAMPING_RATIO: f64 = 0.05;

/// `ω` for which `(1 + ω)·e^(-ω) == SETTLE_RESIDUAL` (critically damped)
const CRITICAL_OMEGA: f64 = 9.233_4;

/// A damped spring expressed as a progress function over `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringCurve {
    damping_ratio: f64,
}

impl SpringCurve {
    /// Create a spring curve from a damping ratio. Values below 1 overshoot,
    /// 1 and above approach the target without overshoot. Non-finite ratios
    /// fall back to critical damping.
    pub fn new(damping_ratio: f64) -> Self {
        let damping_ratio = if damping_ratio.is_finite() {
            damping_ratio.max(MIN_DAMPING_RATIO)
        } else {
            1.0
        };
        Self { damping_ratio }
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    /// Check if the spring oscillates around its target
    pub fn is_underdamped(&self) -> bool {
        self.damping_ratio < 1.0
    }

    /// Progress at normalized time `t`; exactly 0 at `t <= 0` and 1 at `t >= 1`
    pub fn progress(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 || t.is_nan() {
            return 1.0;
        }

        let zeta = self.damping_ratio;
        if zeta < 1.0 {
            // Envelope e^(-ζω₀t) reaches the residual at t = 1
            let decay = -SETTLE_RESIDUAL.ln();
            let omega0 = decay / zeta;
            let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
            let envelope = (-decay * t).exp();
            1.0 - envelope * ((omega_d * t).cos() + (decay / omega_d) * (omega_d * t).sin())
        } else {
            let omega = CRITICAL_OMEGA;
            1.0 - (1.0 + omega * t) * (-omega * t).exp()
        }
    }
}

impl Default for SpringCurve {
    fn default() -> Self {
        Self::new(1.0)
    }
}
