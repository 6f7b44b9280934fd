use crate::ode::traits::DynamicalSystem;

// Dormand-Prince 5(4) tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;

const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;

const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;

const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;

const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights (also the last stage row, FSAL)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// b - b* (difference to the embedded 4th order solution)
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Order of the embedded error estimate plus one, used by the step controller.
pub const ERROR_ORDER: f64 = 5.0;

/// Dormand-Prince 5(4) explicit Runge-Kutta stepper with first-same-as-last
/// stage reuse.
///
/// `k1` must hold f(t, y) before [`Dopri5::attempt`] is called; after an
/// accepted step call [`Dopri5::accept`] so that `k1` holds f at the new point.
pub struct Dopri5 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    k5: Vec<f64>,
    k6: Vec<f64>,
    k7: Vec<f64>,
    tmp: Vec<f64>,
    y_new: Vec<f64>,
}

impl Dopri5 {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            k5: vec![0.0; dim],
            k6: vec![0.0; dim],
            k7: vec![0.0; dim],
            tmp: vec![0.0; dim],
            y_new: vec![0.0; dim],
        }
    }

    /// Evaluate the first stage at (t, y). Needed once before the first step.
    pub fn prime(&mut self, system: &impl DynamicalSystem, t: f64, y: &[f64]) {
        system.apply(t, y, &mut self.k1);
    }

    /// Derivative at the last primed or accepted point.
    pub fn derivative(&self) -> &[f64] {
        &self.k1
    }

    /// Candidate state computed by the last attempt.
    pub fn proposed(&self) -> &[f64] {
        &self.y_new
    }

    /// Attempt a step of size `dt` from (t, y).
    ///
    /// Writes the 5th order solution into the proposed buffer and returns the
    /// RMS of the scaled local error estimate. Values <= 1 satisfy the
    /// tolerances.
    pub fn attempt(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        y: &[f64],
        dt: f64,
        rtol: f64,
        atol: f64,
    ) -> f64 {
        let n = y.len();

        // k2
        for i in 0..n {
            self.tmp[i] = y[i] + dt * (A21 * self.k1[i]);
        }
        system.apply(t + C2 * dt, &self.tmp, &mut self.k2);

        // k3
        for i in 0..n {
            self.tmp[i] = y[i] + dt * (A31 * self.k1[i] + A32 * self.k2[i]);
        }
        system.apply(t + C3 * dt, &self.tmp, &mut self.k3);

        // k4
        for i in 0..n {
            self.tmp[i] = y[i] + dt * (A41 * self.k1[i] + A42 * self.k2[i] + A43 * self.k3[i]);
        }
        system.apply(t + C4 * dt, &self.tmp, &mut self.k4);

        // k5
        for i in 0..n {
            self.tmp[i] = y[i]
                + dt * (A51 * self.k1[i] + A52 * self.k2[i] + A53 * self.k3[i] + A54 * self.k4[i]);
        }
        system.apply(t + C5 * dt, &self.tmp, &mut self.k5);

        // k6
        for i in 0..n {
            self.tmp[i] = y[i]
                + dt * (A61 * self.k1[i]
                    + A62 * self.k2[i]
                    + A63 * self.k3[i]
                    + A64 * self.k4[i]
                    + A65 * self.k5[i]);
        }
        system.apply(t + dt, &self.tmp, &mut self.k6);

        // 5th order solution
        for i in 0..n {
            self.y_new[i] = y[i]
                + dt * (B1 * self.k1[i]
                    + B3 * self.k3[i]
                    + B4 * self.k4[i]
                    + B5 * self.k5[i]
                    + B6 * self.k6[i]);
        }

        // k7 = f(t + dt, y_new)
        system.apply(t + dt, &self.y_new, &mut self.k7);

        let mut sum = 0.0;
        for i in 0..n {
            let err = dt
                * (E1 * self.k1[i]
                    + E3 * self.k3[i]
                    + E4 * self.k4[i]
                    + E5 * self.k5[i]
                    + E6 * self.k6[i]
                    + E7 * self.k7[i]);
            let scale = atol + rtol * y[i].abs().max(self.y_new[i].abs());
            let ratio = err / scale;
            sum += ratio * ratio;
        }

        if n == 0 {
            0.0
        } else {
            (sum / n as f64).sqrt()
        }
    }

    /// Commit the last attempt: copy the proposed state into `y` and reuse the
    /// final stage as the first stage of the next step.
    pub fn accept(&mut self, y: &mut [f64]) {
        y.copy_from_slice(&self.y_new);
        std::mem::swap(&mut self.k1, &mut self.k7);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    #[test]
    fn test_single_step_accuracy() {
        let system = Decay { rate: 1.0 };
        let mut stepper = Dopri5::new(1);
        let mut y = vec![1.0];

        stepper.prime(&system, 0.0, &y);
        let err = stepper.attempt(&system, 0.0, &y, 0.1, 1e-6, 1e-6);
        stepper.accept(&mut y);

        assert!(err < 1.0);
        assert_relative_eq!(y[0], (-0.1f64).exp(), epsilon = 1e-8);
        // FSAL: first stage now holds f at the new point
        assert_relative_eq!(stepper.derivative()[0], -y[0], epsilon = 1e-15);
    }

    #[test]
    fn test_large_step_flags_error() {
        let system = Decay { rate: 50.0 };
        let mut stepper = Dopri5::new(1);
        let y = vec![1.0];

        stepper.prime(&system, 0.0, &y);
        let err = stepper.attempt(&system, 0.0, &y, 1.0, 1e-6, 1e-6);

        assert!(err > 1.0);
    }
}
