//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Three-stage strong-stability-preserving Runge-Kutta scheme in Shu-Osher
/// form. Every stage is a convex combination of forward Euler steps.
#[derive(Clone, Debug)]
pub struct SspRk3;

impl Integrator for SspRk3 {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;
        let x1 = model.add(x, &model.scale(&k1, dt));

        let k2 = model.rhs(t + dt, &x1)?;
        let x2 = model.add(
            &model.scale(x, 0.75),
            &model.scale(&model.add(&x1, &model.scale(&k2, dt)), 0.25),
        );

        let k3 = model.rhs(t + 0.5 * dt, &x2)?;
        Ok(model.add(
            &model.scale(x, 1.0 / 3.0),
            &model.scale(&model.add(&x2, &model.scale(&k3, dt)), 2.0 / 3.0),
        ))
    }
}

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls rhs() once per step instead of 3 times (SSP-RK3).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x' = lambda x
    struct Decay {
        lambda: f64,
        calls: usize,
        times: Vec<f64>,
    }

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&mut self, t: f64, x: &f64) -> SimResult<f64> {
            self.calls += 1;
            self.times.push(t);
            Ok(self.lambda * x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }
    }

    fn decay() -> Decay {
        Decay {
            lambda: -2.0,
            calls: 0,
            times: Vec::new(),
        }
    }

    #[test]
    fn ssp_rk3_matches_the_third_order_taylor_polynomial() {
        let mut model = decay();
        let dt = 0.1;
        let x = SspRk3.step(&mut model, 0.0, &1.0, dt).unwrap();
        let z: f64 = -2.0 * dt;
        assert!((x - (1.0 + z + z * z / 2.0 + z.powi(3) / 6.0)).abs() < 1e-14);
        assert_eq!(model.calls, 3);
        assert_eq!(model.times, vec![0.0, 0.1, 0.05]);
    }

    #[test]
    fn forward_euler_takes_one_stage() {
        let mut model = decay();
        let x = ForwardEuler.step(&mut model, 1.0, &1.0, 0.1).unwrap();
        assert!((x - 0.8).abs() < 1e-15);
        assert_eq!(model.calls, 1);
    }

    #[test]
    fn ssp_rk3_converges_with_third_order() {
        let error = |steps: usize| {
            let mut model = decay();
            let dt = 1.0 / steps as f64;
            let mut x = model.initial_state();
            for i in 0..steps {
                x = SspRk3.step(&mut model, i as f64 * dt, &x, dt).unwrap();
            }
            (x - (-2.0f64).exp()).abs()
        };
        let ratio = error(20) / error(40);
        assert!(ratio > 7.0 && ratio < 9.0, "ratio {ratio}");
    }
}
