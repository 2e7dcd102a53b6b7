//! Newton solvers: a vector solver with line search and an admissibility
//! constraint, and a damped scalar iteration.

use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};

/// Newton solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-12,
            rel_tol: 1e-14,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Newton solver with backtracking line search.
///
/// Trial points rejected by `admissible` are halved back towards the
/// current iterate. Running out of iterations is not an error: the last
/// iterate is returned with `converged == false`. A singular Jacobian is.
pub fn newton_solve<F, J, P>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    admissible: P,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
    P: Fn(&DVector<f64>) -> bool,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;
    let mut iterations = 0;

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: true,
            });
        }

        let jac = jacobian_fn(&x)?;

        // Solve J * dx = -r
        let dx = jac
            .lu()
            .solve(&(-r.clone()))
            .ok_or_else(|| SolverError::Numeric {
                what: format!("singular Jacobian at iteration {iter}"),
            })?;

        let mut alpha = 1.0;
        let mut x_new = &x + alpha * &dx;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();

        for _ in 0..config.max_line_search_iters {
            if admissible(&x_new) && r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        if !admissible(&x_new) || !r_new_norm.is_finite() {
            // keep the last admissible iterate
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: false,
            });
        }

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
        iterations = iter + 1;

        if alpha < 1e-10 {
            break;
        }
    }

    let converged = r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm;
    Ok(NewtonResult {
        x,
        residual_norm: r_norm,
        iterations,
        converged,
    })
}

/// Damped scalar Newton iteration `x <- x - relaxation * f(x) / f'(x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarNewtonConfig {
    pub relaxation: f64,
    /// Stop once `|f(x)|` drops to this value.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl ScalarNewtonConfig {
    /// Settings of the Windkessel outflow solve.
    pub const WINDKESSEL: Self = Self {
        relaxation: 0.5,
        tolerance: 1e-10,
        max_iterations: 250,
    };

    /// Settings of the inflow area solve.
    pub const INFLOW: Self = Self {
        relaxation: 1.0,
        tolerance: 1e-12,
        max_iterations: 100,
    };
}

impl Default for ScalarNewtonConfig {
    fn default() -> Self {
        Self::INFLOW
    }
}

/// Result of a scalar Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonOutcome {
    /// Last iterate, also when not converged.
    pub value: f64,
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Run the damped scalar iteration from `x0`.
///
/// Never fails: a vanishing derivative or a non-finite step stops the
/// iteration and the last finite iterate is reported as not converged.
pub fn damped_newton<F, D>(f: F, df: D, x0: f64, config: &ScalarNewtonConfig) -> NewtonOutcome
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x = x0;
    let mut residual = f(x);
    let mut iterations = 0;

    while iterations < config.max_iterations && !(residual.abs() <= config.tolerance) {
        let slope = df(x);
        let next = x - config.relaxation * residual / slope;
        if slope == 0.0 || !next.is_finite() {
            break;
        }
        let next_residual = f(next);
        if !next_residual.is_finite() {
            break;
        }
        x = next;
        residual = next_residual;
        iterations += 1;
    }

    NewtonOutcome {
        value: x,
        residual,
        iterations,
        converged: residual.abs() <= config.tolerance,
    }
}
