//! Legendre basis on the reference micro-edge `[-1, 1]` and Gauss-Legendre
//! quadrature.
//!
//! A field on a micro-edge is stored as coefficients `c_k` of the Legendre
//! polynomials `P_k`. Since `P_k(1) = 1` and `P_k(-1) = (-1)^k`, boundary
//! values need no basis evaluation at all.

/// Values `P_0(xi) ..= P_n(xi)` and their derivatives, `n = values.len() - 1`.
pub fn legendre_values(xi: f64, values: &mut [f64], derivatives: &mut [f64]) {
    debug_assert_eq!(values.len(), derivatives.len());
    let n = values.len();
    if n == 0 {
        return;
    }
    values[0] = 1.0;
    derivatives[0] = 0.0;
    if n == 1 {
        return;
    }
    values[1] = xi;
    derivatives[1] = 1.0;
    for k in 1..n - 1 {
        let kf = k as f64;
        values[k + 1] = ((2.0 * kf + 1.0) * xi * values[k] - kf * values[k - 1]) / (kf + 1.0);
        derivatives[k + 1] = derivatives[k - 1] + (2.0 * kf + 1.0) * values[k];
    }
}

/// Nodes and weights of a Gauss-Legendre rule on `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    points: Vec<f64>,
    weights: Vec<f64>,
}

impl QuadratureRule {
    /// Rule with `n` nodes, exact for polynomials up to degree `2n - 1`.
    ///
    /// Nodes are the roots of `P_n`, found by Newton from the Chebyshev-like
    /// initial guesses, in ascending order.
    pub fn gauss_legendre(n: usize) -> Self {
        let mut points = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);
        let mut values = vec![0.0; n + 1];
        let mut derivatives = vec![0.0; n + 1];

        for i in 0..n {
            let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            for _ in 0..100 {
                legendre_values(x, &mut values, &mut derivatives);
                let dx = values[n] / derivatives[n];
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            legendre_values(x, &mut values, &mut derivatives);
            points.push(x);
            weights.push(2.0 / ((1.0 - x * x) * derivatives[n] * derivatives[n]));
        }

        // the guesses run from +1 down to -1
        points.reverse();
        weights.reverse();
        Self { points, weights }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Integral of `f` over `[-1, 1]`.
    pub fn integrate(&self, f: impl Fn(f64) -> f64) -> f64 {
        self.points
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| w * f(x))
            .sum()
    }
}

/// Values of a field at both ends of a micro-edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryValues {
    pub left: f64,
    pub right: f64,
}

/// Legendre basis of one polynomial degree with a matching quadrature.
///
/// The rule has `degree + 2` nodes.
#[derive(Debug, Clone)]
pub struct FeTypeNetwork {
    degree: usize,
    quadrature: QuadratureRule,
    /// `phi[q][k] = P_k(xi_q)`
    phi: Vec<Vec<f64>>,
    /// `dphi[q][k] = P_k'(xi_q)`
    dphi: Vec<Vec<f64>>,
}

impl FeTypeNetwork {
    pub fn new(degree: usize) -> Self {
        let quadrature = QuadratureRule::gauss_legendre(degree + 2);
        let nb = degree + 1;
        let mut phi = Vec::with_capacity(quadrature.len());
        let mut dphi = Vec::with_capacity(quadrature.len());
        for &xi in quadrature.points() {
            let mut values = vec![0.0; nb];
            let mut derivatives = vec![0.0; nb];
            legendre_values(xi, &mut values, &mut derivatives);
            phi.push(values);
            dphi.push(derivatives);
        }
        Self {
            degree,
            quadrature,
            phi,
            dphi,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_basis_functions(&self) -> usize {
        self.degree + 1
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        &self.quadrature
    }

    /// Basis values at quadrature node `q`.
    pub fn phi(&self, q: usize) -> &[f64] {
        &self.phi[q]
    }

    /// Basis derivatives at quadrature node `q`.
    pub fn dphi(&self, q: usize) -> &[f64] {
        &self.dphi[q]
    }

    /// Field values at all quadrature nodes.
    pub fn evaluate_dof_at_quadrature_points(&self, coefficients: &[f64], out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.quadrature.len());
        for (value, phi) in out.iter_mut().zip(&self.phi) {
            *value = phi.iter().zip(coefficients).map(|(p, c)| p * c).sum();
        }
    }

    pub fn evaluate_dof_at_boundary_points(&self, coefficients: &[f64]) -> BoundaryValues {
        let mut left = 0.0;
        let mut right = 0.0;
        for (k, &c) in coefficients.iter().enumerate() {
            right += c;
            left += if k % 2 == 0 { c } else { -c };
        }
        BoundaryValues { left, right }
    }

    /// Field value at an arbitrary reference coordinate.
    pub fn evaluate(&self, coefficients: &[f64], xi: f64) -> f64 {
        let mut values = vec![0.0; coefficients.len()];
        let mut derivatives = vec![0.0; coefficients.len()];
        legendre_values(xi, &mut values, &mut derivatives);
        values.iter().zip(coefficients).map(|(p, c)| p * c).sum()
    }

    /// L2 projection of `f` onto the basis.
    pub fn project(&self, f: impl Fn(f64) -> f64, coefficients: &mut [f64]) {
        for c in coefficients.iter_mut() {
            *c = 0.0;
        }
        for (q, (&xi, &w)) in self
            .quadrature
            .points()
            .iter()
            .zip(self.quadrature.weights())
            .enumerate()
        {
            let value = f(xi);
            for (k, c) in coefficients.iter_mut().enumerate() {
                *c += (2.0 * k as f64 + 1.0) / 2.0 * w * value * self.phi[q][k];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legendre_recurrence_matches_closed_forms() {
        let xi = 0.3;
        let mut v = [0.0; 4];
        let mut d = [0.0; 4];
        legendre_values(xi, &mut v, &mut d);
        assert!((v[2] - 0.5 * (3.0 * xi * xi - 1.0)).abs() < 1e-14);
        assert!((v[3] - 0.5 * (5.0 * xi.powi(3) - 3.0 * xi)).abs() < 1e-14);
        assert!((d[2] - 3.0 * xi).abs() < 1e-14);
        assert!((d[3] - 0.5 * (15.0 * xi * xi - 3.0)).abs() < 1e-14);
    }

    #[test]
    fn derivatives_are_finite_at_the_ends() {
        let mut v = [0.0; 6];
        let mut d = [0.0; 6];
        legendre_values(1.0, &mut v, &mut d);
        for (k, &dk) in d.iter().enumerate() {
            let k = k as f64;
            assert!((dk - k * (k + 1.0) / 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn gauss_legendre_is_exact_up_to_degree_2n_minus_1() {
        for n in 1..=6 {
            let rule = QuadratureRule::gauss_legendre(n);
            assert_eq!(rule.len(), n);
            assert!(rule.points().windows(2).all(|w| w[0] < w[1]));
            for p in 0..2 * n {
                let exact = if p % 2 == 0 { 2.0 / (p as f64 + 1.0) } else { 0.0 };
                let approx = rule.integrate(|x| x.powi(p as i32));
                assert!((approx - exact).abs() < 1e-13, "n={n} p={p}");
            }
        }
    }

    #[test]
    fn boundary_values_follow_the_parity_of_the_basis() {
        let fe = FeTypeNetwork::new(3);
        let coefficients = [1.0, 2.0, 3.0, 4.0];
        let bv = fe.evaluate_dof_at_boundary_points(&coefficients);
        assert_eq!(bv.right, 10.0);
        assert_eq!(bv.left, 1.0 - 2.0 + 3.0 - 4.0);
        assert!((fe.evaluate(&coefficients, 1.0) - bv.right).abs() < 1e-14);
        assert!((fe.evaluate(&coefficients, -1.0) - bv.left).abs() < 1e-14);
    }

    #[test]
    fn projection_reproduces_polynomials() {
        let fe = FeTypeNetwork::new(2);
        let mut c = [0.0; 3];
        fe.project(|x| 2.0 - x + 3.0 * x * x, &mut c);
        // 3x^2 = 2 P_2 + 1
        assert!((c[0] - 3.0).abs() < 1e-13);
        assert!((c[1] + 1.0).abs() < 1e-13);
        assert!((c[2] - 2.0).abs() < 1e-13);

        let mut at_nodes = vec![0.0; fe.quadrature().len()];
        fe.evaluate_dof_at_quadrature_points(&c, &mut at_nodes);
        for (&xi, &v) in fe.quadrature().points().iter().zip(&at_nodes) {
            assert!((v - (2.0 - xi + 3.0 * xi * xi)).abs() < 1e-13);
        }
    }
}
