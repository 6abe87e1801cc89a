use na::{SMatrix, SVector};

use crate::numdiff;

/// Second-order expansion of the running cost around `(x, u)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostDerivatives<const N: usize, const U: usize> {
    pub l_x: SVector<f64, N>,
    pub l_u: SVector<f64, U>,
    pub l_xx: SMatrix<f64, N, N>,
    pub l_uu: SMatrix<f64, U, U>,
    pub l_ux: SMatrix<f64, U, N>,
}

/// Problem definition consumed by the optimizer.
///
/// Implementors supply continuous dynamics `x_dot = f(x, u)`, a running cost and
/// a terminal cost measured against an explicit target state. The derivative
/// methods default to central differences; override them to supply analytic
/// derivatives. All methods must be free of side effects, since they are
/// evaluated at perturbed, off-trajectory points.
pub trait Model<const N: usize, const U: usize> {
    fn dynamics(&self, x: &SVector<f64, N>, u: &SVector<f64, U>) -> SVector<f64, N>;

    fn running_cost(&self, x: &SVector<f64, N>, u: &SVector<f64, U>) -> f64;

    fn terminal_cost(&self, x: &SVector<f64, N>, target: &SVector<f64, N>) -> f64;

    /// Jacobians `(df/dx, df/du)` of the continuous dynamics.
    fn dynamics_jacobians(
        &self,
        x: &SVector<f64, N>,
        u: &SVector<f64, U>,
        eps: f64,
    ) -> (SMatrix<f64, N, N>, SMatrix<f64, N, U>) {
        let f_x = numdiff::jacobian(|x| self.dynamics(x, u), x, eps);
        let f_u = numdiff::jacobian(|u| self.dynamics(x, u), u, eps);
        (f_x, f_u)
    }

    fn running_cost_derivatives(
        &self,
        x: &SVector<f64, N>,
        u: &SVector<f64, U>,
        grad_eps: f64,
        hess_eps: f64,
    ) -> CostDerivatives<N, U> {
        CostDerivatives {
            l_x: numdiff::gradient(|x| self.running_cost(x, u), x, grad_eps),
            l_u: numdiff::gradient(|u| self.running_cost(x, u), u, grad_eps),
            l_xx: numdiff::hessian(|x| self.running_cost(x, u), x, hess_eps),
            l_uu: numdiff::hessian(|u| self.running_cost(x, u), u, hess_eps),
            l_ux: numdiff::cross_hessian(|x, u| self.running_cost(x, u), x, u, hess_eps),
        }
    }

    /// Gradient and Hessian of the terminal cost.
    fn terminal_cost_derivatives(
        &self,
        x: &SVector<f64, N>,
        target: &SVector<f64, N>,
        grad_eps: f64,
        hess_eps: f64,
    ) -> (SVector<f64, N>, SMatrix<f64, N, N>) {
        let g = numdiff::gradient(|x| self.terminal_cost(x, target), x, grad_eps);
        let h = numdiff::hessian(|x| self.terminal_cost(x, target), x, hess_eps);
        (g, h)
    }
}

/// Model assembled from plain function pointers.
#[derive(Clone, Copy)]
pub struct FnModel<const N: usize, const U: usize> {
    dynamics: fn(&SVector<f64, N>, &SVector<f64, U>) -> SVector<f64, N>,
    running_cost: fn(&SVector<f64, N>, &SVector<f64, U>) -> f64,
    terminal_cost: fn(&SVector<f64, N>, &SVector<f64, N>) -> f64,
}

impl<const N: usize, const U: usize> FnModel<N, U> {
    pub fn new(
        dynamics: fn(&SVector<f64, N>, &SVector<f64, U>) -> SVector<f64, N>,
        running_cost: fn(&SVector<f64, N>, &SVector<f64, U>) -> f64,
        terminal_cost: fn(&SVector<f64, N>, &SVector<f64, N>) -> f64,
    ) -> Self {
        Self {
            dynamics,
            running_cost,
            terminal_cost,
        }
    }
}

impl<const N: usize, const U: usize> Model<N, U> for FnModel<N, U> {
    fn dynamics(&self, x: &SVector<f64, N>, u: &SVector<f64, U>) -> SVector<f64, N> {
        (self.dynamics)(x, u)
    }

    fn running_cost(&self, x: &SVector<f64, N>, u: &SVector<f64, U>) -> f64 {
        (self.running_cost)(x, u)
    }

    fn terminal_cost(&self, x: &SVector<f64, N>, target: &SVector<f64, N>) -> f64 {
        (self.terminal_cost)(x, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{matrix, vector};

    fn pendulum(x: &SVector<f64, 2>, u: &SVector<f64, 1>) -> SVector<f64, 2> {
        vector![x[1], -9.8 * x[0].sin() + u[0]]
    }

    fn effort(x: &SVector<f64, 2>, u: &SVector<f64, 1>) -> f64 {
        x.norm_squared() + 0.1 * u[0] * u[0] + x[0] * u[0]
    }

    fn distance(x: &SVector<f64, 2>, target: &SVector<f64, 2>) -> f64 {
        10.0 * (x - target).norm_squared()
    }

    #[test]
    fn numerical_jacobians_match_analytic() {
        let model = FnModel::new(pendulum, effort, distance);
        let x = vector![0.4, -0.2];
        let (f_x, f_u) = model.dynamics_jacobians(&x, &vector![0.3], 1e-5);
        assert_relative_eq!(
            f_x,
            matrix![0.0, 1.0; -9.8 * x[0].cos(), 0.0],
            epsilon = 1e-7
        );
        assert_relative_eq!(f_u, vector![0.0, 1.0], epsilon = 1e-7);
    }

    #[test]
    fn cost_derivatives_match_analytic() {
        let model = FnModel::new(pendulum, effort, distance);
        let x = vector![0.4, -0.2];
        let u = vector![0.3];
        let d = model.running_cost_derivatives(&x, &u, 1e-5, 1e-4);
        assert_relative_eq!(d.l_x, 2.0 * x + vector![u[0], 0.0], epsilon = 1e-7);
        assert_relative_eq!(d.l_u, vector![0.2 * u[0] + x[0]], epsilon = 1e-7);
        assert_relative_eq!(d.l_xx, 2.0 * SMatrix::<f64, 2, 2>::identity(), epsilon = 1e-5);
        assert_relative_eq!(d.l_uu, matrix![0.2], epsilon = 1e-5);
        assert_relative_eq!(d.l_ux, matrix![1.0, 0.0], epsilon = 1e-5);

        let target = vector![0.1, 0.0];
        let (g, h) = model.terminal_cost_derivatives(&x, &target, 1e-5, 1e-4);
        assert_relative_eq!(g, 20.0 * (x - target), epsilon = 1e-6);
        assert_relative_eq!(h, 20.0 * SMatrix::<f64, 2, 2>::identity(), epsilon = 1e-4);
    }
}
