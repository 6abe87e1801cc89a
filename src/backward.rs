use na::{Cholesky, Const, SMatrix, SVector};
use rayon::prelude::*;

use crate::config::IlqrConfig;
use crate::model::{CostDerivatives, Model};
use crate::trajectory::Trajectory;

/// Local expansion of the discretized problem at one control step.
#[derive(Debug, Clone, Copy)]
pub struct StepDerivatives<const N: usize, const U: usize> {
    pub a: SMatrix<f64, N, N>,
    pub b: SMatrix<f64, N, U>,
    pub cost: CostDerivatives<N, U>,
}

#[derive(Debug, Clone)]
pub struct Linearization<const N: usize, const U: usize> {
    pub steps: Vec<StepDerivatives<N, U>>,
    pub terminal_grad: SVector<f64, N>,
    pub terminal_hess: SMatrix<f64, N, N>,
}

/// Feedback gain `k` and feedforward term `d` for one control step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackGain<const N: usize, const U: usize> {
    pub k: SMatrix<f64, U, N>,
    pub d: SVector<f64, U>,
}

impl<const N: usize, const U: usize> FeedbackGain<N, U> {
    /// `u_nom + k (x - x_nom) + alpha d`
    pub fn apply(
        &self,
        x: &SVector<f64, N>,
        x_nom: &SVector<f64, N>,
        u_nom: &SVector<f64, U>,
        alpha: f64,
    ) -> SVector<f64, U> {
        u_nom + self.k * (x - x_nom) + self.d * alpha
    }
}

/// Output of one backward pass.
#[derive(Debug, Clone)]
pub struct Policy<const N: usize, const U: usize> {
    pub gains: Vec<FeedbackGain<N, U>>,
    /// `V_xx` for every step `0..=K`.
    pub value_hessians: Vec<SMatrix<f64, N, N>>,
    dv1: f64,
    dv2: f64,
}

impl<const N: usize, const U: usize> Policy<N, U> {
    /// Cost reduction predicted by the quadratic model for a step of size `alpha`.
    pub fn expected_reduction(&self, alpha: f64) -> f64 {
        -(alpha * self.dv1 + alpha * alpha * self.dv2)
    }
}

/// Backward pass could not make `Q_uu` positive definite at `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackwardFailure {
    pub step: usize,
}

pub fn linearize<M, const N: usize, const U: usize>(
    model: &M,
    traj: &Trajectory<N, U>,
    target: &SVector<f64, N>,
    config: &IlqrConfig,
) -> Linearization<N, U>
where
    M: Model<N, U> + Sync,
{
    let dt = config.time_delta;
    let step = |k: usize| {
        let (x, u) = (&traj.xs[k], &traj.us[k]);
        let (f_x, f_u) = model.dynamics_jacobians(x, u, config.jacobian_epsilon);
        let cost = model.running_cost_derivatives(
            x,
            u,
            config.jacobian_epsilon,
            config.hessian_epsilon,
        );
        StepDerivatives {
            a: SMatrix::<f64, N, N>::identity() + f_x * dt,
            b: f_u * dt,
            cost,
        }
    };

    // steps are independent, so they can run in parallel
    let steps: Vec<_> = if config.parallel {
        (0..traj.horizon()).into_par_iter().map(step).collect()
    } else {
        (0..traj.horizon()).map(step).collect()
    };

    let x_final = &traj.xs[traj.horizon()];
    let (terminal_grad, terminal_hess) = model.terminal_cost_derivatives(
        x_final,
        target,
        config.jacobian_epsilon,
        config.hessian_epsilon,
    );

    Linearization {
        steps,
        terminal_grad,
        terminal_hess,
    }
}

/// Factorize `Q_uu`, shifting it by `mu I` until the factorization succeeds.
fn regularized_cholesky<const U: usize>(
    q_uu: &SMatrix<f64, U, U>,
    config: &IlqrConfig,
) -> Option<Cholesky<f64, Const<U>>> {
    if q_uu.iter().any(|v| !v.is_finite()) {
        return None;
    }
    if let Some(chol) = q_uu.cholesky() {
        return Some(chol);
    }

    let mut mu = config.regularization_init;
    for _ in 0..config.max_regularization_attempts {
        let shifted = q_uu + SMatrix::<f64, U, U>::identity() * mu;
        if let Some(chol) = shifted.cholesky() {
            log::trace!("Q_uu regularized with mu = {mu:e}");
            return Some(chol);
        }
        mu *= config.regularization_factor;
    }
    None
}

/// Riccati-like recursion from `k = K` down to `0`.
pub fn backward_pass<const N: usize, const U: usize>(
    lin: &Linearization<N, U>,
    config: &IlqrConfig,
) -> Result<Policy<N, U>, BackwardFailure> {
    let horizon = lin.steps.len();
    let mut v_x = lin.terminal_grad;
    let mut v_xx = lin.terminal_hess;

    let mut gains = Vec::with_capacity(horizon);
    let mut value_hessians = vec![SMatrix::<f64, N, N>::zeros(); horizon + 1];
    value_hessians[horizon] = v_xx;
    let (mut dv1, mut dv2) = (0.0, 0.0);

    for (k, s) in lin.steps.iter().enumerate().rev() {
        let c = &s.cost;
        let q_x = c.l_x + s.a.transpose() * v_x;
        let q_u = c.l_u + s.b.transpose() * v_x;
        let q_xx = c.l_xx + s.a.transpose() * v_xx * s.a;
        let q_uu = c.l_uu + s.b.transpose() * v_xx * s.b;
        let q_ux = c.l_ux + s.b.transpose() * v_xx * s.a;
        let q_uu = (q_uu + q_uu.transpose()) * 0.5;

        let chol = regularized_cholesky(&q_uu, config).ok_or(BackwardFailure { step: k })?;
        let k_gain = -chol.solve(&q_ux);
        let d = -chol.solve(&q_u);

        dv1 += d.dot(&q_u);
        dv2 += 0.5 * d.dot(&(q_uu * d));

        v_x = q_x + k_gain.transpose() * q_uu * d + k_gain.transpose() * q_u + q_ux.transpose() * d;
        let v = q_xx
            + k_gain.transpose() * q_uu * k_gain
            + k_gain.transpose() * q_ux
            + q_ux.transpose() * k_gain;
        // keep V_xx symmetric
        v_xx = (v + v.transpose()) * 0.5;
        value_hessians[k] = v_xx;

        gains.push(FeedbackGain { k: k_gain, d });
    }
    gains.reverse();

    Ok(Policy {
        gains,
        value_hessians,
        dv1,
        dv2,
    })
}
