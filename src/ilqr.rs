use na::SVector;

use crate::backward::{backward_pass, linearize, FeedbackGain, Policy};
use crate::config::IlqrConfig;
use crate::controller::FeedbackController;
use crate::error::{IlqrError, Result};
use crate::forward::LineSearchOutcome;
use crate::model::Model;
use crate::trajectory::{initial_trajectory, Trajectory};

/// Why the outer loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Converged,
    MaxIterations,
    /// No step size decreased the cost; the best trajectory so far is kept.
    LineSearchExhausted,
    /// The backward pass on an accepted trajectory failed; the previous
    /// trajectory and its gains are kept.
    RegularizationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iter: usize,
    pub cost: f64,
    pub alpha: f64,
    pub expected_reduction: f64,
    pub accepted: bool,
}

#[derive(Debug, Clone)]
pub struct Solution<const N: usize, const U: usize> {
    pub trajectory: Trajectory<N, U>,
    /// Gains from the backward pass around `trajectory`.
    pub gains: Vec<FeedbackGain<N, U>>,
    pub cost: f64,
    pub initial_cost: f64,
    pub iterations: usize,
    pub status: Status,
    pub history: Vec<IterationRecord>,
}

impl<const N: usize, const U: usize> Solution<N, U> {
    pub fn xs(&self) -> &[SVector<f64, N>] {
        &self.trajectory.xs
    }

    pub fn us(&self) -> &[SVector<f64, U>] {
        &self.trajectory.us
    }

    pub fn controller(&self) -> FeedbackController<N, U> {
        FeedbackController::new(self.trajectory.clone(), self.gains.clone())
    }
}

/// Iterative LQR trajectory optimizer.
#[derive(Debug, Clone, Default)]
pub struct Ilqr {
    pub config: IlqrConfig,
}

impl Ilqr {
    pub fn new(config: IlqrConfig) -> Self {
        Self { config }
    }

    /// Optimize a `horizon`-step trajectory from `start` toward `target`,
    /// seeded with a zero-control rollout.
    pub fn generate_feedback_controller<M, const N: usize, const U: usize>(
        &self,
        model: &M,
        start: SVector<f64, N>,
        target: SVector<f64, N>,
        horizon: usize,
        iterations: usize,
    ) -> Result<Solution<N, U>>
    where
        M: Model<N, U> + Sync,
    {
        if horizon == 0 {
            return Err(IlqrError::EmptyHorizon);
        }
        let us = vec![SVector::<f64, U>::zeros(); horizon];
        self.generate_feedback_controller_from(model, start, target, us, iterations)
    }

    /// Same as [`Ilqr::generate_feedback_controller`], warm-started from `us`.
    pub fn generate_feedback_controller_from<M, const N: usize, const U: usize>(
        &self,
        model: &M,
        start: SVector<f64, N>,
        target: SVector<f64, N>,
        us: Vec<SVector<f64, U>>,
        iterations: usize,
    ) -> Result<Solution<N, U>>
    where
        M: Model<N, U> + Sync,
    {
        self.config.validate()?;
        if us.is_empty() {
            return Err(IlqrError::EmptyHorizon);
        }
        if start.iter().chain(target.iter()).any(|v| !v.is_finite()) {
            return Err(IlqrError::NonFiniteStart);
        }

        let config = &self.config;
        let mut traj = initial_trajectory(model, start, us, config.time_delta)?;
        let mut cost = traj.cost(model, &target);
        if !cost.is_finite() {
            return Err(IlqrError::Diverged {
                step: traj.horizon(),
            });
        }
        let initial_cost = cost;

        let mut policy = self
            .backward(model, &traj, &target)
            .map_err(|step| IlqrError::Regularization { step })?;

        let mut history = Vec::new();
        let mut status = Status::MaxIterations;
        let mut iters = 0;

        while iters < iterations {
            // stop once even the quadratic model predicts no improvement
            let expected = policy.expected_reduction(1.0);
            if expected.abs() < config.tolerance * cost.abs().max(1.0) {
                status = Status::Converged;
                break;
            }
            iters += 1;

            let outcome = config
                .line_search
                .search(model, &traj, cost, &policy, &target, config);
            let (trajectory, new_cost, alpha, expected_reduction) = match outcome {
                LineSearchOutcome::Accepted {
                    trajectory,
                    cost,
                    alpha,
                    expected_reduction,
                } => (trajectory, cost, alpha, expected_reduction),
                LineSearchOutcome::Exhausted { alpha } => {
                    log::warn!("iter {iters}: line search exhausted at alpha = {alpha:.3e}");
                    history.push(IterationRecord {
                        iter: iters,
                        cost,
                        alpha,
                        expected_reduction: policy.expected_reduction(alpha),
                        accepted: false,
                    });
                    status = Status::LineSearchExhausted;
                    break;
                }
            };

            match self.backward(model, &trajectory, &target) {
                Ok(next) => policy = next,
                Err(step) => {
                    log::warn!(
                        "iter {iters}: backward pass failed at step {step}, keeping previous trajectory"
                    );
                    history.push(IterationRecord {
                        iter: iters,
                        cost,
                        alpha,
                        expected_reduction,
                        accepted: false,
                    });
                    status = Status::RegularizationFailed;
                    break;
                }
            }

            let improvement = cost - new_cost;
            log::debug!(
                "iter {iters}: cost {new_cost:.6e} | alpha {alpha:.3e} | expected {expected_reduction:.3e}"
            );
            history.push(IterationRecord {
                iter: iters,
                cost: new_cost,
                alpha,
                expected_reduction,
                accepted: true,
            });
            traj = trajectory;
            let converged = improvement < config.tolerance * cost.abs().max(1.0);
            cost = new_cost;
            if converged {
                status = Status::Converged;
                break;
            }
        }

        log::info!(
            "ilqr finished after {iters} iterations ({status:?}): cost {initial_cost:.6e} -> {cost:.6e}"
        );

        Ok(Solution {
            trajectory: traj,
            gains: policy.gains,
            cost,
            initial_cost,
            iterations: iters,
            status,
            history,
        })
    }

    fn backward<M, const N: usize, const U: usize>(
        &self,
        model: &M,
        traj: &Trajectory<N, U>,
        target: &SVector<f64, N>,
    ) -> std::result::Result<Policy<N, U>, usize>
    where
        M: Model<N, U> + Sync,
    {
        let lin = linearize(model, traj, target, &self.config);
        backward_pass(&lin, &self.config).map_err(|failure| failure.step)
    }
}
