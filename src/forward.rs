use na::SVector;

use crate::backward::Policy;
use crate::config::{IlqrConfig, LineSearch};
use crate::model::Model;
use crate::trajectory::{euler_step, Trajectory};

/// Result of the backtracking search over `alpha`.
#[derive(Debug, Clone)]
pub enum LineSearchOutcome<const N: usize, const U: usize> {
    Accepted {
        trajectory: Trajectory<N, U>,
        cost: f64,
        alpha: f64,
        expected_reduction: f64,
    },
    Exhausted {
        alpha: f64,
    },
}

/// Roll the nonlinear dynamics forward under the feedback policy.
///
/// The start state is copied from the nominal trajectory, so `xs[0]` is
/// never perturbed.
pub fn rollout_with_policy<M, const N: usize, const U: usize>(
    model: &M,
    nominal: &Trajectory<N, U>,
    policy: &Policy<N, U>,
    alpha: f64,
    dt: f64,
) -> Trajectory<N, U>
where
    M: Model<N, U> + ?Sized,
{
    let horizon = nominal.horizon();
    let mut xs: Vec<SVector<f64, N>> = Vec::with_capacity(horizon + 1);
    let mut us: Vec<SVector<f64, U>> = Vec::with_capacity(horizon);
    xs.push(nominal.xs[0]);

    for (k, gain) in policy.gains.iter().enumerate() {
        let u = gain.apply(&xs[k], &nominal.xs[k], &nominal.us[k], alpha);
        let x_next = euler_step(model, &xs[k], &u, dt);
        us.push(u);
        xs.push(x_next);
    }
    Trajectory { xs, us }
}

impl LineSearch {
    /// Backtrack from `alpha = 1` until the rolled-out cost strictly decreases.
    pub fn search<M, const N: usize, const U: usize>(
        &self,
        model: &M,
        nominal: &Trajectory<N, U>,
        cost: f64,
        policy: &Policy<N, U>,
        target: &SVector<f64, N>,
        config: &IlqrConfig,
    ) -> LineSearchOutcome<N, U>
    where
        M: Model<N, U> + ?Sized,
    {
        let mut alpha = 1.0;
        for _ in 0..self.max_steps {
            let trial = rollout_with_policy(model, nominal, policy, alpha, config.time_delta);
            let cost_trial = trial.cost(model, target);
            let expected = policy.expected_reduction(alpha);

            if trial.is_finite() && cost_trial.is_finite() && cost_trial < cost {
                let ratio = (cost - cost_trial) / expected;
                if expected <= 0.0 || ratio >= self.min_reduction_ratio {
                    return LineSearchOutcome::Accepted {
                        trajectory: trial,
                        cost: cost_trial,
                        alpha,
                        expected_reduction: expected,
                    };
                }
            }
            log::trace!(
                "line search rejected alpha = {alpha:.3e} (cost {cost_trial:.6e} vs {cost:.6e})"
            );
            alpha *= self.backtrack;
        }
        LineSearchOutcome::Exhausted { alpha }
    }
}
