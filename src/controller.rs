use na::SVector;

use crate::backward::FeedbackGain;
use crate::trajectory::Trajectory;

/// Time-varying affine controller around an optimized trajectory.
///
/// Applies `u = u_nom[k] + K[k] (x - x_nom[k]) + alpha d[k]` without
/// re-running the optimizer.
#[derive(Debug, Clone)]
pub struct FeedbackController<const N: usize, const U: usize> {
    nominal: Trajectory<N, U>,
    gains: Vec<FeedbackGain<N, U>>,
}

impl<const N: usize, const U: usize> FeedbackController<N, U> {
    pub fn new(nominal: Trajectory<N, U>, gains: Vec<FeedbackGain<N, U>>) -> Self {
        Self { nominal, gains }
    }

    /// Steps that have both a gain and a nominal control.
    pub fn horizon(&self) -> usize {
        self.gains.len().min(self.nominal.us.len())
    }

    /// Control for step `k` given the measured state `x`, or `None` past the
    /// horizon.
    pub fn control(&self, k: usize, x: &SVector<f64, N>, alpha: f64) -> Option<SVector<f64, U>> {
        let gain = self.gains.get(k)?;
        let x_nom = self.nominal.xs.get(k)?;
        let u_nom = self.nominal.us.get(k)?;
        Some(gain.apply(x, x_nom, u_nom, alpha))
    }

    /// Feedback-only control; the feedforward term is already folded into
    /// the nominal controls once the optimizer has converged.
    pub fn feedback(&self, k: usize, x: &SVector<f64, N>) -> Option<SVector<f64, U>> {
        self.control(k, x, 0.0)
    }

    pub fn nominal(&self) -> &Trajectory<N, U> {
        &self.nominal
    }
}
