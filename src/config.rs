use crate::error::{IlqrError, Result};

/// Backtracking parameters for the forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearch {
    pub backtrack: f64,           // multiply alpha on rejected step
    pub max_steps: usize,         // rejected trials before giving up
    pub min_reduction_ratio: f64, // actual / expected reduction required to accept
}

impl Default for LineSearch {
    fn default() -> Self {
        Self {
            backtrack: 0.5,
            max_steps: 10,
            min_reduction_ratio: 0.0,
        }
    }
}

/// Solver configuration. `time_delta` is the fixed Euler step shared by the
/// rollout and the linearization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IlqrConfig {
    pub time_delta: f64,
    pub tolerance: f64,
    pub jacobian_epsilon: f64,
    pub hessian_epsilon: f64,
    pub regularization_init: f64,
    pub regularization_factor: f64,
    pub max_regularization_attempts: usize,
    pub line_search: LineSearch,
    pub parallel: bool,
}

impl Default for IlqrConfig {
    fn default() -> Self {
        Self {
            time_delta: 0.05,
            tolerance: 1e-6,
            jacobian_epsilon: 1e-5,
            hessian_epsilon: 1e-4,
            regularization_init: 1e-6,
            regularization_factor: 10.0,
            max_regularization_attempts: 20,
            line_search: LineSearch::default(),
            parallel: false,
        }
    }
}

impl IlqrConfig {
    pub fn with_time_delta(mut self, time_delta: f64) -> Self {
        self.time_delta = time_delta;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_line_search(mut self, line_search: LineSearch) -> Self {
        self.line_search = line_search;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(IlqrError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {v}"
                )))
            }
        };
        positive("time_delta", self.time_delta)?;
        positive("jacobian_epsilon", self.jacobian_epsilon)?;
        positive("hessian_epsilon", self.hessian_epsilon)?;
        positive("regularization_init", self.regularization_init)?;

        if !(self.tolerance >= 0.0) {
            return Err(IlqrError::InvalidConfig(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.regularization_factor > 1.0) {
            return Err(IlqrError::InvalidConfig(format!(
                "regularization_factor must exceed 1, got {}",
                self.regularization_factor
            )));
        }
        let backtrack = self.line_search.backtrack;
        if !(backtrack > 0.0 && backtrack < 1.0) {
            return Err(IlqrError::InvalidConfig(format!(
                "line search backtrack must lie in (0, 1), got {backtrack}"
            )));
        }
        Ok(())
    }
}
