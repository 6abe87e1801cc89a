use thiserror::Error;

/// Errors that prevent the optimizer from producing a controller at all.
///
/// Line-search exhaustion and running out of iterations are not errors; they
/// are reported through [`crate::ilqr::Status`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IlqrError {
    #[error("trajectory length must be positive")]
    EmptyHorizon,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("start or target state contains non-finite values")]
    NonFiniteStart,

    #[error("rollout diverged at step {step}")]
    Diverged { step: usize },

    #[error("could not regularize Q_uu at step {step}")]
    Regularization { step: usize },
}

pub type Result<T> = std::result::Result<T, IlqrError>;
