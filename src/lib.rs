//! Iterative LQR trajectory optimization.
//!
//! A problem is described by a [`Model`]: continuous dynamics, a running cost
//! and a terminal cost against a target state. [`Ilqr`] alternates a backward
//! Riccati-like pass with a forward rollout under line search, and returns the
//! optimized trajectory together with the time-varying feedback gains.
//!
//! ```no_run
//! use ilqr::{cartpole::CartPole, Ilqr, IlqrConfig};
//! use nalgebra::vector;
//!
//! let ilqr = Ilqr::new(IlqrConfig::default().with_time_delta(0.05));
//! let start = vector![0.0, 0.0, std::f64::consts::FRAC_PI_4, 0.0];
//! let solution = ilqr
//!     .generate_feedback_controller(&CartPole::default(), start, vector![0.0, 0.0, 0.0, 0.0], 100, 1)
//!     .unwrap();
//! assert_eq!(solution.xs().len(), 101);
//! ```
extern crate nalgebra as na;

pub mod backward;
pub mod cartpole;
pub mod config;
pub mod controller;
pub mod error;
pub mod forward;
pub mod ilqr;
pub mod model;
pub mod numdiff;
pub mod trajectory;

pub use backward::FeedbackGain;
pub use config::{IlqrConfig, LineSearch};
pub use controller::FeedbackController;
pub use error::IlqrError;
pub use ilqr::{Ilqr, IterationRecord, Solution, Status};
pub use model::{CostDerivatives, FnModel, Model};
pub use trajectory::Trajectory;
