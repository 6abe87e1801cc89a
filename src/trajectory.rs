use std::io;

use na::SVector;

use crate::error::{IlqrError, Result};
use crate::model::Model;

/// State and control sequences. `xs` has one more entry than `us`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<const N: usize, const U: usize> {
    pub xs: Vec<SVector<f64, N>>,
    pub us: Vec<SVector<f64, U>>,
}

/// One explicit Euler step of the continuous dynamics.
pub fn euler_step<M, const N: usize, const U: usize>(
    model: &M,
    x: &SVector<f64, N>,
    u: &SVector<f64, U>,
    dt: f64,
) -> SVector<f64, N>
where
    M: Model<N, U> + ?Sized,
{
    x + model.dynamics(x, u) * dt
}

impl<const N: usize, const U: usize> Trajectory<N, U> {
    /// Simulate `us` open-loop from `x0`.
    pub fn rollout<M>(model: &M, x0: SVector<f64, N>, us: Vec<SVector<f64, U>>, dt: f64) -> Self
    where
        M: Model<N, U> + ?Sized,
    {
        let mut xs = Vec::with_capacity(us.len() + 1);
        xs.push(x0);
        for (k, u) in us.iter().enumerate() {
            let x_next = euler_step(model, &xs[k], u, dt);
            xs.push(x_next);
        }
        Self { xs, us }
    }

    /// Number of control steps `K`.
    pub fn horizon(&self) -> usize {
        self.us.len()
    }

    pub fn cost<M>(&self, model: &M, target: &SVector<f64, N>) -> f64
    where
        M: Model<N, U> + ?Sized,
    {
        let running: f64 = self
            .xs
            .iter()
            .zip(self.us.iter())
            .map(|(x, u)| model.running_cost(x, u))
            .sum();
        // xs is never empty after construction
        let terminal = self
            .xs
            .last()
            .map_or(0.0, |x| model.terminal_cost(x, target));
        running + terminal
    }

    /// First step whose state or control is not finite.
    pub fn first_non_finite(&self) -> Option<usize> {
        let bad_x = self.xs.iter().position(|x| x.iter().any(|v| !v.is_finite()));
        let bad_u = self.us.iter().position(|u| u.iter().any(|v| !v.is_finite()));
        match (bad_x, bad_u) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// Write one CSV row per state: `x0..x{N-1}, u0..u{U-1}`.
    /// The final state has no control, so its control fields are left empty.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let header: Vec<String> = (0..N)
            .map(|i| format!("x{i}"))
            .chain((0..U).map(|i| format!("u{i}")))
            .collect();
        self.write_csv_with_header(writer, &header)
    }

    /// Same as [`Trajectory::write_csv`] with caller-supplied column names.
    /// `header` must have `N + U` entries, otherwise the first row fails.
    pub fn write_csv_with_header<W, S>(&self, writer: W, header: &[S]) -> csv::Result<()>
    where
        W: io::Write,
        S: AsRef<[u8]>,
    {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(header)?;

        for (k, x) in self.xs.iter().enumerate() {
            let mut record: Vec<String> = x.iter().map(|v| v.to_string()).collect();
            match self.us.get(k) {
                Some(u) => record.extend(u.iter().map(|v| v.to_string())),
                None => record.extend((0..U).map(|_| String::new())),
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Zero-control rollout used to seed the optimizer.
pub(crate) fn initial_trajectory<M, const N: usize, const U: usize>(
    model: &M,
    x0: SVector<f64, N>,
    us: Vec<SVector<f64, U>>,
    dt: f64,
) -> Result<Trajectory<N, U>>
where
    M: Model<N, U> + ?Sized,
{
    let traj = Trajectory::rollout(model, x0, us, dt);
    match traj.first_non_finite() {
        Some(step) => Err(IlqrError::Diverged { step }),
        None => Ok(traj),
    }
}
