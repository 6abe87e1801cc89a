extern crate nalgebra as na;
use anyhow::{bail, Result};
use clap::Parser;
use ilqr::{cartpole::CartPole, Ilqr, IlqrConfig, Status};
use na::vector;
use std::f64::consts::PI;

// cargo run --example cartpole --release -- --iterations 20

#[derive(Parser, Debug)]
#[command(about = "Stabilize an inverted pendulum on a cart with ILQR")]
struct Args {
    /// Number of control steps
    #[arg(long, default_value_t = 100)]
    horizon: usize,

    /// Outer iteration budget
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Integration time step [s]
    #[arg(long, default_value_t = 0.05)]
    dt: f64,

    /// Initial pole angle [rad]
    #[arg(long, default_value_t = PI / 4.0)]
    theta: f64,

    #[arg(long, default_value = "cartpole.trajectory.csv")]
    output: String,
}

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;
    let args = Args::parse();

    // state: x, x_dot, theta, theta_dot
    let start = vector![0.0, 0.0, args.theta, 0.0];
    let target = vector![0.0, 0.0, 0.0, 0.0];

    let ilqr = Ilqr::new(IlqrConfig::default().with_time_delta(args.dt));
    let now = std::time::Instant::now();
    let solution = ilqr.generate_feedback_controller(
        &CartPole::default(),
        start,
        target,
        args.horizon,
        args.iterations,
    )?;
    log::info!("elapsed: {:.3} sec", now.elapsed().as_secs_f64());

    if !solution.trajectory.is_finite() {
        bail!("optimized trajectory contains non-finite values");
    }
    if solution.status == Status::LineSearchExhausted {
        log::warn!("line search could not improve the trajectory any further");
    }

    // trajectory log
    let file = std::fs::File::create(&args.output)?;
    solution
        .trajectory
        .write_csv_with_header(file, &["x", "x_dot", "theta", "theta_dot", "u"])?;

    println!(
        "cost: {:.4} -> {:.4} ({} iterations, {:?}), wrote {}",
        solution.initial_cost, solution.cost, solution.iterations, solution.status, args.output
    );
    Ok(())
}
