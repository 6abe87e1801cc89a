use na::{SVector, Vector1, Vector4};

use crate::model::Model;

/// Cart-pole swing-up/balance problem.
///
/// state x: [px, px', theta, theta'], input u: [Fx].
/// theta = 0 is pointing up. The applied force is squashed with `tanh`, so it
/// stays within (-1, 1).
#[derive(Debug, Clone, Copy)]
pub struct CartPole {
    pub mc: f64, // cart mass [kg]
    pub mp: f64, // pole mass [kg]
    pub l: f64,  // pole length [m]
    pub g: f64,  // gravity [m/s^2]
    pub control_weight: f64,
    pub terminal_weight: f64,
}

impl Default for CartPole {
    fn default() -> Self {
        Self {
            mc: 1.0,
            mp: 0.1,
            l: 1.0,
            g: 9.80665,
            control_weight: 1.0,
            terminal_weight: 400.0,
        }
    }
}

impl Model<4, 1> for CartPole {
    fn dynamics(&self, q: &Vector4<f64>, u: &Vector1<f64>) -> Vector4<f64> {
        let x_dot = q[1];
        let theta = q[2];
        let theta_dot = q[3];
        let (sin_theta, cos_theta) = theta.sin_cos();
        let total = self.mc + self.mp;

        let force = u[0].tanh();
        let temp = (force + self.mp * self.l * theta_dot.powi(2) * sin_theta) / total;
        let numerator = self.g * sin_theta - cos_theta * temp;
        let denominator = self.l * (4.0 / 3.0 - self.mp * cos_theta.powi(2) / total);
        let theta_dot_dot = numerator / denominator;
        let x_dot_dot = temp - self.mp * self.l * theta_dot_dot * cos_theta / total;

        Vector4::new(x_dot, x_dot_dot, theta_dot, theta_dot_dot)
    }

    // penalize large inputs
    fn running_cost(&self, _: &Vector4<f64>, u: &Vector1<f64>) -> f64 {
        self.control_weight * u.norm_squared()
    }

    fn terminal_cost(&self, q: &Vector4<f64>, target: &SVector<f64, 4>) -> f64 {
        self.terminal_weight * (q - target).norm_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::vector;

    #[test]
    fn upright_is_an_equilibrium() {
        let model = CartPole::default();
        let q_dot = model.dynamics(&Vector4::zeros(), &vector![0.0]);
        assert_eq!(q_dot, Vector4::zeros());
    }

    #[test]
    fn tilted_pole_falls_further() {
        let model = CartPole::default();
        let q_dot = model.dynamics(&vector![0.0, 0.0, 0.1, 0.0], &vector![0.0]);
        assert!(q_dot[3] > 0.0);
        // cart is pushed the other way by the falling pole
        assert!(q_dot[1] < 0.0);
    }

    #[test]
    fn terminal_cost_uses_target() {
        let model = CartPole::default();
        let q = vector![1.0, 0.0, 0.0, 0.0];
        assert_eq!(model.terminal_cost(&q, &q), 0.0);
        assert_relative_eq!(model.terminal_cost(&q, &Vector4::zeros()), 400.0);
    }
}
