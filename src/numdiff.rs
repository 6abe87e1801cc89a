//! Central-difference derivatives on static vectors.

use na::{SMatrix, SVector};

/// Jacobian of `f` at `x`, column `i` is `df/dx_i`.
pub fn jacobian<const N: usize, const M: usize, F>(
    f: F,
    x: &SVector<f64, N>,
    eps: f64,
) -> SMatrix<f64, M, N>
where
    F: Fn(&SVector<f64, N>) -> SVector<f64, M>,
{
    let mut j = SMatrix::<f64, M, N>::zeros();
    let mut xp = *x;
    for i in 0..N {
        xp[i] = x[i] + eps;
        let f_plus = f(&xp);
        xp[i] = x[i] - eps;
        let f_minus = f(&xp);
        xp[i] = x[i];
        j.set_column(i, &((f_plus - f_minus) / (2.0 * eps)));
    }
    j
}

pub fn gradient<const N: usize, F>(f: F, x: &SVector<f64, N>, eps: f64) -> SVector<f64, N>
where
    F: Fn(&SVector<f64, N>) -> f64,
{
    let mut g = SVector::<f64, N>::zeros();
    let mut xp = *x;
    for i in 0..N {
        xp[i] = x[i] + eps;
        let f_plus = f(&xp);
        xp[i] = x[i] - eps;
        let f_minus = f(&xp);
        xp[i] = x[i];
        g[i] = (f_plus - f_minus) / (2.0 * eps);
    }
    g
}

/// Hessian of a scalar function. Symmetric by construction.
pub fn hessian<const N: usize, F>(f: F, x: &SVector<f64, N>, eps: f64) -> SMatrix<f64, N, N>
where
    F: Fn(&SVector<f64, N>) -> f64,
{
    let mut h = SMatrix::<f64, N, N>::zeros();
    let f0 = f(x);
    let h2 = eps * eps;
    let mut xp = *x;
    for i in 0..N {
        xp[i] = x[i] + eps;
        let f_plus = f(&xp);
        xp[i] = x[i] - eps;
        let f_minus = f(&xp);
        xp[i] = x[i];
        h[(i, i)] = (f_plus - 2.0 * f0 + f_minus) / h2;

        for j in 0..i {
            let v = second_difference(&f, x, i, j, eps);
            h[(i, j)] = v;
            h[(j, i)] = v;
        }
    }
    h
}

/// Mixed second derivative `d²f / du dx` of `f(x, u)`, shaped U×N.
pub fn cross_hessian<const N: usize, const U: usize, F>(
    f: F,
    x: &SVector<f64, N>,
    u: &SVector<f64, U>,
    eps: f64,
) -> SMatrix<f64, U, N>
where
    F: Fn(&SVector<f64, N>, &SVector<f64, U>) -> f64,
{
    let mut h = SMatrix::<f64, U, N>::zeros();
    let mut xp = *x;
    let mut up = *u;
    for a in 0..U {
        for i in 0..N {
            let mut eval = |dx: f64, du: f64| {
                xp[i] = x[i] + dx;
                up[a] = u[a] + du;
                let v = f(&xp, &up);
                xp[i] = x[i];
                up[a] = u[a];
                v
            };
            let pp = eval(eps, eps);
            let pm = eval(eps, -eps);
            let mp = eval(-eps, eps);
            let mm = eval(-eps, -eps);
            h[(a, i)] = (pp - pm - mp + mm) / (4.0 * eps * eps);
        }
    }
    h
}

fn second_difference<const N: usize, F>(
    f: &F,
    x: &SVector<f64, N>,
    i: usize,
    j: usize,
    eps: f64,
) -> f64
where
    F: Fn(&SVector<f64, N>) -> f64,
{
    let mut xp = *x;
    let mut eval = |di: f64, dj: f64| {
        xp[i] = x[i] + di;
        xp[j] = x[j] + dj;
        let v = f(&xp);
        xp[i] = x[i];
        xp[j] = x[j];
        v
    };
    let pp = eval(eps, eps);
    let pm = eval(eps, -eps);
    let mp = eval(-eps, eps);
    let mm = eval(-eps, -eps);
    (pp - pm - mp + mm) / (4.0 * eps * eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use na::{matrix, vector};

    #[test]
    fn jacobian_of_nonlinear_map() {
        let f = |x: &SVector<f64, 2>| vector![x[0] * x[1], x[0].sin()];
        let x = vector![0.3, -1.2];
        let j = jacobian(f, &x, 1e-5);
        let expected = matrix![
            x[1], x[0];
            x[0].cos(), 0.0
        ];
        assert_relative_eq!(j, expected, epsilon = 1e-8);
    }

    #[test]
    fn gradient_and_hessian_of_quadratic() {
        let q = matrix![
            3.0, 1.0;
            1.0, 2.0
        ];
        let f = |x: &SVector<f64, 2>| 0.5 * (x.transpose() * q * x)[0] + x[0];
        let x = vector![0.7, -0.4];
        let g = gradient(f, &x, 1e-5);
        assert_relative_eq!(g, q * x + vector![1.0, 0.0], epsilon = 1e-8);

        let h = hessian(f, &x, 1e-4);
        assert_relative_eq!(h, q, epsilon = 1e-5);
        assert_eq!(h, h.transpose());
    }

    #[test]
    fn cross_hessian_of_bilinear_term() {
        let f = |x: &SVector<f64, 2>, u: &SVector<f64, 1>| 2.0 * x[1] * u[0] + u[0] * u[0];
        let h = cross_hessian(f, &vector![1.0, 2.0], &vector![0.5], 1e-4);
        assert_relative_eq!(h, matrix![0.0, 2.0], epsilon = 1e-5);
    }
}
