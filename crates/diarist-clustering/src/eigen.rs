//! Iterative eigensolver for sparse symmetric matrices
//!
//! Spectral embedding needs the eigenvectors at the bottom of a Laplacian's
//! spectrum, and only a handful of them, so a dense decomposition is never
//! materialized. Instead a shift-inverted subspace iteration runs on
//! `(L + I)^{-1}`: the Laplacian is positive semi-definite, making the
//! shifted operator well-conditioned for conjugate-gradient solves, and its
//! dominant invariant subspace is exactly the bottom of L's spectrum.
//! Rayleigh-Ritz extraction on the small projected problem (solved by cyclic
//! Jacobi) recovers the individual eigenpairs.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sparse::CsrMatrix;

const OUTER_MAX_ITERS: usize = 300;
const RESIDUAL_TOL: f64 = 1e-8;
const CG_TOL: f64 = 1e-12;

/// Compute the `k` algebraically smallest eigenpairs of a symmetric sparse
/// matrix
///
/// Returns eigenvalues in ascending order and the matching eigenvectors as
/// columns. The starting subspace is drawn from a seeded generator, so the
/// iteration is fully deterministic for a fixed seed; callers needing
/// reproducibility across arbitrary seeds must canonicalize eigenvector
/// signs themselves.
pub fn smallest_eigenpairs(
    matrix: &CsrMatrix,
    k: usize,
    seed: u64,
) -> (Array1<f64>, Array2<f64>) {
    let n = matrix.n();
    debug_assert!(k >= 1 && k <= n);

    // Small oversampling accelerates convergence of the trailing pair
    let m = (k + 2).min(n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut subspace = Array2::from_shape_fn((n, m), |_| rng.gen_range(-1.0..1.0));
    orthonormalize(&mut subspace);

    let mut values = Array1::zeros(m);
    for _ in 0..OUTER_MAX_ITERS {
        // One shift-invert application per column
        let mut inverted = Array2::zeros((n, m));
        for j in 0..m {
            let solved = cg_solve_shifted(matrix, subspace.column(j));
            inverted.column_mut(j).assign(&solved);
        }
        orthonormalize(&mut inverted);

        // Rayleigh-Ritz: project, solve the small dense problem, rotate back
        let mut projected_image = Array2::zeros((n, m));
        for j in 0..m {
            projected_image
                .column_mut(j)
                .assign(&matrix.matvec(inverted.column(j)));
        }
        let mut small = inverted.t().dot(&projected_image);
        symmetrize(&mut small);
        let (theta, rotation) = jacobi_eigh(small);

        subspace = inverted.dot(&rotation);
        values = theta;

        if max_residual(matrix, subspace.view(), values.view(), k) < RESIDUAL_TOL {
            break;
        }
    }

    (
        values.slice(ndarray::s![..k]).to_owned(),
        subspace.slice(ndarray::s![.., ..k]).to_owned(),
    )
}

/// Worst residual norm `||A x - theta x||` over the first `k` pairs
fn max_residual(
    matrix: &CsrMatrix,
    vectors: ArrayView2<f64>,
    values: ArrayView1<f64>,
    k: usize,
) -> f64 {
    let mut worst: f64 = 0.0;
    for j in 0..k {
        let x = vectors.column(j);
        let residual = matrix.matvec(x) - &(&x * values[j]);
        let norm = residual.dot(&residual).sqrt();
        worst = worst.max(norm / values[j].abs().max(1.0));
    }
    worst
}

/// Solve `(A + I) y = b` by conjugate gradients
///
/// The shift keeps the operator positive definite for any positive
/// semi-definite `A`, so plain CG converges without preconditioning.
fn cg_solve_shifted(matrix: &CsrMatrix, b: ArrayView1<f64>) -> Array1<f64> {
    let n = b.len();
    let b_norm = b.dot(&b).sqrt();
    if b_norm == 0.0 {
        return Array1::zeros(n);
    }

    let mut y = Array1::zeros(n);
    let mut residual = b.to_owned();
    let mut direction = residual.clone();
    let mut rs = residual.dot(&residual);

    let max_iters = 10 * n + 100;
    for _ in 0..max_iters {
        let applied = matrix.matvec(direction.view()) + &direction;
        let denom = direction.dot(&applied);
        if denom <= 0.0 {
            break;
        }
        let alpha = rs / denom;
        y.scaled_add(alpha, &direction);
        residual.scaled_add(-alpha, &applied);

        let rs_next = residual.dot(&residual);
        if rs_next.sqrt() <= CG_TOL * b_norm {
            break;
        }
        direction = &residual + &(&direction * (rs_next / rs));
        rs = rs_next;
    }
    y
}

/// Orthonormalize the columns in place (modified Gram-Schmidt)
///
/// A column that collapses to numerical zero is replaced by a canonical
/// basis vector so the subspace keeps full rank deterministically.
fn orthonormalize(block: &mut Array2<f64>) {
    let (n, m) = block.dim();
    for j in 0..m {
        for attempt in 0..=n {
            for i in 0..j {
                let projection = block.column(i).dot(&block.column(j));
                let prior = block.column(i).to_owned();
                block.column_mut(j).scaled_add(-projection, &prior);
            }
            let norm = block.column(j).dot(&block.column(j)).sqrt();
            if norm > 1e-10 {
                block.column_mut(j).mapv_inplace(|v| v / norm);
                break;
            }
            // Degenerate column: restart from a basis vector and re-project
            let mut replacement = Array1::zeros(n);
            replacement[(j + attempt) % n] = 1.0;
            block.column_mut(j).assign(&replacement);
        }
    }
}

fn symmetrize(a: &mut Array2<f64>) {
    let m = a.nrows();
    for i in 0..m {
        for j in (i + 1)..m {
            let avg = (a[[i, j]] + a[[j, i]]) / 2.0;
            a[[i, j]] = avg;
            a[[j, i]] = avg;
        }
    }
}

/// Eigendecomposition of a small dense symmetric matrix by cyclic Jacobi
///
/// Returns eigenvalues ascending with eigenvectors as the matching columns
/// of the rotation matrix. Intended for the Rayleigh-Ritz matrices of the
/// subspace iteration, whose dimension is a few more than the cluster count.
pub fn jacobi_eigh(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let m = a.nrows();
    debug_assert_eq!(m, a.ncols());
    let mut vectors = Array2::eye(m);

    const MAX_SWEEPS: usize = 100;
    for _ in 0..MAX_SWEEPS {
        let mut off_diag: f64 = 0.0;
        for i in 0..m {
            for j in (i + 1)..m {
                off_diag += a[[i, j]] * a[[i, j]];
            }
        }
        if off_diag.sqrt() < 1e-14 {
            break;
        }

        for p in 0..m {
            for q in (p + 1)..m {
                if a[[p, q]].abs() < 1e-300 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * a[[p, q]]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for i in 0..m {
                    let aip = a[[i, p]];
                    let aiq = a[[i, q]];
                    a[[i, p]] = c * aip - s * aiq;
                    a[[i, q]] = s * aip + c * aiq;
                }
                for i in 0..m {
                    let api = a[[p, i]];
                    let aqi = a[[q, i]];
                    a[[p, i]] = c * api - s * aqi;
                    a[[q, i]] = s * api + c * aqi;
                }
                for i in 0..m {
                    let vip = vectors[[i, p]];
                    let viq = vectors[[i, q]];
                    vectors[[i, p]] = c * vip - s * viq;
                    vectors[[i, q]] = s * vip + c * viq;
                }
            }
        }
    }

    // Sort ascending, carrying eigenvectors along
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| a[[i, i]].total_cmp(&a[[j, j]]));

    let values = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut sorted_vectors = Array2::zeros((m, m));
    for (dst, &src) in order.iter().enumerate() {
        sorted_vectors.column_mut(dst).assign(&vectors.column(src));
    }
    (values, sorted_vectors)
}
