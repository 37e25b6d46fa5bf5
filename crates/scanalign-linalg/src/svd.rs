//! Double precision 3×3 Singular Value Decomposition (SVD).
//!
//! The decomposition is the workhorse of the rigid solver in [`crate::rigid`]:
//! the cross-covariance of two small point sets is factored and the rotation
//! is read off the singular vectors.
//!
//! # Mathematical Background
//!
//! For any matrix A ∈ ℝ³ˣ³, the SVD decomposes it into three matrices:
//!
//! ```text
//! A = U Σ Vᵀ
//! ```
//!
//! where:
//! * U ∈ ℝ³ˣ³ is an orthogonal matrix (left singular vectors)
//! * Σ ∈ ℝ³ˣ³ is a diagonal matrix of singular values (σ₁ ≥ σ₂ ≥ σ₃ ≥ 0)
//! * V ∈ ℝ³ˣ³ is an orthogonal matrix (right singular vectors)
//!
//! # Implementation Details
//!
//! * cyclic Jacobi eigen-analysis of the symmetric matrix AᵀA gives V
//! * the columns of B = A·V are sorted by decreasing norm
//! * a Givens QR decomposition of B gives U and the singular values
//!
//! Rank deficient inputs (including the zero matrix) still produce orthogonal
//! U and V; the missing singular values come out as (numerical) zeros.
//!
//! # Example
//!
//! ```
//! use scanalign_linalg::svd::svd3;
//! use scanalign_linalg::DMat3;
//!
//! let matrix = DMat3::from_cols_array(&[
//!     1.0, 0.0, 0.0,
//!     0.0, 2.0, 0.0,
//!     0.0, 0.0, 3.0,
//! ]);
//!
//! let svd_result = svd3(&matrix);
//! let u = svd_result.u();
//! let s = svd_result.s();
//! let v = svd_result.v();
//! assert!((*u * *s * v.transpose()).abs_diff_eq(matrix, 1e-12));
//! ```
//!
//! # References
//!
//! * Golub and Van Loan, "Matrix Computations", 4th ed., §8.5 (Jacobi methods)
//!   and §5.1.8 (Givens rotations).

use glam::{DMat3, DVec3};

use crate::rigid::{array_to_dmat3, dmat3_to_array};

/// Off-diagonal mass, relative to the Frobenius norm, below which Jacobi stops.
const JACOBI_TOLERANCE: f64 = 1e-30;
const MAX_SWEEPS: usize = 16;
/// Pairs below this magnitude are treated as already eliminated.
const GIVENS_EPSILON: f64 = 1e-300;

/// Rotation parameters of a single plane rotation.
#[derive(Debug, Clone, Copy)]
struct Givens {
    cos_theta: f64,
    sin_theta: f64,
}

impl Givens {
    const IDENTITY: Self = Self {
        cos_theta: 1.0,
        sin_theta: 0.0,
    };
}

#[derive(Debug)]
/// Helper struct to store 2 Matrices to avoid OUT parameters on functions
struct QR3 {
    /// The orthogonal matrix Q from the QR decomposition.
    q: DMat3,

    /// The upper triangular matrix R from the QR decomposition.
    r: DMat3,
}

/// Result of [`svd3`]: `a = u * s * v.transpose()`.
#[derive(Debug, Clone, Copy)]
pub struct SVD3Set {
    /// The matrix of left singular vectors.
    u: DMat3,

    /// The diagonal matrix of singular values.
    s: DMat3,

    /// The matrix of right singular vectors.
    v: DMat3,
}

impl SVD3Set {
    /// Get the left singular vectors matrix.
    #[inline]
    pub fn u(&self) -> &DMat3 {
        &self.u
    }

    /// Get the diagonal matrix of singular values.
    #[inline]
    pub fn s(&self) -> &DMat3 {
        &self.s
    }

    /// Get the right singular vectors matrix.
    #[inline]
    pub fn v(&self) -> &DMat3 {
        &self.v
    }

    /// Singular values in decreasing order.
    #[inline]
    pub fn singular_values(&self) -> DVec3 {
        DVec3::new(self.s.x_axis.x, self.s.y_axis.y, self.s.z_axis.z)
    }
}

/// Classic symmetric Schur rotation that annihilates `s[p][q]`.
fn symmetric_schur(s_pp: f64, s_qq: f64, s_pq: f64) -> Givens {
    if s_pq.abs() < GIVENS_EPSILON {
        return Givens::IDENTITY;
    }
    let theta = (s_qq - s_pp) / (2.0 * s_pq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let cos_theta = 1.0 / (t * t + 1.0).sqrt();
    Givens {
        cos_theta,
        sin_theta: t * cos_theta,
    }
}

/// Eigenvectors of the symmetric matrix `s`, returned as the columns of V.
fn jacobi_eigenanalysis(mut s: [[f64; 3]; 3]) -> DMat3 {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    let frobenius_sq = s.iter().flatten().map(|x| x * x).sum::<f64>();

    for _ in 0..MAX_SWEEPS {
        let off_diag_sq = s[0][1] * s[0][1] + s[0][2] * s[0][2] + s[1][2] * s[1][2];
        if off_diag_sq <= JACOBI_TOLERANCE * frobenius_sq {
            break;
        }

        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let g = symmetric_schur(s[p][p], s[q][q], s[p][q]);
            let (c, sn) = (g.cos_theta, g.sin_theta);
            if sn == 0.0 {
                continue;
            }

            // S' = Jᵀ S J with J the rotation in the (p, q) plane
            for k in 0..3 {
                let s_kp = s[k][p];
                let s_kq = s[k][q];
                s[k][p] = c * s_kp - sn * s_kq;
                s[k][q] = sn * s_kp + c * s_kq;
            }
            for k in 0..3 {
                let s_pk = s[p][k];
                let s_qk = s[q][k];
                s[p][k] = c * s_pk - sn * s_qk;
                s[q][k] = sn * s_pk + c * s_qk;
            }
            s[p][q] = 0.0;
            s[q][p] = 0.0;

            // V' = V J
            for row in v.iter_mut() {
                let v_p = row[p];
                let v_q = row[q];
                row[p] = c * v_p - sn * v_q;
                row[q] = sn * v_p + c * v_q;
            }
        }
    }

    array_to_dmat3(&v)
}

/// Swap two columns and negate one of them, keeping the determinant sign.
#[inline]
fn swap_negate(x: &mut DVec3, y: &mut DVec3) {
    std::mem::swap(x, y);
    *y = -*y;
}

/// Sorts the singular values in descending order and adjusts the corresponding singular vectors accordingly
pub fn sort_singular_values(b: &mut DMat3, v: &mut DMat3) {
    let mut rho1 = b.x_axis.length_squared();
    let mut rho2 = b.y_axis.length_squared();
    let mut rho3 = b.z_axis.length_squared();

    if rho1 < rho2 {
        std::mem::swap(&mut rho1, &mut rho2);
        swap_negate(&mut b.x_axis, &mut b.y_axis);
        swap_negate(&mut v.x_axis, &mut v.y_axis);
    }

    if rho1 < rho3 {
        std::mem::swap(&mut rho1, &mut rho3);
        swap_negate(&mut b.x_axis, &mut b.z_axis);
        swap_negate(&mut v.x_axis, &mut v.z_axis);
    }

    if rho2 < rho3 {
        swap_negate(&mut b.y_axis, &mut b.z_axis);
        swap_negate(&mut v.y_axis, &mut v.z_axis);
    }
}

/// Rotation that maps `(a, b)` onto `(r, 0)`.
#[inline]
fn qr_givens(a: f64, b: f64) -> Givens {
    let rho = a.hypot(b);
    if rho < GIVENS_EPSILON {
        return Givens::IDENTITY;
    }
    Givens {
        cos_theta: a / rho,
        sin_theta: b / rho,
    }
}

/// Implements a QR decomposition of a Matrix using Givens rotations
fn qr_decomposition(b_mat: &DMat3) -> QR3 {
    let mut r = dmat3_to_array(b_mat);
    let mut q = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    // zero out r[1][0], then r[2][0], then r[2][1]
    for (i, j, col) in [(0, 1, 0), (0, 2, 0), (1, 2, 1)] {
        let g = qr_givens(r[i][col], r[j][col]);
        let (c, s) = (g.cos_theta, g.sin_theta);

        // R' = G R (rows i and j)
        for k in 0..3 {
            let r_ik = r[i][k];
            let r_jk = r[j][k];
            r[i][k] = c * r_ik + s * r_jk;
            r[j][k] = -s * r_ik + c * r_jk;
        }
        r[j][col] = 0.0;

        // Q' = Q Gᵀ (columns i and j)
        for row in q.iter_mut() {
            let q_i = row[i];
            let q_j = row[j];
            row[i] = c * q_i + s * q_j;
            row[j] = -s * q_i + c * q_j;
        }
    }

    QR3 {
        q: array_to_dmat3(&q),
        r: array_to_dmat3(&r),
    }
}

/// Singular value decomposition of a 3x3 matrix.
///
/// Singular values are non-negative and sorted in decreasing order; `u` and
/// `v` are orthogonal but their determinants are not normalised.
pub fn svd3(a: &DMat3) -> SVD3Set {
    // Compute the eigenvectors of A^T * A, which is V in SVD (right singular vectors)
    let ata = a.transpose() * *a;
    let mut v = jacobi_eigenanalysis(dmat3_to_array(&ata));

    // Compute B = A * V
    let mut b = *a * v;

    sort_singular_values(&mut b, &mut v);

    // B has orthogonal columns, so R of its QR factorization is diagonal
    let qr = qr_decomposition(&b);
    let mut u = qr.q;
    let r = qr.r;

    let mut sigma = DVec3::new(r.x_axis.x, r.y_axis.y, r.z_axis.z);
    if sigma.x < 0.0 {
        u.x_axis = -u.x_axis;
        sigma.x = -sigma.x;
    }
    if sigma.y < 0.0 {
        u.y_axis = -u.y_axis;
        sigma.y = -sigma.y;
    }
    if sigma.z < 0.0 {
        u.z_axis = -u.z_axis;
        sigma.z = -sigma.z;
    }

    SVD3Set {
        u,
        s: DMat3::from_diagonal(sigma),
        v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    /// Helper function to validate all critical SVD properties
    fn verify_svd_properties(a: &DMat3, svd: &SVD3Set) {
        let u = svd.u;
        let s = svd.s;
        let v = svd.v;

        let reconstruction = u * s * v.transpose();
        assert!(
            a.abs_diff_eq(reconstruction, EPSILON),
            "Reconstruction failed: A != U*S*V.T\nA:\n{}\nReconstruction:\n{}",
            a,
            reconstruction
        );

        let u_t_u = u.transpose() * u;
        assert!(
            DMat3::IDENTITY.abs_diff_eq(u_t_u, EPSILON),
            "U is not orthogonal: U.T*U != I\nU.T*U:\n{}",
            u_t_u
        );

        let v_t_v = v.transpose() * v;
        assert!(
            DMat3::IDENTITY.abs_diff_eq(v_t_v, EPSILON),
            "V is not orthogonal: V.T*V != I\nV.T*V:\n{}",
            v_t_v
        );

        let s_diag = svd.singular_values();
        assert!(
            DMat3::from_diagonal(s_diag).abs_diff_eq(s, 0.0),
            "S is not diagonal:\n{}",
            s
        );
        assert!(
            s_diag.x >= 0.0 && s_diag.y >= 0.0 && s_diag.z >= 0.0,
            "Singular values are not non-negative: {:?}",
            s_diag
        );
        assert!(
            s_diag.x >= s_diag.y - EPSILON && s_diag.y >= s_diag.z - EPSILON,
            "Singular values are not sorted: {:?}",
            s_diag
        );
    }

    #[test]
    fn test_svd3_diagonal_sorted() {
        let a = DMat3::from_diagonal(DVec3::new(3.0, 2.0, 1.0));
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result
            .singular_values()
            .abs_diff_eq(DVec3::new(3.0, 2.0, 1.0), EPSILON));
    }

    #[test]
    fn test_svd3_zero() {
        let a = DMat3::ZERO;
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result.s.abs_diff_eq(DMat3::ZERO, EPSILON));
    }

    #[test]
    fn test_svd3_identity() {
        let a = DMat3::IDENTITY;
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result.s.abs_diff_eq(DMat3::IDENTITY, EPSILON));
    }

    #[test]
    fn test_svd3_singular_rank1() {
        let a = DMat3 {
            x_axis: DVec3::new(1.0, 2.0, 3.0),
            y_axis: DVec3::new(2.0, 4.0, 6.0),
            z_axis: DVec3::new(3.0, 6.0, 9.0),
        };
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);

        let s_diag = svd_result.singular_values();
        assert!(s_diag.x > EPSILON);
        assert!(s_diag.y.abs() < EPSILON);
        assert!(s_diag.z.abs() < EPSILON);
    }

    #[test]
    fn test_svd3_diagonal_unsorted() {
        let a = DMat3::from_diagonal(DVec3::new(2.0, 3.0, 1.0));
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result
            .singular_values()
            .abs_diff_eq(DVec3::new(3.0, 2.0, 1.0), EPSILON));
    }

    #[test]
    fn test_svd3_rotation_matrix() {
        let a = DMat3::from_rotation_y(std::f64::consts::FRAC_PI_4);
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result.singular_values().abs_diff_eq(DVec3::ONE, EPSILON));
    }

    #[test]
    fn test_svd3_reflection_matrix() {
        let a = DMat3::from_diagonal(DVec3::new(1.0, -1.0, 1.0));
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result.singular_values().abs_diff_eq(DVec3::ONE, EPSILON));
    }

    #[test]
    fn test_svd3_general_full_rank() {
        let a = DMat3::from_cols(
            DVec3::new(1.0, 4.0, 7.0),
            DVec3::new(2.0, 5.0, 8.0),
            DVec3::new(3.0, 6.0, 10.0),
        );
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);
        assert!(svd_result.singular_values().min_element() > EPSILON);
    }

    #[test]
    fn test_svd3_singular_rank2() {
        let a = DMat3::from_cols(
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(4.0, 5.0, 6.0),
            DVec3::new(5.0, 7.0, 9.0), // c0 + c1
        );
        let svd_result = svd3(&a);
        verify_svd_properties(&a, &svd_result);

        let s_diag = svd_result.singular_values();
        assert!(s_diag.x > EPSILON);
        assert!(s_diag.y > EPSILON);
        assert!(s_diag.z.abs() < 1e-7);
    }

    #[test]
    fn test_svd3_random_matrices() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let cols: [f64; 9] = std::array::from_fn(|_| rng.random_range(-10.0..10.0));
            let a = DMat3::from_cols_array(&cols);
            verify_svd_properties(&a, &svd3(&a));
        }
    }
}
