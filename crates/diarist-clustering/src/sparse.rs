//! Compressed sparse row matrices for affinity graphs
//!
//! The affinity graph and its Laplacian are square, symmetric and sparse
//! (each node keeps a handful of neighbors), so they are stored in CSR form
//! rather than as dense arrays. Symmetry and the zero diagonal are checkable
//! structural properties here, and both matrices live only for the duration
//! of one recording.

use ndarray::{Array1, ArrayView1};

/// Square sparse matrix in compressed sparse row form
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    n: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// Build from (row, col, value) triplets, summing duplicates
    ///
    /// Entries that sum to exactly zero are kept; callers that need a pruned
    /// structure should not emit them.
    pub fn from_triplets(n: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut indptr = vec![0usize; n + 1];
        let mut indices = Vec::with_capacity(triplets.len());
        let mut data = Vec::with_capacity(triplets.len());

        let mut prev: Option<(usize, usize)> = None;
        for (row, col, value) in triplets {
            debug_assert!(row < n && col < n);
            if prev == Some((row, col)) {
                let last = data.len() - 1;
                data[last] += value;
                continue;
            }
            indices.push(col);
            data.push(value);
            indptr[row + 1] = indices.len();
            prev = Some((row, col));
        }

        // Close out rows with no entries
        for row in 0..n {
            indptr[row + 1] = indptr[row + 1].max(indptr[row]);
        }

        Self { n, indptr, indices, data }
    }

    /// Matrix dimension (the matrix is square)
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Entry at (row, col); zero if not stored
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let range = self.indptr[row]..self.indptr[row + 1];
        match self.indices[range.clone()].binary_search(&col) {
            Ok(offset) => self.data[range.start + offset],
            Err(_) => 0.0,
        }
    }

    /// The main diagonal as a dense vector
    pub fn diagonal(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n, |i| self.get(i, i))
    }

    /// Row sums as a dense vector
    pub fn row_sums(&self) -> Array1<f64> {
        let mut sums = Array1::zeros(self.n);
        for row in 0..self.n {
            let mut acc = 0.0;
            for idx in self.indptr[row]..self.indptr[row + 1] {
                acc += self.data[idx];
            }
            sums[row] = acc;
        }
        sums
    }

    /// Sparse matrix-vector product
    pub fn matvec(&self, x: ArrayView1<f64>) -> Array1<f64> {
        debug_assert_eq!(x.len(), self.n);
        let mut y = Array1::zeros(self.n);
        for row in 0..self.n {
            let mut acc = 0.0;
            for idx in self.indptr[row]..self.indptr[row + 1] {
                acc += self.data[idx] * x[self.indices[idx]];
            }
            y[row] = acc;
        }
        y
    }

    /// Check symmetry up to `tol`
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for row in 0..self.n {
            for idx in self.indptr[row]..self.indptr[row + 1] {
                let col = self.indices[idx];
                if (self.data[idx] - self.get(col, row)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Number of connected components of the graph this matrix describes
    ///
    /// Counts over the stored structure (nonzero pattern, off-diagonal),
    /// treating edges as undirected.
    pub fn connected_components(&self) -> usize {
        let mut visited = vec![false; self.n];
        let mut components = 0;
        let mut queue = Vec::new();

        for start in 0..self.n {
            if visited[start] {
                continue;
            }
            components += 1;
            visited[start] = true;
            queue.push(start);
            while let Some(node) = queue.pop() {
                for idx in self.indptr[node]..self.indptr[node + 1] {
                    let next = self.indices[idx];
                    if next != node && self.data[idx] != 0.0 && !visited[next] {
                        visited[next] = true;
                        queue.push(next);
                    }
                }
            }
        }
        components
    }

    /// Graph Laplacian of this affinity matrix
    ///
    /// The diagonal of the affinity is stripped first (no self-loops), then
    /// degrees are taken as the remaining row sums. The normalized variant is
    /// `I - D^{-1/2} A D^{-1/2}` and returns the square-root degrees as the
    /// compensation vector; the combinatorial variant is `D - A` and returns
    /// the degrees themselves. Zero degrees are guarded to 1 so isolated
    /// nodes do not divide by zero. In both variants every row carries an
    /// explicit diagonal entry (1 for normalized, the degree otherwise),
    /// which keeps the smallest eigenvalues away from degeneracies that
    /// destabilize iterative solvers.
    pub fn to_laplacian(&self, normalized: bool) -> (CsrMatrix, Array1<f64>) {
        // Off-diagonal triplets and degrees
        let mut degrees = Array1::<f64>::zeros(self.n);
        let mut off_diag = Vec::with_capacity(self.nnz());
        for row in 0..self.n {
            for idx in self.indptr[row]..self.indptr[row + 1] {
                let col = self.indices[idx];
                if col != row {
                    degrees[row] += self.data[idx];
                    off_diag.push((row, col, self.data[idx]));
                }
            }
        }

        let mut triplets = Vec::with_capacity(off_diag.len() + self.n);
        if normalized {
            let dd = degrees.mapv(|d| if d > 0.0 { d.sqrt() } else { 1.0 });
            for (row, col, w) in off_diag {
                triplets.push((row, col, -w / (dd[row] * dd[col])));
            }
            for row in 0..self.n {
                triplets.push((row, row, 1.0));
            }
            (CsrMatrix::from_triplets(self.n, triplets), dd)
        } else {
            for (row, col, w) in off_diag {
                triplets.push((row, col, -w));
            }
            for row in 0..self.n {
                triplets.push((row, row, degrees[row]));
            }
            (CsrMatrix::from_triplets(self.n, triplets), degrees)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Unweighted path graph 0 - 1 - 2
    fn path3() -> CsrMatrix {
        CsrMatrix::from_triplets(
            3,
            vec![(0, 1, 1.0), (1, 0, 1.0), (1, 2, 1.0), (2, 1, 1.0)],
        )
    }

    #[test]
    fn test_from_triplets_sums_duplicates() {
        let m = CsrMatrix::from_triplets(2, vec![(0, 1, 0.5), (0, 1, 0.5), (1, 0, 1.0)]);
        assert_eq!(m.nnz(), 2);
        assert!((m.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((m.get(1, 0) - 1.0).abs() < 1e-12);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_empty_rows() {
        let m = CsrMatrix::from_triplets(3, vec![(2, 0, 1.0)]);
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.get(1, 2), 0.0);
        assert!((m.get(2, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matvec() {
        let m = path3();
        let y = m.matvec(array![1.0, 2.0, 3.0].view());
        assert_eq!(y, array![2.0, 4.0, 2.0]);
    }

    #[test]
    fn test_row_sums_and_diagonal() {
        let m = path3();
        assert_eq!(m.row_sums(), array![1.0, 2.0, 1.0]);
        assert_eq!(m.diagonal(), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_is_symmetric() {
        assert!(path3().is_symmetric(1e-12));
        let asym = CsrMatrix::from_triplets(2, vec![(0, 1, 1.0)]);
        assert!(!asym.is_symmetric(1e-12));
    }

    #[test]
    fn test_connected_components() {
        assert_eq!(path3().connected_components(), 1);

        // Two disjoint edges: 0-1 and 2-3
        let m = CsrMatrix::from_triplets(
            4,
            vec![(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)],
        );
        assert_eq!(m.connected_components(), 2);

        // Isolated node counts as its own component
        let m = CsrMatrix::from_triplets(3, vec![(0, 1, 1.0), (1, 0, 1.0)]);
        assert_eq!(m.connected_components(), 2);
    }

    #[test]
    fn test_combinatorial_laplacian() {
        let (l, degrees) = path3().to_laplacian(false);
        assert_eq!(degrees, array![1.0, 2.0, 1.0]);
        assert!((l.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((l.get(1, 1) - 2.0).abs() < 1e-12);
        assert!((l.get(0, 1) + 1.0).abs() < 1e-12);
        // Rows of D - A sum to zero
        let ones = Array1::from_elem(3, 1.0);
        let y = l.matvec(ones.view());
        assert!(y.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_normalized_laplacian() {
        let (l, dd) = path3().to_laplacian(true);
        assert!((dd[0] - 1.0).abs() < 1e-12);
        assert!((dd[1] - 2.0f64.sqrt()).abs() < 1e-12);
        // Diagonal forced to 1
        assert!((l.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((l.get(1, 1) - 1.0).abs() < 1e-12);
        // Off-diagonal is -1/sqrt(d_i d_j)
        assert!((l.get(0, 1) + 1.0 / 2.0f64.sqrt()).abs() < 1e-12);
        assert!(l.is_symmetric(1e-12));
    }

    #[test]
    fn test_laplacian_strips_affinity_diagonal() {
        let m = CsrMatrix::from_triplets(
            2,
            vec![(0, 0, 1.0), (1, 1, 1.0), (0, 1, 1.0), (1, 0, 1.0)],
        );
        let (_, degrees) = m.to_laplacian(false);
        // Self-loops do not contribute to degree
        assert_eq!(degrees, array![1.0, 1.0]);
    }

    #[test]
    fn test_laplacian_isolated_node_guard() {
        let m = CsrMatrix::from_triplets(3, vec![(0, 1, 1.0), (1, 0, 1.0)]);
        let (l, dd) = m.to_laplacian(true);
        // Isolated node 2: degree 0 guarded to 1, diagonal still 1
        assert!((dd[2] - 1.0).abs() < 1e-12);
        assert!((l.get(2, 2) - 1.0).abs() < 1e-12);
    }
}
