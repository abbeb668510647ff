//! Minimum-cost one-to-one assignment on a rectangular cost matrix.

/// Row-major cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Build an `rows x cols` matrix with `cost(i, j)` at each cell.
    pub(crate) fn from_fn(rows: usize, cols: usize, cost: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(cost(i, j));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub(crate) fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    fn transposed(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }
}

/// Solve the assignment problem, returning matched `(row, col)` pairs.
///
/// Exactly `min(rows, cols)` pairs are returned, ordered by row, and their
/// total cost is minimal. Uses the shortest augmenting path formulation of
/// the Hungarian algorithm with row and column potentials, `O(r^2 c)`.
pub(crate) fn solve(matrix: &CostMatrix) -> Vec<(usize, usize)> {
    if matrix.rows == 0 || matrix.cols == 0 {
        return Vec::new();
    }
    if matrix.rows > matrix.cols {
        let mut pairs: Vec<(usize, usize)> = solve(&matrix.transposed())
            .into_iter()
            .map(|(r, c)| (c, r))
            .collect();
        pairs.sort_unstable();
        return pairs;
    }

    let n = matrix.rows;
    let m = matrix.cols;
    // 1-based potentials; column 0 is a virtual source.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; m + 1];
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        owner[0] = i;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let slack = matrix.get(i0 - 1, j - 1) - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut pairs: Vec<(usize, usize)> = (1..=m)
        .filter(|&j| owner[j] != 0)
        .map(|j| (owner[j] - 1, j - 1))
        .collect();
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(matrix: &CostMatrix, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(r, c)| matrix.get(r, c)).sum()
    }

    #[test]
    fn square_textbook_case() {
        let costs = [[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
        let m = CostMatrix::from_fn(3, 3, |i, j| costs[i][j]);
        let pairs = solve(&m);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(total(&m, &pairs), 5.0);
    }

    #[test]
    fn wide_matrix_assigns_every_row() {
        let costs = [[9.0, 1.0, 9.0, 9.0], [1.0, 9.0, 9.0, 9.0]];
        let m = CostMatrix::from_fn(2, 4, |i, j| costs[i][j]);
        let pairs = solve(&m);
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn tall_matrix_assigns_every_column() {
        let costs = [[5.0, 1.0], [1.0, 5.0], [0.5, 0.5]];
        let m = CostMatrix::from_fn(3, 2, |i, j| costs[i][j]);
        let pairs = solve(&m);
        assert_eq!(pairs.len(), 2);
        assert_eq!(total(&m, &pairs), 1.5);
    }

    #[test]
    fn brute_force_agrees_on_small_matrix() {
        let costs = [
            [7.0, 3.0, 6.0, 2.0],
            [1.0, 8.0, 4.0, 9.0],
            [5.0, 2.0, 7.0, 3.0],
            [4.0, 6.0, 1.0, 5.0],
        ];
        let m = CostMatrix::from_fn(4, 4, |i, j| costs[i][j]);
        let mut best = f64::INFINITY;
        let perms = [
            [0, 1, 2, 3], [0, 1, 3, 2], [0, 2, 1, 3], [0, 2, 3, 1], [0, 3, 1, 2], [0, 3, 2, 1],
            [1, 0, 2, 3], [1, 0, 3, 2], [1, 2, 0, 3], [1, 2, 3, 0], [1, 3, 0, 2], [1, 3, 2, 0],
            [2, 0, 1, 3], [2, 0, 3, 1], [2, 1, 0, 3], [2, 1, 3, 0], [2, 3, 0, 1], [2, 3, 1, 0],
            [3, 0, 1, 2], [3, 0, 2, 1], [3, 1, 0, 2], [3, 1, 2, 0], [3, 2, 0, 1], [3, 2, 1, 0],
        ];
        for p in perms {
            best = best.min((0..4).map(|i| costs[i][p[i]]).sum());
        }
        assert_eq!(total(&m, &solve(&m)), best);
    }

    #[test]
    fn empty_matrix() {
        assert!(solve(&CostMatrix::from_fn(0, 3, |_, _| 0.0)).is_empty());
    }
}
