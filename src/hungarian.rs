use num_traits::{PrimInt, Signed};

/// Return type of the hungarian algorithm. Represents a mapping of rows to columns (i.e. students to topic slots)
/// by storing the matched column index for each row.
pub type Matching = ndarray::Array1<usize>;

/// Type to use as edge weights in the adjacency matrix.
///
/// Preference values are small (typically 1 -- 3), but excluded pairings are marked with a large negative weight,
/// which must still be summed up over all rows of the matrix without overflow. See `weights::exclusion_weight()`.
pub type EdgeWeight = i64;

/// Find a perfect matching of rows to columns with maximum total edge weight (Kuhn-Munkres, O(n^2 m)).
///
/// The matrix must have at most as many rows as columns; every row is matched to a distinct column. Returns the
/// matching and its total weight.
///
/// Internally, the weights are transformed into non-negative costs `max_weight - weight`, which are minimized using
/// row and column potentials and shortest augmenting paths.
pub fn hungarian_algorithm<W>(adjacency_matrix: &ndarray::Array2<W>) -> (Matching, W)
where
    W: PrimInt + Signed,
{
    let (n, m) = adjacency_matrix.dim();
    assert!(n <= m, "Cannot match {} rows into {} columns", n, m);
    if n == 0 {
        return (Matching::zeros([0]), W::zero());
    }

    let max_weight = adjacency_matrix
        .iter()
        .copied()
        .fold(W::min_value(), |acc, w| acc.max(w));
    let cost = |i: usize, j: usize| max_weight - adjacency_matrix[[i, j]];
    let infinity = W::max_value();

    // Rows and columns are 1-based in the following. Column 0 is a virtual column, the augmenting path starts from.
    let mut u = vec![W::zero(); n + 1];
    let mut v = vec![W::zero(); m + 1];
    // Row matched to each column (0 = unmatched)
    let mut p = vec![0usize; m + 1];
    // Predecessor column of each column on the current shortest path
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut min_v = vec![infinity; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = infinity;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] = u[p[j]] + delta;
                    v[j] = v[j] - delta;
                } else {
                    min_v[j] = min_v[j] - delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut matching = Matching::zeros([n]);
    for j in 1..=m {
        if p[j] != 0 {
            matching[p[j] - 1] = j - 1;
        }
    }
    let score = matching
        .iter()
        .enumerate()
        .fold(W::zero(), |acc, (i, j)| acc + adjacency_matrix[[i, *j]]);
    (matching, score)
}
