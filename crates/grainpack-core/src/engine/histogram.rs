/// A dense 2-D histogram stored row-major in one flat buffer.
///
/// One-dimensional distributions use a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    rows: usize,
    cols: usize,
    bins: Vec<f64>,
}

impl Histogram {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            bins: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.bins[row * self.cols + col]
    }

    #[inline]
    pub fn add(&mut self, row: usize, col: usize, amount: f64) {
        self.bins[row * self.cols + col] += amount;
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[f64] {
        &self.bins
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Scales the histogram to sum 1. An empty histogram stays all zero.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total > 0.0 {
            self.bins.iter_mut().for_each(|b| *b /= total);
        } else {
            self.bins.iter_mut().for_each(|b| *b = 0.0);
        }
    }

    /// Divides every row by its element count; rows with no elements become zero.
    pub fn normalize_rows(&mut self, counts: &[usize]) {
        for (row, chunk) in self.bins.chunks_mut(self.cols.max(1)).enumerate() {
            let count = counts.get(row).copied().unwrap_or(0);
            for bin in chunk {
                *bin = if count == 0 { 0.0 } else { *bin / count as f64 };
            }
        }
    }
}

/// Bhattacharyya coefficient Σ √(pᵢ·qᵢ) of two histograms of the same shape.
///
/// For normalized inputs the result lies in [0, 1] and is 1 for identical distributions.
pub fn similarity(simulated: &Histogram, target: &Histogram) -> f64 {
    debug_assert_eq!((simulated.rows, simulated.cols), (target.rows, target.cols));
    simulated
        .bins
        .iter()
        .zip(&target.bins)
        .map(|(p, q)| (p * q).max(0.0).sqrt())
        .sum()
}
