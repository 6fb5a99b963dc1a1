//! Cross-validation splitting

use crate::domain::DomainError;

/// One train/test split of row indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Contiguous, unshuffled k-fold splitter
///
/// The first `n % k` folds hold one extra row, so fold sizes differ by at
/// most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Result<Self, DomainError> {
        if n_splits < 2 {
            return Err(DomainError::configuration(format!(
                "Cross-validation needs at least 2 folds, got {}",
                n_splits
            )));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Split `0..n_samples` into folds
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>, DomainError> {
        self.split_indices(&(0..n_samples).collect::<Vec<_>>())
    }

    /// Split an arbitrary index list into folds, preserving its order
    pub fn split_indices(&self, indices: &[usize]) -> Result<Vec<Fold>, DomainError> {
        let n = indices.len();

        if n < self.n_splits {
            return Err(DomainError::configuration(format!(
                "Cannot split {} samples into {} folds",
                n, self.n_splits
            )));
        }

        let base = n / self.n_splits;
        let extra = n % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for i in 0..self.n_splits {
            let size = base + usize::from(i < extra);
            let end = start + size;

            let test = indices[start..end].to_vec();
            let train = indices[..start]
                .iter()
                .chain(&indices[end..])
                .copied()
                .collect();

            folds.push(Fold { train, test });
            start = end;
        }

        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn test_fold_sizes_and_coverage() {
        let folds = KFold::new(3).unwrap().split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);

        let mut all_test: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 10);
            assert!(fold.test.iter().all(|t| !fold.train.contains(t)));
        }
    }

    #[test]
    fn test_split_indices_preserves_order() {
        let folds = KFold::new(2).unwrap().split_indices(&[9, 4, 7, 1]).unwrap();
        assert_eq!(folds[0].test, vec![9, 4]);
        assert_eq!(folds[0].train, vec![7, 1]);
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert_eq!(KFold::new(1).unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(
            KFold::new(5).unwrap().split(3).unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }
}
