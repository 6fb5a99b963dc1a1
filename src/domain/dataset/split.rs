use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::record::LabeledRecord;
use crate::domain::DomainError;

/// Training and held-out rows
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<LabeledRecord>,
    pub test: Vec<LabeledRecord>,
}

/// Seeded shuffle split; the test side gets `ceil(n * test_size)` rows
pub fn train_test_split(
    records: Vec<LabeledRecord>,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, DomainError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DomainError::configuration(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = records.len();
    let n_test = (n as f64 * test_size).ceil() as usize;

    if n_test == 0 || n_test >= n {
        return Err(DomainError::validation(format!(
            "Cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut slots: Vec<Option<LabeledRecord>> = records.into_iter().map(Some).collect();
    let mut take = |idx: &usize| slots[*idx].take();

    let test: Vec<LabeledRecord> = order[..n_test].iter().filter_map(&mut take).collect();
    let train: Vec<LabeledRecord> = order[n_test..].iter().filter_map(&mut take).collect();

    Ok(TrainTestSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RawRecord;
    use crate::domain::ErrorKind;

    fn rows(n: usize) -> Vec<LabeledRecord> {
        (0..n)
            .map(|i| {
                let record = RawRecord::builder()
                    .podcast_name(format!("Show {}", i))
                    .episode_length_minutes(i as f64)
                    .genre("News")
                    .publication_day("Monday")
                    .publication_time("Night")
                    .build()
                    .unwrap();
                LabeledRecord::new(record, i as f64).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let split = train_test_split(rows(10), 0.3, 42).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 7);

        let mut all: Vec<f64> = split
            .train
            .iter()
            .chain(&split.test)
            .map(|r| r.listening_time_minutes)
            .collect();
        all.sort_by(f64::total_cmp);
        assert_eq!(all, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let a = train_test_split(rows(20), 0.3, 42).unwrap();
        let b = train_test_split(rows(20), 0.3, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_split() {
        assert_eq!(
            train_test_split(rows(10), 1.5, 42).unwrap_err().kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            train_test_split(rows(1), 0.3, 42).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
