//! Stratified train/test split with a fixed seed

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{OffenseError, Result};

/// Row indices for each partition, in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows so both partitions keep the class proportions of `targets`.
///
/// The test partition gets `ceil(test_fraction * n)` rows, shared between
/// the classes by largest remainder. Every class needs at least two rows so
/// it can appear on both sides.
pub fn stratified_split(targets: &[u8], test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(OffenseError::Configuration(format!(
            "test fraction must be between 0 and 1, got {}",
            test_fraction
        )));
    }

    let mut classes: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (i, &target) in targets.iter().enumerate() {
        match target {
            0 | 1 => classes[target as usize].push(i),
            other => {
                return Err(OffenseError::Parse(format!(
                    "target must be 0 or 1, got {} in row {}",
                    other, i
                )))
            }
        }
    }
    for (class, rows) in classes.iter().enumerate() {
        if rows.len() < 2 {
            return Err(OffenseError::InsufficientData(format!(
                "class {} has {} examples; need at least 2 in each class to stratify",
                class,
                rows.len()
            )));
        }
    }

    let n = targets.len();
    let n_test = ((test_fraction * n as f64).ceil() as usize).clamp(2, n - 2);

    // Largest-remainder share of the test rows per class
    let exact: Vec<f64> = classes
        .iter()
        .map(|rows| rows.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut test_counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut leftover = n_test - test_counts.iter().sum::<usize>();
    let mut by_remainder: Vec<usize> = (0..classes.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });
    for &class in by_remainder.iter().cycle() {
        if leftover == 0 {
            break;
        }
        test_counts[class] += 1;
        leftover -= 1;
    }
    for (count, rows) in test_counts.iter_mut().zip(classes.iter()) {
        *count = (*count).clamp(1, rows.len() - 1);
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n);
    let mut test = Vec::with_capacity(n_test);
    for (rows, &count) in classes.iter_mut().zip(test_counts.iter()) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..count]);
        train.extend_from_slice(&rows[count..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    log::info!(
        "Split {} rows: train={}, test={}",
        n,
        train.len(),
        test.len()
    );
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(targets: &[u8], rows: &[usize], class: u8) -> usize {
        rows.iter().filter(|&&i| targets[i] == class).count()
    }

    #[test]
    fn test_split_is_stratified() {
        let targets: Vec<u8> = (0..20).map(|i| if i < 12 { 1 } else { 0 }).collect();
        let split = stratified_split(&targets, 0.25, 42).unwrap();

        assert_eq!(split.test.len(), 5);
        assert_eq!(split.train.len(), 15);
        assert_eq!(count(&targets, &split.test, 1), 3);
        assert_eq!(count(&targets, &split.test, 0), 2);
    }

    #[test]
    fn test_partitions_cover_all_rows() {
        let targets = vec![1, 0, 1, 0, 1, 1, 0, 0, 1];
        let split = stratified_split(&targets, 0.25, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..targets.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let targets: Vec<u8> = (0..30).map(|i| (i % 3 == 0) as u8).collect();
        let first = stratified_split(&targets, 0.25, 42).unwrap();
        let second = stratified_split(&targets, 0.25, 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_two_per_class_minimum() {
        let targets = vec![1, 1, 0, 0];
        let split = stratified_split(&targets, 0.25, 42).unwrap();
        assert_eq!(count(&targets, &split.test, 1), 1);
        assert_eq!(count(&targets, &split.test, 0), 1);
        assert_eq!(count(&targets, &split.train, 1), 1);
        assert_eq!(count(&targets, &split.train, 0), 1);
    }

    #[test]
    fn test_too_few_in_a_class() {
        let targets = vec![1, 1, 1, 0];
        assert!(matches!(
            stratified_split(&targets, 0.25, 42),
            Err(OffenseError::InsufficientData(_))
        ));
        assert!(matches!(
            stratified_split(&[1, 1, 1], 0.25, 42),
            Err(OffenseError::InsufficientData(_))
        ));
    }
}
