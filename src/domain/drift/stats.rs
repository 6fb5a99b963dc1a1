//! Two-sample distribution tests
//!
//! Chi-square tail probabilities come from `statrs`. The Kolmogorov
//! distribution has no `statrs` counterpart, so KS uses the asymptotic
//! series with Stephens' small-sample correction.

use std::collections::BTreeMap;

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Kolmogorov-Smirnov statistic and asymptotic p-value
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> (f64, f64) {
    let mut a = reference.to_vec();
    let mut b = current.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n, m) = (a.len(), b.len());
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;

    while i < n && j < m {
        let x = a[i].min(b[j]);
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n as f64 - j as f64 / m as f64).abs());
    }

    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    let p = kolmogorov_q((en + 0.12 + 0.11 / en) * d);
    (d, p)
}

/// Survival function of the Kolmogorov distribution
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }

    let mut sum = 0.0;
    let mut sign = 1.0;
    let mut prev_term = 0.0;

    for k in 1..=100 {
        let kf = k as f64;
        let term = sign * 2.0 * (-2.0 * kf * kf * lambda * lambda).exp();
        sum += term;
        if term.abs() <= 1e-10 * prev_term || term.abs() <= 1e-12 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        prev_term = term.abs();
    }

    1.0
}

fn counts<'a>(values: &'a [String]) -> BTreeMap<&'a str, f64> {
    let mut map = BTreeMap::new();
    for v in values {
        *map.entry(v.as_str()).or_insert(0.0) += 1.0;
    }
    map
}

fn union_keys<'a>(a: &BTreeMap<&'a str, f64>, b: &BTreeMap<&'a str, f64>) -> Vec<&'a str> {
    let mut keys: Vec<&str> = a.keys().chain(b.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

/// Pseudo-count added to every category's reference count
const CHI_SQUARE_PSEUDO_COUNT: f64 = 0.5;

/// Pearson chi-square of current counts against reference proportions
///
/// Categories are the union of both samples. Reference proportions are
/// smoothed with a pseudo-count so a category absent from the reference
/// still has a finite expected count. Returns (statistic, p-value).
pub fn chi_square(reference: &[String], current: &[String]) -> (f64, f64) {
    let ref_counts = counts(reference);
    let cur_counts = counts(current);
    let keys = union_keys(&ref_counts, &cur_counts);

    let smoothed_total = reference.len() as f64 + CHI_SQUARE_PSEUDO_COUNT * keys.len() as f64;
    let n_cur = current.len() as f64;

    let mut statistic = 0.0;
    for key in &keys {
        let ref_count = ref_counts.get(key).copied().unwrap_or(0.0);
        let expected = (ref_count + CHI_SQUARE_PSEUDO_COUNT) / smoothed_total * n_cur;
        let observed = cur_counts.get(key).copied().unwrap_or(0.0);
        statistic += (observed - expected).powi(2) / expected;
    }

    let df = keys.len().saturating_sub(1);
    if df == 0 {
        return (statistic, 1.0);
    }
    (statistic, chi_square_sf(statistic, df as f64))
}

/// `P(X >= x)` for a chi-square variable with `df` degrees of freedom
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    ChiSquared::new(df).map_or(1.0, |dist| dist.sf(x))
}

/// First Wasserstein distance between the two empirical distributions
pub fn wasserstein(reference: &[f64], current: &[f64]) -> f64 {
    let mut a = reference.to_vec();
    let mut b = current.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let mut all: Vec<f64> = a.iter().chain(&b).copied().collect();
    all.sort_by(f64::total_cmp);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut distance = 0.0;

    for w in all.windows(2) {
        while i < a.len() && a[i] <= w[0] {
            i += 1;
        }
        while j < b.len() && b[j] <= w[0] {
            j += 1;
        }
        distance += (i as f64 / n - j as f64 / m).abs() * (w[1] - w[0]);
    }

    distance
}

/// Wasserstein distance divided by the reference's population std
pub fn normed_wasserstein(reference: &[f64], current: &[f64]) -> f64 {
    let distance = wasserstein(reference, current);
    let n = reference.len() as f64;
    let mean = reference.iter().sum::<f64>() / n;
    let std = (reference.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();

    if std > 0.0 {
        distance / std
    } else if distance == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

/// Jensen-Shannon distance (natural log) between category proportions
pub fn jensen_shannon(reference: &[String], current: &[String]) -> f64 {
    let ref_counts = counts(reference);
    let cur_counts = counts(current);
    let keys = union_keys(&ref_counts, &cur_counts);
    let (n, m) = (reference.len() as f64, current.len() as f64);

    let kl = |p: f64, q: f64| if p > 0.0 { p * (p / q).ln() } else { 0.0 };

    let mut divergence = 0.0;
    for key in &keys {
        let p = ref_counts.get(key).copied().unwrap_or(0.0) / n;
        let q = cur_counts.get(key).copied().unwrap_or(0.0) / m;
        let mid = (p + q) / 2.0;
        divergence += kl(p, mid) + kl(q, mid);
    }

    (divergence / 2.0).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ks_identical_and_shifted() {
        let a: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (d, p) = ks_two_sample(&a, &a);
        assert_eq!(d, 0.0);
        assert!(p > 0.99);

        let b: Vec<f64> = a.iter().map(|x| x + 1000.0).collect();
        let (d, p) = ks_two_sample(&a, &b);
        assert_eq!(d, 1.0);
        assert!(p < 1e-6);
    }

    #[test]
    fn test_chi_square_sf_known_values() {
        // 95th percentile of chi-square(1) is 3.841
        assert!((chi_square_sf(3.841_458_8, 1.0) - 0.05).abs() < 1e-5);
        // 95th percentile of chi-square(10) is 18.307
        assert!((chi_square_sf(18.307_038, 10.0) - 0.05).abs() < 1e-5);
        assert_eq!(chi_square_sf(0.0, 3.0), 1.0);
    }

    #[test]
    fn test_chi_square_same_proportions() {
        let reference = strings(&["a", "a", "b", "b"]);
        let current = strings(&["a", "b", "a", "b", "a", "b"]);
        let (statistic, p) = chi_square(&reference, &current);
        assert_eq!(statistic, 0.0);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_chi_square_single_unseen_category_is_not_drift() {
        let reference: Vec<String> = (0..200)
            .map(|i| if i % 2 == 0 { "Comedy" } else { "News" }.to_string())
            .collect();
        let mut current: Vec<String> = reference[..199].to_vec();
        current.push("Music".to_string());

        let (statistic, p) = chi_square(&reference, &current);
        assert!(statistic.is_finite());
        assert!(p > 0.05, "p = {p}");
    }

    #[test]
    fn test_chi_square_unseen_majority_is_drift() {
        let reference = strings(&["a", "b", "a", "b", "a", "b", "a", "b"]);
        let current = strings(&["c", "c", "c", "c", "c", "c", "c", "a"]);
        let (statistic, p) = chi_square(&reference, &current);
        assert!(statistic.is_finite());
        assert!(p < 0.05, "p = {p}");
    }

    #[test]
    fn test_wasserstein_shift() {
        let a = [0.0, 1.0, 2.0, 3.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        assert!((wasserstein(&a, &b) - 5.0).abs() < 1e-12);
        assert_eq!(wasserstein(&a, &a), 0.0);
        assert_eq!(normed_wasserstein(&[1.0, 1.0], &[1.0]), 0.0);
        assert!(normed_wasserstein(&[1.0, 1.0], &[2.0]).is_infinite());
    }

    #[test]
    fn test_jensen_shannon_bounds() {
        let a = strings(&["x", "y"]);
        assert_eq!(jensen_shannon(&a, &a), 0.0);

        let b = strings(&["z"]);
        let disjoint = jensen_shannon(&a, &b);
        assert!((disjoint - std::f64::consts::LN_2.sqrt()).abs() < 1e-12);
    }
}
