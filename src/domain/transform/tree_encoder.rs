//! Supervised categorical encoding through a shallow regression tree
//!
//! Categories are first given ordinal codes in order of first appearance. A
//! one-feature regression tree is then fit on those codes against the target
//! and each category is replaced by the mean target of the leaf it falls in.
//! The tree depth is chosen by k-fold cross-validation.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::search::KFold;
use crate::domain::DomainError;

/// Tuning for [`DecisionTreeEncoder::fit`]
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEncoderConfig {
    /// Candidate tree depths, tried in order
    pub depth_grid: Vec<usize>,
    /// Folds used to pick the depth
    pub cv_folds: usize,
    /// Decimal places kept in the encoded values
    pub precision: u32,
}

impl Default for TreeEncoderConfig {
    fn default() -> Self {
        Self {
            depth_grid: vec![1, 2, 3, 4],
            cv_folds: 3,
            precision: 3,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, code: f64) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                threshold,
                left,
                right,
            } => {
                if code <= *threshold {
                    left.predict(code)
                } else {
                    right.predict(code)
                }
            }
        }
    }
}

/// Target statistics for one ordinal code
#[derive(Debug, Clone, Copy, Default)]
struct CodeStats {
    code: usize,
    count: f64,
    sum: f64,
    sum_sq: f64,
}

impl CodeStats {
    fn sse(count: f64, sum: f64, sum_sq: f64) -> f64 {
        if count == 0.0 {
            return 0.0;
        }
        (sum_sq - sum * sum / count).max(0.0)
    }
}

fn aggregate(codes: &[usize], target: &[f64], rows: &[usize], n_codes: usize) -> Vec<CodeStats> {
    let mut stats: Vec<CodeStats> = (0..n_codes)
        .map(|code| CodeStats {
            code,
            ..CodeStats::default()
        })
        .collect();

    for &row in rows {
        let s = &mut stats[codes[row]];
        s.count += 1.0;
        s.sum += target[row];
        s.sum_sq += target[row] * target[row];
    }

    stats.retain(|s| s.count > 0.0);
    stats
}

fn build(stats: &[CodeStats], depth: usize, max_depth: usize) -> Node {
    let count: f64 = stats.iter().map(|s| s.count).sum();
    let sum: f64 = stats.iter().map(|s| s.sum).sum();
    let sum_sq: f64 = stats.iter().map(|s| s.sum_sq).sum();
    let leaf = Node::Leaf(sum / count);

    if depth >= max_depth || stats.len() < 2 || count < 2.0 {
        return leaf;
    }

    let parent_sse = CodeStats::sse(count, sum, sum_sq);
    if parent_sse <= f64::EPSILON {
        return leaf;
    }

    let mut best: Option<(usize, f64)> = None;
    let (mut lc, mut ls, mut lsq) = (0.0, 0.0, 0.0);

    for i in 1..stats.len() {
        let s = &stats[i - 1];
        lc += s.count;
        ls += s.sum;
        lsq += s.sum_sq;

        let split_sse =
            CodeStats::sse(lc, ls, lsq) + CodeStats::sse(count - lc, sum - ls, sum_sq - lsq);

        if best.is_none_or(|(_, b)| split_sse < b) {
            best = Some((i, split_sse));
        }
    }

    match best {
        Some((i, split_sse)) if split_sse < parent_sse => {
            let threshold = (stats[i - 1].code as f64 + stats[i].code as f64) / 2.0;
            Node::Split {
                threshold,
                left: Box::new(build(&stats[..i], depth + 1, max_depth)),
                right: Box::new(build(&stats[i..], depth + 1, max_depth)),
            }
        }
        _ => leaf,
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Fitted encoder for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeEncoder {
    column: String,
    max_depth: usize,
    mapping: BTreeMap<String, f64>,
    fallback: f64,
}

impl DecisionTreeEncoder {
    pub fn fit(
        column: &str,
        values: &[String],
        target: &[f64],
        config: &TreeEncoderConfig,
    ) -> Result<Self, DomainError> {
        if values.is_empty() {
            return Err(DomainError::validation(format!(
                "Cannot encode empty column '{}'",
                column
            )));
        }

        if values.len() != target.len() {
            return Err(DomainError::validation(format!(
                "Column '{}' has {} rows but target has {}",
                column,
                values.len(),
                target.len()
            )));
        }

        if config.depth_grid.is_empty() {
            return Err(DomainError::configuration("Encoder depth grid is empty"));
        }

        let mut categories: Vec<&str> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let codes: Vec<usize> = values
            .iter()
            .map(|v| {
                *index.entry(v.as_str()).or_insert_with(|| {
                    categories.push(v.as_str());
                    categories.len() - 1
                })
            })
            .collect();

        let max_depth = select_depth(&codes, target, categories.len(), config)?;
        let all_rows: Vec<usize> = (0..codes.len()).collect();
        let tree = build(&aggregate(&codes, target, &all_rows, categories.len()), 0, max_depth);

        let mapping = categories
            .iter()
            .enumerate()
            .map(|(code, category)| {
                (
                    category.to_string(),
                    round_to(tree.predict(code as f64), config.precision),
                )
            })
            .collect();

        let mean = target.iter().sum::<f64>() / target.len() as f64;

        debug!(
            column = column,
            categories = categories.len(),
            max_depth = max_depth,
            "Fitted decision tree encoder"
        );

        Ok(Self {
            column: column.to_string(),
            max_depth,
            mapping,
            fallback: round_to(mean, config.precision),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    pub fn n_categories(&self) -> usize {
        self.mapping.len()
    }

    /// Encoded value for a category; unseen categories map to the fallback
    pub fn encode(&self, category: &str) -> f64 {
        self.mapping.get(category).copied().unwrap_or(self.fallback)
    }
}

/// Pick the depth with the lowest cross-validated MSE; ties keep the earlier depth
fn select_depth(
    codes: &[usize],
    target: &[f64],
    n_codes: usize,
    config: &TreeEncoderConfig,
) -> Result<usize, DomainError> {
    if codes.len() < config.cv_folds || config.cv_folds < 2 {
        return Ok(config.depth_grid[0]);
    }

    let folds = KFold::new(config.cv_folds)?.split(codes.len())?;
    let mut best: Option<(usize, f64)> = None;

    for &depth in &config.depth_grid {
        let mut total = 0.0;

        for fold in &folds {
            let tree = build(&aggregate(codes, target, &fold.train, n_codes), 0, depth);
            let sse: f64 = fold
                .test
                .iter()
                .map(|&row| (tree.predict(codes[row] as f64) - target[row]).powi(2))
                .sum();
            total += sse / fold.test.len() as f64;
        }

        let mse = total / folds.len() as f64;
        if best.is_none_or(|(_, b)| mse < b) {
            best = Some((depth, mse));
        }
    }

    Ok(best.map(|(depth, _)| depth).unwrap_or(config.depth_grid[0]))
}
