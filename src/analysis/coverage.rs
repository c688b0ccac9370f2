//! Per-algorithm coverage computation from step validations.

use std::collections::{HashMap, HashSet};

use crate::analysis::matcher::MatchResult;
use crate::analysis::steps::{flatten_steps, AlgorithmStep};
use crate::analysis::StepValidation;

/// Coverage of a spec algorithm in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageResult {
    /// The algorithm's anchor name.
    pub anchor: String,
    /// Total steps in the canonical algorithm.
    pub total_steps: usize,
    /// Step numbers found in code, EXACT/FUZZY/MISMATCH each counted once.
    pub implemented: Vec<Vec<u32>>,
    /// Step numbers in the canonical algorithm with no implementation.
    pub missing: Vec<Vec<u32>>,
    /// Count of MISMATCH or NOT_FOUND validations.
    pub warnings: usize,
    /// Count of implemented steps that appear out of the algorithm's order.
    pub reordered: usize,
}

impl CoverageResult {
    /// Number of distinct implemented steps.
    #[must_use]
    pub fn implemented_count(&self) -> usize {
        self.implemented.len()
    }

    /// One-line summary for code lens display, e.g.
    /// `"navigate: 3/5 steps | 1 warning | 1 reordered"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{}: {}/{} steps",
            self.anchor,
            self.implemented_count(),
            self.total_steps
        )];
        if self.warnings > 0 {
            let suffix = if self.warnings == 1 { "" } else { "s" };
            parts.push(format!("{} warning{suffix}", self.warnings));
        }
        if self.reordered > 0 {
            parts.push(format!("{} reordered", self.reordered));
        }
        parts.join(" | ")
    }
}

/// Length of the longest strictly increasing subsequence, via patience
/// sorting (O(n log n)): each value replaces the first tail `>= value`
/// (lower-bound), so equal values never extend the run.
fn longest_increasing_subsequence_length(seq: &[usize]) -> usize {
    let mut tails: Vec<usize> = Vec::new();
    for &val in seq {
        match tails.binary_search(&val) {
            Ok(pos) | Err(pos) => {
                if pos == tails.len() {
                    tails.push(val);
                } else if let Some(slot) = tails.get_mut(pos) {
                    *slot = val;
                }
            }
        }
    }
    tails.len()
}

/// Compute coverage of an algorithm from the step validations in its scope.
#[must_use]
pub fn compute_coverage(
    validations: &[StepValidation],
    algo_steps: &[AlgorithmStep],
    anchor: &str,
) -> CoverageResult {
    let flat = flatten_steps(algo_steps);
    let total = flat.len();

    let mut step_to_idx: HashMap<Vec<u32>, usize> = HashMap::new();
    for (i, s) in flat.iter().enumerate() {
        step_to_idx.insert(s.number.clone(), i);
    }

    let mut implemented: Vec<Vec<u32>> = Vec::new();
    let mut implemented_set: HashSet<Vec<u32>> = HashSet::new();
    let mut spec_order_indices: Vec<usize> = Vec::new();
    let mut warnings = 0usize;

    for v in validations {
        let key = v.step.number.clone();
        match v.result {
            MatchResult::Exact | MatchResult::Fuzzy => {
                if implemented_set.insert(key.clone()) {
                    implemented.push(v.step.number.clone());
                    if let Some(&idx) = step_to_idx.get(&key) {
                        spec_order_indices.push(idx);
                    }
                }
            }
            MatchResult::Mismatch => {
                if implemented_set.insert(key.clone()) {
                    implemented.push(v.step.number.clone());
                    if let Some(&idx) = step_to_idx.get(&key) {
                        spec_order_indices.push(idx);
                    }
                }
                warnings += 1;
            }
            MatchResult::NotFound => {
                warnings += 1;
            }
        }
    }

    let missing: Vec<Vec<u32>> = flat
        .iter()
        .filter(|s| !implemented_set.contains(&s.number))
        .map(|s| s.number.clone())
        .collect();

    let lis_len = longest_increasing_subsequence_length(&spec_order_indices);
    let reordered = spec_order_indices.len() - lis_len;

    CoverageResult {
        anchor: anchor.to_string(),
        total_steps: total,
        implemented,
        missing,
        warnings,
        reordered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scanner::StepComment;

    fn step_comment(number: Vec<u32>) -> StepComment {
        StepComment {
            line: 0,
            col_start: 0,
            col_end: 0,
            number,
            text: String::new(),
            end_line: None,
        }
    }

    fn validation(number: Vec<u32>, result: MatchResult) -> StepValidation {
        StepValidation {
            step: step_comment(number),
            result,
            spec_text: String::new(),
            algo_name: "navigate".to_string(),
        }
    }

    fn flat_algo(count: usize) -> Vec<AlgorithmStep> {
        (1..=count)
            .map(|i| AlgorithmStep {
                number: vec![u32::try_from(i).unwrap_or(u32::MAX)],
                text: format!("Step {i}"),
                children: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn missing_and_implemented_partition_all_steps() {
        let algo = flat_algo(5);
        let validations = vec![
            validation(vec![1], MatchResult::Exact),
            validation(vec![3], MatchResult::Fuzzy),
        ];
        let cov = compute_coverage(&validations, &algo, "navigate");
        assert_eq!(cov.total_steps, 5);
        assert_eq!(cov.implemented_count(), 2);
        assert_eq!(cov.missing.len(), 3);
        assert_eq!(cov.missing, vec![vec![2], vec![4], vec![5]]);
    }

    #[test]
    fn duplicate_step_counted_once() {
        let algo = flat_algo(3);
        let validations = vec![
            validation(vec![1], MatchResult::Exact),
            validation(vec![1], MatchResult::Exact),
        ];
        let cov = compute_coverage(&validations, &algo, "navigate");
        assert_eq!(cov.implemented_count(), 1);
    }

    #[test]
    fn mismatch_counts_as_implemented_with_warning() {
        let algo = flat_algo(2);
        let validations = vec![validation(vec![1], MatchResult::Mismatch)];
        let cov = compute_coverage(&validations, &algo, "navigate");
        assert_eq!(cov.implemented_count(), 1);
        assert_eq!(cov.warnings, 1);
        assert_eq!(cov.missing, vec![vec![2]]);
    }

    #[test]
    fn not_found_is_warning_but_not_implemented() {
        let algo = flat_algo(2);
        let validations = vec![validation(vec![9], MatchResult::NotFound)];
        let cov = compute_coverage(&validations, &algo, "navigate");
        assert_eq!(cov.implemented_count(), 0);
        assert_eq!(cov.warnings, 1);
        assert_eq!(cov.missing.len(), 2);
    }

    #[test]
    fn reordered_detection_via_lis() {
        // Implemented in spec order 2, 0, 1 -> LIS length 2 -> reordered 1.
        let algo = flat_algo(3);
        let validations = vec![
            validation(vec![3], MatchResult::Exact),
            validation(vec![1], MatchResult::Exact),
            validation(vec![2], MatchResult::Exact),
        ];
        let cov = compute_coverage(&validations, &algo, "navigate");
        assert_eq!(cov.reordered, 1);
    }

    #[test]
    fn in_order_implementation_has_no_reordering() {
        let algo = flat_algo(3);
        let validations = vec![
            validation(vec![1], MatchResult::Exact),
            validation(vec![2], MatchResult::Exact),
            validation(vec![3], MatchResult::Exact),
        ];
        let cov = compute_coverage(&validations, &algo, "navigate");
        assert_eq!(cov.reordered, 0);
    }

    #[test]
    fn summary_formats_singular_and_plural_warnings() {
        let algo = flat_algo(2);
        let one_warning = compute_coverage(
            &[validation(vec![9], MatchResult::NotFound)],
            &algo,
            "navigate",
        );
        assert_eq!(one_warning.summary(), "navigate: 0/2 steps | 1 warning");

        let two_warnings = compute_coverage(
            &[
                validation(vec![8], MatchResult::NotFound),
                validation(vec![9], MatchResult::NotFound),
            ],
            &algo,
            "navigate",
        );
        assert_eq!(two_warnings.summary(), "navigate: 0/2 steps | 2 warnings");
    }

    #[test]
    fn summary_omits_zero_counts() {
        let algo = flat_algo(1);
        let cov = compute_coverage(&[validation(vec![1], MatchResult::Exact)], &algo, "navigate");
        assert_eq!(cov.summary(), "navigate: 1/1 steps");
    }
}
