//! Entropy and information gain over label distributions
//!
//! Label counts are accumulated in a `BTreeMap` so the floating-point sums
//! are evaluated in the same order on every run and platform.

use std::collections::BTreeMap;

use crate::bins::{partition_rows, values_of, Bin, Discretization};
use crate::dataset::{Column, Dataset};
use crate::errors::{Id3Error, Result};

/// Shannon entropy (bits) of the label column. Empty datasets have entropy 0.
pub fn entropy(dataset: &Dataset) -> Result<f64> {
    let labels = dataset.labels()?;
    Ok(label_entropy(labels.iter().map(String::as_str)))
}

/// Shannon entropy (bits) of a label sequence
pub fn label_entropy<'a, I>(labels: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;
    for label in labels {
        *counts.entry(label).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    let sum: f64 = counts
        .values()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();
    sum.max(0.0)
}

/// Information gain of splitting `dataset` on `feature`, with bins computed
/// from the dataset itself.
pub fn info_gain(dataset: &Dataset, feature: &str, options: &Discretization) -> Result<f64> {
    let column = dataset
        .feature(feature)
        .ok_or_else(|| Id3Error::UnknownFeature(feature.to_string()))?;
    let labels = dataset.labels()?;
    if labels.is_empty() {
        return Ok(0.0);
    }
    let bins = values_of(column, options)?;
    let rows: Vec<usize> = (0..labels.len()).collect();
    Ok(gain_over_rows(labels, column, &rows, &bins))
}

/// Information gain of partitioning `rows` by `bins` of `column`.
///
/// Rounding can push the result a hair below zero; it is clamped at 0.
pub fn gain_over_rows(labels: &[String], column: &Column, rows: &[usize], bins: &[Bin]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }

    let parent = label_entropy(rows.iter().map(|&r| labels[r].as_str()));
    let total = rows.len() as f64;
    let mut terms: Vec<f64> = partition_rows(column, rows, bins)
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            let weight = group.len() as f64 / total;
            weight * label_entropy(group.iter().map(|&r| labels[r].as_str()))
        })
        .collect();
    // Sum in value order so equal partitions give bit-identical gains
    // whatever order their bins are listed in.
    terms.sort_by(f64::total_cmp);
    let weighted: f64 = terms.iter().sum();

    (parent - weighted).max(0.0)
}

/// Most frequent label; ties go to the label seen first.
pub fn majority_label<'a, I>(labels: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(feature: Column, labels: &[&str]) -> Dataset {
        Dataset::new(vec![feature, Column::nominal("label", labels.iter().copied())]).unwrap()
    }

    #[test]
    fn test_pure_labels_have_zero_entropy() {
        assert_eq!(label_entropy(["a", "a", "a"]), 0.0);
        assert_eq!(label_entropy(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_uniform_labels_reach_log2_k() {
        assert!((label_entropy(["a", "b"]) - 1.0).abs() < 1e-12);
        assert!((label_entropy(["a", "b", "c", "d"]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_skewed_entropy() {
        // -(3/4 log2 3/4 + 1/4 log2 1/4)
        let expected = 0.811_278_124_459_132_8;
        assert!((label_entropy(["a", "a", "a", "b"]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_dataset_entropy_needs_labels() {
        let unlabeled = Dataset::unlabeled(vec![Column::continuous("x", [1.0])]).unwrap();
        assert!(matches!(entropy(&unlabeled), Err(Id3Error::MissingLabels)));
    }

    #[test]
    fn test_perfect_split_gains_full_entropy() {
        let dataset = labelled(Column::nominal("a", ["x", "y", "x", "y"]), &["0", "1", "0", "1"]);
        let gain = info_gain(&dataset, "a", &Discretization::default()).unwrap();
        assert!((gain - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_irrelevant_feature_gains_nothing() {
        let dataset = labelled(Column::nominal("a", ["x", "x", "y", "y"]), &["0", "1", "0", "1"]);
        let gain = info_gain(&dataset, "a", &Discretization::default()).unwrap();
        assert!(gain.abs() < 1e-12);
    }

    #[test]
    fn test_continuous_gain_uses_bins() {
        let dataset = labelled(
            Column::continuous("x", [0.0, 1.0, 9.0, 10.0]),
            &["lo", "lo", "hi", "hi"],
        );
        let gain = info_gain(&dataset, "x", &Discretization::new(Some(2))).unwrap();
        assert!((gain - 1.0).abs() < 1e-12);

        let err = info_gain(&dataset, "x", &Discretization::new(None)).unwrap_err();
        assert!(matches!(err, Id3Error::Configuration(_)));
    }

    #[test]
    fn test_gain_ignores_bin_order() {
        // Same partition of rows, categories declared in opposite orders.
        for seed in 0..400usize {
            let n = 6 + seed % 29;
            let k = 2 + seed % 4;
            let categories: Vec<String> = (0..k).map(|c| format!("c{c}")).collect();
            let reversed: Vec<String> = categories.iter().rev().cloned().collect();
            let values: Vec<String> = (0..n)
                .map(|i| categories[(i * 7 + seed * 13 + i * i) % k].clone())
                .collect();
            let labels: Vec<String> = (0..n)
                .map(|i| ((i * 5 + seed + i / 3) % 3).to_string())
                .collect();

            let forward = Column::categorical("a", categories.clone(), values.clone());
            let backward = Column::categorical("b", reversed.clone(), values);
            let rows: Vec<usize> = (0..n).collect();
            let bins_a: Vec<Bin> = categories.into_iter().map(Bin::Category).collect();
            let bins_b: Vec<Bin> = reversed.into_iter().map(Bin::Category).collect();

            let gain_a = gain_over_rows(&labels, &forward, &rows, &bins_a);
            let gain_b = gain_over_rows(&labels, &backward, &rows, &bins_b);
            assert_eq!(
                gain_a.to_bits(),
                gain_b.to_bits(),
                "seed {seed}: {gain_a} vs {gain_b}"
            );
        }
    }

    #[test]
    fn test_majority_label_tie_goes_to_first_seen() {
        assert_eq!(majority_label(["b", "a", "a", "b"]), Some("b"));
        assert_eq!(majority_label(["b", "a", "a"]), Some("a"));
        assert_eq!(majority_label(std::iter::empty()), None);
    }
}
