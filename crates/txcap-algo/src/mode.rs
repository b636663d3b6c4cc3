//! Deterministic reductions used when collapsing rows into one edge.

use std::collections::HashMap;
use std::hash::Hash;

/// Most frequent non-null value. Ties go to the value seen first.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = Option<T>>,
{
    // value -> (count, first index)
    let mut tally: HashMap<T, (usize, usize)> = HashMap::new();
    for (idx, value) in values.into_iter().enumerate() {
        if let Some(value) = value {
            tally.entry(value).or_insert((0, idx)).0 += 1;
        }
    }
    tally
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}

/// Median of the finite values; the mean of the two middle values for an
/// even count.
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut finite: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_skips_nulls() {
        let values = vec![None, Some("Denver"), None, Some("Adams"), Some("Denver")];
        assert_eq!(mode(values), Some("Denver"));
        assert_eq!(mode::<&str, _>(vec![None, None]), None);
    }

    #[test]
    fn mode_ties_break_by_first_occurrence() {
        let values = vec![Some("b"), Some("a"), Some("a"), Some("b")];
        assert_eq!(mode(values), Some("b"));
        let values = vec![Some(3), Some(1), Some(2)];
        assert_eq!(mode(values), Some(3));
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(vec![Some(0.99), Some(0.95), Some(0.97)]), Some(0.97));
        assert_eq!(median(vec![Some(230.0), None, Some(500.0)]), Some(365.0));
        assert_eq!(median(vec![None, Some(f64::NAN)]), None);
    }
}
