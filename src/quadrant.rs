//! Eisenhower quadrant classification.

use crate::fields::Quadrant;
use crate::task::AnalyzedTask;

/// Component values at or above this count as high.
pub const THRESHOLD: f64 = 0.5;

/// Bucket a point of the urgency/importance square. Exactly 0.5 counts as high.
pub fn classify_components(urgency: f64, importance: f64) -> Quadrant {
    let urgent = urgency >= THRESHOLD;
    let important = importance >= THRESHOLD;
    match (urgent, important) {
        (true, true) => Quadrant::DoFirst,
        (false, true) => Quadrant::Schedule,
        (true, false) => Quadrant::Delegate,
        (false, false) => Quadrant::Eliminate,
    }
}

pub fn classify(task: &AnalyzedTask) -> Quadrant {
    classify_components(task.components.urgency, task.components.importance_norm)
}

/// Indices into `tasks`, grouped by quadrant in [`Quadrant::ALL`] order.
/// Within a quadrant the service's rank order is kept.
pub fn bucket(tasks: &[AnalyzedTask]) -> [Vec<usize>; 4] {
    let mut buckets: [Vec<usize>; 4] = Default::default();
    for (i, task) in tasks.iter().enumerate() {
        buckets[classify(task).index()].push(i);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_lean_towards_high() {
        assert_eq!(classify_components(0.5, 0.5), Quadrant::DoFirst);
        assert_eq!(classify_components(0.49, 0.5), Quadrant::Schedule);
        assert_eq!(classify_components(0.5, 0.49), Quadrant::Delegate);
        assert_eq!(classify_components(0.49, 0.49), Quadrant::Eliminate);
    }

    #[test]
    fn corners_of_the_unit_square() {
        assert_eq!(classify_components(1.0, 1.0), Quadrant::DoFirst);
        assert_eq!(classify_components(0.0, 1.0), Quadrant::Schedule);
        assert_eq!(classify_components(1.0, 0.0), Quadrant::Delegate);
        assert_eq!(classify_components(0.0, 0.0), Quadrant::Eliminate);
    }

    #[test]
    fn every_grid_point_lands_in_exactly_one_bucket() {
        for u in 0..=100 {
            for i in 0..=100 {
                let (u, i) = (u as f64 / 100.0, i as f64 / 100.0);
                let q = classify_components(u, i);
                let expected = match (u >= 0.5, i >= 0.5) {
                    (true, true) => Quadrant::DoFirst,
                    (false, true) => Quadrant::Schedule,
                    (true, false) => Quadrant::Delegate,
                    (false, false) => Quadrant::Eliminate,
                };
                assert_eq!(q, expected, "({u}, {i})");
            }
        }
    }

    #[test]
    fn bucket_keeps_rank_order() {
        use crate::analysis::tests::score;
        use crate::task::Task;

        let t = |id: &str| Task {
            id: id.into(),
            title: id.into(),
            priority: 5,
            effort: 5,
            due_date: None,
            dependencies: Vec::new(),
        };
        let tasks = vec![
            score(&t("a"), 0.9, 0.9, 0.9),
            score(&t("b"), 0.8, 0.1, 0.9),
            score(&t("c"), 0.7, 0.8, 0.8),
            score(&t("d"), 0.1, 0.1, 0.1),
        ];
        let buckets = bucket(&tasks);
        assert_eq!(buckets[Quadrant::DoFirst.index()], vec![0, 2]);
        assert_eq!(buckets[Quadrant::Schedule.index()], vec![1]);
        assert!(buckets[Quadrant::Delegate.index()].is_empty());
        assert_eq!(buckets[Quadrant::Eliminate.index()], vec![3]);
    }
}
