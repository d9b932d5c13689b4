use crate::trajectory::TrajectoryPoint;

/// A filter that decides, per point, whether it stays in the trajectory.
///
/// `keep_mask` is index-aligned with its input. `apply` selects the kept
/// points in their original order, so every filter output is a subsequence
/// of its input.
pub trait PointFilter {
    fn name(&self) -> &'static str;

    fn keep_mask(&self, points: &[TrajectoryPoint]) -> Vec<bool>;

    fn apply(&self, points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
        let mask = self.keep_mask(points);
        select(points, &mask)
    }
}

/// Copy out the points whose mask entry is `true`.
pub fn select(points: &[TrajectoryPoint], mask: &[bool]) -> Vec<TrajectoryPoint> {
    debug_assert_eq!(points.len(), mask.len());

    points
        .iter()
        .zip(mask)
        .filter(|(_, &keep)| keep)
        .map(|(p, _)| p.clone())
        .collect()
}
