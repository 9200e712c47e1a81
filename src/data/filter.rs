use std::collections::BTreeSet;

use super::model::Cell;

// ---------------------------------------------------------------------------
// Cross-filter: which legend categories are active per axis
// ---------------------------------------------------------------------------

/// Set of active category labels. Empty means "no filter" (all emphasized).
pub type CategorySet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAxis {
    Color,
    Shape,
}

/// Two independent legend selections, by colour and by shape category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossFilter {
    color: CategorySet,
    shape: CategorySet,
}

impl CrossFilter {
    pub fn set(&self, axis: FilterAxis) -> &CategorySet {
        match axis {
            FilterAxis::Color => &self.color,
            FilterAxis::Shape => &self.shape,
        }
    }

    fn set_mut(&mut self, axis: FilterAxis) -> &mut CategorySet {
        match axis {
            FilterAxis::Color => &mut self.color,
            FilterAxis::Shape => &mut self.shape,
        }
    }

    /// Add or remove exactly one label from an axis.
    pub fn toggle(&mut self, axis: FilterAxis, label: &str) {
        let selected = self.set_mut(axis);
        if !selected.remove(label) {
            selected.insert(label.to_string());
        }
    }

    pub fn clear(&mut self, axis: FilterAxis) {
        self.set_mut(axis).clear();
    }

    /// Whether a legend entry is drawn as active.
    pub fn is_active(&self, axis: FilterAxis, label: &str) -> bool {
        let selected = self.set(axis);
        selected.is_empty() || selected.contains(label)
    }

    /// A point is emphasized when it passes both axes. A point without a
    /// label on an axis fails that axis whenever its filter is non-empty.
    pub fn emphasizes(&self, color: Option<&str>, shape: Option<&str>) -> bool {
        passes(&self.color, color) && passes(&self.shape, shape)
    }
}

fn passes(selected: &CategorySet, label: Option<&str>) -> bool {
    selected.is_empty() || label.is_some_and(|l| selected.contains(l))
}

/// Per-row emphasis flags. Filtering never drops rows, it only restyles them.
pub fn emphasis_mask(
    rows: usize,
    color_labels: Option<&[Cell]>,
    shape_labels: Option<&[Cell]>,
    filter: &CrossFilter,
) -> Vec<bool> {
    (0..rows)
        .map(|i| {
            let color = color_labels.and_then(|l| l.get(i)).and_then(Cell::key);
            let shape = shape_labels.and_then(|l| l.get(i)).and_then(Cell::key);
            filter.emphasizes(color.as_deref(), shape.as_deref())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::parse(v)).collect()
    }

    #[test]
    fn empty_filter_emphasizes_everything() {
        let colors = cells(&["A", "B", ""]);
        let mask = emphasis_mask(3, Some(&colors), None, &CrossFilter::default());
        assert_eq!(mask, vec![true, true, true]);
    }

    #[test]
    fn toggle_on_then_off_restores_mask() {
        let colors = cells(&["A", "B", "A", ""]);
        let shapes = cells(&["s", "t", "t", "s"]);
        let mut filter = CrossFilter::default();
        filter.toggle(FilterAxis::Shape, "t");
        let before = emphasis_mask(4, Some(&colors), Some(&shapes), &filter);

        filter.toggle(FilterAxis::Color, "A");
        assert_ne!(emphasis_mask(4, Some(&colors), Some(&shapes), &filter), before);
        filter.toggle(FilterAxis::Color, "A");
        assert_eq!(emphasis_mask(4, Some(&colors), Some(&shapes), &filter), before);
    }

    #[test]
    fn axes_combine_with_and() {
        let colors = cells(&["A", "A", "B"]);
        let shapes = cells(&["x", "y", "x"]);
        let mut filter = CrossFilter::default();
        filter.toggle(FilterAxis::Color, "A");
        filter.toggle(FilterAxis::Shape, "x");
        assert_eq!(
            emphasis_mask(3, Some(&colors), Some(&shapes), &filter),
            vec![true, false, false]
        );
    }

    #[test]
    fn unlabelled_points_fail_active_axis() {
        let colors = cells(&["A", ""]);
        let mut filter = CrossFilter::default();
        filter.toggle(FilterAxis::Color, "A");
        assert_eq!(emphasis_mask(2, Some(&colors), None, &filter), vec![true, false]);
    }

    #[test]
    fn legend_activity_follows_set() {
        let mut filter = CrossFilter::default();
        assert!(filter.is_active(FilterAxis::Color, "A"));
        filter.toggle(FilterAxis::Color, "B");
        assert!(!filter.is_active(FilterAxis::Color, "A"));
        assert!(filter.is_active(FilterAxis::Color, "B"));
        filter.clear(FilterAxis::Color);
        assert!(filter.set(FilterAxis::Color).is_empty());
    }
}
