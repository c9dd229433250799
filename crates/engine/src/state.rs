//! The shared filter selection.
//!
//! [`FilterState`] is the only mutable value every data collection depends on.
//! It is mutated by explicit user action only, and every mutation is a single
//! transition published on a `watch` channel: subscribers never observe a
//! half-applied change (for example a custom label without its bounds).

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::{
    FilterError,
    filter::{FilterLabel, FilterSelection, parse_date},
};

#[derive(Clone, Debug)]
pub struct FilterState {
    tx: Arc<watch::Sender<FilterSelection>>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    /// Starts on [`FilterLabel::All`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FilterSelection::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn selection(&self) -> FilterSelection {
        *self.tx.borrow()
    }

    /// Receiver notified after every committed change.
    pub fn subscribe(&self) -> watch::Receiver<FilterSelection> {
        self.tx.subscribe()
    }

    /// Selects a preset and drops any stored custom bounds.
    ///
    /// Selecting [`FilterLabel::CustomRange`] only opens range entry: the
    /// selection stays pending until [`FilterState::set_custom_range`].
    pub fn set_label(&self, label: FilterLabel) {
        self.commit(FilterSelection::preset(label));
    }

    /// Commits an explicit range. Both bounds are required.
    pub fn set_custom_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<(), FilterError> {
        let (Some(from), Some(to)) = (from, to) else {
            return Err(FilterError::IncompleteRange);
        };
        if from > to {
            return Err(FilterError::InvertedRange { from, to });
        }
        self.commit(FilterSelection::custom(from, to));
        Ok(())
    }

    /// UI entry point: parses both bounds as `YYYY-MM-DD` before committing.
    pub fn select_custom_range(&self, from: &str, to: &str) -> Result<(), FilterError> {
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        self.set_custom_range(Some(from), Some(to))
    }

    /// Back to [`FilterLabel::All`].
    pub fn reset(&self) {
        self.commit(FilterSelection::default());
    }

    /// Closing the range picker without choosing bounds falls back to All.
    ///
    /// Returns `true` when the selection was reset.
    pub fn dismiss_custom_range(&self) -> bool {
        if !self.selection().is_pending() {
            return false;
        }
        self.reset();
        true
    }

    fn commit(&self, next: FilterSelection) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::debug!(label = %next.label, "filter selection changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn starts_on_all() {
        let state = FilterState::new();
        assert_eq!(state.selection(), FilterSelection::default());
        assert_eq!(state.selection().label, FilterLabel::All);
    }

    #[test]
    fn set_label_clears_custom_bounds() {
        let state = FilterState::new();
        state
            .set_custom_range(Some(date(2025, 1, 1)), Some(date(2025, 1, 31)))
            .unwrap();
        state.set_label(FilterLabel::LastMonth);
        let selection = state.selection();
        assert_eq!(selection.label, FilterLabel::LastMonth);
        assert_eq!(selection.from, None);
        assert_eq!(selection.to, None);
    }

    #[test]
    fn custom_label_starts_pending() {
        let state = FilterState::new();
        state.set_label(FilterLabel::CustomRange);
        assert!(state.selection().is_pending());
    }

    #[test]
    fn custom_range_requires_both_bounds() {
        let state = FilterState::new();
        state.set_label(FilterLabel::CustomRange);
        assert_eq!(
            state.set_custom_range(Some(date(2025, 1, 1)), None),
            Err(FilterError::IncompleteRange)
        );
        assert!(state.selection().is_pending());
    }

    #[test]
    fn custom_range_rejects_inverted_bounds() {
        let state = FilterState::new();
        let err = state
            .set_custom_range(Some(date(2025, 2, 1)), Some(date(2025, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvertedRange { .. }));
        assert_eq!(state.selection().label, FilterLabel::All);
    }

    #[test]
    fn select_custom_range_parses_strings() {
        let state = FilterState::new();
        state.select_custom_range("2025-01-01", "2025-01-31").unwrap();
        assert_eq!(
            state.selection(),
            FilterSelection::custom(date(2025, 1, 1), date(2025, 1, 31))
        );
        assert!(matches!(
            state.select_custom_range("01/01/2025", "2025-01-31"),
            Err(FilterError::InvalidDate(_))
        ));
    }

    #[test]
    fn dismiss_only_resets_pending_ranges() {
        let state = FilterState::new();
        state.set_label(FilterLabel::CustomRange);
        assert!(state.dismiss_custom_range());
        assert_eq!(state.selection().label, FilterLabel::All);

        state.select_custom_range("2025-01-01", "2025-01-31").unwrap();
        assert!(!state.dismiss_custom_range());
        assert_eq!(state.selection().label, FilterLabel::CustomRange);
    }

    #[test]
    fn subscribers_see_changes_but_not_no_ops() {
        let state = FilterState::new();
        let mut rx = state.subscribe();

        state.set_label(FilterLabel::All);
        assert!(!rx.has_changed().unwrap());

        state.set_label(FilterLabel::Last3Months);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().label, FilterLabel::Last3Months);
    }

    #[test]
    fn clones_share_the_selection() {
        let state = FilterState::new();
        let header = state.clone();
        header.set_label(FilterLabel::LastMonth);
        assert_eq!(state.selection().label, FilterLabel::LastMonth);
    }
}
