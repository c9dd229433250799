//! Date-range filter selection and its resolution into query bounds.
//!
//! A [`FilterSelection`] is what the user picked in the header (a label and,
//! for custom ranges, explicit bounds). [`resolve`] turns it into the concrete
//! [`ResolvedRange`] sent with every data request. Resolution is pure: the
//! current date is always passed in.

use std::{fmt, str::FromStr};

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::FilterError;

/// Wire format of every date bound.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-range presets offered by the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterLabel {
    #[default]
    All,
    LastMonth,
    Last3Months,
    CustomRange,
}

impl FilterLabel {
    pub const ALL: [FilterLabel; 4] = [
        FilterLabel::All,
        FilterLabel::LastMonth,
        FilterLabel::Last3Months,
        FilterLabel::CustomRange,
    ];

    /// Label as shown in the range picker.
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::LastMonth => "Last Month",
            Self::Last3Months => "Last 3 Months",
            Self::CustomRange => "Custom Range",
        }
    }

    /// Months covered by a trailing preset, `None` for the others.
    fn trailing_months(self) -> Option<u32> {
        match self {
            Self::LastMonth => Some(1),
            Self::Last3Months => Some(3),
            Self::All | Self::CustomRange => None,
        }
    }
}

impl fmt::Display for FilterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterLabel {
    type Err = FilterError;

    /// Accepts `"Last Month"`, `"LastMonth"`, `"last-month"` and friends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "all" => Ok(Self::All),
            "lastmonth" => Ok(Self::LastMonth),
            "last3months" => Ok(Self::Last3Months),
            "customrange" | "custom" => Ok(Self::CustomRange),
            _ => Err(FilterError::UnknownLabel(s.trim().to_string())),
        }
    }
}

/// The user's current choice.
///
/// `from`/`to` only carry meaning for [`FilterLabel::CustomRange`]; with any
/// other label they are ignored by [`resolve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSelection {
    pub label: FilterLabel,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FilterSelection {
    pub fn preset(label: FilterLabel) -> Self {
        Self {
            label,
            from: None,
            to: None,
        }
    }

    pub fn custom(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            label: FilterLabel::CustomRange,
            from: Some(from),
            to: Some(to),
        }
    }

    /// A custom range whose bounds have not been committed yet.
    pub fn is_pending(&self) -> bool {
        self.label == FilterLabel::CustomRange && (self.from.is_none() || self.to.is_none())
    }
}

/// Concrete bounds derived from a selection at fetch time.
///
/// Serializes to the outbound query parameters: `from`/`to` as `YYYY-MM-DD`,
/// each omitted when absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl ResolvedRange {
    pub const fn unbounded() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| from <= date) && self.to.is_none_or(|to| date <= to)
    }

    /// Query parameters for transports that do not go through serde.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(from) = self.from {
            pairs.push(("from", from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.format(DATE_FORMAT).to_string()));
        }
        pairs
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from, self.to) {
            (None, None) => f.write_str("all time"),
            (Some(from), Some(to)) => write!(f, "{from} .. {to}"),
            (Some(from), None) => write!(f, "since {from}"),
            (None, Some(to)) => write!(f, "until {to}"),
        }
    }
}

/// Parses a `YYYY-MM-DD` date coming from the UI.
pub fn parse_date(value: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| FilterError::InvalidDate(value.trim().to_string()))
}

/// Resolves `selection` against `today`.
///
/// Trailing presets end on `today` and start the same day of the month
/// `N` months earlier; when that day does not exist in the target month it is
/// clamped to the month's last day (31 March minus one month is 28 or 29
/// February). A custom range with a missing bound resolves to the unbounded
/// range.
pub fn resolve(selection: &FilterSelection, today: NaiveDate) -> ResolvedRange {
    if let Some(months) = selection.label.trailing_months() {
        return ResolvedRange::between(months_before(today, months), today);
    }

    match (selection.label, selection.from, selection.to) {
        (FilterLabel::CustomRange, Some(from), Some(to)) if from <= to => {
            ResolvedRange::between(from, to)
        }
        (FilterLabel::CustomRange, Some(from), Some(to)) => ResolvedRange::between(to, from),
        _ => ResolvedRange::unbounded(),
    }
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn all_is_unbounded() {
        let range = resolve(&FilterSelection::default(), date(2025, 3, 15));
        assert!(range.is_unbounded());
        assert!(range.query_pairs().is_empty());
    }

    #[test]
    fn last_month_ends_today() {
        let range = resolve(
            &FilterSelection::preset(FilterLabel::LastMonth),
            date(2025, 3, 15),
        );
        assert_eq!(range, ResolvedRange::between(date(2025, 2, 15), date(2025, 3, 15)));
    }

    #[test]
    fn last_three_months_rolls_back_the_year() {
        let range = resolve(
            &FilterSelection::preset(FilterLabel::Last3Months),
            date(2025, 2, 10),
        );
        assert_eq!(range.from, Some(date(2024, 11, 10)));
        assert_eq!(range.to, Some(date(2025, 2, 10)));
    }

    #[test]
    fn month_rollback_clamps_to_last_day() {
        let last_month = FilterSelection::preset(FilterLabel::LastMonth);
        assert_eq!(resolve(&last_month, date(2025, 3, 31)).from, Some(date(2025, 2, 28)));
        assert_eq!(resolve(&last_month, date(2024, 3, 31)).from, Some(date(2024, 2, 29)));

        let quarter = FilterSelection::preset(FilterLabel::Last3Months);
        assert_eq!(resolve(&quarter, date(2025, 5, 31)).from, Some(date(2025, 2, 28)));
    }

    #[test]
    fn trailing_presets_ignore_stale_bounds() {
        let selection = FilterSelection {
            label: FilterLabel::LastMonth,
            from: Some(date(2020, 1, 1)),
            to: Some(date(2020, 1, 2)),
        };
        assert_eq!(resolve(&selection, date(2025, 3, 15)).from, Some(date(2025, 2, 15)));
    }

    #[test]
    fn custom_range_passes_bounds_through() {
        let selection = FilterSelection::custom(date(2025, 1, 1), date(2025, 1, 31));
        let range = resolve(&selection, date(2025, 3, 15));
        assert_eq!(
            range.query_pairs(),
            vec![("from", "2025-01-01".to_string()), ("to", "2025-01-31".to_string())]
        );
    }

    #[test]
    fn pending_custom_range_is_unbounded() {
        let today = date(2025, 3, 15);
        let pending = FilterSelection::preset(FilterLabel::CustomRange);
        assert!(pending.is_pending());
        assert!(resolve(&pending, today).is_unbounded());

        let half = FilterSelection {
            label: FilterLabel::CustomRange,
            from: Some(date(2025, 1, 1)),
            to: None,
        };
        assert!(resolve(&half, today).is_unbounded());
    }

    #[test]
    fn inverted_custom_range_is_reordered() {
        let selection = FilterSelection::custom(date(2025, 2, 1), date(2025, 1, 1));
        let range = resolve(&selection, date(2025, 3, 15));
        assert_eq!(range, ResolvedRange::between(date(2025, 1, 1), date(2025, 2, 1)));
    }

    #[test]
    fn resolution_is_deterministic() {
        let today = date(2025, 12, 1);
        for label in FilterLabel::ALL {
            let selection = FilterSelection::preset(label);
            assert_eq!(resolve(&selection, today), resolve(&selection, today));
            let range = resolve(&selection, today);
            if let (Some(from), Some(to)) = (range.from, range.to) {
                assert!(from <= to);
            }
        }
    }

    #[test]
    fn serializes_only_present_bounds() {
        let json = serde_json::to_string(&ResolvedRange {
            from: Some(date(2025, 2, 15)),
            to: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"from":"2025-02-15"}"#);
        assert_eq!(serde_json::to_string(&ResolvedRange::unbounded()).unwrap(), "{}");
    }

    #[test]
    fn contains_is_inclusive() {
        let range = ResolvedRange::between(date(2025, 1, 1), date(2025, 1, 31));
        assert!(range.contains(date(2025, 1, 1)));
        assert!(range.contains(date(2025, 1, 31)));
        assert!(!range.contains(date(2025, 2, 1)));
        assert!(ResolvedRange::unbounded().contains(date(1999, 1, 1)));
    }

    #[test]
    fn labels_parse_from_ui_and_cli_spellings() {
        assert_eq!("Last 3 Months".parse::<FilterLabel>().unwrap(), FilterLabel::Last3Months);
        assert_eq!("last-month".parse::<FilterLabel>().unwrap(), FilterLabel::LastMonth);
        assert_eq!("CustomRange".parse::<FilterLabel>().unwrap(), FilterLabel::CustomRange);
        assert_eq!("ALL".parse::<FilterLabel>().unwrap(), FilterLabel::All);
        assert!(matches!(
            "yesterday".parse::<FilterLabel>(),
            Err(FilterError::UnknownLabel(_))
        ));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert_eq!(parse_date(" 2025-01-31 ").unwrap(), date(2025, 1, 31));
        assert!(parse_date("31/01/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
