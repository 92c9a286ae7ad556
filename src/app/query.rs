//! Compact data query construction

use serde::{Deserialize, Serialize};

use crate::app::models::CodelistRole;
use crate::app::selection::Selection;
use crate::constants::sdmx;

/// Immutable snapshot of a series request
///
/// Built from the selection at the moment a fetch is triggered, so later
/// toggles do not affect a request already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesQuery {
    key_family_id: String,
    dimensions: [Vec<String>; 3],
}

impl SeriesQuery {
    pub fn new(key_family_id: impl Into<String>, selection: &Selection) -> Self {
        Self {
            key_family_id: key_family_id.into(),
            dimensions: CodelistRole::ALL.map(|role| selection.values(role)),
        }
    }

    /// Query from explicit code values, in frequency, area, indicator order
    pub fn from_values(
        key_family_id: impl Into<String>,
        frequency: Vec<String>,
        area: Vec<String>,
        indicator: Vec<String>,
    ) -> Self {
        Self {
            key_family_id: key_family_id.into(),
            dimensions: [frequency, area, indicator],
        }
    }

    pub fn key_family_id(&self) -> &str {
        &self.key_family_id
    }

    pub fn values(&self, role: CodelistRole) -> &[String] {
        &self.dimensions[role.index()]
    }

    /// Dimension path such as `Q+A.US.NGDP`; an empty dimension leaves an
    /// empty segment, which the service reads as "all"
    pub fn key_path(&self) -> String {
        self.dimensions
            .iter()
            .map(|values| values.join(sdmx::VALUE_SEPARATOR))
            .collect::<Vec<_>>()
            .join(sdmx::DIMENSION_SEPARATOR)
    }

    pub fn has_indicator(&self) -> bool {
        !self.values(CodelistRole::Indicator).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::CodeEntry;

    #[test]
    fn test_key_path_from_selection() {
        let mut selection = Selection::new();
        selection.toggle(CodelistRole::Frequency, CodeEntry::new("Quarterly", "Q"));
        selection.toggle(CodelistRole::Frequency, CodeEntry::new("Annual", "A"));
        selection.toggle(CodelistRole::Area, CodeEntry::new("United States", "US"));
        selection.toggle(CodelistRole::Indicator, CodeEntry::new("GDP", "NGDP"));

        let query = SeriesQuery::new("IFS", &selection);
        assert_eq!(query.key_path(), "Q+A.US.NGDP");
        assert_eq!(query.key_family_id(), "IFS");
        assert!(query.has_indicator());
    }

    #[test]
    fn test_empty_dimensions_leave_empty_segments() {
        let query = SeriesQuery::from_values("IFS", vec![], vec![], vec!["NGDP".to_string()]);
        assert_eq!(query.key_path(), "..NGDP");

        let query = SeriesQuery::from_values("IFS", vec![], vec![], vec![]);
        assert_eq!(query.key_path(), "..");
        assert!(!query.has_indicator());
    }

    #[test]
    fn test_snapshot_is_independent_of_later_toggles() {
        let mut selection = Selection::new();
        selection.toggle(CodelistRole::Indicator, CodeEntry::from_value("NGDP"));
        let query = SeriesQuery::new("IFS", &selection);

        selection.toggle(CodelistRole::Indicator, CodeEntry::from_value("PCPI"));
        assert_eq!(query.values(CodelistRole::Indicator), ["NGDP".to_string()]);
    }
}
