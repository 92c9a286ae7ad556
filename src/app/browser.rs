//! Cursor over the series tables returned by the last fetch

use crate::app::models::SeriesTable;

/// Ordered set of series tables with a single cursor
///
/// The cursor is always a valid index while tables are held. Moving past
/// either end is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DatasetBrowser {
    tables: Vec<SeriesTable>,
    cursor: usize,
}

impl DatasetBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new result set and rewind to the first table
    pub fn replace(&mut self, tables: Vec<SeriesTable>) {
        tracing::debug!("Browser now holds {} series", tables.len());
        self.tables = tables;
        self.cursor = 0;
    }

    /// Advance the cursor; returns whether it moved
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.tables.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Step the cursor back; returns whether it moved
    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 && !self.tables.is_empty() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&SeriesTable> {
        self.tables.get(self.cursor)
    }

    /// `(cursor, len)` while tables are held
    pub fn position(&self) -> Option<(usize, usize)> {
        if self.tables.is_empty() {
            None
        } else {
            Some((self.cursor, self.tables.len()))
        }
    }

    pub fn tables(&self) -> &[SeriesTable] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Observation, SeriesKey};

    fn table(freq: &str, observations: usize) -> SeriesTable {
        SeriesTable::new(
            SeriesKey {
                frequency: freq.to_string(),
                area: "US".to_string(),
                indicator: "NGDP".to_string(),
            },
            (0..observations)
                .map(|i| Observation::new(format!("{}", 2000 + i), format!("{}", i)))
                .collect(),
        )
    }

    #[test]
    fn test_empty_browser() {
        let mut browser = DatasetBrowser::new();
        assert!(browser.current().is_none());
        assert_eq!(browser.position(), None);
        assert!(!browser.next());
        assert!(!browser.previous());
        assert!(browser.is_empty());
    }

    #[test]
    fn test_two_series_navigation() {
        let mut browser = DatasetBrowser::new();
        browser.replace(vec![table("Q", 3), table("A", 3)]);

        assert_eq!(browser.current().unwrap().label(), "Q_US_NGDP");
        assert_eq!(browser.position(), Some((0, 2)));

        assert!(browser.next());
        assert_eq!(browser.current().unwrap().label(), "A_US_NGDP");

        // Already at the last table
        assert!(!browser.next());
        assert_eq!(browser.position(), Some((1, 2)));

        assert!(browser.previous());
        assert!(!browser.previous());
        assert_eq!(browser.current().unwrap().label(), "Q_US_NGDP");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut browser = DatasetBrowser::new();
        browser.replace(vec![table("A", 1), table("Q", 1), table("M", 1)]);

        let moves = [true, true, true, false, true, false, false, false, true];
        for forward in moves {
            if forward {
                browser.next();
            } else {
                browser.previous();
            }
            let (cursor, len) = browser.position().unwrap();
            assert!(cursor < len);
        }
    }

    #[test]
    fn test_replace_resets_cursor() {
        let mut browser = DatasetBrowser::new();
        browser.replace(vec![table("A", 1), table("Q", 1)]);
        browser.next();

        browser.replace(vec![table("M", 2)]);
        assert_eq!(browser.position(), Some((0, 1)));
        assert_eq!(browser.current().unwrap().observations().len(), 2);

        browser.clear();
        assert!(browser.current().is_none());
    }
}
