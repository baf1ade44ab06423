//! Shared selected-date context

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::sync::Arc;

/// Date picked in the calendar, read by the file explorer.
///
/// Cloning shares the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct DateSelection {
    inner: Arc<RwLock<Option<NaiveDate>>>,
}

impl DateSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<NaiveDate> {
        *self.inner.read()
    }

    pub fn set(&self, date: Option<NaiveDate>) {
        tracing::debug!(?date, "selected date");
        *self.inner.write() = date;
    }

    /// Catalog key (`YYYY-MM-DD`) of the selection
    pub fn key(&self) -> Option<String> {
        self.get().map(|d| d.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_selection() {
        let calendar = DateSelection::new();
        let explorer = calendar.clone();
        assert_eq!(explorer.key(), None);

        calendar.set(NaiveDate::from_ymd_opt(2024, 10, 7));
        assert_eq!(explorer.key().as_deref(), Some("2024-10-07"));

        calendar.set(None);
        assert!(explorer.get().is_none());
    }
}
