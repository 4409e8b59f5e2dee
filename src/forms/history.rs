use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingStatus, BookingTab, DateRange, HistoryFilter};

/// Query string of the history page and its CSV report.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl From<&HistoryQuery> for HistoryFilter {
    fn from(query: &HistoryQuery) -> Self {
        let status = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "all")
            .map(BookingStatus::from);
        HistoryFilter {
            status,
            range: query
                .range
                .as_deref()
                .map(DateRange::parse)
                .unwrap_or_default(),
            search: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BookingsQuery {
    #[serde(default)]
    pub tab: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

impl BookingsQuery {
    pub fn tab(&self) -> BookingTab {
        self.tab
            .as_deref()
            .map(BookingTab::parse)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_status_means_no_filter() {
        let filter = HistoryFilter::from(&HistoryQuery {
            status: Some("all".into()),
            range: Some("week".into()),
            q: Some("  ".into()),
            page: None,
        });
        assert_eq!(filter.status, None);
        assert_eq!(filter.range, DateRange::Week);
        assert_eq!(filter.search, None);
    }
}
