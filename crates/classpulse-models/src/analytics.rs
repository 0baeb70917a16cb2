//! Per-teacher aggregates over feedback.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    Month,
    Year,
    All,
}

impl TimeRange {
    /// Unknown or missing values fall back to a week.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("month") => Self::Month,
            Some("year") => Self::Year,
            Some("all") => Self::All,
            _ => Self::Week,
        }
    }

    /// Inclusive lower bound on `created_at`; `None` for the whole history.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => now.checked_sub_months(Months::new(1)),
            Self::Year => now.checked_sub_months(Months::new(12)),
            Self::All => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// `week` (default), `month`, `year` or `all`
    pub time_range: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DayCountRow {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct DayAverageRow {
    pub date: String,
    pub average: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RatingCountRow {
    pub rating: i32,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TotalsRow {
    pub total: i64,
    pub average: Option<f64>,
    pub pending: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyCount {
    /// UTC calendar day, `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAverage {
    pub date: String,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalStats {
    pub total_feedbacks: i64,
    pub average_rating: f64,
    pub pending_feedbacks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub time_range: TimeRange,
    pub total_stats: TotalStats,
    pub feedback_trends: Vec<DailyCount>,
    /// Keys `"1"` through `"5"`, always all present
    pub rating_distribution: BTreeMap<String, i64>,
    pub rating_trends: Vec<DailyAverage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub data: AnalyticsData,
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Counts per rating with every rating 1..=5 present.
pub fn rating_distribution(rows: &[RatingCountRow]) -> BTreeMap<String, i64> {
    let mut distribution: BTreeMap<String, i64> =
        (1..=5).map(|rating| (rating.to_string(), 0)).collect();

    for row in rows {
        if let Some(count) = distribution.get_mut(&row.rating.to_string()) {
            *count += row.count;
        }
    }

    distribution
}

impl From<TotalsRow> for TotalStats {
    fn from(row: TotalsRow) -> Self {
        Self {
            total_feedbacks: row.total,
            average_rating: round_to_tenth(row.average.unwrap_or(0.0)),
            pending_feedbacks: row.pending,
        }
    }
}

impl From<DayCountRow> for DailyCount {
    fn from(row: DayCountRow) -> Self {
        Self {
            date: row.date,
            count: row.count,
        }
    }
}

impl From<DayAverageRow> for DailyAverage {
    fn from(row: DayAverageRow) -> Self {
        Self {
            date: row.date,
            average_rating: round_to_tenth(row.average),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_range_parse() {
        assert_eq!(TimeRange::parse_or_default(None), TimeRange::Week);
        assert_eq!(TimeRange::parse_or_default(Some("week")), TimeRange::Week);
        assert_eq!(TimeRange::parse_or_default(Some("Month")), TimeRange::Month);
        assert_eq!(TimeRange::parse_or_default(Some("year")), TimeRange::Year);
        assert_eq!(TimeRange::parse_or_default(Some("all")), TimeRange::All);
        assert_eq!(TimeRange::parse_or_default(Some("decade")), TimeRange::Week);
    }

    #[test]
    fn test_time_range_start() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            TimeRange::Week.start(now),
            Some(Utc.with_ymd_and_hms(2025, 3, 24, 12, 0, 0).unwrap())
        );
        // calendar month back, clamped to the end of February
        assert_eq!(
            TimeRange::Month.start(now),
            Some(Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap())
        );
        assert_eq!(
            TimeRange::Year.start(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap())
        );
        assert_eq!(TimeRange::All.start(now), None);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to_tenth(4.25), 4.3);
        assert_eq!(round_to_tenth(3.333), 3.3);
        assert_eq!(round_to_tenth(5.0), 5.0);
    }

    #[test]
    fn test_distribution_zero_fills() {
        let rows = vec![
            RatingCountRow { rating: 5, count: 3 },
            RatingCountRow { rating: 2, count: 1 },
        ];
        let dist = rating_distribution(&rows);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist["1"], 0);
        assert_eq!(dist["2"], 1);
        assert_eq!(dist["5"], 3);
        assert_eq!(dist.values().sum::<i64>(), 4);
    }

    #[test]
    fn test_distribution_ignores_out_of_range() {
        let rows = vec![RatingCountRow { rating: 9, count: 2 }];
        assert_eq!(rating_distribution(&rows).values().sum::<i64>(), 0);
    }

    #[test]
    fn test_empty_totals() {
        let stats = TotalStats::from(TotalsRow {
            total: 0,
            average: None,
            pending: 0,
        });
        assert_eq!(stats.total_feedbacks, 0);
        assert_eq!(stats.average_rating, 0.0);
    }

    #[test]
    fn test_serialized_shape() {
        let data = AnalyticsData {
            time_range: TimeRange::Week,
            total_stats: TotalStats {
                total_feedbacks: 2,
                average_rating: 4.5,
                pending_feedbacks: 1,
            },
            feedback_trends: vec![DailyCount {
                date: "2025-01-02".to_string(),
                count: 2,
            }],
            rating_distribution: rating_distribution(&[]),
            rating_trends: vec![DayAverageRow {
                date: "2025-01-02".to_string(),
                average: 4.46,
            }
            .into()],
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["timeRange"], "week");
        assert_eq!(json["totalStats"]["totalFeedbacks"], 2);
        assert_eq!(json["feedbackTrends"][0]["date"], "2025-01-02");
        assert_eq!(json["ratingTrends"][0]["averageRating"], 4.5);
        assert_eq!(json["ratingDistribution"]["3"], 0);
    }
}
