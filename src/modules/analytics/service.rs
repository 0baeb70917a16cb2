use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use classpulse_core::AppError;
use classpulse_models::UserId;
use classpulse_models::analytics::{
    AnalyticsData, DayAverageRow, DayCountRow, RatingCountRow, TimeRange, TotalsRow,
    rating_distribution,
};

/// UTC calendar day of `created_at`.
const DAY_BUCKET: &str = "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')";

pub struct AnalyticsService;

impl AnalyticsService {
    /// Report for one teacher. Trends and distribution cover `time_range`; the
    /// totals cover the teacher's whole history.
    #[instrument(skip(db))]
    pub async fn teacher_report(
        db: &PgPool,
        teacher_id: UserId,
        time_range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsData, AppError> {
        // NULL start means unbounded
        let start = time_range.start(now);

        let trends = sqlx::query_as::<_, DayCountRow>(&format!(
            "SELECT {bucket} AS date, COUNT(*) AS count
             FROM feedback
             WHERE teacher_id = $1 AND ($2::timestamptz IS NULL OR created_at >= $2)
             GROUP BY 1
             ORDER BY 1",
            bucket = DAY_BUCKET
        ))
        .bind(teacher_id)
        .bind(start)
        .fetch_all(db)
        .await?;

        let ratings = sqlx::query_as::<_, RatingCountRow>(
            "SELECT rating, COUNT(*) AS count
             FROM feedback
             WHERE teacher_id = $1 AND ($2::timestamptz IS NULL OR created_at >= $2)
             GROUP BY rating",
        )
        .bind(teacher_id)
        .bind(start)
        .fetch_all(db)
        .await?;

        let rating_trends = sqlx::query_as::<_, DayAverageRow>(&format!(
            "SELECT {bucket} AS date, AVG(rating)::float8 AS average
             FROM feedback
             WHERE teacher_id = $1 AND ($2::timestamptz IS NULL OR created_at >= $2)
             GROUP BY 1
             ORDER BY 1",
            bucket = DAY_BUCKET
        ))
        .bind(teacher_id)
        .bind(start)
        .fetch_all(db)
        .await?;

        let totals = sqlx::query_as::<_, TotalsRow>(
            "SELECT COUNT(*) AS total,
                    AVG(rating)::float8 AS average,
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending
             FROM feedback
             WHERE teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_one(db)
        .await?;

        Ok(AnalyticsData {
            time_range,
            total_stats: totals.into(),
            feedback_trends: trends.into_iter().map(Into::into).collect(),
            rating_distribution: rating_distribution(&ratings),
            rating_trends: rating_trends.into_iter().map(Into::into).collect(),
        })
    }
}
