use crate::DbError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::future::Future;
use std::time::Duration;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic,
/// and runs every statement under a fixed time budget.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    statement_timeout: Duration,
}

/// The closed set of issue timestamp columns a count query may filter on.
///
/// Column names reach the SQL templates through this enum only; callers can
/// never smuggle an arbitrary string into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueDateField {
    CreatedAt,
    ClosedAt,
}

impl IssueDateField {
    /// The `issues` column this selector stands for.
    pub fn column(&self) -> &'static str {
        match self {
            IssueDateField::CreatedAt => "created_at",
            IssueDateField::ClosedAt => "closed_at",
        }
    }
}

/// An inclusive `[begin, end]` window for time-based issue counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// The window covering the `days` days up to and including `now`.
    pub fn past_days(now: NaiveDateTime, days: i64) -> Self {
        Self {
            begin: now - chrono::Duration::days(days),
            end: now,
        }
    }

    /// Window bounds travel to the database as `YYYY-MM-DD HH:MM:SS` strings
    /// and are parsed back with `to_timestamp`; second precision is all the
    /// schema stores.
    pub fn begin_str(&self) -> String {
        format_bound(self.begin)
    }

    pub fn end_str(&self) -> String {
        format_bound(self.end)
    }
}

fn format_bound(bound: NaiveDateTime) -> String {
    bound.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ==============================================================================
// Row Types
// ==============================================================================
// These map one-to-one onto result-set columns and serialize straight into
// the JSON response bodies, so their field order mirrors the SELECT lists.

/// A repo's identity row: id plus display name.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoName {
    pub repo_id: i64,
    pub repo_name: String,
}

/// One grouped count row from a time-windowed issue query.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoIssueCount {
    pub repo_id: i64,
    pub issue_count: i64,
}

/// A repo with its all-time totals and group, for the overview listing.
///
/// `url` is the clone URL with the transport scheme stripped; `base64_url`
/// is the stripped URL base64-encoded, which front-ends embed in request
/// paths. Both are filled in after the fetch, so `base64_url` is not a
/// result-set column.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoOverview {
    pub repo_id: i64,
    pub repo_name: String,
    pub description: Option<String>,
    pub url: String,
    pub repo_status: String,
    pub commits_all_time: Option<i64>,
    pub issues_all_time: Option<i64>,
    pub rg_name: String,
    pub repo_group_id: i64,
    #[sqlx(default)]
    pub base64_url: String,
}

/// A repo inside one group, with the same all-time totals.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupRepo {
    pub repo_id: i64,
    pub repo_name: String,
    pub description: Option<String>,
    pub url: String,
    pub repo_status: String,
    pub commits_all_time: Option<i64>,
    pub issues_all_time: Option<i64>,
}

/// The group membership row answering an owner/name lookup.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoGroupRef {
    pub repo_id: i64,
    pub repo_group_id: i64,
    pub rg_name: String,
}

/// The row answering a group-name + repo-name lookup.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoByName {
    pub repo_id: i64,
    pub repo_group_id: i64,
    pub url: String,
}

/// A repo group's identity row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoGroup {
    pub repo_group_id: i64,
    pub rg_name: String,
}

/// Where a repo is checked out on disk, derived from the `repo_directory`
/// setting. `path` is NULL when the repo row has no `repo_path` yet.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepoCheckoutPath {
    pub repo_id: i64,
    pub path: Option<String>,
}

/// An issue joined with its event aggregate: how many events it has, when
/// the latest one happened, and how many days the issue has been open.
///
/// The per-repo listing also carries `repo_name`; the per-group listing does
/// not select it, so the field defaults to `None` and stays out of the JSON.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IssueActivity {
    pub issue_title: Option<String>,
    pub issue_id: i64,
    pub repo_id: i64,
    pub html_url: Option<String>,
    pub status: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub count: i64,
    pub last_event_date: Option<NaiveDateTime>,
    pub open_day: Option<i64>,
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
}

// ==============================================================================
// Store Interface
// ==============================================================================

/// The abstract, read-only interface to the repository/issue store.
///
/// This trait is the contract the route handlers depend on, allowing the
/// underlying implementation (live Postgres or an in-memory stub in tests)
/// to be swapped out.
#[async_trait]
pub trait RepoStore: Send + Sync {
    /// Every repo's id and display name, ordered by name ascending.
    async fn all_repo_names(&self) -> Result<Vec<RepoName>, DbError>;

    /// A single repo's identity row, or `None` when the id is unknown.
    async fn find_repo(&self, repo_id: i64) -> Result<Option<RepoName>, DbError>;

    /// The grouped count row for issues whose `field` timestamp falls inside
    /// `window`. A repo with no matching issues yields zero rows, not an
    /// error.
    async fn issues_in_window(
        &self,
        repo_id: i64,
        field: IssueDateField,
        window: TimeWindow,
    ) -> Result<Vec<RepoIssueCount>, DbError>;

    /// Like [`RepoStore::issues_in_window`], additionally restricted to
    /// issues that are still open (`closed_at IS NULL`).
    async fn open_issues_in_window(
        &self,
        repo_id: i64,
        field: IssueDateField,
        window: TimeWindow,
    ) -> Result<Vec<RepoIssueCount>, DbError>;

    /// The scalar behind [`RepoStore::issues_in_window`]: a repo with no
    /// matching issues counts as `0` instead of "no row".
    async fn count_issues_in_window(
        &self,
        repo_id: i64,
        field: IssueDateField,
        window: TimeWindow,
    ) -> Result<i64, DbError> {
        let rows = self.issues_in_window(repo_id, field, window).await?;
        Ok(rows.first().map(|row| row.issue_count).unwrap_or(0))
    }

    /// The scalar behind [`RepoStore::open_issues_in_window`], with the same
    /// `0` default.
    async fn count_open_issues_in_window(
        &self,
        repo_id: i64,
        field: IssueDateField,
        window: TimeWindow,
    ) -> Result<i64, DbError> {
        let rows = self.open_issues_in_window(repo_id, field, window).await?;
        Ok(rows.first().map(|row| row.issue_count).unwrap_or(0))
    }

    /// All repos with their all-time commit/issue totals, group name, and
    /// normalized URLs, for the overview listing.
    async fn repo_overviews(&self) -> Result<Vec<RepoOverview>, DbError>;

    /// The repos belonging to one group, with the same all-time totals.
    async fn repos_in_group(&self, repo_group_id: i64) -> Result<Vec<GroupRepo>, DbError>;

    /// Looks repos up by the owner segment of their git path plus their
    /// exact name.
    async fn repo_by_git_name(
        &self,
        owner: &str,
        repo_name: &str,
    ) -> Result<Vec<RepoGroupRef>, DbError>;

    /// Looks repos up by group name and repo name, case-insensitively.
    async fn repo_by_group_and_name(
        &self,
        rg_name: &str,
        repo_name: &str,
    ) -> Result<Vec<RepoByName>, DbError>;

    /// Looks repo groups up by name, case-insensitively.
    async fn group_by_name(&self, rg_name: &str) -> Result<Vec<RepoGroup>, DbError>;

    /// Every repo's on-disk checkout path, per the `repo_directory` setting.
    async fn checkout_paths(&self) -> Result<Vec<RepoCheckoutPath>, DbError>;

    /// Issue activity (event count, last event, days open) for every
    /// non-pull-request issue in a repo group, most-stale first.
    async fn issues_for_group(&self, repo_group_id: i64) -> Result<Vec<IssueActivity>, DbError>;

    /// Same as [`RepoStore::issues_for_group`] but for a single repo; rows
    /// carry the repo name as well.
    async fn issues_for_repo(&self, repo_id: i64) -> Result<Vec<IssueActivity>, DbError>;
}

// ==============================================================================
// SQL Templates
// ==============================================================================

/// The windowed count over a caller-selected timestamp column. The column
/// name comes from [`IssueDateField`], never from user input.
fn issue_count_sql(field: IssueDateField) -> String {
    format!(
        r#"
        SELECT repo.repo_id, COUNT(issues.issue_id) AS issue_count
        FROM repo JOIN issues ON repo.repo_id = issues.repo_id
        WHERE repo.repo_id = $1
          AND issues.{col} BETWEEN to_timestamp($2, 'YYYY-MM-DD HH24:MI:SS')
                               AND to_timestamp($3, 'YYYY-MM-DD HH24:MI:SS')
        GROUP BY repo.repo_id
        "#,
        col = field.column()
    )
}

/// Same count restricted to still-open issues: one `WHERE` clause, the
/// open-state filter joined as a conjunct.
fn open_issue_count_sql(field: IssueDateField) -> String {
    format!(
        r#"
        SELECT repo.repo_id, COUNT(issues.issue_id) AS issue_count
        FROM repo JOIN issues ON repo.repo_id = issues.repo_id
        WHERE repo.repo_id = $1
          AND issues.closed_at IS NULL
          AND issues.{col} BETWEEN to_timestamp($2, 'YYYY-MM-DD HH24:MI:SS')
                               AND to_timestamp($3, 'YYYY-MM-DD HH24:MI:SS')
        GROUP BY repo.repo_id
        "#,
        col = field.column()
    )
}

/// The owner/name lookup. The owner travels as a LIKE pattern built by
/// [`owner_path_pattern`].
const REPO_BY_GIT_NAME_SQL: &str = r#"
    SELECT repo.repo_id, repo.repo_group_id, rg_name
    FROM repo JOIN repo_groups ON repo_groups.repo_group_id = repo.repo_group_id
    WHERE repo_name = $1 AND repo_path LIKE $2
    GROUP BY repo_id, rg_name
"#;

/// The group-name + repo-name lookup; both name comparisons fold case.
const REPO_BY_GROUP_AND_NAME_SQL: &str = r#"
    SELECT repo_id, repo.repo_group_id, repo_git AS url
    FROM repo, repo_groups
    WHERE repo.repo_group_id = repo_groups.repo_group_id
      AND LOWER(rg_name) = LOWER($1)
      AND LOWER(repo_name) = LOWER($2)
"#;

/// The group-name lookup, case-folded the same way.
const GROUP_BY_NAME_SQL: &str = r#"
    SELECT repo_group_id, rg_name
    FROM repo_groups
    WHERE LOWER(rg_name) = LOWER($1)
"#;

/// The LIKE pattern matching the owner segment of a git path. The path
/// looks like "github.com/<owner>/", so the trailing `_` wildcard matches
/// the path separator.
fn owner_path_pattern(owner: &str) -> String {
    format!("%{}_", owner)
}

// ==============================================================================
// URL Normalization
// ==============================================================================

/// Strips the transport scheme (`https://`, `git://`, ...) off a clone URL.
/// URLs that already lack a scheme pass through unchanged.
fn strip_url_scheme(url: &str) -> &str {
    match url.split_once("//") {
        Some((_scheme, rest)) => rest,
        None => url,
    }
}

/// Normalizes every overview row: scheme-stripped `url`, plus its base64
/// form for front-ends that embed the URL in request paths.
fn finalize_overviews(mut rows: Vec<RepoOverview>) -> Vec<RepoOverview> {
    for row in &mut rows {
        row.url = strip_url_scheme(&row.url).to_string();
        row.base64_url = BASE64.encode(&row.url);
    }
    rows
}

/// Scheme-strips the `url` on group-membership rows.
fn strip_group_repo_urls(mut rows: Vec<GroupRepo>) -> Vec<GroupRepo> {
    for row in &mut rows {
        row.url = strip_url_scheme(&row.url).to_string();
    }
    rows
}

/// Scheme-strips the `url` on group/name lookup rows.
fn strip_repo_lookup_urls(mut rows: Vec<RepoByName>) -> Vec<RepoByName> {
    for row in &mut rows {
        row.url = strip_url_scheme(&row.url).to_string();
    }
    rows
}

/// Runs a query future under `limit`. Dropping the future cancels the
/// in-flight statement, so a query past its budget (or an abandoned request)
/// does not keep holding a pooled connection.
async fn run_limited<T>(
    limit: Duration,
    query: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, DbError> {
    match tokio::time::timeout(limit, query).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!(timeout = ?limit, "Database query exceeded its time budget.");
            Err(DbError::QueryTimeout(limit))
        }
    }
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool
    /// and the per-query time budget every statement runs under.
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    async fn limited<T>(
        &self,
        query: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, DbError> {
        run_limited(self.statement_timeout, query).await
    }
}

#[async_trait]
impl RepoStore for DbRepository {
    async fn all_repo_names(&self) -> Result<Vec<RepoName>, DbError> {
        let repos = self
            .limited(
                sqlx::query_as::<_, RepoName>(
                    r#"
                    SELECT repo.repo_id, repo.repo_name
                    FROM repo
                    ORDER BY repo.repo_name
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(repos)
    }

    async fn find_repo(&self, repo_id: i64) -> Result<Option<RepoName>, DbError> {
        let repo = self
            .limited(
                sqlx::query_as::<_, RepoName>(
                    r#"
                    SELECT repo.repo_id, repo.repo_name
                    FROM repo
                    WHERE repo.repo_id = $1
                    "#,
                )
                .bind(repo_id)
                .fetch_optional(&self.pool),
            )
            .await?;
        Ok(repo)
    }

    async fn issues_in_window(
        &self,
        repo_id: i64,
        field: IssueDateField,
        window: TimeWindow,
    ) -> Result<Vec<RepoIssueCount>, DbError> {
        let sql = issue_count_sql(field);
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoIssueCount>(&sql)
                    .bind(repo_id)
                    .bind(window.begin_str())
                    .bind(window.end_str())
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }

    async fn open_issues_in_window(
        &self,
        repo_id: i64,
        field: IssueDateField,
        window: TimeWindow,
    ) -> Result<Vec<RepoIssueCount>, DbError> {
        let sql = open_issue_count_sql(field);
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoIssueCount>(&sql)
                    .bind(repo_id)
                    .bind(window.begin_str())
                    .bind(window.end_str())
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }

    async fn repo_overviews(&self) -> Result<Vec<RepoOverview>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoOverview>(
                    r#"
                    SELECT
                        repo.repo_id,
                        repo.repo_name,
                        repo.description,
                        repo.repo_git AS url,
                        repo.repo_status,
                        a.commits_all_time,
                        b.issues_all_time,
                        rg_name,
                        repo.repo_group_id
                    FROM
                        repo
                        LEFT OUTER JOIN
                        (SELECT repo_id, COUNT(DISTINCT commits.cmt_commit_hash) AS commits_all_time
                         FROM commits GROUP BY repo_id) a
                        ON repo.repo_id = a.repo_id
                        LEFT OUTER JOIN
                        (SELECT repo_id, COUNT(*) AS issues_all_time
                         FROM issues WHERE issues.pull_request IS NULL GROUP BY repo_id) b
                        ON repo.repo_id = b.repo_id
                        JOIN repo_groups ON repo_groups.repo_group_id = repo.repo_group_id
                    ORDER BY repo_name
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(finalize_overviews(rows))
    }

    async fn repos_in_group(&self, repo_group_id: i64) -> Result<Vec<GroupRepo>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, GroupRepo>(
                    r#"
                    SELECT
                        repo.repo_id,
                        repo.repo_name,
                        repo.description,
                        repo.repo_git AS url,
                        repo.repo_status,
                        a.commits_all_time,
                        b.issues_all_time
                    FROM
                        repo
                        LEFT OUTER JOIN
                        (SELECT repo_id, COUNT(DISTINCT commits.cmt_commit_hash) AS commits_all_time
                         FROM commits GROUP BY repo_id) a
                        ON repo.repo_id = a.repo_id
                        LEFT OUTER JOIN
                        (SELECT repo_id, COUNT(issues.issue_id) AS issues_all_time
                         FROM issues WHERE issues.pull_request IS NULL GROUP BY repo_id) b
                        ON repo.repo_id = b.repo_id
                        JOIN repo_groups ON repo_groups.repo_group_id = repo.repo_group_id
                    WHERE
                        repo_groups.repo_group_id = $1
                    ORDER BY repo.repo_git
                    "#,
                )
                .bind(repo_group_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(strip_group_repo_urls(rows))
    }

    async fn repo_by_git_name(
        &self,
        owner: &str,
        repo_name: &str,
    ) -> Result<Vec<RepoGroupRef>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoGroupRef>(REPO_BY_GIT_NAME_SQL)
                    .bind(repo_name)
                    .bind(owner_path_pattern(owner))
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }

    async fn repo_by_group_and_name(
        &self,
        rg_name: &str,
        repo_name: &str,
    ) -> Result<Vec<RepoByName>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoByName>(REPO_BY_GROUP_AND_NAME_SQL)
                    .bind(rg_name)
                    .bind(repo_name)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(strip_repo_lookup_urls(rows))
    }

    async fn group_by_name(&self, rg_name: &str) -> Result<Vec<RepoGroup>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoGroup>(GROUP_BY_NAME_SQL)
                    .bind(rg_name)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }

    async fn checkout_paths(&self) -> Result<Vec<RepoCheckoutPath>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, RepoCheckoutPath>(
                    r#"
                    SELECT b.repo_id,
                           a.value || b.repo_group_id || '/' || b.repo_path || b.repo_name AS path
                    FROM settings a, repo b
                    WHERE a.setting = 'repo_directory'
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }

    async fn issues_for_group(&self, repo_group_id: i64) -> Result<Vec<IssueActivity>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, IssueActivity>(
                    r#"
                    SELECT issue_title,
                        issues.issue_id,
                        issues.repo_id,
                        issues.html_url,
                        issue_state                                           AS status,
                        issues.created_at                                     AS date,
                        COUNT(issue_events.event_id)                          AS count,
                        MAX(issue_events.created_at)                          AS last_event_date,
                        (EXTRACT(DAY FROM NOW() - issues.created_at))::bigint AS open_day
                    FROM issues,
                        issue_events
                    WHERE issues.repo_id IN (SELECT repo_id FROM repo WHERE repo_group_id = $1)
                    AND issues.issue_id = issue_events.issue_id
                    AND issues.pull_request IS NULL
                    GROUP BY issues.issue_id
                    ORDER BY open_day DESC
                    "#,
                )
                .bind(repo_group_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }

    async fn issues_for_repo(&self, repo_id: i64) -> Result<Vec<IssueActivity>, DbError> {
        let rows = self
            .limited(
                sqlx::query_as::<_, IssueActivity>(
                    r#"
                    SELECT issue_title,
                        issues.issue_id,
                        issues.repo_id,
                        issues.html_url,
                        issue_state                                           AS status,
                        issues.created_at                                     AS date,
                        COUNT(issue_events.event_id)                          AS count,
                        MAX(issue_events.created_at)                          AS last_event_date,
                        (EXTRACT(DAY FROM NOW() - issues.created_at))::bigint AS open_day,
                        repo_name
                    FROM issues JOIN repo ON issues.repo_id = repo.repo_id, issue_events
                    WHERE issues.repo_id = $1
                    AND issues.pull_request IS NULL
                    AND issues.issue_id = issue_events.issue_id
                    GROUP BY issues.issue_id, repo_name
                    ORDER BY open_day DESC
                    "#,
                )
                .bind(repo_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
    }

    #[test]
    fn issue_date_field_maps_to_column_names() {
        assert_eq!(IssueDateField::CreatedAt.column(), "created_at");
        assert_eq!(IssueDateField::ClosedAt.column(), "closed_at");
    }

    #[test]
    fn past_days_window_spans_back_from_now() {
        let now = sample_now();
        let window = TimeWindow::past_days(now, 7);
        assert_eq!(window.end, now);
        assert_eq!(window.begin, now - chrono::Duration::days(7));
    }

    #[test]
    fn window_bounds_format_with_second_precision() {
        let window = TimeWindow::past_days(sample_now(), 7);
        assert_eq!(window.end_str(), "2025-03-14 09:26:53");
        assert_eq!(window.begin_str(), "2025-03-07 09:26:53");
    }

    #[test]
    fn issue_count_sql_filters_on_the_selected_column() {
        let created = issue_count_sql(IssueDateField::CreatedAt);
        assert!(created.contains("issues.created_at BETWEEN"));

        let closed = issue_count_sql(IssueDateField::ClosedAt);
        assert!(closed.contains("issues.closed_at BETWEEN"));
    }

    #[test]
    fn open_issue_count_sql_has_a_single_where_clause() {
        let sql = open_issue_count_sql(IssueDateField::CreatedAt);
        assert_eq!(sql.matches("WHERE").count(), 1);
        assert!(sql.contains("AND issues.closed_at IS NULL"));
    }

    #[test]
    fn name_lookup_sql_folds_case_on_both_sides() {
        assert!(REPO_BY_GROUP_AND_NAME_SQL.contains("LOWER(rg_name) = LOWER($1)"));
        assert!(REPO_BY_GROUP_AND_NAME_SQL.contains("LOWER(repo_name) = LOWER($2)"));
        assert!(GROUP_BY_NAME_SQL.contains("LOWER(rg_name) = LOWER($1)"));
    }

    #[test]
    fn owner_lookup_wildcards_only_the_path_separator() {
        assert_eq!(owner_path_pattern("octo"), "%octo_");
        assert!(REPO_BY_GIT_NAME_SQL.contains("repo_name = $1"));
        assert!(REPO_BY_GIT_NAME_SQL.contains("repo_path LIKE $2"));
    }

    #[test]
    fn strip_url_scheme_handles_https_git_and_bare_urls() {
        assert_eq!(
            strip_url_scheme("https://github.com/octo/widgets"),
            "github.com/octo/widgets"
        );
        assert_eq!(
            strip_url_scheme("git://gitlab.com/acme/anvils"),
            "gitlab.com/acme/anvils"
        );
        assert_eq!(
            strip_url_scheme("github.com/octo/widgets"),
            "github.com/octo/widgets"
        );
    }

    #[test]
    fn finalize_overviews_strips_and_encodes_urls() {
        let rows = vec![RepoOverview {
            repo_id: 1,
            repo_name: "widgets".to_string(),
            description: None,
            url: "https://github.com/octo/widgets".to_string(),
            repo_status: "Complete".to_string(),
            commits_all_time: Some(12),
            issues_all_time: None,
            rg_name: "octo".to_string(),
            repo_group_id: 3,
            base64_url: String::new(),
        }];

        let rows = finalize_overviews(rows);
        assert_eq!(rows[0].url, "github.com/octo/widgets");
        assert_eq!(rows[0].base64_url, "Z2l0aHViLmNvbS9vY3RvL3dpZGdldHM=");
    }

    #[test]
    fn membership_and_lookup_rows_are_scheme_stripped() {
        let members = strip_group_repo_urls(vec![GroupRepo {
            repo_id: 1,
            repo_name: "widgets".to_string(),
            description: None,
            url: "https://github.com/octo/widgets".to_string(),
            repo_status: "Complete".to_string(),
            commits_all_time: Some(12),
            issues_all_time: Some(3),
        }]);
        assert_eq!(members[0].url, "github.com/octo/widgets");

        let lookups = strip_repo_lookup_urls(vec![RepoByName {
            repo_id: 1,
            repo_group_id: 3,
            url: "git://gitlab.com/acme/anvils".to_string(),
        }]);
        assert_eq!(lookups[0].url, "gitlab.com/acme/anvils");
    }

    #[tokio::test]
    async fn run_limited_passes_successful_queries_through() {
        let result = run_limited(Duration::from_secs(1), async { Ok::<_, sqlx::Error>(41) }).await;
        assert_eq!(result.unwrap(), 41);
    }

    #[tokio::test]
    async fn run_limited_times_out_stalled_queries() {
        let stalled = std::future::pending::<Result<i64, sqlx::Error>>();
        let result = run_limited(Duration::from_millis(5), stalled).await;
        assert!(matches!(result, Err(DbError::QueryTimeout(_))));
    }
}
