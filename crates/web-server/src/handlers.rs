use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use database::{
    GroupRepo, IssueActivity, IssueDateField, RepoByName, RepoCheckoutPath, RepoGroup,
    RepoGroupRef, RepoIssueCount, RepoName, RepoOverview, TimeWindow,
};
use serde::Serialize;
use std::sync::Arc;

/// The merged row answering the repo status endpoint: the repo's identity
/// plus its four windowed issue counts.
#[derive(Debug, Serialize)]
pub struct RepoStatus {
    pub repo_id: i64,
    pub repo_name: String,
    pub issues_created_past_week: i64,
    pub issues_created_past_year: i64,
    pub issues_closed_past_week: i64,
    pub issues_closed_past_year: i64,
}

#[derive(Debug, Serialize)]
pub struct PortInfo {
    pub port: u16,
}

/// # GET /giants-project/repos
pub async fn get_repo_names(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoName>>, AppError> {
    let repos = state.store.all_repo_names().await?;
    Ok(Json(repos))
}

/// # GET /giants-project/status/:repo_id
/// Looks the repo up first (unknown ids are a 404, not an empty row), then
/// counts issues created and closed over the past week and past year. The
/// body is a one-element array to keep the listing shape.
pub async fn get_repo_status(
    WithRejection(Path(repo_id), _): WithRejection<Path<i64>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoStatus>>, AppError> {
    let repo = state
        .store
        .find_repo(repo_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repo {} not found", repo_id)))?;

    let now = Utc::now().naive_utc();
    let past_week = TimeWindow::past_days(now, 7);
    let past_year = TimeWindow::past_days(now, 365);

    let store = &state.store;
    let status = RepoStatus {
        repo_id: repo.repo_id,
        repo_name: repo.repo_name,
        issues_created_past_week: store
            .count_issues_in_window(repo_id, IssueDateField::CreatedAt, past_week)
            .await?,
        issues_created_past_year: store
            .count_issues_in_window(repo_id, IssueDateField::CreatedAt, past_year)
            .await?,
        issues_closed_past_week: store
            .count_issues_in_window(repo_id, IssueDateField::ClosedAt, past_week)
            .await?,
        issues_closed_past_year: store
            .count_issues_in_window(repo_id, IssueDateField::ClosedAt, past_year)
            .await?,
    };

    Ok(Json(vec![status]))
}

/// # GET /giants-project/test1/:repo_id
/// The raw grouped rows for issues created in the past week. A repo with no
/// matching issues (or an unknown id) answers with an empty array.
pub async fn get_recent_issue_counts(
    WithRejection(Path(repo_id), _): WithRejection<Path<i64>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoIssueCount>>, AppError> {
    let window = TimeWindow::past_days(Utc::now().naive_utc(), 7);
    let rows = state
        .store
        .issues_in_window(repo_id, IssueDateField::CreatedAt, window)
        .await?;
    Ok(Json(rows))
}

/// # GET /repos
/// Every repo with its all-time commit/issue totals, group name, and
/// normalized URLs.
pub async fn get_repo_overviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoOverview>>, AppError> {
    let repos = state.store.repo_overviews().await?;
    Ok(Json(repos))
}

/// # GET /repo-groups/:repo_group_id/repos
pub async fn get_group_repos(
    WithRejection(Path(repo_group_id), _): WithRejection<Path<i64>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupRepo>>, AppError> {
    let repos = state.store.repos_in_group(repo_group_id).await?;
    Ok(Json(repos))
}

/// # GET /owner/:owner/name/:repo
pub async fn get_repo_by_git_name(
    Path((owner, repo)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoGroupRef>>, AppError> {
    let repos = state.store.repo_by_git_name(&owner, &repo).await?;
    Ok(Json(repos))
}

/// # GET /rg-name/:rg_name/repo-name/:repo_name
pub async fn get_repo_by_group_and_name(
    Path((rg_name, repo_name)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoByName>>, AppError> {
    let repos = state
        .store
        .repo_by_group_and_name(&rg_name, &repo_name)
        .await?;
    Ok(Json(repos))
}

/// # GET /rg-name/:rg_name
pub async fn get_group_by_name(
    Path(rg_name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoGroup>>, AppError> {
    let groups = state.store.group_by_name(&rg_name).await?;
    Ok(Json(groups))
}

/// # GET /dosocs/repos
/// Where each repo is checked out on disk, per the `repo_directory` setting.
pub async fn get_checkout_paths(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RepoCheckoutPath>>, AppError> {
    let paths = state.store.checkout_paths().await?;
    Ok(Json(paths))
}

/// # GET /repo-groups/:repo_group_id/get-issues
pub async fn get_group_issues(
    WithRejection(Path(repo_group_id), _): WithRejection<Path<i64>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IssueActivity>>, AppError> {
    let issues = state.store.issues_for_group(repo_group_id).await?;
    Ok(Json(issues))
}

/// # GET /repos/:repo_id/get-issues
pub async fn get_repo_issues(
    WithRejection(Path(repo_id), _): WithRejection<Path<i64>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IssueActivity>>, AppError> {
    let issues = state.store.issues_for_repo(repo_id).await?;
    Ok(Json(issues))
}

/// # GET /api-port
/// Reports the port this instance was configured to serve on.
pub async fn get_api_port(State(state): State<Arc<AppState>>) -> Json<PortInfo> {
    Json(PortInfo {
        port: state.server.port,
    })
}
