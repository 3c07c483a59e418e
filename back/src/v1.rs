use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use tally_api::v1::{
    date, CompletionDate, Goal, GoalCompletion, GoalPatch, Health, NewGoal, NewTodo,
    ReorderGoals, ReorderTodos, Success, Todo, TodoPatch,
};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    extract::{Id, Payload},
    store::{GoalRepo, TodoRepo},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/goals", get(get_goals).post(create_goal))
        .route("/goals/reorder", post(reorder_goals))
        .route("/goals/:id", put(update_goal).delete(delete_goal))
        .route("/goals/:id/complete", post(toggle_goal))
        .route(
            "/goals/:id/completions",
            post(add_completion).delete(remove_completion),
        )
        .route("/todos", get(get_todos).post(create_todo))
        .route("/todos/reorder", post(reorder_todos))
        .route("/todos/:id", put(update_todo).delete(delete_todo))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: String::from("ok"),
        version: String::from(env!("CARGO_PKG_VERSION")),
    })
}

async fn get_goals(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Goal>>> {
    let conn = state.db.lock().await;
    let goals = GoalRepo::new(&conn).list()?;
    Ok(Json(goals))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    Payload(new): Payload<NewGoal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let conn = state.db.lock().await;
    let goal = GoalRepo::new(&conn).create(&new, Utc::now())?;

    info!(
        id = %goal.id,
        title = %goal.title,
        goal_type = %goal.goal_type,
        "created goal"
    );

    Ok((StatusCode::CREATED, Json(goal)))
}

async fn update_goal(
    State(state): State<Arc<AppState>>,
    Id(id): Id,
    Payload(patch): Payload<GoalPatch>,
) -> ApiResult<Json<Goal>> {
    let conn = state.db.lock().await;
    let goal = GoalRepo::new(&conn).update(id, &patch, Utc::now())?;

    info!(
        id = %goal.id,
        status = %goal.status,
        order = goal.order,
        "updated goal"
    );

    Ok(Json(goal))
}

async fn delete_goal(State(state): State<Arc<AppState>>, Id(id): Id) -> ApiResult<Json<Success>> {
    let conn = state.db.lock().await;
    GoalRepo::new(&conn).delete(id)?;

    info!(%id, "deleted goal");

    Ok(Json(Success::OK))
}

async fn toggle_goal(State(state): State<Arc<AppState>>, Id(id): Id) -> ApiResult<Json<Goal>> {
    let conn = state.db.lock().await;
    let goal = GoalRepo::new(&conn).toggle_one_time(id, Utc::now())?;

    info!(
        id = %goal.id,
        is_completed = goal.is_completed,
        "toggled one-time goal"
    );

    Ok(Json(goal))
}

async fn add_completion(
    State(state): State<Arc<AppState>>,
    Id(id): Id,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<GoalCompletion>)> {
    let day = completion_day(&body)?;

    let conn = state.db.lock().await;
    let completion = GoalRepo::new(&conn).add_completion(id, day, Utc::now())?;

    info!(goal = %id, %day, "added completion");

    Ok((StatusCode::CREATED, Json(completion)))
}

async fn remove_completion(
    State(state): State<Arc<AppState>>,
    Id(id): Id,
    body: Bytes,
) -> ApiResult<Json<Success>> {
    let day = completion_day(&body)?;

    let conn = state.db.lock().await;
    let removed = GoalRepo::new(&conn).remove_completions(id, day)?;

    info!(goal = %id, %day, removed, "removed completions");

    Ok(Json(Success::OK))
}

async fn reorder_goals(
    State(state): State<Arc<AppState>>,
    Payload(body): Payload<ReorderGoals>,
) -> ApiResult<Json<Success>> {
    let conn = state.db.lock().await;
    GoalRepo::new(&conn).reorder(&body.goal_ids)?;

    info!(count = body.goal_ids.len(), "reordered goals");

    Ok(Json(Success::OK))
}

async fn get_todos(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Todo>>> {
    let conn = state.db.lock().await;
    let todos = TodoRepo::new(&conn).list()?;
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Payload(new): Payload<NewTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let conn = state.db.lock().await;
    let todo = TodoRepo::new(&conn).create(&new, Utc::now())?;

    info!(
        id = %todo.id,
        title = %todo.title,
        priority = %todo.priority,
        "created todo"
    );

    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Id(id): Id,
    Payload(patch): Payload<TodoPatch>,
) -> ApiResult<Json<Todo>> {
    let conn = state.db.lock().await;
    let todo = TodoRepo::new(&conn).update(id, &patch, Utc::now())?;

    info!(
        id = %todo.id,
        is_completed = todo.is_completed,
        "updated todo"
    );

    Ok(Json(todo))
}

async fn delete_todo(State(state): State<Arc<AppState>>, Id(id): Id) -> ApiResult<Json<Success>> {
    let conn = state.db.lock().await;
    TodoRepo::new(&conn).delete(id)?;

    info!(%id, "deleted todo");

    Ok(Json(Success::OK))
}

async fn reorder_todos(
    State(state): State<Arc<AppState>>,
    Payload(body): Payload<ReorderTodos>,
) -> ApiResult<Json<Success>> {
    let conn = state.db.lock().await;
    TodoRepo::new(&conn).reorder(&body.todo_ids)?;

    info!(count = body.todo_ids.len(), "reordered todos");

    Ok(Json(Success::OK))
}

/// Calendar day named by an optional completion body, today when the body is
/// empty. A body that isn't a `{ "date"?: string }` object is rejected; a date
/// string that doesn't parse is treated as absent.
fn completion_day(body: &[u8]) -> ApiResult<chrono::NaiveDate> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(date::today());
    }

    let Json(CompletionDate { date: requested }) =
        Json::<CompletionDate>::from_bytes(body).map_err(ApiError::from)?;

    let day = match requested.as_deref().map(|raw| (raw, date::parse_day(raw))) {
        Some((_, Some(day))) => day,
        Some((raw, None)) => {
            warn!(date = raw, "ignoring unparseable completion date");
            date::today()
        }
        None => date::today(),
    };

    Ok(day)
}
