use chrono::NaiveDate;
use eyre::Context;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tally_api::v1::{
    CompletionDate, ErrorBody, Goal, GoalCompletion, GoalPatch, Health, NewGoal, NewTodo,
    ReorderGoals, ReorderTodos, Success, Todo, TodoPatch,
};
use tracing::debug;
use uuid::Uuid;

/// HTTP client for the tracker API.
#[derive(Clone, Debug)]
pub struct Client {
    base: String,
    http: reqwest::Client,
}

impl Client {
    /// `base` is the API root, e.g. `http://localhost:7890/api`.
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_http(base, reqwest::Client::new())
    }

    pub fn with_http(base: impl Into<String>, http: reqwest::Client) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, http }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn health(&self) -> eyre::Result<Health> {
        self.send(self.request(Method::GET, "/health")).await
    }

    pub async fn get_goals(&self) -> eyre::Result<Vec<Goal>> {
        self.send(self.request(Method::GET, "/goals")).await
    }

    pub async fn create_goal(&self, goal: &NewGoal) -> eyre::Result<Goal> {
        self.send(self.request(Method::POST, "/goals").json(goal))
            .await
    }

    pub async fn update_goal(&self, id: Uuid, patch: &GoalPatch) -> eyre::Result<Goal> {
        let path = format!("/goals/{id}");
        self.send(self.request(Method::PUT, &path).json(patch)).await
    }

    pub async fn delete_goal(&self, id: Uuid) -> eyre::Result<()> {
        let path = format!("/goals/{id}");
        self.success(self.request(Method::DELETE, &path)).await
    }

    pub async fn toggle_one_time_goal(&self, id: Uuid) -> eyre::Result<Goal> {
        let path = format!("/goals/{id}/complete");
        self.send(self.request(Method::POST, &path)).await
    }

    pub async fn add_completion(
        &self,
        id: Uuid,
        date: Option<NaiveDate>,
    ) -> eyre::Result<GoalCompletion> {
        let path = format!("/goals/{id}/completions");
        let body = completion_body(date);
        self.send(self.request(Method::POST, &path).json(&body))
            .await
    }

    pub async fn remove_completion(&self, id: Uuid, date: Option<NaiveDate>) -> eyre::Result<()> {
        let path = format!("/goals/{id}/completions");
        let body = completion_body(date);
        self.success(self.request(Method::DELETE, &path).json(&body))
            .await
    }

    pub async fn reorder_goals(&self, goal_ids: Vec<Uuid>) -> eyre::Result<()> {
        let body = ReorderGoals { goal_ids };
        self.success(self.request(Method::POST, "/goals/reorder").json(&body))
            .await
    }

    pub async fn get_todos(&self) -> eyre::Result<Vec<Todo>> {
        self.send(self.request(Method::GET, "/todos")).await
    }

    pub async fn create_todo(&self, todo: &NewTodo) -> eyre::Result<Todo> {
        self.send(self.request(Method::POST, "/todos").json(todo))
            .await
    }

    pub async fn update_todo(&self, id: Uuid, patch: &TodoPatch) -> eyre::Result<Todo> {
        let path = format!("/todos/{id}");
        self.send(self.request(Method::PUT, &path).json(patch)).await
    }

    pub async fn set_todo_completed(&self, id: Uuid, is_completed: bool) -> eyre::Result<Todo> {
        self.update_todo(id, &TodoPatch::completion(is_completed))
            .await
    }

    pub async fn delete_todo(&self, id: Uuid) -> eyre::Result<()> {
        let path = format!("/todos/{id}");
        self.success(self.request(Method::DELETE, &path)).await
    }

    pub async fn reorder_todos(&self, todo_ids: Vec<Uuid>) -> eyre::Result<()> {
        let body = ReorderTodos { todo_ids };
        self.success(self.request(Method::POST, "/todos/reorder").json(&body))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> eyre::Result<T> {
        let response = check(request.send().await?).await?;
        response.json().await.wrap_err("Malformed response body")
    }

    async fn success(&self, request: RequestBuilder) -> eyre::Result<()> {
        let Success { success } = self.send(request).await?;
        eyre::ensure!(success, "Server did not confirm the request");
        Ok(())
    }
}

fn completion_body(date: Option<NaiveDate>) -> CompletionDate {
    CompletionDate {
        date: date.map(|date| date.format("%Y-%m-%d").to_string()),
    }
}

/// Turns a non-2xx response into an error carrying the server's message.
async fn check(response: Response) -> eyre::Result<Response> {
    let status = response.status();
    debug!(url = %response.url(), %status, "api response");

    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };

    eyre::bail!("{} ({})", message, status.as_u16())
}
