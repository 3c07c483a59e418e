//! Client-side copy of the goal and todo lists.
//!
//! Every mutation goes to the server first and the affected list is then read
//! back in full; the board never patches its lists from a partial response.

use chrono::{DateTime, NaiveDate, Utc};
use tally_api::v1::{Goal, GoalPatch, GoalStatus, GoalType, NewGoal, NewTodo, Todo};
use tracing::info;
use uuid::Uuid;

use crate::api::Client;

/// What toggling a daily goal does for a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionAction {
    Add,
    Remove,
}

impl CompletionAction {
    pub fn for_goal(goal: &Goal, today: NaiveDate) -> Self {
        if goal.completed_today(today) {
            CompletionAction::Remove
        } else {
            CompletionAction::Add
        }
    }
}

/// A goal or todo list split the way it is displayed.
#[derive(Debug, PartialEq)]
pub struct Sections<'a, T> {
    pub active: Vec<&'a T>,
    pub completed: Vec<&'a T>,
}

#[derive(Clone, Debug, Default)]
pub struct Board {
    goals: Vec<Goal>,
    todos: Vec<Todo>,
}

impl Board {
    pub fn new(goals: Vec<Goal>, todos: Vec<Todo>) -> Self {
        Self { goals, todos }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn goal(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    pub fn todo(&self, id: Uuid) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Goals of one type, split into active and completed. Daily goals count
    /// as completed once done today; one-time goals once marked completed.
    pub fn goal_sections(&self, goal_type: GoalType, today: NaiveDate) -> Sections<'_, Goal> {
        let (completed, active): (Vec<&Goal>, Vec<&Goal>) = self
            .goals
            .iter()
            .filter(|goal| goal.goal_type == goal_type)
            .partition(|goal| match goal.goal_type {
                GoalType::Daily => goal.completed_today(today),
                GoalType::OneTime => goal.is_completed,
            });

        Sections { active, completed }
    }

    pub fn todo_sections(&self) -> Sections<'_, Todo> {
        let (completed, active): (Vec<&Todo>, Vec<&Todo>) =
            self.todos.iter().partition(|todo| todo.is_completed);
        Sections { active, completed }
    }

    pub fn daily_goals(&self, today: NaiveDate) -> Sections<'_, Goal> {
        self.goal_sections(GoalType::Daily, today)
    }

    pub fn one_time_goals(&self, today: NaiveDate) -> Sections<'_, Goal> {
        self.goal_sections(GoalType::OneTime, today)
    }

    pub fn active_todos(&self) -> Vec<&Todo> {
        self.todo_sections().active
    }

    pub fn completed_todos(&self) -> Vec<&Todo> {
        self.todo_sections().completed
    }

    /// Current streak of a goal, `None` if the board doesn't hold it.
    pub fn streak(&self, goal_id: Uuid, today: NaiveDate) -> Option<u32> {
        self.goal(goal_id).map(|goal| goal.streak(today))
    }

    pub fn overdue_todos(&self, now: DateTime<Utc>) -> Vec<&Todo> {
        self.todos.iter().filter(|todo| todo.is_overdue(now)).collect()
    }

    pub async fn refresh(&mut self, client: &Client) -> eyre::Result<()> {
        self.refresh_goals(client).await?;
        self.refresh_todos(client).await
    }

    pub async fn refresh_goals(&mut self, client: &Client) -> eyre::Result<()> {
        self.goals = client.get_goals().await?;
        Ok(())
    }

    pub async fn refresh_todos(&mut self, client: &Client) -> eyre::Result<()> {
        self.todos = client.get_todos().await?;
        Ok(())
    }

    pub async fn add_goal(&mut self, client: &Client, goal: &NewGoal) -> eyre::Result<()> {
        let goal = client.create_goal(goal).await?;
        info!(id = %goal.id, title = %goal.title, "added goal");
        self.refresh_goals(client).await
    }

    pub async fn add_todo(&mut self, client: &Client, todo: &NewTodo) -> eyre::Result<()> {
        let todo = client.create_todo(todo).await?;
        info!(id = %todo.id, title = %todo.title, "added todo");
        self.refresh_todos(client).await
    }

    /// Marks a daily goal done for `today`, or undoes it if it already is.
    pub async fn toggle_daily(
        &mut self,
        client: &Client,
        goal_id: Uuid,
        today: NaiveDate,
    ) -> eyre::Result<()> {
        let goal = self
            .goal(goal_id)
            .ok_or_else(|| eyre::eyre!("Unknown goal {goal_id}"))?;

        match CompletionAction::for_goal(goal, today) {
            CompletionAction::Add => {
                client.add_completion(goal_id, Some(today)).await?;
            }
            CompletionAction::Remove => {
                client.remove_completion(goal_id, Some(today)).await?;
            }
        }

        self.refresh_goals(client).await
    }

    pub async fn toggle_one_time(&mut self, client: &Client, goal_id: Uuid) -> eyre::Result<()> {
        client.toggle_one_time_goal(goal_id).await?;
        self.refresh_goals(client).await
    }

    pub async fn set_status(
        &mut self,
        client: &Client,
        goal_id: Uuid,
        status: GoalStatus,
    ) -> eyre::Result<()> {
        let patch = GoalPatch {
            status: Some(status),
            ..GoalPatch::default()
        };
        client.update_goal(goal_id, &patch).await?;
        self.refresh_goals(client).await
    }

    pub async fn toggle_todo(&mut self, client: &Client, todo_id: Uuid) -> eyre::Result<()> {
        let todo = self
            .todo(todo_id)
            .ok_or_else(|| eyre::eyre!("Unknown todo {todo_id}"))?;

        client.set_todo_completed(todo_id, !todo.is_completed).await?;
        self.refresh_todos(client).await
    }

    pub async fn delete_goal(&mut self, client: &Client, goal_id: Uuid) -> eyre::Result<()> {
        client.delete_goal(goal_id).await?;
        self.refresh_goals(client).await
    }

    pub async fn delete_todo(&mut self, client: &Client, todo_id: Uuid) -> eyre::Result<()> {
        client.delete_todo(todo_id).await?;
        self.refresh_todos(client).await
    }

    pub async fn reorder_goals(&mut self, client: &Client, ids: Vec<Uuid>) -> eyre::Result<()> {
        client.reorder_goals(ids).await?;
        self.refresh_goals(client).await
    }

    pub async fn reorder_todos(&mut self, client: &Client, ids: Vec<Uuid>) -> eyre::Result<()> {
        client.reorder_todos(ids).await?;
        self.refresh_todos(client).await
    }
}
