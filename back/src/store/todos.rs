use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tally_api::v1::{date, NewTodo, Priority, Todo, TodoPatch};
use uuid::Uuid;

use super::{enum_column, optional_text, required_title, uuid_column, StoreError, StoreResult};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    due_date,
    is_completed,
    completed_at,
    sort_order,
    created_at
FROM todos";

const PRIORITY_RANK_SQL: &str = "CASE priority
    WHEN 'urgent' THEN 3
    WHEN 'high' THEN 2
    WHEN 'medium' THEN 1
    ELSE 0
END";

pub struct TodoRepo<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TodoRepo<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Most urgent first; manual order within a priority, newest first on ties.
    pub fn list(&self) -> StoreResult<Vec<Todo>> {
        let mut statement = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL} ORDER BY {PRIORITY_RANK_SQL} DESC, sort_order ASC, created_at DESC"
        ))?;
        let todos = statement
            .query_map([], todo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(todos)
    }

    pub fn get(&self, id: Uuid) -> StoreResult<Todo> {
        self.conn
            .query_row(
                &format!("{TODO_SELECT_SQL} WHERE id = ?1"),
                params![id.to_string()],
                todo_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound { kind: "todo", id })
    }

    pub fn create(&self, new: &NewTodo, now: DateTime<Utc>) -> StoreResult<Todo> {
        let title = required_title(Some(new.title.as_str()), "Title is required")?;
        let priority = new.priority.unwrap_or_default();

        let todo = Todo {
            id: Uuid::new_v4(),
            title,
            description: optional_text(new.description.as_deref()),
            priority,
            due_date: new.due_date.as_deref().and_then(date::parse_local_noon),
            is_completed: false,
            completed_at: None,
            order: self.top_order(priority)?,
            created_at: now,
        };

        self.conn.execute(
            "INSERT INTO todos (
                id,
                title,
                description,
                priority,
                due_date,
                is_completed,
                completed_at,
                sort_order,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                todo.id.to_string(),
                todo.title,
                todo.description,
                todo.priority.as_str(),
                todo.due_date,
                todo.is_completed,
                todo.completed_at,
                todo.order,
                todo.created_at,
            ],
        )?;

        Ok(todo)
    }

    /// A patch carrying only `is_completed` toggles completion; any other
    /// patch is a full update and needs a title.
    pub fn update(&self, id: Uuid, patch: &TodoPatch, now: DateTime<Utc>) -> StoreResult<Todo> {
        let mut todo = self.get(id)?;

        if !patch.is_completion_toggle() {
            todo.title = required_title(
                patch.title.as_deref(),
                "Title is required for full updates",
            )?;

            if let Some(description) = &patch.description {
                todo.description = optional_text(description.as_deref());
            }
            if let Some(priority) = patch.priority {
                todo.priority = priority;
            }
            if let Some(due_date) = &patch.due_date {
                todo.due_date = due_date.as_deref().and_then(date::parse_local_noon);
            }
        }

        if let Some(is_completed) = patch.is_completed {
            set_completion(&mut todo, is_completed, now);
        }

        self.conn.execute(
            "UPDATE todos SET
                title = ?2,
                description = ?3,
                priority = ?4,
                due_date = ?5,
                is_completed = ?6,
                completed_at = ?7
            WHERE id = ?1",
            params![
                todo.id.to_string(),
                todo.title,
                todo.description,
                todo.priority.as_str(),
                todo.due_date,
                todo.is_completed,
                todo.completed_at,
            ],
        )?;

        Ok(todo)
    }

    pub fn delete(&self, id: Uuid) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id.to_string()])?;

        if deleted == 0 {
            return Err(StoreError::NotFound { kind: "todo", id });
        }

        Ok(())
    }

    /// Same all-or-nothing contract as [`super::GoalRepo::reorder`].
    pub fn reorder(&self, ids: &[Uuid]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut statement = tx.prepare("UPDATE todos SET sort_order = ?1 WHERE id = ?2")?;
            for (position, id) in ids.iter().enumerate() {
                if statement.execute(params![position as i64, id.to_string()])? == 0 {
                    return Err(StoreError::NotFound {
                        kind: "todo",
                        id: *id,
                    });
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn top_order(&self, priority: Priority) -> StoreResult<i64> {
        let min: Option<i64> = self.conn.query_row(
            "SELECT MIN(sort_order) FROM todos WHERE priority = ?1",
            params![priority.as_str()],
            |row| row.get(0),
        )?;

        Ok(min.map_or(0, |min| min - 1))
    }
}

fn set_completion(todo: &mut Todo, is_completed: bool, now: DateTime<Utc>) {
    todo.completed_at = match (todo.is_completed, is_completed) {
        (_, false) => None,
        (false, true) => Some(now),
        (true, true) => todo.completed_at.or(Some(now)),
    };
    todo.is_completed = is_completed;
}

fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: enum_column(row, 3)?,
        due_date: row.get(4)?,
        is_completed: row.get(5)?,
        completed_at: row.get(6)?,
        order: row.get(7)?,
        created_at: row.get(8)?,
    })
}
