use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tally_api::v1::{date, Goal, GoalCompletion, GoalPatch, GoalStatus, GoalType, NewGoal};
use uuid::Uuid;

use super::{
    enum_column, is_unique_violation, optional_text, required_title, uuid_column, StoreError,
    StoreResult,
};

const GOAL_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    goal_type,
    status,
    completed_at,
    target_date,
    sort_order,
    created_at
FROM goals";

const COMPLETION_SELECT_SQL: &str = "SELECT id, goal_id, date, created_at FROM goal_completions";

pub struct GoalRepo<'conn> {
    conn: &'conn Connection,
}

impl<'conn> GoalRepo<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// All goals, grouped by type and then by manual order, each carrying its
    /// completions newest first.
    pub fn list(&self) -> StoreResult<Vec<Goal>> {
        let mut statement = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL} ORDER BY goal_type ASC, sort_order ASC, created_at DESC"
        ))?;
        let mut goals = statement
            .query_map([], goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut statement = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL} ORDER BY date DESC"
        ))?;
        let mut completions: HashMap<Uuid, Vec<GoalCompletion>> = HashMap::new();
        for completion in statement.query_map([], completion_from_row)? {
            let completion = completion?;
            completions
                .entry(completion.goal_id)
                .or_default()
                .push(completion);
        }

        for goal in &mut goals {
            goal.completions = completions.remove(&goal.id).unwrap_or_default();
        }

        Ok(goals)
    }

    pub fn get(&self, id: Uuid) -> StoreResult<Goal> {
        let mut goal = self
            .conn
            .query_row(
                &format!("{GOAL_SELECT_SQL} WHERE id = ?1"),
                params![id.to_string()],
                goal_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound { kind: "goal", id })?;

        let mut statement = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL} WHERE goal_id = ?1 ORDER BY date DESC"
        ))?;
        goal.completions = statement
            .query_map(params![id.to_string()], completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(goal)
    }

    pub fn create(&self, new: &NewGoal, now: DateTime<Utc>) -> StoreResult<Goal> {
        let title = required_title(Some(new.title.as_str()), "Title is required")?;
        let goal_type = new.goal_type.unwrap_or_default();
        let status = new.status.unwrap_or_default();
        let completed_at = status.completes(goal_type).then_some(now);
        let target_date = new.target_date.as_deref().and_then(date::parse_local_noon);
        let order = self.top_order(goal_type)?;

        let goal = Goal {
            id: Uuid::new_v4(),
            title,
            description: optional_text(new.description.as_deref()),
            goal_type,
            status,
            is_completed: completed_at.is_some(),
            completed_at,
            target_date,
            order,
            created_at: now,
            completions: Vec::new(),
        };

        self.conn.execute(
            "INSERT INTO goals (
                id,
                title,
                description,
                goal_type,
                status,
                completed_at,
                target_date,
                sort_order,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                goal.id.to_string(),
                goal.title,
                goal.description,
                goal.goal_type.as_str(),
                goal.status.as_str(),
                goal.completed_at,
                goal.target_date,
                goal.order,
                goal.created_at,
            ],
        )?;

        Ok(goal)
    }

    /// Applies the fields present in `patch`. Moving a goal into or out of a
    /// completing status stamps or clears `completed_at`; moving it to another
    /// type puts it first there unless `patch` also sets an order.
    pub fn update(&self, id: Uuid, patch: &GoalPatch, now: DateTime<Utc>) -> StoreResult<Goal> {
        let mut goal = self.get(id)?;

        if patch.is_empty() {
            return Err(StoreError::Validation("Title is required".to_string()));
        }

        if let Some(title) = &patch.title {
            goal.title = required_title(Some(title.as_str()), "Title is required")?;
        }
        if let Some(description) = &patch.description {
            goal.description = optional_text(description.as_deref());
        }
        if let Some(goal_type) = patch.goal_type {
            if goal_type != goal.goal_type {
                goal.order = self.top_order(goal_type)?;
                goal.goal_type = goal_type;
            }
        }
        if let Some(status) = patch.status {
            goal.status = status;
        }
        if let Some(order) = patch.order {
            goal.order = order;
        }
        if let Some(target_date) = &patch.target_date {
            goal.target_date = target_date.as_deref().and_then(date::parse_local_noon);
        }

        set_completion(&mut goal, now);

        self.conn.execute(
            "UPDATE goals SET
                title = ?2,
                description = ?3,
                goal_type = ?4,
                status = ?5,
                completed_at = ?6,
                target_date = ?7,
                sort_order = ?8
            WHERE id = ?1",
            params![
                goal.id.to_string(),
                goal.title,
                goal.description,
                goal.goal_type.as_str(),
                goal.status.as_str(),
                goal.completed_at,
                goal.target_date,
                goal.order,
            ],
        )?;

        Ok(goal)
    }

    /// Removes the goal; its completions go with it through the foreign key.
    pub fn delete(&self, id: Uuid) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![id.to_string()])?;

        if deleted == 0 {
            return Err(StoreError::NotFound { kind: "goal", id });
        }

        Ok(())
    }

    /// Flips a one-time goal between `completed` and `in-progress`.
    pub fn toggle_one_time(&self, id: Uuid, now: DateTime<Utc>) -> StoreResult<Goal> {
        let mut goal = self.get(id)?;

        if goal.goal_type != GoalType::OneTime {
            return Err(StoreError::Validation(
                "This goal is not a one-time goal".to_string(),
            ));
        }

        goal.status = match goal.status {
            GoalStatus::Completed => GoalStatus::InProgress,
            _ => GoalStatus::Completed,
        };
        set_completion(&mut goal, now);

        self.conn.execute(
            "UPDATE goals SET status = ?2, completed_at = ?3 WHERE id = ?1",
            params![goal.id.to_string(), goal.status.as_str(), goal.completed_at],
        )?;

        Ok(goal)
    }

    pub fn add_completion(
        &self,
        goal_id: Uuid,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> StoreResult<GoalCompletion> {
        if !self.exists(goal_id)? {
            return Err(StoreError::NotFound {
                kind: "goal",
                id: goal_id,
            });
        }

        let completion = GoalCompletion {
            id: Uuid::new_v4(),
            goal_id,
            date: day,
            created_at: now,
        };

        let inserted = self.conn.execute(
            "INSERT INTO goal_completions (id, goal_id, date, created_at)
            VALUES (?1, ?2, ?3, ?4)",
            params![
                completion.id.to_string(),
                completion.goal_id.to_string(),
                completion.date,
                completion.created_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(completion),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(
                "Completion already exists for this date".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the goal's completions in `[day, day + 1)`. Returns how many
    /// were removed.
    pub fn remove_completions(&self, goal_id: Uuid, day: NaiveDate) -> StoreResult<usize> {
        let next = day.succ_opt().unwrap_or(NaiveDate::MAX);
        let removed = self.conn.execute(
            "DELETE FROM goal_completions WHERE goal_id = ?1 AND date >= ?2 AND date < ?3",
            params![goal_id.to_string(), day, next],
        )?;

        Ok(removed)
    }

    /// Gives each listed goal its index as sort position. Either every id is
    /// updated or, if one is unknown, none are.
    pub fn reorder(&self, ids: &[Uuid]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut statement = tx.prepare("UPDATE goals SET sort_order = ?1 WHERE id = ?2")?;
            for (position, id) in ids.iter().enumerate() {
                let updated = statement.execute(params![position as i64, id.to_string()])?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        kind: "goal",
                        id: *id,
                    });
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn exists(&self, id: Uuid) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM goals WHERE id = ?1",
                params![id.to_string()],
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }

    /// Sort position that puts a new goal first within its type.
    fn top_order(&self, goal_type: GoalType) -> StoreResult<i64> {
        let min: Option<i64> = self.conn.query_row(
            "SELECT MIN(sort_order) FROM goals WHERE goal_type = ?1",
            params![goal_type.as_str()],
            |row| row.get(0),
        )?;

        Ok(min.map_or(0, |min| min - 1))
    }
}

fn set_completion(goal: &mut Goal, now: DateTime<Utc>) {
    let completed = goal.status.completes(goal.goal_type);

    goal.completed_at = match (goal.is_completed, completed) {
        (_, false) => None,
        (false, true) => Some(now),
        (true, true) => goal.completed_at.or(Some(now)),
    };
    goal.is_completed = completed;
}

fn goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    let goal_type: GoalType = enum_column(row, 3)?;
    let status: GoalStatus = enum_column(row, 4)?;

    Ok(Goal {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        goal_type,
        status,
        is_completed: status.completes(goal_type),
        completed_at: row.get(5)?,
        target_date: row.get(6)?,
        order: row.get(7)?,
        created_at: row.get(8)?,
        completions: Vec::new(),
    })
}

fn completion_from_row(row: &Row) -> rusqlite::Result<GoalCompletion> {
    Ok(GoalCompletion {
        id: uuid_column(row, 0)?,
        goal_id: uuid_column(row, 1)?,
        date: row.get(2)?,
        created_at: row.get(3)?,
    })
}
