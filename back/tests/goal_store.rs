use chrono::{Days, Duration, NaiveDate, Utc};
use tally_api::v1::{date, GoalPatch, GoalStatus, GoalType, NewGoal};
use tally_back::db::open_db_in_memory;
use tally_back::store::{GoalRepo, StoreError};
use uuid::Uuid;

fn new_goal(title: &str, goal_type: GoalType) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        goal_type: Some(goal_type),
        ..NewGoal::default()
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn create_applies_defaults() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);

    let goal = repo
        .create(
            &NewGoal {
                title: "  Exercise ".to_string(),
                description: Some("   ".to_string()),
                ..NewGoal::default()
            },
            Utc::now(),
        )
        .unwrap();

    assert_eq!(goal.title, "Exercise");
    assert_eq!(goal.description, None);
    assert_eq!(goal.goal_type, GoalType::Daily);
    assert_eq!(goal.status, GoalStatus::InProgress);
    assert!(!goal.is_completed);
    assert_eq!(goal.completed_at, None);

    let loaded = repo.get(goal.id).unwrap();
    assert_eq!(loaded.title, "Exercise");
    assert_eq!(loaded.created_at, goal.created_at);
}

#[test]
fn create_rejects_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);

    let err = repo.create(&new_goal("  ", GoalType::Daily), Utc::now()).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn target_date_is_local_noon_and_garbage_is_dropped() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);

    let goal = repo
        .create(
            &NewGoal {
                title: "Ship it".to_string(),
                goal_type: Some(GoalType::OneTime),
                target_date: Some("2025-12-24".to_string()),
                ..NewGoal::default()
            },
            Utc::now(),
        )
        .unwrap();
    assert_eq!(date::local_day(goal.target_date.unwrap()), day(2025, 12, 24));

    let goal = repo
        .create(
            &NewGoal {
                title: "Someday".to_string(),
                target_date: Some("soon".to_string()),
                ..NewGoal::default()
            },
            Utc::now(),
        )
        .unwrap();
    assert_eq!(goal.target_date, None);
}

#[test]
fn list_groups_by_type_then_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let now = Utc::now();

    let read = repo.create(&new_goal("Read", GoalType::OneTime), now).unwrap();
    let walk = repo.create(&new_goal("Walk", GoalType::Daily), now).unwrap();
    let stretch = repo.create(&new_goal("Stretch", GoalType::Daily), now).unwrap();

    let titles: Vec<_> = repo.list().unwrap().into_iter().map(|g| g.title).collect();
    assert_eq!(titles, ["Stretch", "Walk", "Read"]);

    // newest goal goes to the top of its partition
    assert!(stretch.order < walk.order);
    assert_eq!(read.order, 0);
}

#[test]
fn update_applies_only_supplied_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);

    let goal = repo
        .create(
            &NewGoal {
                title: "Learn Rust".to_string(),
                description: Some("the book".to_string()),
                goal_type: Some(GoalType::OneTime),
                ..NewGoal::default()
            },
            Utc::now(),
        )
        .unwrap();

    let patch = GoalPatch {
        status: Some(GoalStatus::OnHold),
        ..GoalPatch::default()
    };
    let updated = repo.update(goal.id, &patch, Utc::now()).unwrap();
    assert_eq!(updated.title, "Learn Rust");
    assert_eq!(updated.description.as_deref(), Some("the book"));
    assert_eq!(updated.status, GoalStatus::OnHold);

    let patch = GoalPatch {
        description: Some(None),
        order: Some(42),
        ..GoalPatch::default()
    };
    let updated = repo.update(goal.id, &patch, Utc::now()).unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.order, 42);
    assert_eq!(repo.get(goal.id).unwrap().order, 42);
}

#[test]
fn update_validates_title_and_empty_patch() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let goal = repo.create(&new_goal("Walk", GoalType::Daily), Utc::now()).unwrap();

    let blank = GoalPatch {
        title: Some(String::new()),
        ..GoalPatch::default()
    };
    assert!(matches!(
        repo.update(goal.id, &blank, Utc::now()),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        repo.update(goal.id, &GoalPatch::default(), Utc::now()),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        repo.update(Uuid::new_v4(), &blank, Utc::now()),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn status_drives_one_time_completion() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let goal = repo.create(&new_goal("Ship v1", GoalType::OneTime), Utc::now()).unwrap();

    let completed = GoalPatch {
        status: Some(GoalStatus::Completed),
        ..GoalPatch::default()
    };
    let updated = repo.update(goal.id, &completed, Utc::now()).unwrap();
    assert!(updated.is_completed);
    assert!(updated.completed_at.is_some());

    let cancelled = GoalPatch {
        status: Some(GoalStatus::Cancelled),
        ..GoalPatch::default()
    };
    let updated = repo.update(goal.id, &cancelled, Utc::now()).unwrap();
    assert!(!updated.is_completed);
    assert_eq!(updated.completed_at, None);
}

#[test]
fn toggle_one_time_flips_completion() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let goal = repo
        .create(
            &NewGoal {
                title: "Run a marathon".to_string(),
                goal_type: Some(GoalType::OneTime),
                status: Some(GoalStatus::NotStarted),
                ..NewGoal::default()
            },
            Utc::now(),
        )
        .unwrap();

    let now = Utc::now();
    let toggled = repo.toggle_one_time(goal.id, now).unwrap();
    assert_eq!(toggled.status, GoalStatus::Completed);
    assert!(toggled.is_completed);
    assert_eq!(toggled.completed_at, Some(now));

    let loaded = repo.get(goal.id).unwrap();
    assert!(loaded.is_completed);
    assert!(loaded.completed_at.is_some());

    let toggled = repo.toggle_one_time(goal.id, Utc::now()).unwrap();
    assert_eq!(toggled.status, GoalStatus::InProgress);
    assert!(!toggled.is_completed);
    assert_eq!(toggled.completed_at, None);
    assert_eq!(repo.get(goal.id).unwrap().completed_at, None);
}

#[test]
fn toggle_rejects_daily_and_unknown_goals() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let daily = repo.create(&new_goal("Walk", GoalType::Daily), Utc::now()).unwrap();

    assert!(matches!(
        repo.toggle_one_time(daily.id, Utc::now()),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        repo.toggle_one_time(Uuid::new_v4(), Utc::now()),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn second_completion_on_same_day_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let goal = repo.create(&new_goal("Exercise", GoalType::Daily), Utc::now()).unwrap();
    let today = day(2024, 6, 1);

    repo.add_completion(goal.id, today, Utc::now()).unwrap();
    let err = repo.add_completion(goal.id, today, Utc::now()).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    repo.add_completion(goal.id, day(2024, 5, 31), Utc::now()).unwrap();
    assert_eq!(repo.get(goal.id).unwrap().completions.len(), 2);
}

#[test]
fn completion_for_unknown_goal_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);

    assert!(matches!(
        repo.add_completion(Uuid::new_v4(), day(2024, 6, 1), Utc::now()),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn completions_are_newest_first_and_drive_the_streak() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let goal = repo.create(&new_goal("Meditate", GoalType::Daily), Utc::now()).unwrap();
    let today = day(2024, 6, 10);

    for offset in [2, 0, 1, 4] {
        let date = today.checked_sub_days(Days::new(offset)).unwrap();
        repo.add_completion(goal.id, date, Utc::now()).unwrap();
    }

    let goal = repo.get(goal.id).unwrap();
    let dates: Vec<_> = goal.completions.iter().map(|c| c.date).collect();
    assert_eq!(
        dates,
        [day(2024, 6, 10), day(2024, 6, 9), day(2024, 6, 8), day(2024, 6, 6)]
    );
    assert_eq!(goal.streak(today), 3);
    assert!(goal.completed_today(today));
    assert!(!goal.completed_today(today + Duration::days(1)));
}

#[test]
fn remove_only_touches_the_given_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let goal = repo.create(&new_goal("Walk", GoalType::Daily), Utc::now()).unwrap();
    let other = repo.create(&new_goal("Read", GoalType::Daily), Utc::now()).unwrap();

    for date in [day(2024, 6, 9), day(2024, 6, 10), day(2024, 6, 11)] {
        repo.add_completion(goal.id, date, Utc::now()).unwrap();
    }
    repo.add_completion(other.id, day(2024, 6, 10), Utc::now()).unwrap();

    let removed = repo.remove_completions(goal.id, day(2024, 6, 10)).unwrap();
    assert_eq!(removed, 1);

    let dates: Vec<_> = repo
        .get(goal.id)
        .unwrap()
        .completions
        .into_iter()
        .map(|c| c.date)
        .collect();
    assert_eq!(dates, [day(2024, 6, 11), day(2024, 6, 9)]);
    assert_eq!(repo.get(other.id).unwrap().completions.len(), 1);

    assert_eq!(repo.remove_completions(goal.id, day(2024, 6, 10)).unwrap(), 0);
}

#[test]
fn delete_cascades_to_own_completions_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let doomed = repo.create(&new_goal("Walk", GoalType::Daily), Utc::now()).unwrap();
    let kept = repo.create(&new_goal("Read", GoalType::Daily), Utc::now()).unwrap();

    repo.add_completion(doomed.id, day(2024, 6, 1), Utc::now()).unwrap();
    repo.add_completion(kept.id, day(2024, 6, 1), Utc::now()).unwrap();

    repo.delete(doomed.id).unwrap();

    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM goal_completions WHERE goal_id = ?1",
            [doomed.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
    assert_eq!(repo.get(kept.id).unwrap().completions.len(), 1);

    assert!(matches!(repo.delete(doomed.id), Err(StoreError::NotFound { .. })));
}

#[test]
fn reorder_sets_positions_for_listed_ids_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let now = Utc::now();

    let g1 = repo.create(&new_goal("g1", GoalType::Daily), now).unwrap();
    let g2 = repo.create(&new_goal("g2", GoalType::Daily), now).unwrap();
    let g3 = repo.create(&new_goal("g3", GoalType::Daily), now).unwrap();
    let other = repo.create(&new_goal("other", GoalType::OneTime), now).unwrap();

    repo.reorder(&[g3.id, g1.id, g2.id]).unwrap();

    let daily: Vec<_> = repo
        .list()
        .unwrap()
        .into_iter()
        .filter(|g| g.goal_type == GoalType::Daily)
        .map(|g| g.id)
        .collect();
    assert_eq!(daily, [g3.id, g1.id, g2.id]);
    assert_eq!(repo.get(other.id).unwrap().order, other.order);
}

#[test]
fn reorder_with_unknown_id_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let now = Utc::now();

    let g1 = repo.create(&new_goal("g1", GoalType::Daily), now).unwrap();
    let g2 = repo.create(&new_goal("g2", GoalType::Daily), now).unwrap();
    let before: Vec<_> = repo.list().unwrap().into_iter().map(|g| g.order).collect();

    let err = repo.reorder(&[g1.id, Uuid::new_v4(), g2.id]).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let after: Vec<_> = repo.list().unwrap().into_iter().map(|g| g.order).collect();
    assert_eq!(before, after);
}

#[test]
fn changing_type_moves_goal_to_top_of_new_partition() {
    let conn = open_db_in_memory().unwrap();
    let repo = GoalRepo::new(&conn);
    let now = Utc::now();

    let walk = repo.create(&new_goal("walk", GoalType::Daily), now).unwrap();
    let ship = repo.create(&new_goal("ship", GoalType::OneTime), now).unwrap();
    let launch = repo.create(&new_goal("launch", GoalType::OneTime), now).unwrap();

    let to_one_time = GoalPatch {
        goal_type: Some(GoalType::OneTime),
        ..GoalPatch::default()
    };
    let moved = repo.update(walk.id, &to_one_time, now).unwrap();
    assert!(moved.order < launch.order);

    let one_time: Vec<_> = repo
        .list()
        .unwrap()
        .into_iter()
        .filter(|g| g.goal_type == GoalType::OneTime)
        .map(|g| g.id)
        .collect();
    assert_eq!(one_time, [walk.id, launch.id, ship.id]);

    // same type and an explicit order leave the position to the patch
    let unchanged = repo.update(walk.id, &to_one_time, now).unwrap();
    assert_eq!(unchanged.order, moved.order);

    let back_with_order = GoalPatch {
        goal_type: Some(GoalType::Daily),
        order: Some(7),
        ..GoalPatch::default()
    };
    assert_eq!(repo.update(walk.id, &back_with_order, now).unwrap().order, 7);
}
