//! Property-based tests for the record ↔ domain mapper.
//!
//! Uses proptest to verify:
//! 1. Any fully-populated `tasks` row maps to a `Task` carrying exactly
//!    the row's values.
//! 2. A row holding only the required columns always maps, with the
//!    documented fallbacks for the rest.
//! 3. `task_patch_to_record` emits exactly the fields the patch sets,
//!    with a cleared due date written as JSON `null`.
//! 4. The wire strings of `Status`, `TaskKind` and `Priority` round-trip.
//! 5. Any fully-populated `contacts` row maps to a matching `Contact`,
//!    and an absent phone becomes the empty string.
//! 6. A status string outside the four board columns is always rejected.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use proptest::prelude::*;
use serde_json::json;
use taskdeck_model::mapper::{self, MappingError};
use taskdeck_model::{Assignee, Priority, Status, Subtask, TaskKind, TaskPatch};

// --- Strategies for domain values ---

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Todo),
        Just(Status::InProgress),
        Just(Status::AwaitFeedback),
        Just(Status::Done),
    ]
}

fn arb_kind() -> impl Strategy<Value = TaskKind> {
    prop_oneof![Just(TaskKind::UserStory), Just(TaskKind::TechnicalTask)]
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low),
    ]
}

fn arb_assignee() -> impl Strategy<Value = Assignee> {
    ("[a-z0-9]{1,12}", "[A-Z]{1,2}", prop::option::of("[A-Za-z ]{1,24}")).prop_map(
        |(id, initials, name)| Assignee { id, initials, name },
    )
}

fn arb_subtask() -> impl Strategy<Value = Subtask> {
    ("[a-z0-9]{1,12}", "[^\x00]{1,64}", any::<bool>())
        .prop_map(|(id, title, done)| Subtask { id, title, done })
}

/// Whole-second timestamps only, so RFC 3339 formatting loses nothing.
fn arb_created_at() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| {
        DateTime::from_timestamp(secs, 0).expect("range is within chrono bounds")
    })
}

fn arb_due_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).expect("day capped at 28")
    })
}

// --- Property tests ---

proptest! {
    /// A fully-populated row maps to a task carrying exactly its values.
    #[test]
    fn full_task_record_maps_field_for_field(
        id in "[a-z0-9-]{1,24}",
        title in "[^\x00]{1,64}",
        description in "[^\x00]{1,128}",
        status in arb_status(),
        kind in arb_kind(),
        priority in arb_priority(),
        assignees in prop::collection::vec(arb_assignee(), 0..4),
        subtasks in prop::collection::vec(arb_subtask(), 0..4),
        created_at in arb_created_at(),
        due_date in arb_due_date(),
        position in 0i64..10_000,
    ) {
        let record = json!({
            "id": &id,
            "title": &title,
            "description": &description,
            "status": status.as_wire(),
            "task_type": kind.as_wire(),
            "priority": priority.as_wire(),
            "assignees": serde_json::to_value(&assignees).expect("plain data"),
            "subtasks": serde_json::to_value(&subtasks).expect("plain data"),
            "created_at": created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "due_date": due_date.to_string(),
            "position": position,
        });

        let task = mapper::task_from_record(&record).expect("well-formed record maps");
        prop_assert_eq!(task.id.as_str(), id.as_str());
        prop_assert_eq!(task.title, title);
        prop_assert_eq!(task.description.as_deref(), Some(description.as_str()));
        prop_assert_eq!(task.status, status);
        prop_assert_eq!(task.kind, kind);
        prop_assert_eq!(task.priority, priority);
        prop_assert_eq!(task.assignees, assignees);
        prop_assert_eq!(task.subtasks, subtasks);
        prop_assert_eq!(task.created_at, created_at);
        prop_assert_eq!(task.due_date, Some(due_date));
        prop_assert_eq!(task.position, Some(position));
    }

    /// Required columns alone always map, with the documented fallbacks.
    #[test]
    fn minimal_task_record_falls_back(
        id in "[a-z0-9-]{1,24}",
        title in "[^\x00]{1,64}",
        status in arb_status(),
        created_at in arb_created_at(),
    ) {
        let record = json!({
            "id": &id,
            "title": &title,
            "status": status.as_wire(),
            "created_at": created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        });

        let task = mapper::task_from_record(&record).expect("required fields suffice");
        prop_assert_eq!(task.kind, TaskKind::TechnicalTask);
        prop_assert_eq!(task.priority, Priority::Medium);
        prop_assert_eq!(task.description, None);
        prop_assert!(task.assignees.is_empty());
        prop_assert!(task.subtasks.is_empty());
        prop_assert_eq!(task.due_date, None);
        prop_assert_eq!(task.position, None);
    }

    /// A patch row holds exactly the fields the patch sets.
    #[test]
    fn patch_record_mirrors_set_fields(
        title in prop::option::of("[^\x00]{1,64}"),
        status in prop::option::of(arb_status()),
        priority in prop::option::of(arb_priority()),
        clear_due in any::<bool>(),
    ) {
        let patch = TaskPatch {
            title: title.clone(),
            status,
            priority,
            due_date: if clear_due { Some(None) } else { None },
            ..TaskPatch::default()
        };

        let row = mapper::task_patch_to_record(&patch);
        prop_assert_eq!(row.contains_key("title"), title.is_some());
        prop_assert_eq!(row.contains_key("status"), status.is_some());
        prop_assert_eq!(row.contains_key("priority"), priority.is_some());
        prop_assert!(!row.contains_key("description"));
        prop_assert!(!row.contains_key("id"));
        if clear_due {
            prop_assert!(row["due_date"].is_null());
        } else {
            prop_assert!(!row.contains_key("due_date"));
        }
        if let Some(status) = status {
            prop_assert_eq!(row["status"].as_str(), Some(status.as_wire()));
        }
    }

    /// Wire strings round-trip for every enum variant.
    #[test]
    fn wire_strings_round_trip(
        status in arb_status(),
        kind in arb_kind(),
        priority in arb_priority(),
    ) {
        prop_assert_eq!(Status::from_wire(status.as_wire()), Some(status));
        prop_assert_eq!(TaskKind::from_wire_or_default(Some(kind.as_wire())), kind);
        prop_assert_eq!(Priority::from_wire_or_default(Some(priority.as_wire())), priority);
    }

    /// A fully-populated contacts row maps field for field; an absent
    /// phone becomes the empty string.
    #[test]
    fn contact_record_maps_field_for_field(
        id in "[a-z0-9-]{1,24}",
        name in "[A-Za-z]{2,12} [A-Za-z]{2,12}",
        email in "[a-z]{1,8}@[a-z]{1,8}\\.[a-z]{2,4}",
        phone in prop::option::of("\\+?[0-9]{4,14}"),
    ) {
        let mut record = json!({ "id": &id, "name": &name, "email": &email });
        if let Some(phone) = &phone {
            record["phone"] = json!(phone);
        }

        let contact = mapper::contact_from_record(&record).expect("well-formed record maps");
        prop_assert_eq!(contact.id.as_str(), id.as_str());
        prop_assert_eq!(contact.name, name);
        prop_assert_eq!(contact.email, email);
        prop_assert_eq!(contact.phone, phone.unwrap_or_default());
    }

    /// Status strings outside the four board columns are always rejected.
    #[test]
    fn unknown_status_is_rejected(raw in "[a-zA-Z]{1,16}") {
        prop_assume!(Status::from_wire(&raw).is_none());
        let record = json!({
            "id": "1",
            "title": "Card",
            "status": raw,
            "created_at": "2026-01-01T00:00:00Z",
        });
        prop_assert!(matches!(
            mapper::task_from_record(&record),
            Err(MappingError::UnknownStatus(_))
        ));
    }
}
