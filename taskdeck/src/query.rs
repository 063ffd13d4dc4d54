//! View-facing derived queries over cache snapshots.
//!
//! Pure functions: the view layer feeds them the current snapshot and
//! renders the result. Filtering never reorders; both filters and the
//! column grouping preserve the snapshot's relative order.

use std::collections::BTreeMap;

use taskdeck_model::{Contact, Status, Task};

/// The four fixed board columns, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    /// Not started.
    pub todo: Vec<Task>,
    /// Actively being worked on.
    pub in_progress: Vec<Task>,
    /// Waiting on review or feedback.
    pub await_feedback: Vec<Task>,
    /// Finished.
    pub done: Vec<Task>,
}

impl Board {
    /// Total number of tasks across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.await_feedback.len() + self.done.len()
    }

    /// Whether every column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Case-insensitive substring filter over task title and description.
///
/// A query shorter than `min_query_len` characters (after trimming)
/// returns the full set unchanged; in particular the empty query always
/// returns everything, order preserved.
#[must_use]
pub fn filter_by_text(tasks: &[Task], query: &str, min_query_len: usize) -> Vec<Task> {
    let trimmed = query.trim();
    if trimmed.chars().count() < min_query_len {
        return tasks.to_vec();
    }
    let needle = trimmed.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&needle)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Partitions tasks into the four fixed columns, preserving relative
/// order within each column.
#[must_use]
pub fn group_by_status(tasks: &[Task]) -> Board {
    let mut board = Board::default();
    for task in tasks {
        match task.status {
            Status::Todo => board.todo.push(task.clone()),
            Status::InProgress => board.in_progress.push(task.clone()),
            Status::AwaitFeedback => board.await_feedback.push(task.clone()),
            Status::Done => board.done.push(task.clone()),
        }
    }
    board
}

/// Case-insensitive substring filter over contact name and email.
#[must_use]
pub fn filter_contacts(contacts: &[Contact], query: &str, min_query_len: usize) -> Vec<Contact> {
    let trimmed = query.trim();
    if trimmed.chars().count() < min_query_len {
        return contacts.to_vec();
    }
    let needle = trimmed.to_lowercase();
    contacts
        .iter()
        .filter(|contact| {
            contact.name.to_lowercase().contains(&needle)
                || contact.email.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Groups contacts by the uppercased first letter of their name,
/// preserving relative order within each group (the contact list's
/// alphabetical register view).
#[must_use]
pub fn group_contacts_by_initial(contacts: &[Contact]) -> BTreeMap<char, Vec<Contact>> {
    let mut groups: BTreeMap<char, Vec<Contact>> = BTreeMap::new();
    for contact in contacts {
        let initial = contact
            .name
            .chars()
            .next()
            .map_or('#', |c| c.to_ascii_uppercase());
        groups.entry(initial).or_default().push(contact.clone());
    }
    groups
}
