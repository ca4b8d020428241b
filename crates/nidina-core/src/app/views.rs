//! Read-only derivations over the task list.
//!
//! Nothing here touches a store. Every function takes the mirror (or any
//! slice of tasks) plus the current time and returns a presentation model.
//! Dates are shown in a caller-chosen time zone, converting each one with
//! the offset in effect on that date.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Task, TaskStatus};

/// Number of entries in the overview's recent and upcoming lists.
pub const OVERVIEW_LIMIT: usize = 5;

/// Entries shown per calendar day before collapsing into "+N more".
pub const CALENDAR_DAY_LIMIT: usize = 2;

/// Words per line in a calendar event title.
pub const TITLE_WORDS_PER_LINE: usize = 3;

/// Stored-status counts for the overview header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub upcoming: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        Self {
            total: tasks.len(),
            pending: pending(tasks).count(),
            completed: completed(tasks).count(),
            upcoming: upcoming(tasks, now).count(),
        }
    }
}

/// Tasks whose stored status is `Pending`.
pub fn pending(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|t| t.status == TaskStatus::Pending)
}

/// Tasks whose stored status is `Done`.
pub fn completed(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|t| t.status == TaskStatus::Done)
}

/// Pending tasks due strictly after `now`.
pub fn upcoming(tasks: &[Task], now: DateTime<Utc>) -> impl Iterator<Item = &Task> {
    pending(tasks).filter(move |t| t.date > now)
}

/// The `n` most recently created tasks, newest first.
///
/// Creation order comes from the ULID timestamp in the id, not the position
/// in the list.
pub fn recent(tasks: &[Task], n: usize) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview<'a> {
    pub counts: TaskCounts,
    pub recent: Vec<&'a Task>,
    /// Upcoming tasks, soonest first.
    pub upcoming: Vec<&'a Task>,
}

pub fn overview(tasks: &[Task], now: DateTime<Utc>) -> Overview<'_> {
    let mut soonest: Vec<&Task> = upcoming(tasks, now).collect();
    soonest.sort_by_key(|t| t.date);
    soonest.truncate(OVERVIEW_LIMIT);

    Overview {
        counts: TaskCounts::from_tasks(tasks, now),
        recent: recent(tasks, OVERVIEW_LIMIT),
        upcoming: soonest,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListTab {
    /// Pending and overdue tasks.
    #[default]
    Open,
    Done,
}

impl ListTab {
    pub fn contains(self, task: &Task) -> bool {
        match self {
            ListTab::Open => !task.status.is_done(),
            ListTab::Done => task.status.is_done(),
        }
    }
}

/// One card in the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry<'a> {
    pub task: &'a Task,
    pub chip: TaskStatus,
    pub due: String,
}

/// Cards for `tab`, in stored order.
///
/// The chip is computed at day granularity in `tz`: a task due earlier
/// today is still shown as pending.
pub fn list_view<'a, Tz>(tasks: &'a [Task], tab: ListTab, now: DateTime<Utc>, tz: &Tz) -> Vec<ListEntry<'a>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let today = local_day(now, tz);
    tasks
        .iter()
        .filter(|t| tab.contains(t))
        .map(|task| ListEntry {
            task,
            chip: chip(task, today, tz),
            due: format_due(task.date, tz),
        })
        .collect()
}

fn chip<Tz: TimeZone>(task: &Task, today: NaiveDate, tz: &Tz) -> TaskStatus {
    if task.status.is_done() {
        TaskStatus::Done
    } else {
        TaskStatus::classify_by_day(local_day(task.date, tz), today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent<'a> {
    pub task: &'a Task,
    /// [`Task::effective_status`] at the time the calendar was built.
    pub status: TaskStatus,
    pub title: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay<'a> {
    pub events: Vec<CalendarEvent<'a>>,
    /// Entries hidden behind "+N more".
    pub overflow: usize,
}

impl CalendarDay<'_> {
    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{} more", self.overflow))
    }
}

/// Tasks grouped by local calendar day, each day ordered by due time.
pub fn calendar<'a, Tz>(
    tasks: &'a [Task],
    now: DateTime<Utc>,
    tz: &Tz,
) -> BTreeMap<NaiveDate, CalendarDay<'a>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut days: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        days.entry(local_day(task.date, tz)).or_default().push(task);
    }

    days.into_iter()
        .map(|(day, mut entries)| {
            entries.sort_by_key(|t| t.date);
            let overflow = entries.len().saturating_sub(CALENDAR_DAY_LIMIT);
            let events = entries
                .into_iter()
                .take(CALENDAR_DAY_LIMIT)
                .map(|task| CalendarEvent {
                    task,
                    status: task.effective_status(now),
                    title: split_title_into_lines(&task.text, TITLE_WORDS_PER_LINE),
                    time: format_time(task.date, tz),
                })
                .collect();
            (day, CalendarDay { events, overflow })
        })
        .collect()
}

/// Break `title` into lines of at most `words_per_line` words.
///
/// Splits on single spaces, so repeated spaces yield empty words that still
/// count toward a line.
pub fn split_title_into_lines(title: &str, words_per_line: usize) -> String {
    let words: Vec<&str> = title.split(' ').collect();
    words
        .chunks(words_per_line.max(1))
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `October 18, 2026, 09:00 AM`
pub fn format_due<Tz>(date: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    date.with_timezone(tz)
        .format("%B %d, %Y, %I:%M %p")
        .to_string()
}

/// `09:00 AM`
pub fn format_time<Tz>(date: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    date.with_timezone(tz).format("%I:%M %p").to_string()
}

pub fn local_day<Tz: TimeZone>(date: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    date.with_timezone(tz).date_naive()
}
