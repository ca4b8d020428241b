//! Plain-text rendering of the view derivations.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};

use nidina_core::app::views::{CalendarDay, ListEntry, Overview};
use nidina_core::domain::Task;

pub fn list(entries: &[ListEntry<'_>]) -> String {
    if entries.is_empty() {
        return "No tasks.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  [{}]  {}  (due {})",
            entry.task.id, entry.chip, entry.task.text, entry.due
        );
    }
    out
}

/// One line per task: id, status as of `now`, text.
pub fn task_line(task: &Task, now: DateTime<Utc>) -> String {
    format!("{}  [{}]  {}", task.id, task.effective_status(now), task.text)
}

pub fn overview(view: &Overview<'_>, now: DateTime<Utc>) -> String {
    let counts = view.counts;
    let mut out = String::new();
    let _ = writeln!(out, "Total tasks:     {}", counts.total);
    let _ = writeln!(out, "Pending tasks:   {}", counts.pending);
    let _ = writeln!(out, "Completed tasks: {}", counts.completed);
    let _ = writeln!(out, "Upcoming tasks:  {}", counts.upcoming);

    out.push_str("\nRecent tasks\n");
    section(&mut out, &view.recent, now);
    out.push_str("\nUpcoming\n");
    section(&mut out, &view.upcoming, now);
    out
}

fn section(out: &mut String, tasks: &[&Task], now: DateTime<Utc>) {
    if tasks.is_empty() {
        out.push_str("  (none)\n");
    }
    for task in tasks {
        let _ = writeln!(out, "  {}", task_line(task, now));
    }
}

pub fn calendar(days: &BTreeMap<NaiveDate, CalendarDay<'_>>) -> String {
    if days.is_empty() {
        return "No tasks.\n".to_string();
    }
    let mut out = String::new();
    for (day, entry) in days {
        let _ = writeln!(out, "{}", day.format("%A, %B %d, %Y"));
        for event in &entry.events {
            let mut lines = event.title.lines();
            let first = lines.next().unwrap_or_default();
            let _ = writeln!(out, "  {}  [{}]  {}", event.time, event.status, first);
            for line in lines {
                let _ = writeln!(out, "            {}", line);
            }
        }
        if let Some(label) = entry.overflow_label() {
            let _ = writeln!(out, "  {label}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use nidina_core::app::views::{self, ListTab};
    use nidina_core::domain::{NewTask, TaskId, TaskStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn task(text: &str, date: DateTime<Utc>, status: TaskStatus) -> Task {
        let id: TaskId = "task-01JA0000000000000000000000".parse().unwrap();
        Task::from_new(id, NewTask::new(text, date).with_status(status), now())
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(list(&[]), "No tasks.\n");
    }

    #[test]
    fn list_shows_chip_and_due() {
        let tasks = vec![task("Buy milk", now() + Duration::days(1), TaskStatus::Pending)];
        let entries = views::list_view(&tasks, ListTab::Open, now(), &Utc);

        let out = list(&entries);

        assert!(out.contains("[Pending]  Buy milk  (due October 18, 2026, 12:00 PM)"));
    }

    #[test]
    fn calendar_wraps_titles_and_shows_overflow() {
        let base = now() + Duration::days(1);
        let tasks = vec![
            task("one two three four", base, TaskStatus::Pending),
            task("b", base + Duration::hours(1), TaskStatus::Pending),
            task("c", base + Duration::hours(2), TaskStatus::Pending),
        ];
        let days = views::calendar(&tasks, now(), &Utc);

        let out = calendar(&days);

        assert!(out.starts_with("Sunday, October 18, 2026\n"));
        assert!(out.contains("12:00 PM  [Pending]  one two three\n            four\n"));
        assert!(out.contains("  +1 more\n"));
    }

    #[test]
    fn overview_prints_counts() {
        let tasks = vec![
            task("a", now() + Duration::days(1), TaskStatus::Pending),
            task("b", now() - Duration::days(1), TaskStatus::Done),
        ];
        let view = views::overview(&tasks, now());

        let out = overview(&view, now());

        assert!(out.contains("Pending tasks:   1\n"));
        assert!(out.contains("Completed tasks: 1\n"));
        assert!(out.contains("Upcoming tasks:  1\n"));
    }

    #[test]
    fn stale_pending_is_shown_overdue() {
        // stored as Pending on the 17th, due the 18th, viewed on the 20th
        let later = now() + Duration::days(3);
        let tasks = vec![task("Pay rent", now() + Duration::days(1), TaskStatus::Pending)];

        let cal = calendar(&views::calendar(&tasks, later, &Utc));
        let summary = overview(&views::overview(&tasks, later), later);

        assert!(cal.contains("12:00 PM  [Overdue]  Pay rent"));
        assert!(!cal.contains("[Pending]"));
        assert!(summary.contains("[Overdue]  Pay rent"));
        assert!(!summary.contains("[Pending]"));
    }
}
