use std::collections::BTreeSet;
use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use knowa_db::models::{Event, Meeting, NotificationType};
use tracing::info;

use crate::dao::base::DaoResult;
use crate::dao::event::EventDao;
use crate::notifier::Notifier;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderReport {
    pub events: usize,
    pub meetings: usize,
    pub sent: usize,
}

pub fn event_recipients(event: &Event) -> BTreeSet<ObjectId> {
    let mut recipients: BTreeSet<ObjectId> = event.participants.iter().copied().collect();
    recipients.extend(event.crew.iter().copied());
    recipients.extend(event.organizer_id);
    recipients
}

pub fn meeting_recipients(meeting: &Meeting) -> BTreeSet<ObjectId> {
    let mut recipients: BTreeSet<ObjectId> = meeting.participants.iter().copied().collect();
    recipients.extend(meeting.organizer_id);
    recipients
}

fn hours_until(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start - now).num_hours()
}

pub struct ReminderService {
    events: Arc<EventDao>,
    notifier: Notifier,
    window: Duration,
}

impl ReminderService {
    pub fn new(events: Arc<EventDao>, notifier: Notifier, window_hours: i64) -> Self {
        Self {
            events,
            notifier,
            window: Duration::hours(window_hours),
        }
    }

    /// Reminds everyone involved in published events and meetings starting
    /// within the window. A reminder title is only ever sent once per user.
    pub async fn run(&self, now: DateTime<Utc>) -> DaoResult<ReminderReport> {
        let from = bson::DateTime::from_chrono(now);
        let to = bson::DateTime::from_chrono(now + self.window);
        let mut report = ReminderReport::default();

        for event in self.events.starting_between(from, to).await? {
            report.events += 1;
            let start = event.start_time.to_chrono();
            let title = format!("Reminder: Upcoming Event '{}'", event.title);
            let message = format!(
                "This is a reminder that '{}' is starting in about {} hours ({}). We look forward to seeing you there!",
                event.title,
                hours_until(start, now),
                start.format("%I:%M %p")
            );
            for recipient in event_recipients(&event) {
                if self
                    .notifier
                    .send_once(recipient, &title, &message, NotificationType::Info)
                    .await?
                {
                    report.sent += 1;
                }
            }
        }

        for meeting in self.events.meetings_starting_between(from, to).await? {
            report.meetings += 1;
            let title = format!("Reminder: Meeting '{}'", meeting.title);
            let message = format!(
                "You have a meeting '{}' coming up in about {} hours.",
                meeting.title,
                hours_until(meeting.start_time.to_chrono(), now)
            );
            for recipient in meeting_recipients(&meeting) {
                if self
                    .notifier
                    .send_once(recipient, &title, &message, NotificationType::Warning)
                    .await?
                {
                    report.sent += 1;
                }
            }
        }

        info!(
            events = report.events,
            meetings = report.meetings,
            sent = report.sent,
            "Reminder check complete"
        );
        Ok(report)
    }
}
