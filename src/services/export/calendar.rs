//! Calendar export.
//!
//! Day and time strings on stored itineraries are informal ("Saturday",
//! "November 8", "9:00 AM"), so start times are recovered heuristically. The
//! year is always the current one. Serialisation to iCalendar, including text
//! escaping and line folding, is left to the `icalendar` crate.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use icalendar::{Calendar, Component, Event, EventLike, EventStatus};
use regex::Regex;

use super::{export_filename, ExportError, ExportFile};
use crate::models::itinerary::{Activity, Itinerary};

pub const DEFAULT_DURATION_MINUTES: i64 = 60;
/// Longest duration taken at face value; anything beyond is treated as unparseable.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60 * 30;

static MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b",
    )
    .expect("month regex")
});
static DAY_OF_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\b").expect("day regex"));
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(a\.?m\.?|p\.?m\.?)?").expect("time regex")
});
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h)\b").expect("hours regex")
});
static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:minutes?|mins?|m)\b").expect("minutes regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn month_number(token: &str) -> Option<u32> {
    let prefix: String = token.to_lowercase().chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Month and day-of-month from `date`, each defaulting to today's. `None` if the result is not a real date.
pub fn parse_day_date(date: &str, today: NaiveDate) -> Option<NaiveDate> {
    let month = MONTH_RE
        .captures(date)
        .and_then(|caps| month_number(&caps[1]))
        .unwrap_or_else(|| today.month());
    let day = match DAY_OF_MONTH_RE.captures(date) {
        Some(caps) => caps[1].parse().ok()?,
        None => today.day(),
    };
    NaiveDate::from_ymd_opt(today.year(), month, day)
}

/// 12-hour clock with AM/PM, or 24-hour without. Text with no digits means 9:00 AM.
pub fn parse_start_time(time: &str) -> Option<NaiveTime> {
    let Some(caps) = TIME_RE.captures(time) else {
        return NaiveTime::from_hms_opt(9, 0, 0);
    };

    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    if let Some(meridiem) = caps.get(3) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().to_lowercase().starts_with('p');
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Minutes described by text like "2 hours 30 min"; 60 when nothing is
/// recognisable or the total exceeds [`MAX_DURATION_MINUTES`].
pub fn parse_duration_minutes(duration: &str) -> i64 {
    let hours = HOURS_RE
        .captures_iter(duration)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .try_fold(0i64, |total, hours| {
            let minutes = (hours * 60.0).round();
            if !minutes.is_finite() || minutes > MAX_DURATION_MINUTES as f64 {
                return None;
            }
            total.checked_add(minutes as i64)
        });
    let minutes = MINUTES_RE
        .captures_iter(duration)
        .filter_map(|caps| caps[1].parse::<i64>().ok())
        .try_fold(0i64, i64::checked_add);

    match hours.zip(minutes).and_then(|(h, m)| h.checked_add(m)) {
        Some(total) if total > 0 && total <= MAX_DURATION_MINUTES => total,
        _ => DEFAULT_DURATION_MINUTES,
    }
}

fn event_location(activity: &Activity) -> String {
    [activity.venue.trim(), activity.location.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

fn event_description(activity: &Activity, minutes: i64) -> String {
    let duration = if activity.duration.trim().is_empty() {
        format!("{} minutes", minutes)
    } else {
        activity.duration.trim().to_string()
    };
    let mut description = String::new();
    if !activity.description.trim().is_empty() {
        description.push_str(activity.description.trim());
        description.push_str("\n\n");
    }
    description.push_str(&format!("Cost: {}\nDuration: {}", activity.cost, duration));
    description
}

/// One event per activity, in itinerary order. Activities whose times cannot be resolved are skipped.
pub fn to_calendar_events(itinerary: &Itinerary, today: NaiveDate) -> Result<Vec<CalendarEvent>, ExportError> {
    let mut events = Vec::new();

    for day in &itinerary.days {
        for (index, activity) in day.activities.iter().enumerate() {
            let minutes = parse_duration_minutes(&activity.duration);
            let start = parse_day_date(&day.date, today)
                .zip(parse_start_time(&activity.time))
                .map(|(date, time)| date.and_time(time));
            let end = start
                .zip(Duration::try_minutes(minutes))
                .and_then(|(start, length)| start.checked_add_signed(length));

            let (Some(start), Some(end)) = (start, end) else {
                log::warn!(
                    "Skipping calendar event for '{}' (day {} '{}', time '{}')",
                    activity.name,
                    day.day,
                    day.date,
                    activity.time
                );
                continue;
            };

            events.push(CalendarEvent {
                uid: format!("{}-d{}-a{}@itinera", itinerary.id, day.day, index + 1),
                title: activity.name.clone(),
                description: event_description(activity, minutes),
                location: event_location(activity),
                start,
                end,
            });
        }
    }

    if events.is_empty() {
        return Err(ExportError::NoValidEvents);
    }
    Ok(events)
}

/// One VEVENT per event, all confirmed, with floating local start and end times.
pub fn render_ics(events: &[CalendarEvent], stamp: DateTime<Utc>) -> Result<String, ExportError> {
    if events.is_empty() {
        return Err(ExportError::Calendar("no events to render".to_string()));
    }

    let mut calendar = Calendar::new();
    for event in events {
        if event.end <= event.start {
            return Err(ExportError::Calendar(format!(
                "event '{}' ends before it starts",
                event.title
            )));
        }
        calendar.push(
            Event::new()
                .uid(&event.uid)
                .timestamp(stamp)
                .starts(event.start)
                .ends(event.end)
                .summary(&event.title)
                .description(&event.description)
                .location(&event.location)
                .status(EventStatus::Confirmed)
                .done(),
        );
    }
    Ok(calendar.to_string())
}

pub fn export_calendar(itinerary: &Itinerary, now: DateTime<Utc>) -> Result<ExportFile, ExportError> {
    let events = to_calendar_events(itinerary, now.date_naive())?;
    let body = render_ics(&events, now)?;
    Ok(ExportFile {
        filename: export_filename(&itinerary.destination, &itinerary.tier, "ics"),
        content_type: "text/calendar; charset=utf-8",
        bytes: body.into_bytes(),
    })
}
