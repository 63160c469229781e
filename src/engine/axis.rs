use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{TimelineModel, TimelineScale};

/// Day labels are only shown when a day is at least this wide.
const DAY_LABEL_MIN_PX: f32 = 20.0;

/// A gridline on the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub x: f32,
    pub label: Option<String>,
}

/// Everything needed to draw the ruled axis for one timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisLayout {
    /// Coarse gridlines with the upper header labels.
    pub major: Vec<Tick>,
    /// Fine gridlines with the lower header labels.
    pub minor: Vec<Tick>,
    /// The "today" marker, when today lies inside the window.
    pub today_x: Option<f32>,
}

pub fn axis_layout(timeline: &TimelineModel, today: NaiveDate) -> AxisLayout {
    let (major, minor) = match timeline.scale {
        TimelineScale::Days => {
            let labelled = timeline.pixels_per_day() >= DAY_LABEL_MIN_PX;
            let minor = days(timeline.start, timeline.end)
                .map(|date| tick(timeline, date, labelled.then(|| date.format("%d").to_string())))
                .collect();
            (month_ticks(timeline, "%b %Y"), minor)
        }
        TimelineScale::Weeks => {
            let minor = mondays(timeline.start, timeline.end)
                .map(|date| tick(timeline, date, Some(date.format("W%V").to_string())))
                .collect();
            (month_ticks(timeline, "%b %Y"), minor)
        }
        TimelineScale::Months => {
            let major = month_starts(timeline.start, timeline.end)
                .filter(|date| date.month() == 1)
                .map(|date| tick(timeline, date, Some(date.format("%Y").to_string())))
                .collect();
            (major, month_ticks(timeline, "%b"))
        }
    };

    AxisLayout {
        major,
        minor,
        today_x: timeline.contains(today).then(|| timeline.date_to_x(today)),
    }
}

fn tick(timeline: &TimelineModel, date: NaiveDate, label: Option<String>) -> Tick {
    Tick {
        x: timeline.date_to_x(date),
        label,
    }
}

fn month_ticks(timeline: &TimelineModel, fmt: &str) -> Vec<Tick> {
    month_starts(timeline.start, timeline.end)
        .map(|date| tick(timeline, date, Some(date.format(fmt).to_string())))
        .collect()
}

fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

fn mondays(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let offset = (7 - start.weekday().num_days_from_monday() as i64) % 7;
    let first = start + Duration::days(offset);
    first.iter_weeks().take_while(move |d| *d <= end)
}

/// First-of-month dates inside [start, end].
fn month_starts(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = if start.day() == 1 {
        Some(start)
    } else {
        next_month(start)
    };
    std::iter::successors(first, |d| next_month(*d)).take_while(move |d| *d <= end)
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn labels(ticks: &[Tick]) -> Vec<&str> {
        ticks.iter().filter_map(|t| t.label.as_deref()).collect()
    }

    #[test]
    fn day_scale_rules_every_day_and_labels_month_starts() {
        let timeline = TimelineModel::new(d(2024, 1, 28), d(2024, 2, 3), TimelineScale::Days, 1.0);
        let axis = axis_layout(&timeline, d(2024, 1, 30));
        assert_eq!(axis.minor.len(), 7);
        // 6 days stretched to 1200 px: wide enough for labels.
        assert_eq!(labels(&axis.minor), vec!["28", "29", "30", "31", "01", "02", "03"]);
        assert_eq!(labels(&axis.major), vec!["Feb 2024"]);
        assert_eq!(axis.today_x, Some(400.0));
    }

    #[test]
    fn narrow_days_drop_their_labels() {
        let timeline =
            TimelineModel::new(d(2024, 1, 1), d(2024, 12, 31), TimelineScale::Days, 0.25);
        let axis = axis_layout(&timeline, d(2020, 1, 1));
        assert!(axis.minor.iter().all(|t| t.label.is_none()));
        assert_eq!(axis.today_x, None);
    }

    #[test]
    fn week_scale_rules_mondays() {
        let timeline = TimelineModel::new(d(2024, 1, 3), d(2024, 1, 31), TimelineScale::Weeks, 1.0);
        let axis = axis_layout(&timeline, d(2024, 1, 3));
        assert_eq!(labels(&axis.minor), vec!["W02", "W03", "W04", "W05"]);
        assert!(axis.major.is_empty());
        assert_eq!(axis.today_x, Some(0.0));
    }

    #[test]
    fn month_scale_rules_months_and_years() {
        let timeline = TimelineModel::new(d(2024, 11, 15), d(2025, 3, 1), TimelineScale::Months, 1.0);
        let axis = axis_layout(&timeline, d(2030, 1, 1));
        assert_eq!(labels(&axis.minor), vec!["Dec", "Jan", "Feb", "Mar"]);
        assert_eq!(labels(&axis.major), vec!["2025"]);
    }
}
