use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days of slack added on each side of the scheduled range.
pub const PADDING_DAYS: i64 = 7;
/// Narrowest chart the model will produce, before zoom.
pub const MIN_WIDTH: f32 = 1200.0;
/// Hard cap so very long schedules don't blow up the layout.
pub const MAX_WIDTH: f32 = 50_000.0;

const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 8.0;

/// Controls what scale the timeline displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineScale {
    Days,
    Weeks,
    Months,
}

impl TimelineScale {
    /// Pixel density per day of range before zoom.
    pub fn pixels_per_unit(self) -> f32 {
        match self {
            TimelineScale::Days => 40.0,
            TimelineScale::Weeks => 20.0,
            TimelineScale::Months => 8.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimelineScale::Days => "Days",
            TimelineScale::Weeks => "Weeks",
            TimelineScale::Months => "Months",
        }
    }
}

/// The visible date window and its mapping onto a pixel axis.
///
/// Changing zoom or scale only changes the mapping; task dates are never
/// touched.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineModel {
    /// The leftmost date, at x = 0.
    pub start: NaiveDate,
    /// The rightmost date, at x = width.
    pub end: NaiveDate,
    pub scale: TimelineScale,
    pub zoom: f32,
}

impl TimelineModel {
    pub fn new(start: NaiveDate, end: NaiveDate, scale: TimelineScale, zoom: f32) -> Self {
        Self {
            start,
            end: end.max(start + Duration::days(1)),
            scale,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Fit the window around `dates` with a week of padding on each side.
    /// With no dates at all, falls back to [today - 30, today + 90].
    pub fn fit(dates: &[NaiveDate], scale: TimelineScale, zoom: f32, today: NaiveDate) -> Self {
        let (start, end) = fit_bounds(dates, today);
        Self::new(start, end, scale, zoom)
    }

    /// Recompute the bounds for a new set of dates, keeping scale and zoom.
    pub fn refit(&mut self, dates: &[NaiveDate], today: NaiveDate) {
        *self = Self::fit(dates, self.scale, self.zoom, today);
    }

    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    /// Total width in pixels for the window.
    pub fn width(&self) -> f32 {
        let natural = (self.total_days() as f32 * self.scale.pixels_per_unit()).max(MIN_WIDTH);
        (natural * self.zoom).min(MAX_WIDTH)
    }

    pub fn pixels_per_day(&self) -> f32 {
        self.width() / self.total_days() as f32
    }

    /// Convert a date to an x-pixel offset from the window start.
    pub fn date_to_x(&self, date: NaiveDate) -> f32 {
        let days = (date - self.start).num_days() as f32;
        days * self.width() / self.total_days() as f32
    }

    /// Convert an x-pixel offset back to the nearest date.
    pub fn x_to_date(&self, x: f32) -> NaiveDate {
        let days = (x * self.total_days() as f32 / self.width()).round() as i64;
        self.start + Duration::days(days)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn set_scale(&mut self, scale: TimelineScale) {
        self.scale = scale;
    }

    /// Zoom in (widen the chart).
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.2).min(MAX_ZOOM);
    }

    /// Zoom out (narrow the chart).
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.2).max(MIN_ZOOM);
    }
}

fn fit_bounds(dates: &[NaiveDate], today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => (
            *min - Duration::days(PADDING_DAYS),
            *max + Duration::days(PADDING_DAYS),
        ),
        _ => (today - Duration::days(30), today + Duration::days(90)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bounds_pad_the_overall_range_by_a_week() {
        let dates = [d(2024, 1, 1), d(2024, 1, 10), d(2024, 2, 1), d(2024, 2, 5)];
        let model = TimelineModel::fit(&dates, TimelineScale::Days, 1.0, d(2030, 1, 1));
        assert_eq!(model.start, d(2023, 12, 25));
        assert_eq!(model.end, d(2024, 2, 12));
    }

    #[test]
    fn empty_schedule_gets_a_default_window_around_today() {
        let today = d(2024, 6, 1);
        let model = TimelineModel::fit(&[], TimelineScale::Weeks, 1.0, today);
        assert_eq!(model.start, d(2024, 5, 2));
        assert_eq!(model.end, d(2024, 8, 30));
    }

    #[test]
    fn width_has_a_floor_a_scale_factor_and_a_cap() {
        let start = d(2024, 1, 1);
        // 10 days * 40 px is under the floor.
        let short = TimelineModel::new(start, d(2024, 1, 11), TimelineScale::Days, 1.0);
        assert_eq!(short.width(), MIN_WIDTH);

        let long = TimelineModel::new(start, d(2024, 4, 10), TimelineScale::Days, 1.0);
        assert_eq!(long.width(), 100.0 * 40.0);

        let mut zoomed = long.clone();
        zoomed.zoom = 2.0;
        assert_eq!(zoomed.width(), 8000.0);

        let huge = TimelineModel::new(start, d(2030, 1, 1), TimelineScale::Days, 1.0);
        assert_eq!(huge.width(), MAX_WIDTH);
    }

    #[test]
    fn date_and_pixel_mapping_round_trips_across_the_window() {
        for scale in [TimelineScale::Days, TimelineScale::Weeks, TimelineScale::Months] {
            let model = TimelineModel::new(d(2023, 12, 25), d(2025, 2, 12), scale, 1.3);
            let mut date = model.start;
            while date <= model.end {
                assert_eq!(model.x_to_date(model.date_to_x(date)), date);
                date += Duration::days(3);
            }
            assert_eq!(model.date_to_x(model.start), 0.0);
            assert!((model.date_to_x(model.end) - model.width()).abs() < 0.01);
        }
    }

    #[test]
    fn rezooming_keeps_the_window() {
        let mut model = TimelineModel::new(d(2024, 1, 1), d(2024, 3, 1), TimelineScale::Weeks, 1.0);
        let before = (model.start, model.end);
        model.zoom_in();
        model.set_scale(TimelineScale::Months);
        model.zoom_out();
        assert_eq!((model.start, model.end), before);
        for _ in 0..40 {
            model.zoom_out();
        }
        assert_eq!(model.zoom, MIN_ZOOM);
    }
}
