//! Month calendar writing the selected date

use app_core::DateSelection;
use chrono::{Datelike, Local, Months, NaiveDate};
use egui::{Ui, Vec2};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November",
    "December",
];

/// Years offered either side of the shown one
const YEAR_SPAN: i32 = 10;

/// Calendar component
pub struct Calendar {
    /// First day of the shown month
    month: NaiveDate,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar {
    /// Calendar opened on the current month
    pub fn new() -> Self {
        Self::showing(Local::now().date_naive())
    }

    pub fn showing(date: NaiveDate) -> Self {
        Self {
            month: first_of_month(date),
        }
    }

    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn prev_month(&mut self) {
        if let Some(m) = self.month.checked_sub_months(Months::new(1)) {
            self.month = m;
        }
    }

    pub fn next_month(&mut self) {
        if let Some(m) = self.month.checked_add_months(Months::new(1)) {
            self.month = m;
        }
    }

    /// Jump to `year`, keeping the month
    pub fn set_year(&mut self, year: i32) {
        if let Some(m) = self.month.with_year(year) {
            self.month = m;
        }
    }

    /// Render the calendar; clicking a day writes it to `selection`
    pub fn ui(&mut self, ui: &mut Ui, selection: &DateSelection) {
        ui.horizontal(|ui| {
            if ui.small_button("←").clicked() {
                self.prev_month();
            }

            ui.strong(MONTH_NAMES[self.month.month0() as usize]);

            let shown_year = self.month.year();
            let mut year = shown_year;
            egui::ComboBox::from_id_salt("calendar_year")
                .selected_text(year.to_string())
                .width(64.0)
                .show_ui(ui, |ui| {
                    for y in year_range(shown_year) {
                        ui.selectable_value(&mut year, y, y.to_string());
                    }
                });
            if year != shown_year {
                self.set_year(year);
            }

            if ui.small_button("→").clicked() {
                self.next_month();
            }
        });

        let selected = selection.get();
        let cell = Vec2::new((ui.available_width() / 7.0 - 4.0).max(24.0), 28.0);

        egui::Grid::new("calendar_grid")
            .num_columns(7)
            .spacing(Vec2::new(4.0, 4.0))
            .show(ui, |ui| {
                for name in WEEKDAYS {
                    ui.centered_and_justified(|ui| ui.strong(name));
                }
                ui.end_row();

                for week in month_cells(self.month).chunks(7) {
                    for day in week {
                        match day {
                            Some(date) => {
                                let button = egui::Button::new(date.day().to_string())
                                    .selected(selected == Some(*date))
                                    .min_size(cell);
                                if ui.add(button).clicked() {
                                    selection.set(Some(*date));
                                }
                            }
                            None => {
                                ui.allocate_space(cell);
                            }
                        }
                    }
                    ui.end_row();
                }
            });
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Days of the month laid out Sunday first, with leading blanks
pub fn month_cells(month: NaiveDate) -> Vec<Option<NaiveDate>> {
    let first = first_of_month(month);
    let blanks = first.weekday().num_days_from_sunday() as usize;

    let mut cells = vec![None; blanks];
    cells.extend(first.iter_days().take_while(|d| d.month() == first.month()).map(Some));
    cells
}

pub fn year_range(year: i32) -> std::ops::RangeInclusive<i32> {
    (year - YEAR_SPAN)..=(year + YEAR_SPAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_october_2024_layout() {
        // 2024-10-01 was a Tuesday
        let cells = month_cells(ymd(2024, 10, 17));
        assert_eq!(cells.len(), 2 + 31);
        assert_eq!(&cells[..2], &[None, None]);
        assert_eq!(cells[2], Some(ymd(2024, 10, 1)));
        assert_eq!(cells.last().copied().flatten(), Some(ymd(2024, 10, 31)));
    }

    #[test]
    fn test_leap_february() {
        let cells = month_cells(ymd(2024, 2, 1));
        assert_eq!(cells.iter().flatten().count(), 29);
        let cells = month_cells(ymd(2023, 2, 1));
        assert_eq!(cells.iter().flatten().count(), 28);
    }

    #[test]
    fn test_month_navigation_wraps_year() {
        let mut calendar = Calendar::showing(ymd(2024, 1, 20));
        assert_eq!(calendar.month(), ymd(2024, 1, 1));
        calendar.prev_month();
        assert_eq!(calendar.month(), ymd(2023, 12, 1));
        calendar.next_month();
        calendar.next_month();
        assert_eq!(calendar.month(), ymd(2024, 2, 1));
    }

    #[test]
    fn test_year_select_keeps_month() {
        let mut calendar = Calendar::showing(ymd(2024, 10, 9));
        calendar.set_year(2019);
        assert_eq!(calendar.month(), ymd(2019, 10, 1));

        let years = year_range(2024);
        assert_eq!(*years.start(), 2014);
        assert_eq!(*years.end(), 2034);
        assert_eq!(years.count(), 21);
    }
}
