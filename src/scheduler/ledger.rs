use crate::calendar;
use crate::model::{CaregiverId, Occurrence, ScheduleEntry};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Heures persistées d'un intervenant sur une semaine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WeeklyHours {
    pub one_time: f64,
    pub recurring: f64,
}

impl WeeklyHours {
    pub fn total(&self) -> f64 {
        self.one_time + self.recurring
    }
}

/// Heures d'une entrée tombant dans la semaine commençant au dimanche `sunday`.
pub fn entry_hours_in_week(entry: &ScheduleEntry, sunday: NaiveDate) -> WeeklyHours {
    if !entry.is_active {
        return WeeklyHours::default();
    }
    match &entry.occurrence {
        Occurrence::OneTime { date } if calendar::in_week(*date, sunday) => WeeklyHours {
            one_time: entry.hours(),
            recurring: 0.0,
        },
        Occurrence::OneTime { .. } => WeeklyHours::default(),
        Occurrence::Recurring { day_of_week, .. } => {
            let date = calendar::date_in_week(sunday, *day_of_week);
            if calendar::occurs_on(&entry.occurrence, date) {
                WeeklyHours {
                    one_time: 0.0,
                    recurring: entry.hours(),
                }
            } else {
                WeeklyHours::default()
            }
        }
    }
}

/// Registre des heures d'une semaine : persisté + réservations provisoires du lot en cours.
#[derive(Debug, Clone)]
pub struct HoursLedger {
    week_start: NaiveDate,
    persisted: HashMap<CaregiverId, WeeklyHours>,
    tentative: HashMap<CaregiverId, f64>,
}

impl HoursLedger {
    /// `week_of` peut être n'importe quel jour de la semaine.
    pub fn seed<'a, I>(week_of: NaiveDate, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleEntry>,
    {
        let week_start = calendar::week_start(week_of);
        let mut persisted: HashMap<CaregiverId, WeeklyHours> = HashMap::new();
        for entry in entries {
            let h = entry_hours_in_week(entry, week_start);
            if h.total() == 0.0 {
                continue;
            }
            let slot = persisted.entry(entry.caregiver_id.clone()).or_default();
            slot.one_time += h.one_time;
            slot.recurring += h.recurring;
        }
        Self {
            week_start,
            persisted,
            tentative: HashMap::new(),
        }
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn persisted(&self, caregiver: &CaregiverId) -> WeeklyHours {
        self.persisted.get(caregiver).copied().unwrap_or_default()
    }

    pub fn tentative_hours(&self, caregiver: &CaregiverId) -> f64 {
        self.tentative.get(caregiver).copied().unwrap_or(0.0)
    }

    /// Total projeté = persisté + provisoire.
    pub fn weekly_hours(&self, caregiver: &CaregiverId) -> f64 {
        self.persisted(caregiver).total() + self.tentative_hours(caregiver)
    }

    pub fn add_tentative(&mut self, caregiver: &CaregiverId, hours: f64) {
        *self.tentative.entry(caregiver.clone()).or_insert(0.0) += hours;
    }
}
