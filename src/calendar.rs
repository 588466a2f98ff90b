//! Calculs calendaires : semaines alignées sur le dimanche, activation des récurrences.

use crate::model::{Frequency, Occurrence};
use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

/// Dimanche de la semaine contenant `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Les 7 jours (dimanche → samedi) de la semaine commençant à `start`.
pub fn week_days(start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

/// Date du jour `day` dans la semaine commençant au dimanche `sunday`.
pub fn date_in_week(sunday: NaiveDate, day: Weekday) -> NaiveDate {
    sunday + Duration::days(i64::from(day.num_days_from_sunday()))
}

pub fn in_week(date: NaiveDate, sunday: NaiveDate) -> bool {
    date >= sunday && date < sunday + Duration::days(7)
}

/// Durée en heures décimales ; 0 si la plage est vide ou inversée.
pub fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    let minutes = (end - start).num_minutes();
    if minutes <= 0 {
        return 0.0;
    }
    minutes as f64 / 60.0
}

/// Une occurrence bi-hebdomadaire est active quand le nombre de semaines
/// écoulées depuis l'ancre est pair.
pub fn biweekly_active(anchor: NaiveDate, date: NaiveDate) -> bool {
    let weeks = (date - anchor).num_days().div_euclid(7);
    weeks.rem_euclid(2) == 0
}

/// L'occurrence s'applique-t-elle à la date concrète `date` ?
pub fn occurs_on(occurrence: &Occurrence, date: NaiveDate) -> bool {
    match occurrence {
        Occurrence::OneTime { date: d } => *d == date,
        Occurrence::Recurring {
            day_of_week,
            frequency,
            anchor_date,
            effective_date,
        } => {
            if date.weekday() != *day_of_week {
                return false;
            }
            if effective_date.is_some_and(|eff| date < eff) {
                return false;
            }
            match (frequency, anchor_date) {
                (Frequency::Biweekly, Some(anchor)) => biweekly_active(*anchor, date),
                _ => true,
            }
        }
    }
}

/// Accepte `HH:MM` ou `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    for fmt in ["%H:%M", "%H:%M:%S"] {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
            return Ok(t);
        }
    }
    bail!("invalid time (expected HH:MM): {raw}")
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(d) => Ok(d),
        Err(_) => bail!("invalid date (expected YYYY-MM-DD): {raw}"),
    }
}

/// Accepte `0`..`6` (0 = dimanche) ou un nom anglais (`mon`, `Monday`...).
pub fn parse_weekday(raw: &str) -> Result<Weekday> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u8>() {
        return match n {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            _ => bail!("day of week out of range (0-6): {raw}"),
        };
    }
    raw.parse::<Weekday>()
        .map_err(|_| anyhow::anyhow!("invalid day of week: {raw}"))
}
