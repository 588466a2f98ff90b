use super::types::{ConflictQuery, ConflictReport};
use super::{Engine, EngineError};
use crate::calendar;
use crate::model::{CaregiverId, Occurrence, ScheduleEntry, ScheduleId, TimeWindow};
use crate::storage::ScheduleStore;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// Jour visé par une plage candidate : date concrète ou jour de semaine récurrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDay {
    Date(NaiveDate),
    Weekday(Weekday),
}

/// L'entrée active s'applique-t-elle à cette date concrète ?
pub fn entry_applies_on(entry: &ScheduleEntry, date: NaiveDate) -> bool {
    entry.is_active && calendar::occurs_on(&entry.occurrence, date)
}

fn entry_matches_day(entry: &ScheduleEntry, day: CandidateDay) -> bool {
    if !entry.is_active {
        return false;
    }
    match day {
        CandidateDay::Date(date) => calendar::occurs_on(&entry.occurrence, date),
        // sans date concrète, seules les récurrences du même jour sont comparables
        CandidateDay::Weekday(weekday) => matches!(
            entry.occurrence,
            Occurrence::Recurring { day_of_week, .. } if day_of_week == weekday
        ),
    }
}

/// Entrées de l'intervenant qui chevauchent la plage candidate.
pub fn find_conflicts<'a, I>(
    caregiver: &CaregiverId,
    day: CandidateDay,
    window: &TimeWindow,
    entries: I,
) -> Vec<&'a ScheduleEntry>
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    entries
        .into_iter()
        .filter(|e| &e.caregiver_id == caregiver)
        .filter(|e| entry_matches_day(e, day))
        .filter(|e| e.window().overlaps(window))
        .collect()
}

pub fn has_conflict<'a, I>(
    caregiver: &CaregiverId,
    day: CandidateDay,
    window: &TimeWindow,
    entries: I,
) -> bool
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    entries.into_iter().any(|e| {
        &e.caregiver_id == caregiver && entry_matches_day(e, day) && e.window().overlaps(window)
    })
}

/// Chevauchement constaté entre deux entrées persistées.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub caregiver_id: CaregiverId,
    pub date: NaiveDate,
    pub entry_a: ScheduleId,
    pub entry_b: ScheduleId,
}

/// Contrôle de l'invariant « pas deux entrées actives qui se chevauchent
/// le même jour » sur une semaine.
pub fn detect_week_overlaps(entries: &[ScheduleEntry], week_start: NaiveDate) -> Vec<Overlap> {
    let mut out = Vec::new();
    for date in calendar::week_days(calendar::week_start(week_start)) {
        let mut today: Vec<&ScheduleEntry> =
            entries.iter().filter(|e| entry_applies_on(e, date)).collect();
        today.sort_by(|a, b| {
            a.caregiver_id
                .cmp(&b.caregiver_id)
                .then(a.start_time.cmp(&b.start_time))
        });

        for (idx, a) in today.iter().enumerate() {
            for b in today.iter().skip(idx + 1) {
                if a.caregiver_id != b.caregiver_id {
                    break;
                }
                if a.window().overlaps(&b.window()) {
                    out.push(Overlap {
                        caregiver_id: a.caregiver_id.clone(),
                        date,
                        entry_a: a.id.clone(),
                        entry_b: b.id.clone(),
                    });
                }
            }
        }
    }
    out
}

pub(super) fn check_conflicts<S: ScheduleStore>(
    engine: &Engine<S>,
    query: &ConflictQuery,
) -> Result<ConflictReport, EngineError> {
    let caregiver_id = query
        .caregiver_id
        .as_ref()
        .ok_or_else(|| EngineError::Validation("caregiver_id is required".into()))?;
    let (Some(start), Some(end)) = (query.start_time, query.end_time) else {
        return Err(EngineError::Validation(
            "start_time and end_time are required".into(),
        ));
    };
    let day = match (query.date, query.day_of_week) {
        (Some(date), Some(weekday)) if date.weekday() != weekday => {
            return Err(EngineError::Validation(format!(
                "date {date} is not a {weekday}"
            )));
        }
        (Some(date), _) => CandidateDay::Date(date),
        (None, Some(weekday)) => CandidateDay::Weekday(weekday),
        (None, None) => {
            return Err(EngineError::Validation(
                "either date or day_of_week is required".into(),
            ));
        }
    };
    let window = TimeWindow::new(start, end).map_err(EngineError::Validation)?;

    if engine.store.caregiver(caregiver_id)?.is_none() {
        return Err(EngineError::caregiver_not_found(caregiver_id));
    }

    let entries = engine.store.schedule_entries()?;
    let conflicts: Vec<ScheduleEntry> = find_conflicts(caregiver_id, day, &window, &entries)
        .into_iter()
        .cloned()
        .collect();

    tracing::debug!(
        caregiver = %caregiver_id,
        ?day,
        conflicts = conflicts.len(),
        "conflict check"
    );

    Ok(ConflictReport {
        has_conflict: !conflicts.is_empty(),
        conflicts,
    })
}
