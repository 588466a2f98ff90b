use super::conflicts::{self, Overlap};
use super::ledger::{entry_hours_in_week, HoursLedger};
use super::types::{
    CaregiverHours, CaregiverUtilization, CaregiverWeek, ClientCoverage, CoverageOverview, WeekCell,
    WeekDay, WeekView,
};
use super::{Engine, EngineError};
use crate::calendar;
use crate::model::{CaregiverId, Client, ClientId, Occurrence, ScheduleEntry};
use crate::storage::ScheduleStore;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Unités de facturation par heure (unité de 15 minutes).
const UNITS_PER_HOUR: f64 = 4.0;

fn active_entries<S: ScheduleStore>(engine: &Engine<S>) -> Result<Vec<ScheduleEntry>, EngineError> {
    Ok(engine
        .store
        .schedule_entries()?
        .into_iter()
        .filter(|e| e.is_active)
        .collect())
}

pub(super) fn week_view<S: ScheduleStore>(
    engine: &Engine<S>,
    week_of: NaiveDate,
) -> Result<WeekView, EngineError> {
    let week_start = calendar::week_start(week_of);
    let entries = active_entries(engine)?;
    let clients: HashMap<ClientId, Client> = engine
        .store
        .clients()?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();
    let ledger = HoursLedger::seed(week_start, &entries);

    let mut caregivers = Vec::new();
    for caregiver in engine.store.caregivers()? {
        let days = calendar::week_days(week_start)
            .into_iter()
            .map(|date| {
                let mut cells: Vec<WeekCell> = entries
                    .iter()
                    .filter(|e| e.caregiver_id == caregiver.id)
                    .filter(|e| conflicts::entry_applies_on(e, date))
                    .map(|e| WeekCell {
                        schedule_id: e.id.clone(),
                        client_id: e.client_id.clone(),
                        client_name: clients
                            .get(&e.client_id)
                            .map(|c| c.name.clone())
                            .unwrap_or_default(),
                        start_time: e.start_time,
                        end_time: e.end_time,
                        recurring: matches!(e.occurrence, Occurrence::Recurring { .. }),
                    })
                    .collect();
                cells.sort_by_key(|c| (c.start_time, c.end_time));
                WeekDay {
                    date,
                    entries: cells,
                }
            })
            .collect();
        caregivers.push(CaregiverWeek {
            total_hours: ledger.weekly_hours(&caregiver.id),
            caregiver_id: caregiver.id,
            caregiver_name: caregiver.name,
            days,
        });
    }
    caregivers.sort_by(|a, b| a.caregiver_name.cmp(&b.caregiver_name));

    Ok(WeekView {
        week_start,
        caregivers,
    })
}

pub(super) fn caregiver_hours<S: ScheduleStore>(
    engine: &Engine<S>,
    caregiver_id: &CaregiverId,
    week_of: NaiveDate,
) -> Result<CaregiverHours, EngineError> {
    let caregiver = engine
        .store
        .caregiver(caregiver_id)?
        .ok_or_else(|| EngineError::caregiver_not_found(caregiver_id))?;
    let entries = active_entries(engine)?;
    let ledger = HoursLedger::seed(week_of, &entries);
    let hours = ledger.persisted(caregiver_id);
    let total = hours.total();

    Ok(CaregiverHours {
        caregiver_id: caregiver.id,
        week_start: ledger.week_start(),
        total_hours: total,
        one_time_hours: hours.one_time,
        recurring_hours: hours.recurring,
        max_hours: caregiver.max_hours_per_week,
        remaining_hours: (caregiver.max_hours_per_week - total).max(0.0),
        approaching_overtime: total > engine.options.overtime_threshold_hours,
    })
}

pub(super) fn coverage_overview<S: ScheduleStore>(
    engine: &Engine<S>,
    week_of: NaiveDate,
) -> Result<CoverageOverview, EngineError> {
    let entries = active_entries(engine)?;
    let ledger = HoursLedger::seed(week_of, &entries);
    let week_start = ledger.week_start();

    let mut caregivers: Vec<CaregiverUtilization> = engine
        .store
        .caregivers()?
        .into_iter()
        .map(|c| {
            let scheduled = ledger.weekly_hours(&c.id);
            let pct = if c.max_hours_per_week > 0.0 {
                (scheduled / c.max_hours_per_week * 100.0).round().max(0.0) as u32
            } else {
                0
            };
            CaregiverUtilization {
                caregiver_id: c.id,
                caregiver_name: c.name,
                scheduled_hours: scheduled,
                max_hours: c.max_hours_per_week,
                utilization_pct: pct,
            }
        })
        .collect();
    caregivers.sort_by(|a, b| {
        b.utilization_pct
            .cmp(&a.utilization_pct)
            .then_with(|| a.caregiver_name.cmp(&b.caregiver_name))
    });

    let mut client_hours: HashMap<&ClientId, f64> = HashMap::new();
    for e in &entries {
        *client_hours.entry(&e.client_id).or_insert(0.0) += entry_hours_in_week(e, week_start).total();
    }

    let mut clients: Vec<ClientCoverage> = engine
        .store
        .clients()?
        .into_iter()
        .filter_map(|c| {
            let authorized = c.authorized_units_per_week?;
            let scheduled = client_hours.get(&c.id).copied().unwrap_or(0.0) * UNITS_PER_HOUR;
            Some(ClientCoverage {
                client_id: c.id,
                client_name: c.name,
                authorized_units: authorized,
                scheduled_units: scheduled,
                shortfall_units: (authorized - scheduled).max(0.0),
            })
        })
        .collect();
    clients.sort_by(|a, b| {
        b.shortfall_units
            .total_cmp(&a.shortfall_units)
            .then_with(|| a.client_name.cmp(&b.client_name))
    });

    Ok(CoverageOverview {
        week_start,
        caregivers,
        clients,
    })
}

pub(super) fn audit_week<S: ScheduleStore>(
    engine: &Engine<S>,
    week_of: NaiveDate,
) -> Result<Vec<Overlap>, EngineError> {
    let entries = active_entries(engine)?;
    Ok(conflicts::detect_week_overlaps(&entries, week_of))
}
