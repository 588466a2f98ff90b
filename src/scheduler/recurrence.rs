use super::conflicts::{self, CandidateDay};
use super::types::{BulkCreateReport, BulkCreateRequest, SkippedSlot};
use super::{Engine, EngineError};
use crate::calendar;
use crate::model::{ScheduleEntry, TimeWindow};
use crate::storage::ScheduleStore;
use chrono::{Duration, NaiveDate};

/// Déroule un modèle hebdomadaire sur N semaines en entrées ponctuelles,
/// en sautant les dates passées et les créneaux en conflit.
pub(super) fn bulk_create<S: ScheduleStore>(
    engine: &mut Engine<S>,
    req: &BulkCreateRequest,
    today: NaiveDate,
) -> Result<BulkCreateReport, EngineError> {
    if req.template.is_empty() {
        return Err(EngineError::Validation(
            "template must contain at least one slot".into(),
        ));
    }
    let windows = req
        .template
        .iter()
        .map(|slot| {
            TimeWindow::new(slot.start_time, slot.end_time)
                .map(|w| (slot.day_of_week, w))
                .map_err(|e| EngineError::Validation(format!("slot on {}: {e}", slot.day_of_week)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if engine.store.caregiver(&req.caregiver_id)?.is_none() {
        return Err(EngineError::caregiver_not_found(&req.caregiver_id));
    }
    if engine.store.client(&req.client_id)?.is_none() {
        return Err(EngineError::client_not_found(&req.client_id));
    }

    let weeks = req.weeks.clamp(1, engine.options.max_bulk_weeks.max(1));
    let first_sunday = calendar::week_start(req.start_date);
    let mut entries: Vec<ScheduleEntry> = engine
        .store
        .schedule_entries()?
        .into_iter()
        .filter(|e| e.is_active)
        .collect();

    let mut report = BulkCreateReport {
        created: 0,
        skipped_conflicts: 0,
        conflicts: Vec::new(),
        created_ids: Vec::new(),
    };

    for week in 0..weeks {
        let sunday = first_sunday + Duration::weeks(i64::from(week));
        for (day, window) in &windows {
            let date = calendar::date_in_week(sunday, *day);
            if date < today {
                tracing::debug!(%date, "skipping past slot");
                continue;
            }
            if conflicts::has_conflict(&req.caregiver_id, CandidateDay::Date(date), window, &entries) {
                tracing::debug!(%date, start = %window.start, "skipping conflicting slot");
                report.conflicts.push(SkippedSlot {
                    date,
                    start_time: window.start,
                    end_time: window.end,
                });
                continue;
            }

            let mut entry =
                ScheduleEntry::one_time(req.caregiver_id.clone(), req.client_id.clone(), date, *window);
            entry.notes = req.notes.clone();
            let id = engine.store.insert_schedule(entry.clone())?;
            report.created_ids.push(id);
            entries.push(entry);
        }
    }

    report.created = report.created_ids.len();
    report.skipped_conflicts = report.conflicts.len();
    tracing::info!(
        caregiver = %req.caregiver_id,
        client = %req.client_id,
        weeks,
        created = report.created,
        skipped = report.skipped_conflicts,
        "bulk create finished"
    );
    Ok(report)
}
