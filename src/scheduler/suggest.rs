use super::conflicts::{self, CandidateDay};
use super::ledger::HoursLedger;
use super::scoring::{self, CandidateScorer};
use super::types::{ScoredCandidate, SuggestRequest};
use super::{Engine, EngineError};
use crate::calendar;
use crate::model::{ScheduleEntry, TimeWindow};
use crate::storage::ScheduleStore;
use chrono::NaiveDate;

/// Classement complet des intervenants pour un créneau unique.
///
/// Pénalités seulement : un candidat en conflit ou sans certification reste
/// listé, plus bas, avec ses raisons.
pub(super) fn suggest_caregivers<S: ScheduleStore>(
    engine: &Engine<S>,
    req: &SuggestRequest,
    today: NaiveDate,
) -> Result<Vec<ScoredCandidate>, EngineError> {
    let client_id = req
        .client_id
        .as_ref()
        .ok_or_else(|| EngineError::Validation("client_id is required".into()))?;

    let window = match (req.start_time, req.end_time) {
        (Some(start), Some(end)) => Some(TimeWindow::new(start, end).map_err(EngineError::Validation)?),
        (None, None) => None,
        _ => {
            return Err(EngineError::Validation(
                "start_time and end_time must be given together".into(),
            ))
        }
    };
    let shift_hours = window
        .map(|w| w.hours())
        .unwrap_or(engine.options.default_shift_hours);

    let client = engine
        .store
        .client(client_id)?
        .ok_or_else(|| EngineError::client_not_found(client_id))?;
    let required = engine.store.required_certifications(&client)?;

    let entries: Vec<ScheduleEntry> = engine
        .store
        .schedule_entries()?
        .into_iter()
        .filter(|e| e.is_active)
        .collect();
    let ledger = HoursLedger::seed(req.date.unwrap_or(today), &entries);
    let scorer = CandidateScorer::new(&engine.options);

    let mut ranked = Vec::new();
    for caregiver in engine.store.caregivers()? {
        let has_conflict = match (req.date, window) {
            (Some(date), Some(w)) => {
                conflicts::has_conflict(&caregiver.id, CandidateDay::Date(date), &w, &entries)
            }
            _ => false,
        };
        let facts = engine.candidate_facts(
            &caregiver,
            &client,
            &required,
            today,
            ledger.weekly_hours(&caregiver.id),
            shift_hours,
            has_conflict,
        )?;
        ranked.push(scorer.score(&caregiver, &facts));
    }
    scoring::rank(&mut ranked);

    tracing::debug!(
        client = %client_id,
        week = %calendar::week_start(req.date.unwrap_or(today)),
        candidates = ranked.len(),
        "suggestions computed"
    );
    Ok(ranked)
}
