//! Auto-remplissage glouton d'un lot de créneaux ouverts.
//!
//! Une seule passe, créneau par créneau : chaque affectation met à jour le
//! `BatchContext` avant l'évaluation du créneau suivant.

use super::conflicts::{self, CandidateDay};
use super::ledger::HoursLedger;
use super::scoring::{self, CandidateScorer};
use super::types::{
    AutoFillReport, RejectedCandidate, ScoredCandidate, ShiftOutcome, UnfilledReason,
};
use super::{Engine, EngineError};
use crate::calendar;
use crate::model::{
    AvailabilityStatus, Caregiver, CaregiverId, Client, ClientId, OpenShift, ScheduleEntry,
    ScheduleId, TimeWindow,
};
use crate::storage::ScheduleStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// État mutable d'un lot : entrées persistées (instantané), réservations
/// provisoires et registres d'heures par semaine.
#[derive(Debug, Clone)]
pub struct BatchContext {
    persisted: Vec<ScheduleEntry>,
    tentative: Vec<ScheduleEntry>,
    ledgers: BTreeMap<NaiveDate, HoursLedger>,
}

impl BatchContext {
    /// Les entrées inactives sont écartées dès l'instantané.
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self {
            persisted: entries.into_iter().filter(|e| e.is_active).collect(),
            tentative: Vec::new(),
            ledgers: BTreeMap::new(),
        }
    }

    fn ledger(&mut self, date: NaiveDate) -> &mut HoursLedger {
        let week = calendar::week_start(date);
        let persisted = &self.persisted;
        self.ledgers
            .entry(week)
            .or_insert_with(|| HoursLedger::seed(week, persisted))
    }

    /// Heures projetées de la semaine contenant `date`.
    pub fn projected_hours(&mut self, caregiver: &CaregiverId, date: NaiveDate) -> f64 {
        self.ledger(date).weekly_hours(caregiver)
    }

    /// Conflit avec une entrée persistée ou une réservation antérieure du lot.
    pub fn has_conflict(&self, caregiver: &CaregiverId, date: NaiveDate, window: &TimeWindow) -> bool {
        let day = CandidateDay::Date(date);
        conflicts::has_conflict(caregiver, day, window, &self.persisted)
            || conflicts::has_conflict(caregiver, day, window, &self.tentative)
    }

    /// Enregistre une affectation : plage réservée + heures provisoires.
    pub fn record(&mut self, entry: ScheduleEntry, date: NaiveDate) {
        let hours = entry.hours();
        let caregiver = entry.caregiver_id.clone();
        self.ledger(date).add_tentative(&caregiver, hours);
        self.tentative.push(entry);
    }
}

/// Urgence décroissante, puis date, heure de début, identifiant.
pub fn order_shifts(shifts: &mut [OpenShift]) {
    shifts.sort_by(|a, b| {
        b.urgency
            .cmp(&a.urgency)
            .then(a.date.cmp(&b.date))
            .then(a.start_time.cmp(&b.start_time))
            .then_with(|| a.id.cmp(&b.id))
    });
}

struct RosterMember {
    caregiver: Caregiver,
    certifications: BTreeSet<String>,
}

pub(super) fn auto_fill<S: ScheduleStore>(
    engine: &mut Engine<S>,
    start: NaiveDate,
    end: NaiveDate,
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<AutoFillReport, EngineError> {
    if end < start {
        return Err(EngineError::Validation(
            "end date must not be before start date".into(),
        ));
    }
    let span = tracing::info_span!("auto_fill", %start, %end, dry_run);
    let _enter = span.enter();
    let today = now.date_naive();

    let mut shifts = engine.store.open_shifts(start, end)?;
    order_shifts(&mut shifts);

    let roster: Vec<RosterMember> = engine
        .store
        .caregivers()?
        .into_iter()
        .filter(|c| c.availability != AvailabilityStatus::Unavailable)
        .map(|caregiver| RosterMember {
            certifications: caregiver.active_certifications(today),
            caregiver,
        })
        .collect();

    let mut ctx = BatchContext::new(engine.store.schedule_entries()?);
    let mut clients: HashMap<ClientId, (Client, BTreeSet<String>)> = HashMap::new();
    let mut results = Vec::with_capacity(shifts.len());

    for shift in &shifts {
        let outcome = match fill_shift(
            engine,
            &mut ctx,
            &mut clients,
            &roster,
            shift,
            dry_run,
            now,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(shift = %shift.id, error = %err, "shift evaluation failed");
                ShiftOutcome::Error {
                    shift_id: shift.id.clone(),
                    caregiver_id: None,
                    schedule_id: None,
                    error: err.to_string(),
                }
            }
        };
        results.push(outcome);
    }

    let filled = results.iter().filter(|r| r.is_assigned()).count();
    let report = AutoFillReport {
        dry_run,
        filled,
        failed: results.len() - filled,
        total: results.len(),
        results,
    };
    tracing::info!(
        filled = report.filled,
        failed = report.failed,
        total = report.total,
        "auto-fill finished"
    );
    Ok(report)
}

fn fill_shift<S: ScheduleStore>(
    engine: &mut Engine<S>,
    ctx: &mut BatchContext,
    clients: &mut HashMap<ClientId, (Client, BTreeSet<String>)>,
    roster: &[RosterMember],
    shift: &OpenShift,
    dry_run: bool,
    now: DateTime<Utc>,
) -> Result<ShiftOutcome, EngineError> {
    let window = shift
        .window()
        .map_err(|e| EngineError::Validation(format!("shift {}: {e}", shift.id)))?;
    let shift_hours = window.hours();

    if !clients.contains_key(&shift.client_id) {
        let client = engine
            .store
            .client(&shift.client_id)?
            .ok_or_else(|| EngineError::client_not_found(&shift.client_id))?;
        let required = engine.store.required_certifications(&client)?;
        clients.insert(shift.client_id.clone(), (client, required));
    }
    let Some((client, required)) = clients.get(&shift.client_id) else {
        return Err(EngineError::client_not_found(&shift.client_id));
    };

    if roster.is_empty() {
        return Ok(ShiftOutcome::Unfilled {
            shift_id: shift.id.clone(),
            reason: UnfilledReason::NoCaregivers,
            top_disqualified: Vec::new(),
        });
    }

    let scorer = CandidateScorer::new(&engine.options);
    let mut candidates: Vec<ScoredCandidate> = Vec::with_capacity(roster.len());
    let mut rejected: Vec<RejectedCandidate> = Vec::new();

    for member in roster {
        let caregiver = &member.caregiver;
        let has_conflict = ctx.has_conflict(&caregiver.id, shift.date, &window);
        let projected = ctx.projected_hours(&caregiver.id, shift.date);
        let facts = engine.candidate_facts_with_certs(
            caregiver,
            client,
            required,
            &member.certifications,
            projected,
            shift_hours,
            has_conflict,
        )?;
        let candidate = scorer.score(caregiver, &facts);

        match scoring::disqualification(caregiver, &facts) {
            Some(reason) => {
                rejected.push(RejectedCandidate {
                    caregiver_id: caregiver.id.clone(),
                    caregiver_name: caregiver.name.clone(),
                    reason,
                    score: candidate.score,
                });
                candidates.push(scoring::disqualify(candidate, reason));
            }
            None => candidates.push(candidate),
        }
    }

    scoring::rank(&mut candidates);
    let Some(best) = candidates.into_iter().find(|c| !c.disqualified) else {
        rejected.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.caregiver_id.cmp(&b.caregiver_id))
        });
        rejected.truncate(engine.options.report_top_disqualified);
        tracing::debug!(shift = %shift.id, "no eligible caregiver");
        return Ok(ShiftOutcome::Unfilled {
            shift_id: shift.id.clone(),
            reason: UnfilledReason::AllDisqualified,
            top_disqualified: rejected,
        });
    };

    let mut entry = ScheduleEntry::one_time(
        best.caregiver_id.clone(),
        shift.client_id.clone(),
        shift.date,
        window,
    );
    entry.notes = shift.notes.clone();

    let schedule_id = if dry_run {
        ctx.record(entry, shift.date);
        None
    } else {
        match commit(engine, ctx, shift, entry, now) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(
                    shift = %shift.id,
                    caregiver = %best.caregiver_id,
                    written = err.schedule_id.is_some(),
                    error = %err.source,
                    "commit failed"
                );
                return Ok(ShiftOutcome::Error {
                    shift_id: shift.id.clone(),
                    caregiver_id: Some(best.caregiver_id),
                    schedule_id: err.schedule_id,
                    error: format!("{:#}", err.source),
                });
            }
        }
    };

    tracing::debug!(
        shift = %shift.id,
        caregiver = %best.caregiver_id,
        score = best.score,
        "shift assigned"
    );
    Ok(ShiftOutcome::Assigned {
        shift_id: shift.id.clone(),
        caregiver_id: best.caregiver_id,
        caregiver_name: best.caregiver_name,
        date: shift.date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        score: best.score,
        distance_miles: best.distance_miles,
        familiarity: best.prior_visit_count,
        schedule_id,
    })
}

/// Échec d'écriture ; `schedule_id` est renseigné si l'entrée est déjà persistée.
struct CommitError {
    schedule_id: Option<ScheduleId>,
    source: anyhow::Error,
}

/// Persiste l'entrée puis passe le créneau à `filled`. Dès que l'entrée est
/// écrite, elle compte dans le contexte du lot, même si la transition échoue.
fn commit<S: ScheduleStore>(
    engine: &mut Engine<S>,
    ctx: &mut BatchContext,
    shift: &OpenShift,
    entry: ScheduleEntry,
    now: DateTime<Utc>,
) -> Result<ScheduleId, CommitError> {
    let caregiver = entry.caregiver_id.clone();
    let id = engine
        .store
        .insert_schedule(entry.clone())
        .map_err(|source| CommitError {
            schedule_id: None,
            source,
        })?;
    ctx.record(entry, shift.date);
    engine
        .store
        .mark_shift_filled(&shift.id, &caregiver, now)
        .map_err(|source| CommitError {
            schedule_id: Some(id.clone()),
            source,
        })?;
    Ok(id)
}
