pub mod autofill;
pub mod conflicts;
pub mod ledger;
mod recurrence;
pub mod scoring;
mod suggest;
mod types;
mod views;

pub use autofill::BatchContext;
pub use conflicts::{CandidateDay, Overlap};
pub use ledger::{HoursLedger, WeeklyHours};
pub use scoring::{CandidateFacts, CandidateScorer};
pub use types::{
    AutoFillReport, BulkCreateReport, BulkCreateRequest, CaregiverHours, CaregiverUtilization,
    CaregiverWeek, ClientCoverage, ConflictQuery, ConflictReport, CoverageOverview,
    DisqualifyReason, EngineError, EngineOptions, RejectedCandidate, ScoredCandidate,
    ShiftOutcome, SkippedSlot, SuggestRequest, UnfilledReason, WeekCell, WeekDay, WeekView,
};

use crate::certification;
use crate::geo;
use crate::model::{Caregiver, CaregiverId, Client};
use crate::storage::ScheduleStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

/// Engine : opérations de planification au-dessus d'un `ScheduleStore`.
///
/// Chaque appel est séquentiel ; deux engines sur des stores distincts
/// ne partagent aucun état.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
    options: EngineOptions,
}

impl<S: ScheduleStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    pub fn with_options(store: S, options: EngineOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
    pub fn into_store(self) -> S {
        self.store
    }
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Intervenants classés pour un créneau (pénalités, pas de filtre).
    pub fn suggest_caregivers(
        &self,
        req: &SuggestRequest,
        today: NaiveDate,
    ) -> Result<Vec<ScoredCandidate>, EngineError> {
        suggest::suggest_caregivers(self, req, today)
    }

    /// Remplit les créneaux ouverts de `[start, end]`. En `dry_run`, aucune écriture.
    pub fn auto_fill(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        dry_run: bool,
        now: DateTime<Utc>,
    ) -> Result<AutoFillReport, EngineError> {
        autofill::auto_fill(self, start, end, dry_run, now)
    }

    pub fn check_conflicts(&self, query: &ConflictQuery) -> Result<ConflictReport, EngineError> {
        conflicts::check_conflicts(self, query)
    }

    pub fn week_view(&self, week_of: NaiveDate) -> Result<WeekView, EngineError> {
        views::week_view(self, week_of)
    }

    pub fn bulk_create(
        &mut self,
        req: &BulkCreateRequest,
        today: NaiveDate,
    ) -> Result<BulkCreateReport, EngineError> {
        recurrence::bulk_create(self, req, today)
    }

    pub fn caregiver_hours(
        &self,
        caregiver_id: &CaregiverId,
        week_of: NaiveDate,
    ) -> Result<CaregiverHours, EngineError> {
        views::caregiver_hours(self, caregiver_id, week_of)
    }

    pub fn coverage_overview(&self, week_of: NaiveDate) -> Result<CoverageOverview, EngineError> {
        views::coverage_overview(self, week_of)
    }

    /// Chevauchements entre entrées actives déjà persistées sur la semaine.
    pub fn audit_week(&self, week_of: NaiveDate) -> Result<Vec<Overlap>, EngineError> {
        views::audit_week(self, week_of)
    }

    #[allow(clippy::too_many_arguments)]
    fn candidate_facts(
        &self,
        caregiver: &Caregiver,
        client: &Client,
        required: &BTreeSet<String>,
        today: NaiveDate,
        projected: f64,
        shift_hours: f64,
        has_conflict: bool,
    ) -> Result<CandidateFacts, EngineError> {
        let held = caregiver.active_certifications(today);
        self.candidate_facts_with_certs(
            caregiver,
            client,
            required,
            &held,
            projected,
            shift_hours,
            has_conflict,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn candidate_facts_with_certs(
        &self,
        caregiver: &Caregiver,
        client: &Client,
        required: &BTreeSet<String>,
        held: &BTreeSet<String>,
        projected: f64,
        shift_hours: f64,
        has_conflict: bool,
    ) -> Result<CandidateFacts, EngineError> {
        let prior_visits = self.store.completed_visit_count(&caregiver.id, &client.id)?;
        Ok(CandidateFacts {
            projected_weekly_hours: projected,
            shift_hours,
            distance_miles: geo::distance_miles(caregiver.location(), client.location()),
            prior_visits,
            has_conflict,
            certs_required: !required.is_empty(),
            certs: certification::satisfies(held, required),
        })
    }
}
