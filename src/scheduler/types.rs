use crate::model::{CaregiverId, ClientId, ScheduleEntry, ScheduleId, ShiftId};
use crate::template::TemplateSlot;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use thiserror::Error;

/// Options du moteur
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Au-delà, l'intervenant est considéré proche des heures sup.
    pub overtime_threshold_hours: f64,
    /// Durée estimée quand la suggestion n'a pas de plage horaire.
    pub default_shift_hours: f64,
    pub max_bulk_weeks: u32,
    /// Nombre de candidats disqualifiés rapportés par créneau non pourvu.
    pub report_top_disqualified: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            overtime_threshold_hours: 35.0,
            default_shift_hours: 4.0,
            max_bulk_weeks: 12,
            report_top_disqualified: 3,
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl EngineError {
    pub(crate) fn caregiver_not_found(id: &CaregiverId) -> Self {
        Self::NotFound {
            kind: "caregiver",
            id: id.to_string(),
        }
    }

    pub(crate) fn client_not_found(id: &ClientId) -> Self {
        Self::NotFound {
            kind: "client",
            id: id.to_string(),
        }
    }
}

/// Motif de disqualification ferme (auto-remplissage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisqualifyReason {
    Conflict,
    MissingCerts,
    ExceedsHours,
}

impl DisqualifyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::MissingCerts => "missing_certs",
            Self::ExceedsHours => "exceeds_hours",
        }
    }
}

/// Candidat noté, prêt pour l'affichage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub caregiver_id: CaregiverId,
    pub caregiver_name: String,
    pub score: f64,
    pub disqualified: bool,
    pub disqualified_reason: Option<DisqualifyReason>,
    pub distance_miles: Option<f64>,
    pub projected_weekly_hours: f64,
    pub max_hours_per_week: f64,
    pub prior_visit_count: u32,
    pub has_conflict: bool,
    pub missing_certifications: Vec<String>,
    pub reasons: Vec<String>,
}

/// Demande de suggestion pour un créneau unique.
#[derive(Debug, Clone, Default)]
pub struct SuggestRequest {
    pub client_id: Option<ClientId>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Demande de vérification de conflit : date concrète ou jour de semaine.
#[derive(Debug, Clone, Default)]
pub struct ConflictQuery {
    pub caregiver_id: Option<CaregiverId>,
    pub date: Option<NaiveDate>,
    pub day_of_week: Option<Weekday>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub has_conflict: bool,
    pub conflicts: Vec<ScheduleEntry>,
}

/// Candidat écarté, rapporté pour un créneau non pourvu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedCandidate {
    pub caregiver_id: CaregiverId,
    pub caregiver_name: String,
    pub reason: DisqualifyReason,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfilledReason {
    NoCaregivers,
    AllDisqualified,
}

impl UnfilledReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCaregivers => "no_caregivers",
            Self::AllDisqualified => "all_disqualified",
        }
    }
}

/// Résultat d'un créneau dans un lot d'auto-remplissage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShiftOutcome {
    Assigned {
        shift_id: ShiftId,
        caregiver_id: CaregiverId,
        caregiver_name: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        score: f64,
        distance_miles: Option<f64>,
        familiarity: u32,
        schedule_id: Option<ScheduleId>,
    },
    Unfilled {
        shift_id: ShiftId,
        reason: UnfilledReason,
        top_disqualified: Vec<RejectedCandidate>,
    },
    Error {
        shift_id: ShiftId,
        caregiver_id: Option<CaregiverId>,
        /// Entrée déjà écrite quand seule la transition du créneau a échoué.
        schedule_id: Option<ScheduleId>,
        error: String,
    },
}

impl ShiftOutcome {
    pub fn shift_id(&self) -> &ShiftId {
        match self {
            Self::Assigned { shift_id, .. }
            | Self::Unfilled { shift_id, .. }
            | Self::Error { shift_id, .. } => shift_id,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoFillReport {
    pub dry_run: bool,
    pub filled: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<ShiftOutcome>,
}

#[derive(Debug, Clone)]
pub struct BulkCreateRequest {
    pub caregiver_id: CaregiverId,
    pub client_id: ClientId,
    pub template: Vec<TemplateSlot>,
    pub weeks: u32,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkCreateReport {
    pub created: usize,
    pub skipped_conflicts: usize,
    pub conflicts: Vec<SkippedSlot>,
    pub created_ids: Vec<ScheduleId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaregiverHours {
    pub caregiver_id: CaregiverId,
    pub week_start: NaiveDate,
    pub total_hours: f64,
    pub one_time_hours: f64,
    pub recurring_hours: f64,
    pub max_hours: f64,
    pub remaining_hours: f64,
    pub approaching_overtime: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekCell {
    pub schedule_id: ScheduleId,
    pub client_id: ClientId,
    pub client_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurring: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub entries: Vec<WeekCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaregiverWeek {
    pub caregiver_id: CaregiverId,
    pub caregiver_name: String,
    pub total_hours: f64,
    pub days: Vec<WeekDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub caregivers: Vec<CaregiverWeek>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaregiverUtilization {
    pub caregiver_id: CaregiverId,
    pub caregiver_name: String,
    pub scheduled_hours: f64,
    pub max_hours: f64,
    pub utilization_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientCoverage {
    pub client_id: ClientId,
    pub client_name: String,
    pub authorized_units: f64,
    pub scheduled_units: f64,
    pub shortfall_units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageOverview {
    pub week_start: NaiveDate,
    pub caregivers: Vec<CaregiverUtilization>,
    pub clients: Vec<ClientCoverage>,
}
