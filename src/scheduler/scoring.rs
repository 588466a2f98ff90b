//! Notation multi-critères d'un intervenant pour un créneau.
//!
//! Base 100, puis ajustements indépendants dans un ordre fixe (l'ordre ne
//! compte que pour la liste des raisons affichées).

use super::types::{DisqualifyReason, EngineOptions, ScoredCandidate};
use crate::certification::CertCheck;
use crate::model::{AvailabilityStatus, Caregiver};
use std::cmp::Ordering;

pub const BASE_SCORE: f64 = 100.0;
/// Score forcé d'un candidat disqualifié en auto-remplissage.
pub const DISQUALIFIED_SCORE: f64 = -1000.0;

const FAMILIARITY_PER_VISIT: f64 = 3.0;
const FAMILIARITY_CAP: f64 = 30.0;
const UNAVAILABLE_PENALTY: f64 = 100.0;
const CONFLICT_PENALTY: f64 = 100.0;
const UTILIZATION_WEIGHT: f64 = 20.0;
const EXCEEDS_CAP_PENALTY: f64 = 50.0;
const OVERTIME_PENALTY: f64 = 10.0;
const MISSING_CERTS_PENALTY: f64 = 40.0;

/// Faits calculés en amont (conflits, registre d'heures, distance, certifications).
#[derive(Debug, Clone)]
pub struct CandidateFacts {
    pub projected_weekly_hours: f64,
    pub shift_hours: f64,
    pub distance_miles: Option<f64>,
    pub prior_visits: u32,
    pub has_conflict: bool,
    pub certs_required: bool,
    pub certs: CertCheck,
}

impl CandidateFacts {
    pub fn would_exceed(&self, max_hours: f64) -> bool {
        self.projected_weekly_hours + self.shift_hours > max_hours
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateScorer {
    overtime_threshold_hours: f64,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(&EngineOptions::default())
    }
}

impl CandidateScorer {
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            overtime_threshold_hours: options.overtime_threshold_hours,
        }
    }

    /// Notation « souple » : aucune disqualification, seulement des pénalités.
    pub fn score(&self, caregiver: &Caregiver, facts: &CandidateFacts) -> ScoredCandidate {
        let max_hours = caregiver.max_hours_per_week;
        let projected = facts.projected_weekly_hours;
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        if facts.prior_visits > 0 {
            score += (f64::from(facts.prior_visits) * FAMILIARITY_PER_VISIT).min(FAMILIARITY_CAP);
            let plural = if facts.prior_visits == 1 { "" } else { "s" };
            reasons.push(format!("✓ Familiar ({} visit{plural})", facts.prior_visits));
        }

        if caregiver.availability == AvailabilityStatus::Unavailable {
            score -= UNAVAILABLE_PENALTY;
            reasons.push("✗ Marked unavailable".to_string());
        }

        if facts.has_conflict {
            score -= CONFLICT_PENALTY;
            reasons.push("✗ Schedule conflict".to_string());
        }

        if max_hours > 0.0 {
            score -= (projected / max_hours) * UTILIZATION_WEIGHT;
        } else {
            score -= UTILIZATION_WEIGHT;
        }

        if facts.would_exceed(max_hours) {
            score -= EXCEEDS_CAP_PENALTY;
            reasons.push(format!(
                "⚠️ Exceeds max hours ({:.1}/{:.0})",
                projected + facts.shift_hours,
                max_hours
            ));
        }

        if projected > self.overtime_threshold_hours && projected <= max_hours {
            score -= OVERTIME_PENALTY;
            reasons.push(format!("⚠️ Approaching overtime ({projected:.1}h)"));
        }

        if let Some(d) = facts.distance_miles {
            if d <= 5.0 {
                score += 20.0;
                reasons.push(format!("✓ Nearby ({d:.1} mi)"));
            } else if d <= 10.0 {
                score += 10.0;
                reasons.push(format!("✓ Close ({d:.1} mi)"));
            } else if d <= 20.0 {
                score += 5.0;
                reasons.push(format!("{d:.1} mi away"));
            } else if d > 30.0 {
                score -= 15.0;
                reasons.push(format!("⚠️ Far ({d:.1} mi)"));
            }
        }

        if !facts.certs.has_all {
            score -= MISSING_CERTS_PENALTY;
            reasons.push(format!("✗ Missing certs: {}", facts.certs.missing.join(", ")));
        } else if facts.certs_required {
            reasons.push("✓ Certified".to_string());
        }

        ScoredCandidate {
            caregiver_id: caregiver.id.clone(),
            caregiver_name: caregiver.name.clone(),
            score,
            disqualified: false,
            disqualified_reason: None,
            distance_miles: facts.distance_miles,
            projected_weekly_hours: projected,
            max_hours_per_week: max_hours,
            prior_visit_count: facts.prior_visits,
            has_conflict: facts.has_conflict,
            missing_certifications: facts.certs.missing.clone(),
            reasons,
        }
    }
}

/// Premier motif de disqualification ferme : conflit, certifications, plafond.
pub fn disqualification(caregiver: &Caregiver, facts: &CandidateFacts) -> Option<DisqualifyReason> {
    if facts.has_conflict {
        Some(DisqualifyReason::Conflict)
    } else if !facts.certs.has_all {
        Some(DisqualifyReason::MissingCerts)
    } else if facts.would_exceed(caregiver.max_hours_per_week) {
        Some(DisqualifyReason::ExceedsHours)
    } else {
        None
    }
}

/// Disqualification ferme : score forcé à la sentinelle.
pub fn disqualify(mut candidate: ScoredCandidate, reason: DisqualifyReason) -> ScoredCandidate {
    candidate.disqualified = true;
    candidate.disqualified_reason = Some(reason);
    candidate.score = DISQUALIFIED_SCORE;
    candidate
}

/// Score décroissant ; à égalité, identifiant d'intervenant croissant.
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.caregiver_id.cmp(&b.caregiver_id))
}

pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(compare_candidates);
}
