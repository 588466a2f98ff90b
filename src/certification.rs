//! Contrôle des certifications exigées.
//!
//! Les certifications expirées doivent être retirées par l'appelant
//! (`Caregiver::active_certifications`) ; aucune comparaison de date ici.

use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertCheck {
    pub has_all: bool,
    /// Certifications exigées absentes, triées.
    pub missing: Vec<String>,
}

pub fn satisfies(held: &BTreeSet<String>, required: &BTreeSet<String>) -> CertCheck {
    let missing: Vec<String> = required.difference(held).cloned().collect();
    CertCheck {
        has_all: missing.is_empty(),
        missing,
    }
}
