#![forbid(unsafe_code)]
//! Caresched : moteur de planification des intervenants à domicile.
//!
//! - Classement multi-critères des intervenants pour un créneau.
//! - Détection de conflits (ponctuels, hebdomadaires, bi-hebdomadaires).
//! - Plafonds horaires hebdomadaires, auto-remplissage glouton avec simulation.
//! - Création en masse depuis un modèle hebdomadaire.
//!
//! Semaines alignées sur le dimanche ; dates et heures locales (`NaiveDate`/`NaiveTime`).

pub mod calendar;
pub mod certification;
pub mod geo;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;
pub mod template;

pub use certification::{satisfies, CertCheck};
pub use geo::{distance_miles, GeoPoint};
pub use model::{
    AvailabilityStatus, CareType, CareTypeId, Caregiver, CaregiverId, Certification, Client,
    ClientId, CompletedVisit, Dataset, Frequency, Occurrence, OpenShift, ScheduleEntry,
    ScheduleId, ShiftId, ShiftStatus, TimeWindow, Urgency,
};
pub use scheduler::{
    AutoFillReport, BulkCreateReport, BulkCreateRequest, ConflictQuery, ConflictReport, Engine,
    EngineError, EngineOptions, ScoredCandidate, ShiftOutcome, SuggestRequest,
};
pub use storage::{JsonStorage, ScheduleStore, Storage};
pub use template::{load_template_from_file, TemplateSlot, WeeklyTemplate};
