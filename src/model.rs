use crate::calendar;
use crate::geo::GeoPoint;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort d'un intervenant
    CaregiverId
);
string_id!(
    /// Identifiant fort d'un bénéficiaire
    ClientId
);
string_id!(
    /// Identifiant fort d'une entrée de planning
    ScheduleId
);
string_id!(
    /// Identifiant fort d'un créneau ouvert
    ShiftId
);
string_id!(CareTypeId);

/// Disponibilité déclarée d'un intervenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Limited,
    Unavailable,
}

/// Certification détenue, avec expiration éventuelle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<NaiveDate>,
}

impl Certification {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            expires_on: None,
        }
    }

    pub fn expiring<N: Into<String>>(name: N, expires_on: NaiveDate) -> Self {
        Self {
            name: name.into(),
            expires_on: Some(expires_on),
        }
    }

    /// Valide tant que la date d'expiration n'est pas passée.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.expires_on.map_or(true, |exp| exp >= today)
    }
}

fn default_max_hours() -> f64 {
    40.0
}

fn default_true() -> bool {
    true
}

/// Intervenant (aide à domicile, auxiliaire de vie...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caregiver {
    pub id: CaregiverId,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_max_hours")]
    pub max_hours_per_week: f64,
    #[serde(default)]
    pub availability: AvailabilityStatus,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<Certification>,
}

impl Caregiver {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: CaregiverId::random(),
            name: name.into(),
            latitude: None,
            longitude: None,
            max_hours_per_week: default_max_hours(),
            availability: AvailabilityStatus::Available,
            is_active: true,
            certifications: Vec::new(),
        }
    }

    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    /// Noms des certifications non expirées à la date donnée.
    pub fn active_certifications(&self, today: NaiveDate) -> BTreeSet<String> {
        self.certifications
            .iter()
            .filter(|c| c.is_active_on(today))
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Type de prise en charge ; porte les certifications exigées.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareType {
    pub id: CareTypeId,
    pub name: String,
    #[serde(default)]
    pub required_certifications: Vec<String>,
}

/// Bénéficiaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub care_type_id: Option<CareTypeId>,
    /// Unités autorisées par semaine (une unité = 15 minutes).
    #[serde(default)]
    pub authorized_units_per_week: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Client {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: ClientId::random(),
            name: name.into(),
            latitude: None,
            longitude: None,
            care_type_id: None,
            authorized_units_per_week: None,
            is_active: true,
        }
    }

    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// Plage horaire dans une journée, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if end <= start {
            return Err("end time must be strictly after start time".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    pub fn hours(&self) -> f64 {
        calendar::hours_between(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Weekly,
    Biweekly,
}

/// Quand une entrée de planning s'applique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Occurrence {
    OneTime {
        date: NaiveDate,
    },
    Recurring {
        day_of_week: Weekday,
        #[serde(default)]
        frequency: Frequency,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor_date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        effective_date: Option<NaiveDate>,
    },
}

/// Affectation persistée d'un intervenant chez un bénéficiaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: ScheduleId,
    pub caregiver_id: CaregiverId,
    pub client_id: ClientId,
    #[serde(flatten)]
    pub occurrence: Occurrence,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ScheduleEntry {
    pub fn one_time(
        caregiver_id: CaregiverId,
        client_id: ClientId,
        date: NaiveDate,
        window: TimeWindow,
    ) -> Self {
        Self {
            id: ScheduleId::random(),
            caregiver_id,
            client_id,
            occurrence: Occurrence::OneTime { date },
            start_time: window.start,
            end_time: window.end,
            is_active: true,
            notes: None,
        }
    }

    /// Entrée hebdomadaire sans restriction ; voir `biweekly` / `effective_from`.
    pub fn recurring(
        caregiver_id: CaregiverId,
        client_id: ClientId,
        day_of_week: Weekday,
        window: TimeWindow,
    ) -> Self {
        Self {
            id: ScheduleId::random(),
            caregiver_id,
            client_id,
            occurrence: Occurrence::Recurring {
                day_of_week,
                frequency: Frequency::Weekly,
                anchor_date: None,
                effective_date: None,
            },
            start_time: window.start,
            end_time: window.end,
            is_active: true,
            notes: None,
        }
    }

    pub fn biweekly(mut self, anchor: NaiveDate) -> Self {
        if let Occurrence::Recurring {
            frequency,
            anchor_date,
            ..
        } = &mut self.occurrence
        {
            *frequency = Frequency::Biweekly;
            *anchor_date = Some(anchor);
        }
        self
    }

    pub fn effective_from(mut self, date: NaiveDate) -> Self {
        if let Occurrence::Recurring { effective_date, .. } = &mut self.occurrence {
            *effective_date = Some(date);
        }
        self
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn hours(&self) -> f64 {
        calendar::hours_between(self.start_time, self.end_time)
    }
}

/// Priorité opérateur d'un créneau ouvert (ordre croissant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    #[default]
    Open,
    Filled,
    Cancelled,
}

/// Besoin de couverture non pourvu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenShift {
    pub id: ShiftId,
    pub client_id: ClientId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub status: ShiftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_by: Option<CaregiverId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OpenShift {
    pub fn new(client_id: ClientId, date: NaiveDate, window: TimeWindow, urgency: Urgency) -> Self {
        Self {
            id: ShiftId::random(),
            client_id,
            date,
            start_time: window.start,
            end_time: window.end,
            urgency,
            status: ShiftStatus::Open,
            filled_by: None,
            filled_at: None,
            notes: None,
        }
    }

    /// Plage du créneau ; erreur si `end <= start`.
    pub fn window(&self) -> Result<TimeWindow, String> {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// Visite réalisée, sert au calcul de familiarité.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedVisit {
    pub caregiver_id: CaregiverId,
    pub client_id: ClientId,
    pub date: NaiveDate,
}

/// Document complet d'un tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub care_types: Vec<CareType>,
    #[serde(default)]
    pub caregivers: Vec<Caregiver>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
    #[serde(default)]
    pub open_shifts: Vec<OpenShift>,
    #[serde(default)]
    pub visits: Vec<CompletedVisit>,
}

impl Dataset {
    pub fn find_caregiver<'a>(&'a self, id: &CaregiverId) -> Option<&'a Caregiver> {
        self.caregivers.iter().find(|c| &c.id == id)
    }
    pub fn find_caregiver_by_name<'a>(&'a self, name: &str) -> Option<&'a Caregiver> {
        self.caregivers.iter().find(|c| c.name == name)
    }
    pub fn find_client<'a>(&'a self, id: &ClientId) -> Option<&'a Client> {
        self.clients.iter().find(|c| &c.id == id)
    }
    pub fn find_client_by_name<'a>(&'a self, name: &str) -> Option<&'a Client> {
        self.clients.iter().find(|c| c.name == name)
    }
    pub fn find_care_type<'a>(&'a self, id: &CareTypeId) -> Option<&'a CareType> {
        self.care_types.iter().find(|t| &t.id == id)
    }
    pub fn find_shift_mut(&mut self, id: &ShiftId) -> Option<&mut OpenShift> {
        self.open_shifts.iter_mut().find(|s| &s.id == id)
    }
}
