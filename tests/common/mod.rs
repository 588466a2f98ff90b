#![allow(dead_code)]
use caresched::{
    CareType, CareTypeId, Caregiver, CaregiverId, Certification, Client, ClientId, Dataset,
    OpenShift, ScheduleEntry, TimeWindow, Urgency,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Un degré de latitude, en miles, pour un rayon de 3959 mi.
pub const MILES_PER_DEGREE: f64 = 3959.0 * std::f64::consts::PI / 180.0;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn w(start_h: u32, end_h: u32) -> TimeWindow {
    TimeWindow::new(t(start_h, 0), t(end_h, 0)).unwrap()
}

pub fn noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0).unwrap().and_utc()
}

pub fn caregiver(id: &str) -> Caregiver {
    let mut c = Caregiver::new(id.to_uppercase());
    c.id = CaregiverId::new(id);
    c
}

/// Intervenant situé à `miles` au nord du point (40.0, -75.0).
pub fn caregiver_at(id: &str, miles: f64) -> Caregiver {
    let mut c = caregiver(id);
    c.latitude = Some(40.0 + miles / MILES_PER_DEGREE);
    c.longitude = Some(-75.0);
    c
}

pub fn certified(mut c: Caregiver, certs: &[&str]) -> Caregiver {
    c.certifications = certs.iter().map(|n| Certification::new(*n)).collect();
    c
}

/// Bénéficiaire en (40.0, -75.0), type de prise en charge `care`.
pub fn client(id: &str) -> Client {
    let mut c = Client::new(id.to_uppercase());
    c.id = ClientId::new(id);
    c.latitude = Some(40.0);
    c.longitude = Some(-75.0);
    c
}

pub fn care_type(id: &str, certs: &[&str]) -> CareType {
    CareType {
        id: CareTypeId::new(id),
        name: id.to_string(),
        required_certifications: certs.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn entry(cg: &str, cl: &str, date: NaiveDate, start_h: u32, end_h: u32) -> ScheduleEntry {
    ScheduleEntry::one_time(CaregiverId::new(cg), ClientId::new(cl), date, w(start_h, end_h))
}

pub fn open_shift(cl: &str, date: NaiveDate, start_h: u32, end_h: u32, urgency: Urgency) -> OpenShift {
    OpenShift::new(ClientId::new(cl), date, w(start_h, end_h), urgency)
}

pub fn dataset() -> Dataset {
    Dataset::default()
}
