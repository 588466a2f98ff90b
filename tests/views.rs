#![forbid(unsafe_code)]
mod common;

use caresched::{CaregiverId, ClientId, Engine, EngineError, ScheduleEntry};
use chrono::Weekday;
use common::{caregiver, client, d, dataset, entry, w};

fn engine() -> Engine<caresched::Dataset> {
    let mut ds = dataset();
    ds.caregivers.push(caregiver("bob"));
    ds.caregivers.push(caregiver("ana"));
    let mut c1 = client("c1");
    c1.authorized_units_per_week = Some(80.0);
    ds.clients.push(c1);
    ds.clients.push(client("c2"));

    ds.schedules.push(ScheduleEntry::recurring(
        CaregiverId::new("ana"),
        ClientId::new("c1"),
        Weekday::Mon,
        w(8, 12),
    ));
    ds.schedules.push(entry("ana", "c1", d(2024, 6, 11), 9, 17));
    // hors semaine et inactive : ignorées
    ds.schedules.push(entry("ana", "c1", d(2024, 6, 18), 9, 17));
    let mut cancelled = entry("ana", "c2", d(2024, 6, 12), 9, 17);
    cancelled.is_active = false;
    ds.schedules.push(cancelled);
    Engine::new(ds)
}

#[test]
fn caregiver_hours_split_by_kind() {
    let hours = engine()
        .caregiver_hours(&CaregiverId::new("ana"), d(2024, 6, 13))
        .unwrap();
    assert_eq!(hours.week_start, d(2024, 6, 9));
    assert_eq!(hours.total_hours, 12.0);
    assert_eq!(hours.one_time_hours, 8.0);
    assert_eq!(hours.recurring_hours, 4.0);
    assert_eq!(hours.remaining_hours, 28.0);
    assert!(!hours.approaching_overtime);
}

#[test]
fn caregiver_hours_flags_overtime_and_floors_remaining() {
    let mut engine = engine();
    for day in [12, 13, 14] {
        engine
            .store_mut()
            .schedules
            .push(entry("ana", "c2", d(2024, 6, day), 6, 16));
    }
    let hours = engine
        .caregiver_hours(&CaregiverId::new("ana"), d(2024, 6, 9))
        .unwrap();
    assert_eq!(hours.total_hours, 42.0);
    assert_eq!(hours.remaining_hours, 0.0);
    assert!(hours.approaching_overtime);

    assert!(matches!(
        engine.caregiver_hours(&CaregiverId::new("ghost"), d(2024, 6, 9)),
        Err(EngineError::NotFound { .. })
    ));
}

#[test]
fn week_view_lays_out_each_day() {
    let view = engine().week_view(d(2024, 6, 12)).unwrap();
    assert_eq!(view.week_start, d(2024, 6, 9));
    let names: Vec<&str> = view.caregivers.iter().map(|c| c.caregiver_name.as_str()).collect();
    assert_eq!(names, vec!["ANA", "BOB"]);

    let ana = &view.caregivers[0];
    assert_eq!(ana.days.len(), 7);
    assert_eq!(ana.total_hours, 12.0);
    let monday = &ana.days[1];
    assert_eq!(monday.date, d(2024, 6, 10));
    assert_eq!(monday.entries.len(), 1);
    assert!(monday.entries[0].recurring);
    assert_eq!(monday.entries[0].client_name, "C1");
    assert!(ana.days[3].entries.is_empty());

    assert!(view.caregivers[1].days.iter().all(|day| day.entries.is_empty()));
}

#[test]
fn coverage_reports_utilization_and_shortfall() {
    let overview = engine().coverage_overview(d(2024, 6, 10)).unwrap();
    assert_eq!(overview.caregivers[0].caregiver_id.as_str(), "ana");
    assert_eq!(overview.caregivers[0].utilization_pct, 30);
    assert_eq!(overview.caregivers[1].utilization_pct, 0);

    // seul c1 a une autorisation : 12 h planifiées = 48 unités
    assert_eq!(overview.clients.len(), 1);
    let c1 = &overview.clients[0];
    assert_eq!(c1.scheduled_units, 48.0);
    assert_eq!(c1.shortfall_units, 32.0);
}

#[test]
fn audit_finds_nothing_on_a_clean_week() {
    assert!(engine().audit_week(d(2024, 6, 10)).unwrap().is_empty());
}
