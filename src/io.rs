use crate::calendar;
use crate::model::{AvailabilityStatus, Caregiver, Certification, Dataset};
use crate::scheduler::{AutoFillReport, ShiftOutcome};
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import d'intervenants depuis CSV :
/// header `name,latitude,longitude,max_hours,availability,certifications`
/// (seul `name` est obligatoire ; certifications `NOM[@AAAA-MM-JJ]` séparées par `;`).
pub fn import_caregivers_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Caregiver>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid caregiver row (empty name)");
        }
        let mut caregiver = Caregiver::new(name);
        caregiver.latitude = parse_opt_f64(rec.get(1))
            .with_context(|| format!("invalid latitude for {name}"))?;
        caregiver.longitude = parse_opt_f64(rec.get(2))
            .with_context(|| format!("invalid longitude for {name}"))?;
        if let Some(max) = parse_opt_f64(rec.get(3))
            .with_context(|| format!("invalid max_hours for {name}"))?
        {
            caregiver.max_hours_per_week = max;
        }
        if let Some(raw) = rec.get(4).map(str::trim).filter(|s| !s.is_empty()) {
            caregiver.availability = parse_availability(raw)
                .with_context(|| format!("invalid availability for {name}"))?;
        }
        if let Some(raw) = rec.get(5).map(str::trim).filter(|s| !s.is_empty()) {
            caregiver.certifications = parse_certifications(raw)
                .with_context(|| format!("invalid certifications for {name}"))?;
        }
        out.push(caregiver);
    }
    Ok(out)
}

fn parse_opt_f64(raw: Option<&str>) -> anyhow::Result<Option<f64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Ok(Some(s.parse::<f64>().with_context(|| format!("not a number: {s}"))?)),
    }
}

fn parse_availability(s: &str) -> anyhow::Result<AvailabilityStatus> {
    match s.to_ascii_lowercase().as_str() {
        "available" => Ok(AvailabilityStatus::Available),
        "limited" => Ok(AvailabilityStatus::Limited),
        "unavailable" => Ok(AvailabilityStatus::Unavailable),
        _ => bail!("expected available|limited|unavailable, got {s}"),
    }
}

fn parse_certifications(raw: &str) -> anyhow::Result<Vec<Certification>> {
    raw.split(';')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| -> anyhow::Result<Certification> {
            match chunk.split_once('@') {
                Some((name, exp)) => Ok(Certification::expiring(
                    name.trim(),
                    calendar::parse_date(exp)?,
                )),
                None => Ok(Certification::new(chunk)),
            }
        })
        .collect()
}

/// Export JSON du dataset (jolie mise en forme)
pub fn export_dataset_json<P: AsRef<Path>>(path: P, dataset: &Dataset) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(dataset)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV d'un rapport d'auto-remplissage :
/// header `shift_id,status,caregiver_id,schedule_id,score,distance_miles,detail`
pub fn export_autofill_csv<P: AsRef<Path>>(path: P, report: &AutoFillReport) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "shift_id",
        "status",
        "caregiver_id",
        "schedule_id",
        "score",
        "distance_miles",
        "detail",
    ])?;
    for r in &report.results {
        let (status, caregiver, schedule, score, distance, detail) = match r {
            ShiftOutcome::Assigned {
                caregiver_id,
                schedule_id,
                score,
                distance_miles,
                familiarity,
                ..
            } => (
                "assigned",
                caregiver_id.to_string(),
                schedule_id.as_ref().map(ToString::to_string).unwrap_or_default(),
                format!("{score:.2}"),
                distance_miles.map(|d| format!("{d:.1}")).unwrap_or_default(),
                format!("familiarity={familiarity}"),
            ),
            ShiftOutcome::Unfilled {
                reason,
                top_disqualified,
                ..
            } => (
                "unfilled",
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                format!(
                    "{}: {}",
                    reason.as_str(),
                    top_disqualified
                        .iter()
                        .map(|c| format!("{} ({})", c.caregiver_name, c.reason.as_str()))
                        .collect::<Vec<_>>()
                        .join("; ")
                ),
            ),
            ShiftOutcome::Error {
                caregiver_id,
                schedule_id,
                error,
                ..
            } => (
                "error",
                caregiver_id.as_ref().map(ToString::to_string).unwrap_or_default(),
                schedule_id.as_ref().map(ToString::to_string).unwrap_or_default(),
                String::new(),
                String::new(),
                error.clone(),
            ),
        };
        w.write_record([
            r.shift_id().as_str(),
            status,
            caregiver.as_str(),
            schedule.as_str(),
            score.as_str(),
            distance.as_str(),
            detail.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
