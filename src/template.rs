use crate::model::TimeWindow;
use anyhow::{bail, Context, Result};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Modèle hebdomadaire utilisé par la création en masse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slots: Vec<TemplateSlot>,
}

impl WeeklyTemplate {
    pub fn validate(&self) -> Result<()> {
        if self.slots.is_empty() {
            bail!("template must contain at least one slot");
        }
        for slot in &self.slots {
            slot.validate()?;
        }
        validate_slot_overlaps(&self.slots)?;
        Ok(())
    }
}

/// Créneau `{jour, début, fin}` d'un modèle hebdomadaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlot {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TemplateSlot {
    pub fn new(day_of_week: Weekday, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
        }
    }

    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::new(self.start_time, self.end_time).map_err(anyhow::Error::msg)
    }

    fn validate(&self) -> Result<()> {
        self.window()
            .with_context(|| format!("invalid slot on {}", self.day_of_week))?;
        Ok(())
    }
}

pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> Result<WeeklyTemplate> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading template {}", path.display()))?;
    let template: WeeklyTemplate = serde_json::from_slice(&data)
        .with_context(|| format!("parsing template {}", path.display()))?;
    template.validate()?;
    Ok(template)
}

pub fn export_template_json<P: AsRef<Path>>(path: P, template: &WeeklyTemplate) -> Result<()> {
    let json = serde_json::to_string_pretty(template)?;
    fs::write(path, json)?;
    Ok(())
}

fn validate_slot_overlaps(slots: &[TemplateSlot]) -> Result<()> {
    for (i, a) in slots.iter().enumerate() {
        for b in slots.iter().skip(i + 1) {
            if a.day_of_week != b.day_of_week {
                continue;
            }
            if a.window()?.overlaps(&b.window()?) {
                bail!(
                    "template contains overlapping slots on {} ({}-{} and {}-{})",
                    a.day_of_week,
                    a.start_time.format("%H:%M"),
                    a.end_time.format("%H:%M"),
                    b.start_time.format("%H:%M"),
                    b.end_time.format("%H:%M")
                );
            }
        }
    }
    Ok(())
}
