use crate::model::{
    Caregiver, CaregiverId, Client, ClientId, Dataset, OpenShift, ScheduleEntry, ScheduleId,
    ShiftId, ShiftStatus,
};
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistance d'un document complet.
pub trait Storage {
    /// Charge un dataset depuis un support.
    fn load(&self) -> anyhow::Result<Dataset>;
    /// Sauvegarde de manière atomique.
    fn save(&self, dataset: &Dataset) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Dataset> {
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let dataset: Dataset = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(dataset)
    }

    fn save(&self, dataset: &Dataset) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(dataset)?;
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

/// Contrats de lecture/écriture consommés par le moteur.
///
/// Les lectures renvoient l'état brut : le moteur filtre lui-même
/// les entrées inactives et les certifications expirées.
pub trait ScheduleStore {
    /// Intervenants actifs (toutes disponibilités confondues).
    fn caregivers(&self) -> anyhow::Result<Vec<Caregiver>>;
    fn caregiver(&self, id: &CaregiverId) -> anyhow::Result<Option<Caregiver>>;
    /// Bénéficiaires actifs.
    fn clients(&self) -> anyhow::Result<Vec<Client>>;
    fn client(&self, id: &ClientId) -> anyhow::Result<Option<Client>>;
    /// Certifications exigées par le type de prise en charge du bénéficiaire.
    fn required_certifications(&self, client: &Client) -> anyhow::Result<BTreeSet<String>>;
    fn schedule_entries(&self) -> anyhow::Result<Vec<ScheduleEntry>>;
    fn completed_visit_count(
        &self,
        caregiver: &CaregiverId,
        client: &ClientId,
    ) -> anyhow::Result<u32>;
    /// Créneaux au statut `open` dont la date est dans `[start, end]`.
    fn open_shifts(&self, start: NaiveDate, end: NaiveDate) -> anyhow::Result<Vec<OpenShift>>;
    fn insert_schedule(&mut self, entry: ScheduleEntry) -> anyhow::Result<ScheduleId>;
    /// Transition `open → filled`.
    fn mark_shift_filled(
        &mut self,
        shift: &ShiftId,
        filled_by: &CaregiverId,
        filled_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}

impl ScheduleStore for Dataset {
    fn caregivers(&self) -> anyhow::Result<Vec<Caregiver>> {
        Ok(self.caregivers.iter().filter(|c| c.is_active).cloned().collect())
    }

    fn caregiver(&self, id: &CaregiverId) -> anyhow::Result<Option<Caregiver>> {
        Ok(self.find_caregiver(id).filter(|c| c.is_active).cloned())
    }

    fn clients(&self) -> anyhow::Result<Vec<Client>> {
        Ok(self.clients.iter().filter(|c| c.is_active).cloned().collect())
    }

    fn client(&self, id: &ClientId) -> anyhow::Result<Option<Client>> {
        Ok(self.find_client(id).filter(|c| c.is_active).cloned())
    }

    fn required_certifications(&self, client: &Client) -> anyhow::Result<BTreeSet<String>> {
        let Some(type_id) = &client.care_type_id else {
            return Ok(BTreeSet::new());
        };
        let care_type = self
            .find_care_type(type_id)
            .with_context(|| format!("unknown care type {type_id} for client {}", client.id))?;
        Ok(care_type.required_certifications.iter().cloned().collect())
    }

    fn schedule_entries(&self) -> anyhow::Result<Vec<ScheduleEntry>> {
        Ok(self.schedules.clone())
    }

    fn completed_visit_count(
        &self,
        caregiver: &CaregiverId,
        client: &ClientId,
    ) -> anyhow::Result<u32> {
        let n = self
            .visits
            .iter()
            .filter(|v| &v.caregiver_id == caregiver && &v.client_id == client)
            .count();
        Ok(u32::try_from(n).unwrap_or(u32::MAX))
    }

    fn open_shifts(&self, start: NaiveDate, end: NaiveDate) -> anyhow::Result<Vec<OpenShift>> {
        Ok(self
            .open_shifts
            .iter()
            .filter(|s| s.status == ShiftStatus::Open && s.date >= start && s.date <= end)
            .cloned()
            .collect())
    }

    fn insert_schedule(&mut self, entry: ScheduleEntry) -> anyhow::Result<ScheduleId> {
        if self.schedules.iter().any(|e| e.id == entry.id) {
            bail!("duplicate schedule id {}", entry.id);
        }
        let id = entry.id.clone();
        self.schedules.push(entry);
        Ok(id)
    }

    fn mark_shift_filled(
        &mut self,
        shift: &ShiftId,
        filled_by: &CaregiverId,
        filled_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let s = self
            .find_shift_mut(shift)
            .with_context(|| format!("unknown open shift {shift}"))?;
        if s.status != ShiftStatus::Open {
            bail!("shift {shift} is not open");
        }
        s.status = ShiftStatus::Filled;
        s.filled_by = Some(filled_by.clone());
        s.filled_at = Some(filled_at);
        Ok(())
    }
}
