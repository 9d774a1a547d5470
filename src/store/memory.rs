//! In-memory record store
//!
//! An explicitly constructed store client holding one user's records. The
//! whole store serializes to JSON, so a file-backed session is load, mutate,
//! save (the lifecycle the CLI uses). There is no ambient global handle;
//! callers own the client and pass it where it is needed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::TrackerError;
use crate::store::RecordStore;
use crate::types::{
    Arm, ArmAssignment, CheckIn, CustomDataPoint, Experiment, MedIntake, Medication,
    Nap, Settings, SleepEntry,
};

/// Single-user in-memory store, serializable for file-backed persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    /// The authenticated user, or `None` for an anonymous session that can
    /// read (its own empty state) but never write
    user: Option<Uuid>,
    sleep_entries: Vec<SleepEntry>,
    naps: Vec<Nap>,
    check_ins: Vec<CheckIn>,
    medications: Vec<Medication>,
    med_intakes: Vec<MedIntake>,
    experiments: Vec<Experiment>,
    arm_assignments: Vec<ArmAssignment>,
    custom_data_points: Vec<CustomDataPoint>,
    settings: Settings,
}

impl MemoryStore {
    /// Open a store client for an authenticated user
    pub fn open(user: Uuid) -> Self {
        Self {
            user: Some(user),
            sleep_entries: Vec::new(),
            naps: Vec::new(),
            check_ins: Vec::new(),
            medications: Vec::new(),
            med_intakes: Vec::new(),
            experiments: Vec::new(),
            arm_assignments: Vec::new(),
            custom_data_points: Vec::new(),
            settings: Settings::default(),
        }
    }

    /// Open a client with no authenticated user; every write fails with
    /// [`TrackerError::NotAuthenticated`]
    pub fn open_anonymous() -> Self {
        Self {
            user: None,
            ..Self::open(Uuid::nil())
        }
    }

    /// The authenticated user, if any
    pub fn user(&self) -> Option<Uuid> {
        self.user
    }

    /// Load a store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn require_user(&self, operation: &'static str) -> Result<(), TrackerError> {
        if self.user.is_some() {
            Ok(())
        } else {
            Err(TrackerError::NotAuthenticated(operation))
        }
    }
}

impl RecordStore for MemoryStore {
    fn sleep_entries(&self) -> Vec<SleepEntry> {
        let mut entries = self.sleep_entries.clone();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    fn insert_sleep_entry(&mut self, mut entry: SleepEntry) -> Result<SleepEntry, TrackerError> {
        self.require_user("insert sleep entry")?;
        entry.validate()?;
        let id = Uuid::new_v4();
        entry.id = Some(id);
        self.sleep_entries.push(entry.clone());
        debug!(%id, date = %entry.date, "inserted sleep entry");
        Ok(entry)
    }

    fn update_sleep_entry(&mut self, id: Uuid, mut entry: SleepEntry) -> Result<(), TrackerError> {
        self.require_user("update sleep entry")?;
        entry.validate()?;
        let existing = self
            .sleep_entries
            .iter_mut()
            .find(|e| e.id == Some(id))
            .ok_or(TrackerError::NotFound(id))?;
        entry.id = Some(id);
        *existing = entry;
        debug!(%id, "updated sleep entry");
        Ok(())
    }

    fn delete_sleep_entry(&mut self, id: Uuid) -> Result<(), TrackerError> {
        self.require_user("delete sleep entry")?;
        let before = self.sleep_entries.len();
        self.sleep_entries.retain(|e| e.id != Some(id));
        if self.sleep_entries.len() == before {
            return Err(TrackerError::NotFound(id));
        }
        debug!(%id, "deleted sleep entry");
        Ok(())
    }

    fn naps(&self) -> Vec<Nap> {
        let mut naps = self.naps.clone();
        naps.sort_by(|a, b| b.date.cmp(&a.date));
        naps
    }

    fn insert_nap(&mut self, mut nap: Nap) -> Result<Nap, TrackerError> {
        self.require_user("insert nap")?;
        nap.validate()?;
        nap.id = Some(Uuid::new_v4());
        self.naps.push(nap.clone());
        Ok(nap)
    }

    fn check_ins(&self) -> Vec<CheckIn> {
        let mut check_ins = self.check_ins.clone();
        check_ins.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        check_ins
    }

    fn insert_check_in(&mut self, mut check_in: CheckIn) -> Result<CheckIn, TrackerError> {
        self.require_user("insert check-in")?;
        check_in.validate()?;
        check_in.id = Some(Uuid::new_v4());
        self.check_ins.push(check_in.clone());
        Ok(check_in)
    }

    fn medications(&self) -> Vec<Medication> {
        let mut medications = self.medications.clone();
        medications.sort_by(|a, b| a.name.cmp(&b.name));
        medications
    }

    fn insert_medication(
        &mut self,
        mut medication: Medication,
    ) -> Result<Medication, TrackerError> {
        self.require_user("insert medication")?;
        medication.validate()?;
        medication.id = Some(Uuid::new_v4());
        self.medications.push(medication.clone());
        Ok(medication)
    }

    fn med_intakes(&self) -> Vec<MedIntake> {
        let mut intakes = self.med_intakes.clone();
        intakes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        intakes
    }

    fn insert_med_intake(&mut self, mut intake: MedIntake) -> Result<MedIntake, TrackerError> {
        self.require_user("insert med intake")?;
        if !self
            .medications
            .iter()
            .any(|m| m.id == Some(intake.medication_id))
        {
            return Err(TrackerError::NotFound(intake.medication_id));
        }
        intake.id = Some(Uuid::new_v4());
        self.med_intakes.push(intake.clone());
        Ok(intake)
    }

    fn experiments(&self) -> Vec<Experiment> {
        let mut experiments = self.experiments.clone();
        experiments.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        experiments
    }

    fn arm_assignments(&self) -> Vec<ArmAssignment> {
        let mut assignments = self.arm_assignments.clone();
        assignments.sort_by(|a, b| b.date.cmp(&a.date));
        assignments
    }

    fn insert_experiment_with_assignments(
        &mut self,
        mut experiment: Experiment,
        schedule: &[(NaiveDate, Arm)],
    ) -> Result<Experiment, TrackerError> {
        self.require_user("insert experiment")?;
        experiment.validate()?;

        let experiment_id = Uuid::new_v4();
        // Reject duplicate dates before touching any state, so a bad
        // schedule leaves neither the experiment nor a partial schedule
        for (index, (date, _)) in schedule.iter().enumerate() {
            if schedule[..index].iter().any(|(d, _)| d == date) {
                return Err(TrackerError::DuplicateAssignment {
                    experiment_id,
                    date: *date,
                });
            }
        }

        experiment.id = Some(experiment_id);
        let assignments: Vec<ArmAssignment> = schedule
            .iter()
            .map(|(date, arm)| ArmAssignment {
                id: Some(Uuid::new_v4()),
                experiment_id,
                date: *date,
                arm: *arm,
            })
            .collect();

        self.experiments.push(experiment.clone());
        self.arm_assignments.extend(assignments);
        debug!(
            %experiment_id,
            days = schedule.len(),
            "inserted experiment with arm schedule"
        );
        Ok(experiment)
    }

    fn custom_data_points(&self) -> Vec<CustomDataPoint> {
        let mut points = self.custom_data_points.clone();
        points.sort_by(|a, b| a.name.cmp(&b.name));
        points
    }

    fn insert_custom_data_point(
        &mut self,
        mut point: CustomDataPoint,
    ) -> Result<CustomDataPoint, TrackerError> {
        self.require_user("insert data point")?;
        point.validate()?;
        point.id = Some(Uuid::new_v4());
        self.custom_data_points.push(point.clone());
        Ok(point)
    }

    fn delete_custom_data_point(&mut self, id: Uuid) -> Result<(), TrackerError> {
        self.require_user("delete data point")?;
        let before = self.custom_data_points.len();
        self.custom_data_points.retain(|p| p.id != Some(id));
        if self.custom_data_points.len() == before {
            return Err(TrackerError::NotFound(id));
        }
        Ok(())
    }

    fn settings(&self) -> Settings {
        self.settings.clone()
    }

    fn put_settings(&mut self, settings: Settings) -> Result<(), TrackerError> {
        self.require_user("save settings")?;
        self.settings = settings;
        Ok(())
    }
}
