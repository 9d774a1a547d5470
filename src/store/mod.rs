//! Record store access
//!
//! CRUD operations for the five record kinds, plus custom data points and
//! the per-user settings singleton. Every operation is implicitly scoped to
//! the client's authenticated user; writes without one fail. The trait is
//! synchronous: the engines only ever compute over records a caller has
//! already fetched.
//!
//! Only sleep entries are updated or deleted (plus custom data point
//! deletion); the other kinds are append-only logs. Arm assignments are
//! bulk-created with their experiment through
//! [`RecordStore::insert_experiment_with_assignments`], a single combined
//! operation so a failure leaves neither the experiment nor a partial
//! schedule behind.

mod memory;

pub use memory::MemoryStore;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::TrackerError;
use crate::types::{
    Arm, ArmAssignment, CheckIn, CustomDataPoint, Experiment, MedIntake, Medication,
    Nap, Settings, SleepEntry,
};

/// Store contract the engines and presentation layer consume
pub trait RecordStore {
    /// Sleep entries, newest date first
    fn sleep_entries(&self) -> Vec<SleepEntry>;
    fn insert_sleep_entry(&mut self, entry: SleepEntry) -> Result<SleepEntry, TrackerError>;
    fn update_sleep_entry(&mut self, id: Uuid, entry: SleepEntry) -> Result<(), TrackerError>;
    fn delete_sleep_entry(&mut self, id: Uuid) -> Result<(), TrackerError>;

    /// Naps, newest date first
    fn naps(&self) -> Vec<Nap>;
    fn insert_nap(&mut self, nap: Nap) -> Result<Nap, TrackerError>;

    /// Check-ins, newest timestamp first
    fn check_ins(&self) -> Vec<CheckIn>;
    fn insert_check_in(&mut self, check_in: CheckIn) -> Result<CheckIn, TrackerError>;

    /// Medications, by name ascending
    fn medications(&self) -> Vec<Medication>;
    fn insert_medication(&mut self, medication: Medication)
        -> Result<Medication, TrackerError>;

    /// Intakes, newest timestamp first
    fn med_intakes(&self) -> Vec<MedIntake>;
    fn insert_med_intake(&mut self, intake: MedIntake) -> Result<MedIntake, TrackerError>;

    /// Experiments, newest start date first
    fn experiments(&self) -> Vec<Experiment>;
    /// All arm assignments, newest date first
    fn arm_assignments(&self) -> Vec<ArmAssignment>;
    /// Insert an experiment and its full day-to-arm schedule as one write
    fn insert_experiment_with_assignments(
        &mut self,
        experiment: Experiment,
        schedule: &[(NaiveDate, Arm)],
    ) -> Result<Experiment, TrackerError>;

    /// Custom data point labels, by name ascending
    fn custom_data_points(&self) -> Vec<CustomDataPoint>;
    fn insert_custom_data_point(
        &mut self,
        point: CustomDataPoint,
    ) -> Result<CustomDataPoint, TrackerError>;
    fn delete_custom_data_point(&mut self, id: Uuid) -> Result<(), TrackerError>;

    /// The per-user settings singleton (defaults when never saved)
    fn settings(&self) -> Settings;
    fn put_settings(&mut self, settings: Settings) -> Result<(), TrackerError>;
}
