//! Data models
//!
//! Rust structs representing database entities.

mod dose_record;
mod health_record;
mod medicine;
mod session;
mod user;

pub use dose_record::DoseRecord;
pub use health_record::{rating_label, HealthRecord, HealthRecordInput, Importance};
pub use medicine::{Medicine, MedicineCreate, MedicineUpdate};
pub use session::{SessionToken, StoredSession};
pub use user::User;
