//! Row types and request payloads for the portal tables

use serde::{Deserialize, Serialize};

pub mod category;
pub mod complaint;
pub mod contact;
pub mod employee;
pub mod event;
pub mod profile;

pub use category::ComplaintCategory;
pub use complaint::{Complaint, ComplaintStatus, NewComplaint};
pub use contact::{ContactMessage, NewContactMessage};
pub use employee::{Employee, EmployeePhotoUpdate, NewEncouragement};
pub use event::{Event, EventRegistration, NewEvent, RegisteredEvent};
pub use profile::{Profile, ProfileUpdate};

/// Account role carried in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Citizen,
    Employee,
    Admin,
}
