//! Repositories for database operations
//!
//! One repository per table family. Every method is a single round trip
//! except [`EmployeeRepository::record_encouragement`], and every query on a
//! personal table is scoped by the caller's id.

pub mod category;
pub mod complaint;
pub mod contact;
pub mod employee;
pub mod event;
pub mod profile;

pub use category::CategoryRepository;
pub use complaint::ComplaintRepository;
pub use contact::ContactRepository;
pub use employee::EmployeeRepository;
pub use event::EventRepository;
pub use profile::ProfileRepository;
