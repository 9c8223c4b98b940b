//! Application state shared across handlers

use common::cache::SessionCache;

use crate::{
    middleware::JwtVerifier,
    repositories::{
        CategoryRepository, ComplaintRepository, ContactRepository, EmployeeRepository,
        EventRepository, ProfileRepository,
    },
    storage::ImageStorage,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub category_repository: CategoryRepository,
    pub complaint_repository: ComplaintRepository,
    pub contact_repository: ContactRepository,
    pub employee_repository: EmployeeRepository,
    pub event_repository: EventRepository,
    pub profile_repository: ProfileRepository,
    pub jwt_verifier: JwtVerifier,
    pub session_cache: SessionCache,
    pub storage: ImageStorage,
}

impl AppState {
    pub fn new(
        pool: sqlx::PgPool,
        jwt_verifier: JwtVerifier,
        session_cache: SessionCache,
        storage: ImageStorage,
    ) -> Self {
        AppState {
            category_repository: CategoryRepository::new(pool.clone()),
            complaint_repository: ComplaintRepository::new(pool.clone()),
            contact_repository: ContactRepository::new(pool.clone()),
            employee_repository: EmployeeRepository::new(pool.clone()),
            event_repository: EventRepository::new(pool.clone()),
            profile_repository: ProfileRepository::new(pool),
            jwt_verifier,
            session_cache,
            storage,
        }
    }
}
