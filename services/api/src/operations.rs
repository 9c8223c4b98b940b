//! Domain operations behind the API routes
//!
//! One function per user-facing action. Input is validated before any
//! repository call, personal rows are always scoped by the authenticated
//! caller, and backend uniqueness violations are mapped to their specific
//! conflict here.

use common::error::DatabaseError;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{
        Complaint, ComplaintCategory, ContactMessage, Employee, EmployeePhotoUpdate, Event,
        EventRegistration, NewComplaint, NewContactMessage, NewEncouragement, NewEvent, Profile,
        ProfileUpdate, RegisteredEvent,
    },
    repositories::{
        complaint::{COMPLAINTS_CATEGORY_FKEY, ComplaintInsert},
        employee::{ENCOURAGEMENTS_USER_EMPLOYEE_KEY, EncouragementInsert},
        event::{EventInsert, REGISTRATIONS_USER_EVENT_KEY},
    },
    state::AppState,
    validation::{min_chars, optional, phone, rating, required},
};

fn unknown_category() -> ApiError {
    ApiError::Validation("Unknown complaint category".to_string())
}

pub async fn list_categories(state: &AppState) -> ApiResult<Vec<ComplaintCategory>> {
    Ok(state.category_repository.list().await?)
}

/// File a complaint as `caller`; it starts out pending
pub async fn submit_complaint(
    state: &AppState,
    caller: &AuthUser,
    input: NewComplaint,
) -> ApiResult<Complaint> {
    let (Some(category_id), Some(subcategory)) =
        (input.category_id, optional(input.subcategory.as_deref()))
    else {
        return Err(ApiError::SelectionRequired);
    };
    let address = required(&input.address, "Address is required")?;

    match (input.latitude, input.longitude) {
        (Some(lat), Some(lng))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) => {}
        (None, None) => {}
        _ => return Err(ApiError::Validation("Invalid location".to_string())),
    }

    let reason: Vec<String> = input
        .reason
        .iter()
        .filter_map(|r| optional(Some(r.as_str())))
        .map(str::to_string)
        .collect();

    let category = state
        .category_repository
        .find_by_id(category_id)
        .await?
        .ok_or_else(unknown_category)?;
    if !category.has_subcategory(subcategory) {
        return Err(ApiError::Validation(format!(
            "\"{}\" is not a subcategory of {}",
            subcategory, category.name
        )));
    }

    let insert = ComplaintInsert {
        category_id,
        subcategory,
        title: optional(input.title.as_deref()).unwrap_or(subcategory),
        description: optional(input.description.as_deref()),
        address,
        zone: optional(input.zone.as_deref()),
        latitude: input.latitude,
        longitude: input.longitude,
        photo_url: optional(input.photo_url.as_deref()),
        reason: &reason,
    };

    let complaint = state
        .complaint_repository
        .create(caller.id, &insert)
        .await
        .map_err(|e| match e {
            DatabaseError::ForeignKeyViolation { constraint: Some(ref c) }
                if c == COMPLAINTS_CATEGORY_FKEY =>
            {
                unknown_category()
            }
            e => ApiError::from(e),
        })?;

    info!("User {} filed complaint {}", caller.id, complaint.id);
    Ok(complaint)
}

/// The caller's complaints, newest first
pub async fn list_my_complaints(state: &AppState, caller: &AuthUser) -> ApiResult<Vec<Complaint>> {
    Ok(state.complaint_repository.list_for_user(caller.id).await?)
}

/// Propose an event; it is hidden from the public listing until approved
pub async fn submit_event(
    state: &AppState,
    caller: &AuthUser,
    input: NewEvent,
) -> ApiResult<Event> {
    let name = min_chars(&input.name, 3, "Event name must be at least 3 characters")?;
    let organizer = min_chars(
        &input.organizer,
        2,
        "Organizer name must be at least 2 characters",
    )?;
    let venue = min_chars(&input.venue, 5, "Venue must be at least 5 characters")?;
    let date = input
        .date
        .ok_or_else(|| ApiError::Validation("Event date is required".to_string()))?;
    let category = required(&input.category, "Please select an event category")?;
    if input.max_participants.is_some_and(|max| max < 1) {
        return Err(ApiError::Validation(
            "Maximum participants must be at least 1".to_string(),
        ));
    }

    let insert = EventInsert {
        name,
        organizer,
        venue,
        date,
        category,
        description: optional(input.description.as_deref()),
        poster_url: optional(input.poster_url.as_deref()),
        max_participants: input.max_participants,
    };

    let event = state.event_repository.create(caller.id, &insert).await?;
    info!("User {} proposed event {}", caller.id, event.id);
    Ok(event)
}

/// Approved events, soonest first
pub async fn list_events(state: &AppState) -> ApiResult<Vec<Event>> {
    Ok(state.event_repository.list_approved().await?)
}

/// Events the caller proposed, including those awaiting approval
pub async fn list_my_events(state: &AppState, caller: &AuthUser) -> ApiResult<Vec<Event>> {
    Ok(state.event_repository.list_created_by(caller.id).await?)
}

pub async fn register_for_event(
    state: &AppState,
    caller: &AuthUser,
    event_id: Uuid,
) -> ApiResult<EventRegistration> {
    let registration = state
        .event_repository
        .register(caller.id, event_id)
        .await
        .map_err(|e| {
            if e.is_unique_violation_on(REGISTRATIONS_USER_EVENT_KEY) {
                ApiError::AlreadyRegistered
            } else {
                ApiError::from(e)
            }
        })?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    info!("User {} registered for event {}", caller.id, event_id);
    Ok(registration)
}

/// Remove the caller's registration; cancelling twice is not an error
pub async fn cancel_registration(
    state: &AppState,
    caller: &AuthUser,
    event_id: Uuid,
) -> ApiResult<()> {
    let removed = state
        .event_repository
        .cancel_registration(caller.id, event_id)
        .await?;

    if removed {
        info!("User {} cancelled registration for event {}", caller.id, event_id);
    }
    Ok(())
}

pub async fn list_my_registrations(
    state: &AppState,
    caller: &AuthUser,
) -> ApiResult<Vec<RegisteredEvent>> {
    Ok(state.event_repository.list_registrations(caller.id).await?)
}

/// Active employees, best rated first
pub async fn list_employees(state: &AppState) -> ApiResult<Vec<Employee>> {
    Ok(state.employee_repository.list_active().await?)
}

/// Rate an employee and return the updated aggregate
///
/// Each caller may encourage a given employee once.
pub async fn submit_encouragement(
    state: &AppState,
    caller: &AuthUser,
    input: NewEncouragement,
) -> ApiResult<Employee> {
    let stars = rating(input.rating)?;
    let username = required(&input.username, "Name is required")?;
    let address = required(&input.address, "Address is required")?;

    let insert = EncouragementInsert {
        employee_id: input.employee_id,
        username,
        address,
        rating: stars,
        description: optional(input.description.as_deref()),
    };

    let employee = state
        .employee_repository
        .record_encouragement(caller.id, &insert)
        .await
        .map_err(|e| {
            if e.is_unique_violation_on(ENCOURAGEMENTS_USER_EMPLOYEE_KEY) {
                ApiError::AlreadyEncouraged
            } else {
                ApiError::from(e)
            }
        })?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    info!("User {} encouraged employee {}", caller.id, employee.id);
    Ok(employee)
}

/// Attach an uploaded photo to an employee; admins or the employee themselves
pub async fn update_employee_photo(
    state: &AppState,
    caller: &AuthUser,
    employee_id: Uuid,
    input: EmployeePhotoUpdate,
) -> ApiResult<Employee> {
    let photo_url = required(&input.photo_url, "Photo URL is required")?;

    let employee = state
        .employee_repository
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    if !caller.is_admin() && employee.user_id != Some(caller.id) {
        return Err(ApiError::Forbidden);
    }

    state
        .employee_repository
        .update_photo(employee_id, photo_url)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))
}

/// Store a contact form message; anyone may send one, as often as they like
pub async fn submit_contact_message(
    state: &AppState,
    input: NewContactMessage,
) -> ApiResult<ContactMessage> {
    let name = required(&input.name, "Name is required")?;
    let email = required(&input.email, "Email is required")?;
    let message = required(&input.message, "Message is required")?;

    let stored = state
        .contact_repository
        .create(name, email, optional(input.subject.as_deref()), message)
        .await?;

    info!("Stored contact message {}", stored.id);
    Ok(stored)
}

pub async fn get_profile(state: &AppState, caller: &AuthUser) -> ApiResult<Profile> {
    state
        .profile_repository
        .find_by_user(caller.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}

/// Update the caller's own profile
pub async fn update_profile(
    state: &AppState,
    caller: &AuthUser,
    input: ProfileUpdate,
) -> ApiResult<Profile> {
    fn trimmed(value: Option<String>) -> Option<String> {
        value.map(|v| v.trim().to_string())
    }

    let update = ProfileUpdate {
        first_name: trimmed(input.first_name),
        middle_name: trimmed(input.middle_name),
        last_name: trimmed(input.last_name),
        address: trimmed(input.address),
        date_of_birth: input.date_of_birth,
        gender: trimmed(input.gender),
        phone: trimmed(input.phone),
        avatar_url: trimmed(input.avatar_url),
    };

    if let Some(first_name) = &update.first_name {
        min_chars(first_name, 2, "First name is required")?;
    }
    if let Some(last_name) = &update.last_name {
        min_chars(last_name, 2, "Last name is required")?;
    }
    if let Some(address) = &update.address {
        min_chars(address, 5, "Address is required")?;
    }
    if let Some(number) = update.phone.as_deref().filter(|p| !p.is_empty()) {
        phone(number)?;
    }

    state
        .profile_repository
        .update(caller.id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::AppRole, state::tests::offline_state};

    fn citizen() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role: Some(AppRole::Citizen),
        }
    }

    fn complaint() -> NewComplaint {
        NewComplaint {
            category_id: Some(Uuid::new_v4()),
            subcategory: Some("Garbage Overflow".to_string()),
            address: "Sitabuldi Main Road".to_string(),
            ..NewComplaint::default()
        }
    }

    // Each case below would fail with a database error if it got past
    // validation, since the offline state cannot reach Postgres.

    #[tokio::test]
    async fn test_complaint_requires_selection() {
        let state = offline_state().await;
        let input = NewComplaint {
            subcategory: None,
            ..complaint()
        };
        let err = submit_complaint(&state, &citizen(), input).await.unwrap_err();
        assert!(matches!(err, ApiError::SelectionRequired));

        let input = NewComplaint {
            category_id: None,
            ..complaint()
        };
        let err = submit_complaint(&state, &citizen(), input).await.unwrap_err();
        assert!(matches!(err, ApiError::SelectionRequired));
    }

    #[tokio::test]
    async fn test_complaint_requires_address_and_sane_location() {
        let state = offline_state().await;
        let input = NewComplaint {
            address: "   ".to_string(),
            ..complaint()
        };
        let err = submit_complaint(&state, &citizen(), input).await.unwrap_err();
        assert_eq!(err.to_string(), "Address is required");

        let input = NewComplaint {
            latitude: Some(21.14),
            ..complaint()
        };
        let err = submit_complaint(&state, &citizen(), input).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid location");
    }

    #[tokio::test]
    async fn test_out_of_range_rating_never_reaches_database() {
        let state = offline_state().await;
        for value in [0, 6, -3] {
            let input = NewEncouragement {
                employee_id: Uuid::new_v4(),
                username: "Asha".to_string(),
                address: "Mahal".to_string(),
                rating: value,
                description: None,
            };
            let err = submit_encouragement(&state, &citizen(), input)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Rating must be between 1 and 5");
        }
    }

    #[tokio::test]
    async fn test_event_field_lengths() {
        let state = offline_state().await;
        let valid = NewEvent {
            name: "Lake Cleanup".to_string(),
            organizer: "NMC".to_string(),
            venue: "Futala Lake".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 11, 1),
            category: "Cleanup Drive".to_string(),
            ..NewEvent::default()
        };

        let cases = [
            (
                NewEvent {
                    name: "Go".to_string(),
                    ..valid.clone()
                },
                "Event name must be at least 3 characters",
            ),
            (
                NewEvent {
                    organizer: "N".to_string(),
                    ..valid.clone()
                },
                "Organizer name must be at least 2 characters",
            ),
            (
                NewEvent {
                    venue: "Lake".to_string(),
                    ..valid.clone()
                },
                "Venue must be at least 5 characters",
            ),
            (
                NewEvent {
                    date: None,
                    ..valid.clone()
                },
                "Event date is required",
            ),
        ];

        for (input, message) in cases {
            let err = submit_event(&state, &citizen(), input).await.unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_contact_message_requires_every_field() {
        let state = offline_state().await;
        let input = NewContactMessage {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            subject: None,
            message: "  ".to_string(),
        };
        let err = submit_contact_message(&state, input).await.unwrap_err();
        assert_eq!(err.to_string(), "Message is required");
    }

    #[tokio::test]
    async fn test_profile_update_is_validated() {
        let state = offline_state().await;
        let input = ProfileUpdate {
            phone: Some("not a phone".to_string()),
            ..ProfileUpdate::default()
        };
        let err = update_profile(&state, &citizen(), input).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid phone number");
    }

    async fn live_state() -> (AppState, sqlx::PgPool) {
        let config = common::database::DatabaseConfig::from_env().unwrap();
        let pool = common::database::init_pool(&config).await.unwrap();
        common::database::run_migrations(&pool).await.unwrap();
        (crate::state::tests::state_with_pool(pool.clone()).await, pool)
    }

    async fn seed_user(pool: &sqlx::PgPool) -> AuthUser {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(format!("{}@example.com", Uuid::new_v4()))
        .fetch_one(pool)
        .await
        .unwrap();
        AuthUser {
            id,
            role: Some(AppRole::Citizen),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres instance"]
    async fn test_encouragement_aggregate_against_database() {
        let (state, pool) = live_state().await;
        let employee_id: Uuid = sqlx::query_scalar(
            "INSERT INTO employees (employee_code, name, job, zone) \
             VALUES ($1, 'Ravi', 'Sweeper', 'Mahal') RETURNING id",
        )
        .bind(Uuid::new_v4().to_string())
        .fetch_one(&pool)
        .await
        .unwrap();

        let encourage = move |rating: i64| NewEncouragement {
            employee_id,
            username: "Asha".to_string(),
            address: "Mahal".to_string(),
            rating,
            description: None,
        };

        // Concurrent raters must all be counted
        let mut handles = Vec::new();
        for rating in [5, 4, 3, 4, 5] {
            let state = state.clone();
            let caller = seed_user(&pool).await;
            handles.push(tokio::spawn(async move {
                submit_encouragement(&state, &caller, encourage(rating)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let repeat = seed_user(&pool).await;
        let employee = submit_encouragement(&state, &repeat, encourage(1)).await.unwrap();
        assert_eq!(employee.total_ratings, 6);
        assert!((employee.rating - 22.0 / 6.0).abs() < 1e-9);

        let err = submit_encouragement(&state, &repeat, encourage(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyEncouraged));

        let unchanged = state
            .employee_repository
            .find_by_id(employee_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.total_ratings, 6);
        assert_eq!(unchanged.rating, employee.rating);
    }

    fn neighbourhood_cleanup() -> NewEvent {
        NewEvent {
            name: "Futala Lake Cleanup".to_string(),
            organizer: "Ward 12 Committee".to_string(),
            venue: "Futala Lake Promenade".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2030, 1, 12),
            category: "cleanup".to_string(),
            ..NewEvent::default()
        }
    }

    async fn approve(pool: &sqlx::PgPool, event_id: Uuid) {
        sqlx::query("UPDATE events SET is_approved = TRUE WHERE id = $1")
            .bind(event_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres instance"]
    async fn test_registration_lifecycle_against_database() {
        let (state, pool) = live_state().await;
        let organizer = seed_user(&pool).await;
        let attendee = seed_user(&pool).await;

        let event = submit_event(&state, &organizer, neighbourhood_cleanup()).await.unwrap();
        let err = register_for_event(&state, &attendee, event.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        approve(&pool, event.id).await;
        let registration = register_for_event(&state, &attendee, event.id).await.unwrap();
        assert_eq!(registration.status, "registered");

        let err = register_for_event(&state, &attendee, event.id).await.unwrap_err();
        assert!(matches!(err, ApiError::AlreadyRegistered));

        let mine = list_my_registrations(&state, &attendee).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].event.id, event.id);

        cancel_registration(&state, &attendee, event.id).await.unwrap();
        cancel_registration(&state, &attendee, event.id).await.unwrap();
        assert!(list_my_registrations(&state, &attendee).await.unwrap().is_empty());

        // Never registered at all
        let stranger = seed_user(&pool).await;
        cancel_registration(&state, &stranger, event.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres instance"]
    async fn test_public_listing_hides_pending_events_against_database() {
        let (state, pool) = live_state().await;
        let organizer = seed_user(&pool).await;

        let pending = submit_event(&state, &organizer, neighbourhood_cleanup()).await.unwrap();
        let approved = submit_event(&state, &organizer, neighbourhood_cleanup()).await.unwrap();
        assert!(!pending.is_approved);
        approve(&pool, approved.id).await;

        let public: Vec<Uuid> = list_events(&state).await.unwrap().iter().map(|e| e.id).collect();
        assert!(public.contains(&approved.id));
        assert!(!public.contains(&pending.id));

        let mine: Vec<Uuid> = list_my_events(&state, &organizer)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(mine.len(), 2);
        assert!(mine.contains(&pending.id));
        assert!(mine.contains(&approved.id));
    }

    #[tokio::test]
    #[ignore = "requires a running Postgres instance"]
    async fn test_complaints_are_private_and_newest_first_against_database() {
        let (state, pool) = live_state().await;
        let category = state
            .category_repository
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|c| !c.subcategories.0.is_empty())
            .unwrap();
        let input = || NewComplaint {
            category_id: Some(category.id),
            subcategory: Some(category.subcategories.0[0].clone()),
            address: "Sitabuldi Main Road".to_string(),
            ..NewComplaint::default()
        };

        let owner = seed_user(&pool).await;
        let neighbour = seed_user(&pool).await;
        let first = submit_complaint(&state, &owner, input()).await.unwrap();
        let second = submit_complaint(&state, &owner, input()).await.unwrap();
        submit_complaint(&state, &neighbour, input()).await.unwrap();

        let mine = list_my_complaints(&state, &owner).await.unwrap();
        let ids: Vec<Uuid> = mine.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(mine.iter().all(|c| c.user_id == owner.id));
        assert_eq!(first.title, category.subcategories.0[0]);
    }
}
