//! Instructor behavior: create and maintain courses, notify students

use crate::actor::Actor;
use crate::client::payload;
use crate::policy::weighted_pick;
use crate::synth::{self, ContentLibrary};
use crate::utils::errors::{Result, SimError};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Method;
use serde_json::json;
use tracing::info;

/// Content items seeded into every newly created course
const INITIAL_CONTENT_ITEMS: i64 = 3;

/// Instructor action table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructorAction {
    CreateCourse,
    CheckEnrollments,
    AddContent,
    UpdateCourse,
    SendNotification,
}

impl InstructorAction {
    /// Weighted table; upkeep and outreach dominate over creation
    pub const WEIGHTS: [(InstructorAction, f64); 5] = [
        (InstructorAction::CreateCourse, 0.1),
        (InstructorAction::CheckEnrollments, 0.15),
        (InstructorAction::AddContent, 0.2),
        (InstructorAction::UpdateCourse, 0.25),
        (InstructorAction::SendNotification, 0.3),
    ];

    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        weighted_pick(rng, &Self::WEIGHTS)
    }
}

/// Run one instructor action to completion
pub async fn run(actor: &mut Actor, library: &ContentLibrary, action: InstructorAction) -> Result<()> {
    match action {
        InstructorAction::CreateCourse => create_course(actor, library).await,
        InstructorAction::CheckEnrollments => check_enrollments(actor, library).await,
        InstructorAction::AddContent => add_content(actor, library).await,
        InstructorAction::UpdateCourse => update_course(actor, library).await,
        InstructorAction::SendNotification => send_notification(actor, library).await,
    }
}

/// Create a course and seed its first three content items (orders 1..3)
pub(crate) async fn create_course(actor: &mut Actor, library: &ContentLibrary) -> Result<()> {
    let instructor_id = resolved_id(actor)?;
    let topic = library.random_topic(&mut actor.rng).to_string();
    let difficulty = synth::random_difficulty(&mut actor.rng);

    let body = json!({
        "title": synth::course_title(&topic, difficulty),
        "description": synth::course_description(&topic, difficulty),
        "instructor_id": instructor_id.to_string(),
    });

    info!("Instructor {} is creating a new course", actor.label());
    let created = actor.call(Method::POST, "courses", Some(&body)).await?;
    let course_id = created
        .json()
        .and_then(payload::id_of)
        .ok_or_else(|| SimError::Decode("course response carried no id".to_string()))?;

    if let Some(owned) = actor.memory.owned_mut() {
        owned.push(course_id);
    }
    info!("Instructor {} created course {}", actor.label(), course_id);

    for order in 1..=INITIAL_CONTENT_ITEMS {
        create_content_item(actor, library, course_id, order).await?;
    }
    Ok(())
}

/// Add one content item at the given order
async fn create_content_item(
    actor: &mut Actor,
    library: &ContentLibrary,
    course_id: i64,
    order: i64,
) -> Result<()> {
    let content_type = library.random_content_type(&mut actor.rng).to_string();
    let body = json!({
        "course_id": course_id,
        "type": content_type,
        "content": synth::content_payload(&content_type, course_id, order),
        "order": order,
    });

    info!(
        "Instructor {} is adding content to course {}",
        actor.label(),
        course_id
    );
    actor.call(Method::POST, "course-content", Some(&body)).await?;
    Ok(())
}

/// Read the enrollment list of one owned course
async fn check_enrollments(actor: &mut Actor, library: &ContentLibrary) -> Result<()> {
    let Some(course_id) = pick_owned(actor) else {
        return create_course(actor, library).await;
    };

    info!(
        "Instructor {} is checking enrollments for course {}",
        actor.label(),
        course_id
    );
    actor
        .call(
            Method::GET,
            &format!("enrollments/course/{}", course_id),
            None,
        )
        .await?;
    Ok(())
}

/// Append one item to an owned course at the next order slot
///
/// The backend is authoritative for `order`; the engine only guesses
/// `count + 1` from the content list it just observed.
async fn add_content(actor: &mut Actor, library: &ContentLibrary) -> Result<()> {
    let Some(course_id) = pick_owned(actor) else {
        return create_course(actor, library).await;
    };

    let contents = actor
        .call(Method::GET, &format!("course-content/{}", course_id), None)
        .await?
        .into_json();
    let next_order = payload::items(&contents).len() as i64 + 1;

    create_content_item(actor, library, course_id, next_order).await
}

/// Re-fetch an owned course and append a dated note to its description
async fn update_course(actor: &mut Actor, library: &ContentLibrary) -> Result<()> {
    let Some(course_id) = pick_owned(actor) else {
        return create_course(actor, library).await;
    };

    let course = actor
        .call(Method::GET, &format!("courses/{}", course_id), None)
        .await?
        .into_json();

    let title = payload::str_field(&course, "title")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Course {}", course_id));
    let description = payload::str_field(&course, "description").unwrap_or_default();

    let body = json!({
        "title": title,
        "description": format!(
            "{} Updated on {}.",
            description,
            Utc::now().format("%Y-%m-%d")
        ),
    });

    info!("Instructor {} is updating course {}", actor.label(), course_id);
    actor
        .call(Method::PUT, &format!("courses/{}", course_id), Some(&body))
        .await?;
    Ok(())
}

/// Send one templated notification to every student of an owned course
///
/// Course title and enrollments are re-fetched immediately before use;
/// nothing is cached across actions.
async fn send_notification(actor: &mut Actor, library: &ContentLibrary) -> Result<()> {
    let Some(course_id) = pick_owned(actor) else {
        return create_course(actor, library).await;
    };

    let course = actor
        .call(Method::GET, &format!("courses/{}", course_id), None)
        .await?
        .into_json();
    let course_title = payload::str_field(&course, "title")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Course {}", course_id));

    let enrollments = actor
        .call(
            Method::GET,
            &format!("enrollments/course/{}", course_id),
            None,
        )
        .await?
        .into_json();
    let enrolled = payload::items(&enrollments);
    if enrolled.is_empty() {
        return Ok(());
    }

    let templates = synth::notification_templates(&course_title);
    let message = templates
        .choose(&mut actor.rng)
        .cloned()
        .unwrap_or_else(|| templates[0].clone());

    for enrollment in enrolled {
        let Some(user_id) = payload::int_field(enrollment, "user_id") else {
            continue;
        };
        let body = json!({
            "user_id": user_id,
            "message": message,
        });

        info!(
            "Instructor {} is sending a notification to student {} in course {}",
            actor.label(),
            user_id,
            course_id
        );
        actor.call(Method::POST, "notifications", Some(&body)).await?;
    }
    Ok(())
}

/// Random course from the owned list, if any
fn pick_owned(actor: &mut Actor) -> Option<i64> {
    let owned = actor.memory.owned()?.clone();
    owned.choose(&mut actor.rng).copied()
}

fn resolved_id(actor: &Actor) -> Result<i64> {
    actor
        .id
        .ok_or_else(|| SimError::Precondition("actor id not resolved".to_string()))
}
