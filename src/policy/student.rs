//! Student behavior: browse, enroll, study, check notifications

use crate::actor::Actor;
use crate::client::payload;
use crate::policy::weighted_pick;
use crate::utils::errors::{Result, SimError};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Method;
use serde_json::json;
use tracing::{info, warn};

/// Probability that a browsing student enrolls in a new course
pub(crate) const ENROLL_CHANCE: f64 = 0.3;

/// Student action table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentAction {
    BrowseCourses,
    ViewEnrolledCourse,
    MakeProgress,
    CheckNotifications,
}

impl StudentAction {
    /// Weighted table; progress and notifications dominate
    pub const WEIGHTS: [(StudentAction, f64); 4] = [
        (StudentAction::BrowseCourses, 0.1),
        (StudentAction::ViewEnrolledCourse, 0.1),
        (StudentAction::MakeProgress, 0.4),
        (StudentAction::CheckNotifications, 0.4),
    ];

    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        weighted_pick(rng, &Self::WEIGHTS)
    }
}

/// Run one student action to completion
pub async fn run(actor: &mut Actor, action: StudentAction) -> Result<()> {
    match action {
        StudentAction::BrowseCourses => browse_courses(actor).await,
        StudentAction::ViewEnrolledCourse => view_enrolled_course(actor).await,
        StudentAction::MakeProgress => make_progress(actor).await,
        StudentAction::CheckNotifications => check_notifications(actor).await,
    }
}

/// List the catalog; with probability [`ENROLL_CHANCE`], enroll in a course
/// the student is not already in
pub(crate) async fn browse_courses(actor: &mut Actor) -> Result<()> {
    browse_courses_with_chance(actor, ENROLL_CHANCE).await
}

pub(crate) async fn browse_courses_with_chance(actor: &mut Actor, chance: f64) -> Result<()> {
    info!("Student {} is browsing courses", actor.label());
    let catalog = actor.call(Method::GET, "courses", None).await?.into_json();
    let courses = payload::items(&catalog);

    if courses.is_empty() || !actor.rng.gen_bool(chance) {
        return Ok(());
    }

    let enrolled = actor
        .memory
        .enrolled()
        .cloned()
        .ok_or_else(|| SimError::Precondition("browse_courses on a non-student".to_string()))?;

    let available: Vec<i64> = courses
        .iter()
        .filter_map(payload::id_of)
        .filter(|id| !enrolled.contains(id))
        .collect();

    match available.choose(&mut actor.rng) {
        Some(&course_id) => enroll(actor, course_id).await,
        None => Ok(()),
    }
}

/// Create an enrollment and remember it locally on success
async fn enroll(actor: &mut Actor, course_id: i64) -> Result<()> {
    let student_id = actor
        .id
        .ok_or_else(|| SimError::Precondition("actor id not resolved".to_string()))?;

    // Local duplicate guard; the backend stays the final arbiter
    if actor
        .memory
        .enrolled()
        .is_some_and(|enrolled| enrolled.contains(&course_id))
    {
        return Ok(());
    }

    let body = json!({
        "course_id": course_id,
        "user_id": student_id,
    });

    info!("Student {} is enrolling in course {}", student_id, course_id);
    actor.call(Method::POST, "enrollments", Some(&body)).await?;

    if let Some(enrolled) = actor.memory.enrolled_mut() {
        enrolled.insert(course_id);
    }
    info!("Student {} enrolled in course {}", actor.label(), course_id);
    Ok(())
}

/// Read an enrolled course's details and content list
async fn view_enrolled_course(actor: &mut Actor) -> Result<()> {
    let Some(course_id) = pick_enrolled(actor) else {
        return browse_courses(actor).await;
    };

    info!("Student {} is viewing course {}", actor.label(), course_id);
    actor
        .call(Method::GET, &format!("courses/{}", course_id), None)
        .await?;
    actor
        .call(Method::GET, &format!("course-content/{}", course_id), None)
        .await?;
    Ok(())
}

/// Record a progress event against one content item of an enrolled course
async fn make_progress(actor: &mut Actor) -> Result<()> {
    let Some(course_id) = pick_enrolled(actor) else {
        return browse_courses(actor).await;
    };

    let contents = actor
        .call(Method::GET, &format!("course-content/{}", course_id), None)
        .await?
        .into_json();
    let items = payload::items(&contents);
    if items.is_empty() {
        return Ok(());
    }

    let Some(content) = items.choose(&mut actor.rng) else {
        return Ok(());
    };
    let Some(content_id) = payload::id_of(content) else {
        warn!("Content item without id in course {}", course_id);
        return Ok(());
    };

    let time_spent = actor.rng.gen_range(60..=900);
    record_progress(actor, course_id, content_id, time_spent).await
}

/// Submit one progress record; the course must be in the enrolled set
pub(crate) async fn record_progress(
    actor: &mut Actor,
    course_id: i64,
    content_id: i64,
    time_spent: i64,
) -> Result<()> {
    let student_id = actor
        .id
        .ok_or_else(|| SimError::Precondition("actor id not resolved".to_string()))?;

    if !actor
        .memory
        .enrolled()
        .is_some_and(|enrolled| enrolled.contains(&course_id))
    {
        return Err(SimError::Precondition(format!(
            "progress attempted for non-enrolled course {}",
            course_id
        )));
    }

    let body = json!({
        "user_id": student_id,
        "course_id": course_id,
        "content_id": content_id,
        "time_spent": time_spent,
    });

    info!(
        "Student {} is making progress in course {}",
        actor.label(),
        course_id
    );
    actor.call(Method::POST, "progress", Some(&body)).await?;
    Ok(())
}

/// Fetch this student's notifications
async fn check_notifications(actor: &mut Actor) -> Result<()> {
    let student_id = actor
        .id
        .ok_or_else(|| SimError::Precondition("actor id not resolved".to_string()))?;

    info!("Student {} is checking notifications", actor.label());
    actor
        .call(Method::GET, &format!("notifications/{}", student_id), None)
        .await?;
    Ok(())
}

/// Random course from the enrolled set, if any
fn pick_enrolled(actor: &mut Actor) -> Option<i64> {
    let enrolled: Vec<i64> = actor.memory.enrolled()?.iter().copied().collect();
    enrolled.choose(&mut actor.rng).copied()
}
