//! Synthetic content generation
//!
//! Vocabulary and payload builders for the fake course catalog: titles,
//! descriptions, content item bodies and notification message templates.
//! Pure string/JSON shaping, no I/O.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

/// Difficulty tiers used in course titles
pub const DIFFICULTIES: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

/// Topic and content-type vocabulary shared by all instructors
#[derive(Debug, Clone)]
pub struct ContentLibrary {
    pub topics: Vec<String>,
    pub content_types: Vec<String>,
}

impl ContentLibrary {
    pub fn new(topics: Vec<String>, content_types: Vec<String>) -> Self {
        Self {
            topics,
            content_types,
        }
    }

    pub fn random_topic<R: Rng>(&self, rng: &mut R) -> &str {
        self.topics
            .choose(rng)
            .map(String::as_str)
            .unwrap_or("General Studies")
    }

    pub fn random_content_type<R: Rng>(&self, rng: &mut R) -> &str {
        self.content_types
            .choose(rng)
            .map(String::as_str)
            .unwrap_or("text")
    }
}

pub fn random_difficulty<R: Rng>(rng: &mut R) -> &'static str {
    DIFFICULTIES.choose(rng).copied().unwrap_or("Beginner")
}

/// `"<topic> <difficulty> Course"`
pub fn course_title(topic: &str, difficulty: &str) -> String {
    format!("{} {} Course", topic, difficulty)
}

pub fn course_description(topic: &str, difficulty: &str) -> String {
    format!(
        "Learn {} from scratch to expert level. This is a {} level course.",
        topic,
        difficulty.to_lowercase()
    )
}

/// Opaque content body for a new content item
///
/// Videos and PDFs point at fake hosted files; everything else gets an
/// image URL, matching the seed data conventions.
pub fn content_payload(content_type: &str, course_id: i64, order: i64) -> Value {
    match content_type {
        "video" => json!({
            "url": format!("https://example.com/video/{}/lesson{}", course_id, order)
        }),
        "pdf" => json!({
            "url": format!("https://example.com/pdf/{}/document{}.pdf", course_id, order)
        }),
        _ => json!({
            "url": format!("https://example.com/img/{}/image{}.png", course_id, order)
        }),
    }
}

/// Notification message templates for a course
pub fn notification_templates(course_title: &str) -> [String; 4] {
    [
        format!(
            "Don't forget to complete the latest module in {}!",
            course_title
        ),
        format!("New live session for {} scheduled next week!", course_title),
        format!(
            "Office hours available for {} students tomorrow.",
            course_title
        ),
        format!(
            "Important deadline approaching for {} assignment!",
            course_title
        ),
    ]
}
