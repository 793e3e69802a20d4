//! Admin behavior: read-only platform monitoring

use crate::actor::Actor;
use crate::client::payload;
use crate::policy::weighted_pick;
use crate::utils::errors::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Method;
use tracing::info;

/// Admin action table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ViewUsers,
    ViewCourses,
    CheckMetrics,
}

impl AdminAction {
    /// Near-equal weights across the three read-only actions
    pub const WEIGHTS: [(AdminAction, f64); 3] = [
        (AdminAction::ViewUsers, 0.33),
        (AdminAction::ViewCourses, 0.33),
        (AdminAction::CheckMetrics, 0.34),
    ];

    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        weighted_pick(rng, &Self::WEIGHTS)
    }
}

/// Run one admin action to completion
pub async fn run(actor: &mut Actor, action: AdminAction) -> Result<()> {
    match action {
        AdminAction::ViewUsers => view_users(actor).await,
        AdminAction::ViewCourses => view_courses(actor).await,
        AdminAction::CheckMetrics => check_metrics(actor).await,
    }
}

async fn view_users(actor: &mut Actor) -> Result<()> {
    info!("Admin {} is viewing all users", actor.label());
    actor.call(Method::GET, "users", None).await?;
    Ok(())
}

async fn view_courses(actor: &mut Actor) -> Result<()> {
    info!("Admin {} is viewing all courses", actor.label());
    actor.call(Method::GET, "courses", None).await?;
    Ok(())
}

/// List courses, then inspect metrics for one of them
async fn check_metrics(actor: &mut Actor) -> Result<()> {
    let catalog = actor.call(Method::GET, "courses", None).await?.into_json();
    let course_ids: Vec<i64> = payload::items(&catalog)
        .iter()
        .filter_map(payload::id_of)
        .collect();

    let Some(&course_id) = course_ids.choose(&mut actor.rng) else {
        return Ok(());
    };

    info!(
        "Admin {} is checking metrics for course {}",
        actor.label(),
        course_id
    );
    actor
        .call(Method::GET, &format!("analytics/course/{}", course_id), None)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use crate::client::{ApiClient, RetryPolicy};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn admin(server: &MockServer) -> Actor {
        let api = ApiClient::new(server.uri(), Duration::from_secs(2), RetryPolicy::default());
        let mut actor = Actor::new(
            "Admin 1",
            "admin1@example.com",
            "admin123",
            Role::Admin,
            &api,
        )
        .with_rng_seed(3);
        actor.token = Some("tok".to_string());
        actor.id = Some(1);
        actor
    }

    #[tokio::test]
    async fn metrics_check_inspects_one_course() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/analytics/course/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"enrollments": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let mut actor = admin(&server).await;
        run(&mut actor, AdminAction::CheckMetrics).await.unwrap();
    }

    #[tokio::test]
    async fn metrics_check_stops_on_an_empty_catalog() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mut actor = admin(&server).await;
        run(&mut actor, AdminAction::CheckMetrics).await.unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_and_course_listings_are_read_only() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mut actor = admin(&server).await;
        run(&mut actor, AdminAction::ViewUsers).await.unwrap();
        run(&mut actor, AdminAction::ViewCourses).await.unwrap();

        assert!(server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .all(|r| r.method.as_str() == "GET"));
    }
}
