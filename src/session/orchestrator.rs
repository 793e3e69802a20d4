//! Session orchestrator for continuous mode
//!
//! Instead of letting each actor loop freely, the orchestrator drives one
//! round of activity across the whole population per session: it samples
//! who is active, runs a generic dashboard/notification check plus a short
//! role-policy burst for each sampled actor, and paces everything with
//! randomized delays.
//!
//! Cancellation is cooperative and checked only at session and actor
//! boundaries; the in-progress actor step always completes.

use crate::actor::{Actor, Role};
use crate::client::payload;
use crate::policy;
use crate::population::manager::random_delay;
use crate::synth::ContentLibrary;
use crate::utils::config::SimConfig;
use crate::utils::errors::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Probability that an actor participates in a given session
const ACTIVITY_PROBABILITY: f64 = 0.9;

/// Pause between actors within one session
const ACTOR_PAUSE_MIN: Duration = Duration::from_millis(500);
const ACTOR_PAUSE_MAX: Duration = Duration::from_millis(1_500);

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    SessionRunning,
    Stopped,
}

/// Sample actor indices, each included independently with `probability`
pub(crate) fn sample_active<R: Rng>(rng: &mut R, count: usize, probability: f64) -> Vec<usize> {
    (0..count).filter(|_| rng.gen_bool(probability)).collect()
}

/// Drives repeated sessions across the whole actor population
pub struct SessionOrchestrator {
    actors: Vec<Actor>,
    library: Arc<ContentLibrary>,
    min_delay: Duration,
    max_delay: Duration,
    state: OrchestratorState,
    sessions_completed: u64,
    shutdown: CancellationToken,
    rng: StdRng,
}

impl SessionOrchestrator {
    pub fn new(
        actors: Vec<Actor>,
        library: Arc<ContentLibrary>,
        config: &SimConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            actors,
            library,
            min_delay: config.min_delay(),
            max_delay: config.max_delay(),
            state: OrchestratorState::Idle,
            sessions_completed: 0,
            shutdown,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed
    }

    /// Run sessions until the shutdown token fires
    pub async fn run(&mut self) {
        info!(
            "Session orchestrator starting with {} actors",
            self.actors.len()
        );

        while !self.shutdown.is_cancelled() {
            self.state = OrchestratorState::SessionRunning;
            self.run_session().await;
            self.sessions_completed += 1;
        }

        self.state = OrchestratorState::Stopped;
        info!(
            "Session orchestrator stopped after {} session(s)",
            self.sessions_completed
        );
    }

    /// One round across the sampled active subset
    async fn run_session(&mut self) {
        let selected = sample_active(&mut self.rng, self.actors.len(), ACTIVITY_PROBABILITY);
        debug!(
            "Session {}: {}/{} actors active",
            self.sessions_completed + 1,
            selected.len(),
            self.actors.len()
        );

        for index in selected {
            // Finish the current actor before honoring a shutdown
            if self.shutdown.is_cancelled() {
                return;
            }

            let actor = &mut self.actors[index];
            process_actor(actor, &self.library).await;

            let pause = random_delay(&mut self.rng, ACTOR_PAUSE_MIN, ACTOR_PAUSE_MAX);
            tokio::time::sleep(pause).await;
        }

        let rest = random_delay(&mut self.rng, self.min_delay, self.max_delay);
        tokio::time::sleep(rest).await;
    }
}

/// Generic check plus a role-policy burst for one actor
///
/// Errors are non-fatal: log and move on to the next draw or actor.
pub(crate) async fn process_actor(actor: &mut Actor, library: &ContentLibrary) {
    if actor.id.is_none() {
        if let Err(e) = actor.resolve_id().await {
            warn!("Could not resolve id for {}: {}", actor.label(), e);
            return;
        }
    }

    if let Err(e) = generic_check(actor).await {
        warn!("Generic check failed for {}: {}", actor.label(), e);
    }

    let draws = match actor.role {
        Role::Student => actor.rng.gen_range(1..=3),
        Role::Instructor | Role::Admin => actor.rng.gen_range(1..=2),
    };

    for _ in 0..draws {
        if let Err(e) = policy::perform(actor, library).await {
            warn!("Action failed for {}: {}", actor.label(), e);
        }
    }
}

/// Dashboard snapshot and inbox sweep
///
/// If the inbox holds unread notifications, one of them, picked at
/// random, is marked read.
async fn generic_check(actor: &mut Actor) -> Result<()> {
    actor.call(Method::GET, "dashboard", None).await?;

    let Some(actor_id) = actor.id else {
        return Ok(());
    };
    let inbox = actor
        .call(Method::GET, &format!("notifications/{}", actor_id), None)
        .await?
        .into_json();

    let unread: Vec<i64> = payload::items(&inbox)
        .iter()
        .filter(|n| !n.get("is_read").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(payload::id_of)
        .collect();

    if let Some(&notification_id) = unread.choose(&mut actor.rng) {
        actor
            .call(
                Method::PUT,
                &format!("notifications/{}/read", notification_id),
                None,
            )
            .await?;
        debug!(
            "{} marked notification {} as read",
            actor.label(),
            notification_id
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiClient, RetryPolicy};
    use serde_json::json;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn sampling_converges_to_the_activity_probability() {
        let mut rng = StdRng::seed_from_u64(99);
        const SESSIONS: usize = 10_000;
        const POPULATION: usize = 10;

        let mut included = 0usize;
        for _ in 0..SESSIONS {
            included += sample_active(&mut rng, POPULATION, ACTIVITY_PROBABILITY).len();
        }

        let fraction = included as f64 / (SESSIONS * POPULATION) as f64;
        assert!(
            (fraction - ACTIVITY_PROBABILITY).abs() < 0.01,
            "inclusion fraction {:.4}",
            fraction
        );
    }

    #[test]
    fn sampling_an_empty_population_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_active(&mut rng, 0, ACTIVITY_PROBABILITY).is_empty());
    }

    #[tokio::test]
    async fn generic_check_marks_one_unread_notification() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notifications/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 4, "user_id": 1, "message": "m", "is_read": false},
                {"id": 5, "user_id": 1, "message": "m", "is_read": true},
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/notifications/4/read"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri(), Duration::from_secs(2), RetryPolicy::default());
        let mut actor = Actor::new("Admin 1", "admin1@example.com", "admin123", Role::Admin, &api)
            .with_rng_seed(2);
        actor.token = Some("tok".to_string());
        actor.id = Some(1);

        generic_check(&mut actor).await.unwrap();
    }

    #[tokio::test]
    async fn generic_check_skips_marking_when_inbox_is_clean() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notifications/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 4, "is_read": true},
            ])))
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri(), Duration::from_secs(2), RetryPolicy::default());
        let mut actor = Actor::new("Admin 1", "admin1@example.com", "admin123", Role::Admin, &api);
        actor.token = Some("tok".to_string());
        actor.id = Some(1);

        generic_check(&mut actor).await.unwrap();

        let puts = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == "PUT")
            .count();
        assert_eq!(puts, 0);
    }

    #[tokio::test]
    async fn process_actor_runs_the_generic_check_and_a_policy_burst() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        // Everything else (inbox, user/course listings, analytics) is empty
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(250)
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri(), Duration::from_secs(2), RetryPolicy::default());
        let mut actor = Actor::new("Admin 1", "admin1@example.com", "admin123", Role::Admin, &api)
            .with_rng_seed(8);
        actor.token = Some("tok".to_string());
        actor.id = Some(1);

        let library = ContentLibrary::new(vec![], vec![]);
        process_actor(&mut actor, &library).await;

        // Dashboard + inbox + at least one admin draw
        let requests = server.received_requests().await.unwrap();
        assert!(requests.len() >= 3);
    }

    #[tokio::test]
    async fn cancelled_orchestrator_stops_without_running_a_session() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let config = SimConfig::default();
        let library = Arc::new(ContentLibrary::new(vec![], vec![]));
        let mut orchestrator = SessionOrchestrator::new(vec![], library, &config, shutdown);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);

        orchestrator.run().await;

        assert_eq!(orchestrator.state(), OrchestratorState::Stopped);
        assert_eq!(orchestrator.sessions_completed(), 0);
    }

    #[tokio::test]
    async fn empty_sessions_still_advance_the_counter() {
        let shutdown = CancellationToken::new();
        let mut config = SimConfig::default();
        config.min_delay_secs = 0.01;
        config.max_delay_secs = 0.02;

        let library = Arc::new(ContentLibrary::new(vec![], vec![]));
        let mut orchestrator =
            SessionOrchestrator::new(vec![], library, &config, shutdown.clone());

        let stopper = tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                shutdown.cancel();
            }
        });

        orchestrator.run().await;
        stopper.await.unwrap();

        assert_eq!(orchestrator.state(), OrchestratorState::Stopped);
        assert!(orchestrator.sessions_completed() > 0);
    }
}
