//! Population manager: build, authenticate, run and stop actors

use crate::actor::{Actor, Role, TokenRegistry};
use crate::client::ApiClient;
use crate::policy;
use crate::population::ActorHandle;
use crate::synth::ContentLibrary;
use crate::utils::config::SimConfig;
use crate::utils::errors::{Result, SimError};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Uniform random delay in `[min, max]`
pub(crate) fn random_delay<R: Rng>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let span = (max - min).as_secs_f64();
    min + Duration::from_secs_f64(rng.gen::<f64>() * span)
}

/// Builds actors from configuration and drives their concurrent loops
pub struct PopulationManager {
    config: SimConfig,
    api: ApiClient,
    library: Arc<ContentLibrary>,
    tokens: TokenRegistry,
    handles: Vec<ActorHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl PopulationManager {
    pub fn new(config: SimConfig) -> Self {
        let api = ApiClient::from_config(&config);
        let library = Arc::new(ContentLibrary::new(
            config.course_topics.clone(),
            config.content_types.clone(),
        ));

        Self {
            config,
            api,
            library,
            tokens: Arc::new(DashMap::new()),
            handles: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Setup-phase id -> token registry
    pub fn tokens(&self) -> TokenRegistry {
        Arc::clone(&self.tokens)
    }

    /// Handles of all spawned actors
    pub fn handles(&self) -> &[ActorHandle] {
        &self.handles
    }

    /// Shared synthetic content vocabulary
    pub fn library(&self) -> Arc<ContentLibrary> {
        Arc::clone(&self.library)
    }

    /// Build the configured population
    pub fn build_actors(&self) -> Vec<Actor> {
        let mut actors = Vec::new();
        let counts = &self.config.population;

        for i in 1..=counts.admins {
            actors.push(self.build_actor(Role::Admin, i, &self.config.passwords.admin));
        }
        for i in 1..=counts.instructors {
            actors.push(self.build_actor(Role::Instructor, i, &self.config.passwords.instructor));
        }
        for i in 1..=counts.students {
            actors.push(self.build_actor(Role::Student, i, &self.config.passwords.student));
        }

        info!(
            "Created {} admins, {} instructors and {} students",
            counts.admins, counts.instructors, counts.students
        );
        actors
    }

    fn build_actor(&self, role: Role, index: usize, password: &str) -> Actor {
        let title = match role {
            Role::Admin => "Admin",
            Role::Instructor => "Instructor",
            Role::Student => "Student",
        };
        let name = format!("{} {}", title, index);
        let email = format!("{}{}@example.com", role.as_str(), index);
        Actor::new(name, email, password, role, &self.api)
    }

    /// Register, log in and resolve each actor
    ///
    /// Registration or login failure excludes the actor from the run; it
    /// never aborts setup. Resolved tokens land in the registry, each key
    /// written exactly once. Failing to authenticate *any* actor is the
    /// one fatal condition.
    pub async fn setup(&self, actors: Vec<Actor>) -> Result<Vec<Actor>> {
        info!("Registering and logging in {} users...", actors.len());
        let total = actors.len();
        let mut ready = Vec::new();

        for mut actor in actors {
            if let Err(e) = actor.register().await {
                warn!("Failed to register {}: {}", actor.label(), e);
                continue;
            }
            if let Err(e) = actor.login().await {
                warn!("Failed to log in {}: {}", actor.label(), e);
                continue;
            }

            // Resolve now so the registry fills during setup; the behavior
            // loop retries later if this misses.
            match actor.resolve_id().await {
                Ok(id) => {
                    if let Some(token) = &actor.token {
                        self.tokens.insert(id, token.clone());
                    }
                }
                Err(e) => warn!("Could not resolve id for {} yet: {}", actor.label(), e),
            }

            ready.push(actor);
        }

        if ready.is_empty() {
            return Err(SimError::NoActorsAuthenticated);
        }

        info!("Authenticated {}/{} actors", ready.len(), total);
        Ok(ready)
    }

    /// Launch one behavior task per actor
    pub fn spawn(&mut self, actors: Vec<Actor>) {
        let min = self.config.min_delay();
        let max = self.config.max_delay();

        for actor in actors {
            self.handles.push(ActorHandle {
                name: actor.name.clone(),
                role: actor.role,
                vitals: Arc::clone(&actor.vitals),
            });

            let library = Arc::clone(&self.library);
            self.tasks
                .push(tokio::spawn(behavior_loop(actor, library, min, max)));
        }

        info!("Simulation running with {} actors", self.tasks.len());
    }

    /// Stop all behavior tasks
    ///
    /// Clears every active flag, then waits up to `stop_timeout` per task.
    /// A task that sleeps past the deadline is aborted so nothing keeps
    /// mutating actor state after `stop()` returns.
    pub async fn stop(&mut self) {
        info!("Stopping simulation...");
        for handle in &self.handles {
            handle.vitals.deactivate();
        }

        let limit = self.config.stop_timeout();
        for (handle, mut task) in self.handles.iter().zip(self.tasks.drain(..)) {
            match tokio::time::timeout(limit, &mut task).await {
                Ok(_) => debug!("Actor task {} exited", handle.name),
                Err(_) => {
                    warn!("Actor task {} did not stop within {:?}, aborting", handle.name, limit);
                    task.abort();
                }
            }
        }

        info!("Simulation stopped");
    }
}

/// Independent behavior loop for one actor
///
/// Cancellation is cooperative: the active flag is checked once per
/// iteration boundary, never mid-call. Errors are non-fatal; they log and
/// cost a `max_delay` cooldown.
async fn behavior_loop(
    mut actor: Actor,
    library: Arc<ContentLibrary>,
    min_delay: Duration,
    max_delay: Duration,
) {
    info!("Starting behavior simulation for {}", actor.label());

    while actor.vitals.is_active() {
        if actor.id.is_none() {
            if let Err(e) = actor.resolve_id().await {
                warn!("Could not resolve id for {}: {}", actor.label(), e);
                tokio::time::sleep(max_delay).await;
                continue;
            }
        }

        match policy::perform(&mut actor, &library).await {
            Ok(()) => {
                let delay = random_delay(&mut actor.rng, min_delay, max_delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!("Error in behavior simulation for {}: {}", actor.label(), e);
                tokio::time::sleep(max_delay).await;
            }
        }
    }

    debug!("Behavior loop for {} exited", actor.label());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{any, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer, students: usize) -> SimConfig {
        let mut config = SimConfig::default();
        config.api_url = server.uri();
        config.population.admins = 0;
        config.population.instructors = 0;
        config.population.students = students;
        config.min_delay_secs = 0.01;
        config.max_delay_secs = 0.05;
        config.stop_timeout_secs = 1;
        config
    }

    #[test]
    fn random_delay_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(300);
        for _ in 0..1_000 {
            let delay = random_delay(&mut rng, min, max);
            assert!(delay >= min && delay <= max);
        }
    }

    #[tokio::test]
    async fn build_actors_follows_configured_counts_and_naming() {
        let server = MockServer::start().await;
        let mut config = test_config(&server, 2);
        config.population.admins = 1;
        config.population.instructors = 3;

        let manager = PopulationManager::new(config);
        let actors = manager.build_actors();

        assert_eq!(actors.len(), 6);
        assert_eq!(actors[0].name, "Admin 1");
        assert_eq!(actors[0].email, "admin1@example.com");
        assert_eq!(actors[1].name, "Instructor 1");
        assert_eq!(actors[3].name, "Instructor 3");
        assert_eq!(actors[4].email, "student1@example.com");
        assert_eq!(actors[5].password, "student123");
    }

    #[tokio::test]
    async fn setup_excludes_actors_that_cannot_log_in() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .and(body_partial_json(json!({"email": "student1@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .and(body_partial_json(json!({"email": "student2@example.com"})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid credentials"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 41}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/enrollments/user/41"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let manager = PopulationManager::new(test_config(&server, 2));
        let ready = manager.setup(manager.build_actors()).await.unwrap();

        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].email, "student1@example.com");
        assert_eq!(
            manager.tokens().get(&41).map(|t| t.value().clone()),
            Some("tok-1".to_string())
        );
    }

    #[tokio::test]
    async fn setup_with_no_authenticated_actor_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "nope"})))
            .mount(&server)
            .await;

        let manager = PopulationManager::new(test_config(&server, 2));
        let err = manager.setup(manager.build_actors()).await.unwrap_err();
        assert!(matches!(err, SimError::NoActorsAuthenticated));
    }

    #[tokio::test]
    async fn stop_returns_within_its_timeout_and_halts_all_tasks() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 7}})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
            .mount(&server)
            .await;
        // Permissive backend: everything else succeeds with an empty list
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(250)
            .mount(&server)
            .await;

        let config = test_config(&server, 2);
        let stop_budget = config.stop_timeout();
        let mut manager = PopulationManager::new(config);
        let ready = manager.setup(manager.build_actors()).await.unwrap();
        assert_eq!(ready.len(), 2);

        manager.spawn(ready);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        manager.stop().await;
        let elapsed = started.elapsed();

        // Per-task budget, plus slack for the scheduler
        assert!(elapsed < stop_budget * 2 + Duration::from_millis(500));
        assert!(manager.handles().iter().all(|h| !h.vitals.is_active()));
        assert!(manager.tasks.is_empty());
    }
}
