//! Simulated user state and identity
//!
//! An [`Actor`] owns everything about one simulated user: identity,
//! credentials, backend-assigned id, auth token, role-specific memory and
//! its random number generator. Actor state is mutated only by the task
//! driving that actor; the only pieces visible across tasks are the
//! [`ActorVitals`] (active flag + lastActivity) and the setup-phase
//! [`TokenRegistry`].

use crate::client::{payload, ActivityTracker, ApiClient, Payload};
use crate::utils::errors::{Result, SimError};
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// id -> token registry, populated once per actor during setup
///
/// Single writer per key; read-only in steady state.
pub type TokenRegistry = Arc<DashMap<i64, String>>;

/// Simulated user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    /// Role string expected by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-specific actor memory
#[derive(Debug, Clone)]
pub enum RoleMemory {
    /// Courses the student believes itself enrolled in
    Student { enrolled: HashSet<i64> },
    /// Courses this instructor created, in creation order
    Instructor { owned: Vec<i64> },
    Admin,
}

impl RoleMemory {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => RoleMemory::Student {
                enrolled: HashSet::new(),
            },
            Role::Instructor => RoleMemory::Instructor { owned: Vec::new() },
            Role::Admin => RoleMemory::Admin,
        }
    }

    /// Enrolled course set (students only)
    pub fn enrolled(&self) -> Option<&HashSet<i64>> {
        match self {
            RoleMemory::Student { enrolled } => Some(enrolled),
            _ => None,
        }
    }

    pub fn enrolled_mut(&mut self) -> Option<&mut HashSet<i64>> {
        match self {
            RoleMemory::Student { enrolled } => Some(enrolled),
            _ => None,
        }
    }

    /// Owned course list (instructors only)
    pub fn owned(&self) -> Option<&Vec<i64>> {
        match self {
            RoleMemory::Instructor { owned } => Some(owned),
            _ => None,
        }
    }

    pub fn owned_mut(&mut self) -> Option<&mut Vec<i64>> {
        match self {
            RoleMemory::Instructor { owned } => Some(owned),
            _ => None,
        }
    }
}

/// Cross-task view of one actor: liveness flag and activity timestamp
#[derive(Debug)]
pub struct ActorVitals {
    active: AtomicBool,
    pub activity: Arc<ActivityTracker>,
}

impl ActorVitals {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            activity: Arc::new(ActivityTracker::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Ask the owning task to stop at its next iteration boundary
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Relaxed);
    }
}

impl Default for ActorVitals {
    fn default() -> Self {
        Self::new()
    }
}

/// One simulated user
#[derive(Debug)]
pub struct Actor {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Backend-assigned numeric id, resolved after login
    pub id: Option<i64>,
    /// Bearer token, present only after a successful login
    pub token: Option<String>,
    pub memory: RoleMemory,
    pub vitals: Arc<ActorVitals>,
    /// Per-actor RNG; `StdRng` so behavior loops stay `Send`
    pub rng: StdRng,
    client: ApiClient,
}

impl Actor {
    /// Build an actor bound to the shared API client
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
        api: &ApiClient,
    ) -> Self {
        let vitals = Arc::new(ActorVitals::new());
        let client = api.for_actor(Arc::clone(&vitals.activity));

        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role,
            id: None,
            token: None,
            memory: RoleMemory::for_role(role),
            vitals,
            rng: StdRng::from_entropy(),
            client,
        }
    }

    /// Replace the RNG with a seeded one, for deterministic draws
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// `"Student 3 (student)"`, matching the backend log convention
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.role)
    }

    /// Whether this actor has a usable token
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Create the account on the backend
    ///
    /// A 2xx with a body the backend never bothered to make JSON still
    /// counts as registered; only transport and HTTP failures reject.
    pub async fn register(&mut self) -> Result<()> {
        let body = json!({
            "name": self.name,
            "email": self.email,
            "password": self.password,
            "role": self.role.as_str(),
        });

        match self
            .client
            .call(Method::POST, "users/register", Some(&body), None)
            .await
        {
            Ok(_) => {
                info!("Registered user: {}", self.label());
                Ok(())
            }
            Err(SimError::Decode(detail)) => {
                warn!(
                    "Registration returned a non-JSON body for {}: {}",
                    self.label(),
                    detail
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Authenticate and store the bearer token
    pub async fn login(&mut self) -> Result<()> {
        let body = json!({
            "email": self.email,
            "password": self.password,
        });

        let payload = self
            .client
            .call(Method::POST, "users/login", Some(&body), None)
            .await?;

        let token = payload
            .json()
            .and_then(payload::token_of)
            .ok_or_else(|| SimError::Decode("login response carried no token".to_string()))?;

        self.token = Some(token);
        info!("User logged in: {}", self.label());
        Ok(())
    }

    /// Resolve the backend-assigned id and prime role memory
    ///
    /// Instructors reload the courses they already own, students their
    /// existing enrollments, so re-runs against a seeded backend do not
    /// start from empty memory. Priming failures are non-fatal.
    pub async fn resolve_id(&mut self) -> Result<i64> {
        if let Some(id) = self.id {
            return Ok(id);
        }

        let path = format!("users/email?email={}", self.email);
        let payload = self.call(Method::GET, &path, None).await?;
        let id = payload
            .json()
            .and_then(|v| payload::int_field(v, "id"))
            .ok_or_else(|| SimError::Decode("user lookup carried no id".to_string()))?;

        self.id = Some(id);
        debug!("Resolved id {} for {}", id, self.label());

        if let Err(e) = self.prime_memory(id).await {
            warn!("Failed to prime memory for {}: {}", self.label(), e);
        }

        Ok(id)
    }

    /// Reload role memory from backend state
    async fn prime_memory(&mut self, id: i64) -> Result<()> {
        match self.role {
            Role::Instructor => {
                if self.memory.owned().is_some_and(|owned| !owned.is_empty()) {
                    return Ok(());
                }
                let path = format!("courses/instructor/{}", id);
                let payload = self.call(Method::GET, &path, None).await?;
                if let (Some(value), Some(owned)) = (payload.json(), self.memory.owned_mut()) {
                    for course in payload::items(value) {
                        if let Some(course_id) = payload::id_of(course) {
                            owned.push(course_id);
                        }
                    }
                }
            }
            Role::Student => {
                let path = format!("enrollments/user/{}", id);
                let payload = self.call(Method::GET, &path, None).await?;
                if let (Some(value), Some(enrolled)) =
                    (payload.json(), self.memory.enrolled_mut())
                {
                    for enrollment in payload::items(value) {
                        if let Some(course_id) = payload::int_field(enrollment, "course_id") {
                            enrolled.insert(course_id);
                        }
                    }
                }
            }
            Role::Admin => {}
        }
        Ok(())
    }

    /// Token-authenticated API call
    ///
    /// Absence of a token is a local precondition failure; no request is
    /// issued.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Payload> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| SimError::Auth(self.email.clone()))?;
        self.client.call(method, path, body, Some(token)).await
    }
}
