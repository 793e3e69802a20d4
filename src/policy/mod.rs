//! Per-role action policies
//!
//! Each role carries a fixed table of weighted actions. One policy
//! invocation performs exactly one weighted draw and runs that action to
//! completion: a short sequence of API calls plus a local state update.
//! Actions are tagged enum values dispatched through a match, not dynamic
//! callable lists.
//!
//! Fallback convention: an action that needs a non-empty owned/enrolled
//! collection and finds it empty performs the collection-populating action
//! instead (course browsing for students, course creation for instructors)
//! and returns.

pub mod admin;
pub mod instructor;
pub mod student;

pub use admin::AdminAction;
pub use instructor::InstructorAction;
pub use student::StudentAction;

use crate::actor::{Actor, Role};
use crate::synth::ContentLibrary;
use crate::utils::errors::Result;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Draw one entry from a weighted table
///
/// Weights are positive and need not sum to 1; `WeightedIndex` normalizes
/// at selection time.
pub fn weighted_pick<T: Copy, R: Rng>(rng: &mut R, table: &[(T, f64)]) -> T {
    let dist = WeightedIndex::new(table.iter().map(|(_, weight)| *weight))
        .expect("action tables carry positive weights");
    table[dist.sample(rng)].0
}

/// Draw and run one action for this actor's role
pub async fn perform(actor: &mut Actor, library: &ContentLibrary) -> Result<()> {
    match actor.role {
        Role::Student => {
            let action = StudentAction::draw(&mut actor.rng);
            student::run(actor, action).await
        }
        Role::Instructor => {
            let action = InstructorAction::draw(&mut actor.rng);
            instructor::run(actor, library, action).await
        }
        Role::Admin => {
            let action = AdminAction::draw(&mut actor.rng);
            admin::run(actor, action).await
        }
    }
}
