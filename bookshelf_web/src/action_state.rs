use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use bookshelf_backend::api::BookId;

use crate::api::{ActionResponse, SessionToken};

pub const DEFAULT_RESET_AFTER: Duration = Duration::from_secs(3);

/// Add, update and remove controls of every session, keyed by book
pub type BookControls = ActionStates<(SessionToken, BookId)>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "details", rename_all = "lowercase")]
/// Feedback state of a control triggering an action
pub enum ActionState {
    #[default]
    Idle,
    Loading,
    Success(String),
    Error(String),
}

#[derive(Default)]
struct Slot {
    state: ActionState,
    generation: u64,
}

/// States of a set of controls, keyed e.g. by book id.
/// A finished action goes back to idle after `reset_after`, unless another run
/// started on the same key in the meantime
pub struct ActionStates<K> {
    slots: Arc<Mutex<HashMap<K, Slot>>>,
    reset_after: Duration,
}

impl<K> Clone for ActionStates<K> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            reset_after: self.reset_after,
        }
    }
}

impl<K> Default for ActionStates<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_RESET_AFTER)
    }
}

impl<K> ActionStates<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(reset_after: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            reset_after,
        }
    }

    pub fn state(&self, key: &K) -> ActionState {
        self.slots
            .lock()
            .get(key)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    /// Runs `action` for the control `key`, tracking its state.
    /// Must be called within a tokio runtime
    pub async fn run<T, Fut>(&self, key: K, action: Fut) -> ActionResponse<T>
    where
        Fut: Future<Output = ActionResponse<T>>,
    {
        let generation = self.transition(&key, None, ActionState::Loading);

        let response = action.await;
        let finished = match &response {
            ActionResponse::Error { details, .. } => ActionState::Error(details.clone()),
            ActionResponse::Success { details, .. } | ActionResponse::Info { details, .. } => {
                ActionState::Success(details.clone())
            }
        };
        self.transition(&key, Some(generation), finished);
        self.schedule_reset(key, generation);

        response
    }

    /// Sets the state of `key`. With `expected` set, only when no other run started since.
    /// Returns the generation of the slot
    fn transition(&self, key: &K, expected: Option<u64>, state: ActionState) -> u64 {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_default();
        match expected {
            None => {
                slot.generation += 1;
                slot.state = state;
            }
            Some(generation) if generation == slot.generation => slot.state = state,
            Some(_) => {}
        }
        slot.generation
    }

    /// Back to idle drops the slot, an absent key reads as Idle
    fn schedule_reset(&self, key: K, generation: u64) {
        let states = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(states.reset_after).await;
            let mut slots = states.slots.lock();
            if slots.get(&key).is_some_and(|slot| slot.generation == generation) {
                slots.remove(&key);
            }
        });
    }

    /// Number of controls not idle
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

#[cfg(test)]
mod action_state_tests {
    use super::*;

    const JUST_AFTER_RESET: Duration = Duration::from_millis(3001);

    #[tokio::test(start_paused = true)]
    async fn success_goes_back_to_idle() {
        // Steps:
        // 1. Run a successful action, state is Loading while it runs
        // 2. State is Success right after
        // 3. State is Idle once the reset timeout passed
        let states: ActionStates<&str> = ActionStates::default();
        assert_eq!(states.state(&"add"), ActionState::Idle);

        let observer = states.clone();
        let response: ActionResponse = states
            .run("add", async move {
                assert_eq!(observer.state(&"add"), ActionState::Loading);
                ActionResponse::done("Book successfully added!")
            })
            .await;

        assert!(response.is_success());
        assert_eq!(
            states.state(&"add"),
            ActionState::Success("Book successfully added!".to_string())
        );

        tokio::time::sleep(JUST_AFTER_RESET).await;
        assert_eq!(states.state(&"add"), ActionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn error_goes_back_to_idle() {
        let states: ActionStates<String> = ActionStates::default();

        let _: ActionResponse = states
            .run("7".to_string(), async {
                ActionResponse::error("This book was not found.", "NOT_FOUND")
            })
            .await;
        assert_eq!(
            states.state(&"7".to_string()),
            ActionState::Error("This book was not found.".to_string())
        );
        assert_eq!(states.state(&"8".to_string()), ActionState::Idle);

        tokio::time::sleep(JUST_AFTER_RESET).await;
        assert_eq!(states.state(&"7".to_string()), ActionState::Idle);
        assert_eq!(states.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_reset_does_not_clobber_newer_run() {
        // Steps:
        // 1. First run finishes at t=0, its reset is due at t=3
        // 2. Second run starts at t=2 and takes 2 seconds
        // 3. At t=3 the state is still Loading
        // 4. At t=4 the second run succeeded, at t=7 the state is Idle
        let states: ActionStates<&str> = ActionStates::default();
        let _: ActionResponse = states
            .run("remove", async { ActionResponse::done("first") })
            .await;

        tokio::time::sleep(Duration::from_secs(2)).await;

        let second_run = {
            let states = states.clone();
            tokio::spawn(async move {
                let _: ActionResponse = states
                    .run("remove", async {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        ActionResponse::done("second")
                    })
                    .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(states.state(&"remove"), ActionState::Loading);

        second_run.await.expect("Second run panicked");
        assert_eq!(
            states.state(&"remove"),
            ActionState::Success("second".to_string())
        );

        tokio::time::sleep(JUST_AFTER_RESET).await;
        assert_eq!(states.state(&"remove"), ActionState::Idle);
        assert_eq!(states.active(), 0);
    }

    #[test]
    fn serialized_for_polling_clients() {
        assert_eq!(
            serde_json::to_value(ActionState::Idle).unwrap(),
            serde_json::json!({ "state": "idle" })
        );
        assert_eq!(
            serde_json::to_value(ActionState::Error("Book not found".to_string())).unwrap(),
            serde_json::json!({ "state": "error", "details": "Book not found" })
        );
    }
}
