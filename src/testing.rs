//! Deterministic stand-ins for the store's collaborators.

use crate::api::contacts::{ContactPicker, PickerRequest, RawContact, SyncError};
use crate::api::draft::{DraftError, DraftGenerator};
use crate::utils::{Clock, Delay, RandomSource, Timers};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// Returns immediately and remembers every requested wait.
#[derive(Default)]
pub struct RecordingDelay {
    waits: RefCell<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

/// Hands out the given draws in order, then 0.5 forever.
pub struct FixedRandom(RefCell<VecDeque<f64>>);

impl FixedRandom {
    pub fn new(draws: Vec<f64>) -> Self {
        Self(RefCell::new(draws.into()))
    }
}

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0.borrow_mut().pop_front().unwrap_or(0.5)
    }
}

/// Advances by one millisecond per reading.
pub struct StepClock(Cell<i64>);

impl StepClock {
    pub fn starting_at(millis: i64) -> Self {
        Self(Cell::new(millis))
    }
}

impl Clock for StepClock {
    fn now_millis(&self) -> i64 {
        let now = self.0.get();
        self.0.set(now + 1);
        now
    }
}

/// Holds scheduled tasks until the test fires them.
#[derive(Default)]
pub struct ManualTimers {
    pending: RefCell<Vec<(Duration, Box<dyn FnOnce()>)>>,
}

impl ManualTimers {
    pub fn pending(&self) -> Vec<Duration> {
        self.pending.borrow().iter().map(|(d, _)| *d).collect()
    }

    /// Runs the oldest pending task, if any.
    pub fn fire_next(&self) -> bool {
        let task = {
            let mut pending = self.pending.borrow_mut();
            if pending.is_empty() {
                return false;
            }
            pending.remove(0).1
        };
        task();
        true
    }
}

impl Timers for ManualTimers {
    fn schedule(&self, after: Duration, task: Box<dyn FnOnce()>) {
        self.pending.borrow_mut().push((after, task));
    }
}

pub struct FakePicker {
    reply: RefCell<Option<Result<Vec<RawContact>, SyncError>>>,
}

impl FakePicker {
    pub fn returning(contacts: Vec<RawContact>) -> Self {
        Self { reply: RefCell::new(Some(Ok(contacts))) }
    }

    pub fn failing(err: SyncError) -> Self {
        Self { reply: RefCell::new(Some(Err(err))) }
    }
}

#[async_trait(?Send)]
impl ContactPicker for FakePicker {
    async fn select(&self, _request: &PickerRequest) -> Result<Vec<RawContact>, SyncError> {
        self.reply.borrow_mut().take().unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub struct FakeDrafter {
    reply: Result<String, fn() -> DraftError>,
    prompts: RefCell<Vec<String>>,
}

impl FakeDrafter {
    pub fn replying(text: &str) -> Self {
        Self { reply: Ok(text.to_string()), prompts: RefCell::default() }
    }

    pub fn failing(err: fn() -> DraftError) -> Self {
        Self { reply: Err(err), prompts: RefCell::default() }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

#[async_trait(?Send)]
impl DraftGenerator for FakeDrafter {
    async fn generate(&self, prompt: &str) -> Result<String, DraftError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}
