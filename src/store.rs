use crate::api::contacts::{cloud_backup, format_picked, ContactSync, PickerRequest, FALLBACK_DELAY};
use crate::api::draft::{draft_outcome, DraftGenerator};
use crate::api::models::View;
use crate::api::sender::simulate_delivery;
use crate::state::{AppState, Effect};
use crate::storage::Persistence;
use crate::utils::{Clock, Delay, RandomSource, Timers};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

type Listener = Rc<dyn Fn(&AppState)>;

/// Everything the store talks to besides its own state.
pub struct Collaborators {
    pub contacts: ContactSync,
    pub drafter: Rc<dyn DraftGenerator>,
    pub delay: Rc<dyn Delay>,
    pub random: Rc<dyn RandomSource>,
    pub timers: Rc<dyn Timers>,
    pub clock: Rc<dyn Clock>,
}

struct Inner {
    state: RefCell<AppState>,
    listeners: RefCell<Vec<Listener>>,
    persistence: Persistence,
    deps: Collaborators,
}

/// Shared handle to the application state. Cloning is cheap; all clones see
/// the same state. Not thread-safe: everything runs on one event loop.
#[derive(Clone)]
pub struct Store {
    inner: Rc<Inner>,
}

impl Store {
    /// Loads persisted groups and contacts and starts on the home view.
    pub fn new(persistence: Persistence, deps: Collaborators) -> Self {
        let snapshot = persistence.load();
        debug!(
            "loaded {} groups, {} contacts",
            snapshot.groups.as_ref().map_or(0, Vec::len),
            snapshot.contacts.as_ref().map_or(0, Vec::len)
        );
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(AppState::from_snapshot(snapshot)),
                listeners: RefCell::new(Vec::new()),
                persistence,
                deps,
            }),
        }
    }

    /// Calls `listener` with the new state after every change.
    pub fn subscribe(&self, listener: impl Fn(&AppState) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn snapshot(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Applies `f` and notifies listeners. The state is not borrowed while
    /// listeners run, so they may call back into the store.
    fn mutate<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let (out, snapshot) = {
            let mut state = self.inner.state.borrow_mut();
            let out = f(&mut state);
            (out, state.clone())
        };
        let listeners: Vec<Listener> = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(&snapshot);
        }
        out
    }

    fn dispatch(&self, f: impl FnOnce(&mut AppState) -> Vec<Effect>) {
        let effects = self.mutate(f);
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::PersistGroups(groups) => {
                if let Err(e) = self.inner.persistence.save_groups(&groups) {
                    warn!("failed to persist groups: {e}");
                }
            }
            Effect::PersistContacts(contacts) => {
                if let Err(e) = self.inner.persistence.save_contacts(&contacts) {
                    warn!("failed to persist contacts: {e}");
                }
            }
            Effect::ExpireToast { id, after } => {
                let store = self.clone();
                self.inner.deps.timers.schedule(
                    after,
                    Box::new(move || {
                        store.mutate(|s| s.expire_toast(id));
                    }),
                );
            }
        }
    }

    pub fn navigate(&self, view: View) {
        self.mutate(|s| s.navigate(view));
    }

    pub fn select_group(&self, id: &str) {
        self.mutate(|s| s.select_group(id));
    }

    pub fn set_message(&self, text: &str) {
        self.mutate(|s| s.set_message(text));
    }

    pub fn set_new_group_name(&self, name: &str) {
        self.mutate(|s| s.set_new_group_name(name));
    }

    pub fn set_search_term(&self, term: &str) {
        self.mutate(|s| s.set_search_term(term));
    }

    pub fn toggle_contact_selection(&self, id: &str) {
        self.mutate(|s| s.toggle_contact_selection(id));
    }

    pub fn toggle_select_all(&self) {
        self.mutate(|s| s.toggle_select_all());
    }

    pub fn create_group(&self, name: &str, member_ids: &[String]) {
        let now = self.inner.deps.clock.now_millis();
        self.dispatch(|s| s.create_group(name, member_ids, now));
    }

    pub fn create_group_from_form(&self) {
        let now = self.inner.deps.clock.now_millis();
        self.dispatch(|s| s.create_group_from_form(now));
    }

    pub fn delete_group(&self, id: &str) {
        self.dispatch(|s| s.delete_group(id));
    }

    pub fn open_confirm(&self) {
        self.mutate(|s| s.open_confirm());
    }

    pub fn dismiss_confirm(&self) {
        self.mutate(|s| s.dismiss_confirm());
    }

    /// Imports contacts from the configured picker, or from the cloud backup
    /// after a fixed delay. The loading flag stays up for the whole run.
    pub async fn sync_contacts(&self) {
        if !self.mutate(|s| s.begin_sync()) {
            debug!("contact sync already running");
            return;
        }
        match &self.inner.deps.contacts {
            ContactSync::Picker(picker) => match picker.select(&PickerRequest::default()).await {
                Ok(raw) => {
                    info!("picker returned {} contacts", raw.len());
                    let picked = format_picked(&raw, self.inner.deps.clock.now_millis());
                    self.dispatch(|s| s.import_picked(picked));
                }
                Err(e) => {
                    warn!("Sync error: {e}");
                    self.dispatch(|s| s.sync_failed());
                }
            },
            ContactSync::CloudFallback => {
                self.inner.deps.delay.wait(FALLBACK_DELAY).await;
                let backup = cloud_backup(self.inner.deps.clock.now_millis());
                self.dispatch(|s| s.import_cloud_backup(backup));
            }
        }
        self.mutate(|s| s.end_sync());
    }

    /// Runs one simulated bulk send to the selected group. Listeners see the
    /// result list grow one entry at a time.
    pub async fn send_bulk(&self) {
        let Some(contacts) = self.mutate(|s| s.begin_send()) else {
            debug!("send ignored: nothing to send or a run is active");
            return;
        };
        info!("sending to {} contacts", contacts.len());
        let deps = &self.inner.deps;
        simulate_delivery(&contacts, deps.delay.as_ref(), deps.random.as_ref(), |results| {
            self.mutate(|s| s.publish_results(results));
        })
        .await;
        self.dispatch(|s| s.finish_send());
    }

    /// Rewrites the message with the draft assistant. On failure the message
    /// is kept and an error toast explains why.
    pub async fn improve_draft(&self) {
        let Some(prompt) = self.mutate(|s| s.begin_draft()) else {
            return;
        };
        let outcome = draft_outcome(self.inner.deps.drafter.as_ref(), &prompt).await;
        self.dispatch(|s| s.finish_draft(outcome));
    }
}
