//! The application's state and every transition on it.
//!
//! Operations are plain methods on [`AppState`]. Anything that has to
//! happen outside the state (persisting a collection, expiring a toast) is
//! returned as an [`Effect`] for the caller to carry out.

use crate::api::draft::DraftFailure;
use crate::api::models::{initial_contacts, Contact, ContactSource, Group, SendStatus, Toast, ToastKind, View};
use crate::storage::Snapshot;
use std::time::Duration;

/// Soft limit shown next to the message box. Never enforced.
pub const SMS_CHAR_HINT: usize = 160;

pub const TOAST_DURATION: Duration = Duration::from_millis(3000);

pub mod messages {
    pub const GROUP_FORM_INCOMPLETE: &str = "يرجى إدخال اسم المجموعة واختيار جهة واحدة على الأقل";
    pub const GROUP_CREATED: &str = "تم إنشاء المجموعة بنجاح";
    pub const GROUP_DELETED: &str = "تم حذف المجموعة";
    pub const CLOUD_SYNCED: &str = "تمت المزامنة مع النسخة السحابية بنجاح";
    pub const ALREADY_SYNCED: &str = "جهات الاتصال محدثة بالفعل";
    pub const SYNC_FAILED: &str = "حدث خطأ أثناء المزامنة";
    pub const SEND_COMPLETE: &str = "اكتملت عملية الإرسال الجماعي";
    pub const DRAFT_IMPROVED: &str = "تم تحسين الرسالة بالذكاء الاصطناعي";

    pub fn contacts_imported(count: usize) -> String {
        format!("تم استيراد {count} جهة اتصال بنجاح")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PersistGroups(Vec<Group>),
    PersistContacts(Vec<Contact>),
    ExpireToast { id: u64, after: Duration },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub groups: Vec<Group>,
    pub contacts: Vec<Contact>,
    /// Target of the next send. May name a group that no longer exists.
    pub selected_group_id: String,
    pub message: String,
    pub is_sending: bool,
    pub send_results: Vec<SendStatus>,
    pub is_generating: bool,
    pub show_confirm_modal: bool,
    pub is_loading_contacts: bool,
    pub toast: Option<Toast>,
    pub search_term: String,
    pub new_group_name: String,
    pub selected_contacts: Vec<String>,
    next_toast_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default())
    }
}

/// Contacts whose name contains `term` ignoring case, or whose phone number
/// contains it verbatim. Order is preserved.
pub fn filter_contacts<'a>(contacts: &'a [Contact], term: &str) -> Vec<&'a Contact> {
    let needle = term.to_lowercase();
    contacts
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle) || c.phone_number.contains(term))
        .collect()
}

impl AppState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            view: View::Home,
            groups: snapshot.groups.unwrap_or_default(),
            contacts: snapshot.contacts.unwrap_or_else(initial_contacts),
            selected_group_id: String::new(),
            message: String::new(),
            is_sending: false,
            send_results: Vec::new(),
            is_generating: false,
            show_confirm_modal: false,
            is_loading_contacts: false,
            toast: None,
            search_term: String::new(),
            new_group_name: String::new(),
            selected_contacts: Vec::new(),
            next_toast_id: 0,
        }
    }

    // Toasts

    /// Replaces any live toast and asks for this one to expire later.
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) -> Effect {
        self.next_toast_id += 1;
        let id = self.next_toast_id;
        self.toast = Some(Toast { id, message: message.into(), kind });
        Effect::ExpireToast { id, after: TOAST_DURATION }
    }

    /// Clears the toast only if `id` is still the one showing.
    pub fn expire_toast(&mut self, id: u64) -> bool {
        if self.toast.as_ref().is_some_and(|t| t.id == id) {
            self.toast = None;
            true
        } else {
            false
        }
    }

    // Navigation and simple fields

    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    pub fn select_group(&mut self, id: &str) {
        self.selected_group_id = id.to_string();
    }

    pub fn set_message(&mut self, text: &str) {
        self.message = text.to_string();
    }

    pub fn set_new_group_name(&mut self, name: &str) {
        self.new_group_name = name.to_string();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn message_length(&self) -> usize {
        self.message.chars().count()
    }

    pub fn message_over_limit(&self) -> bool {
        self.message_length() > SMS_CHAR_HINT
    }

    // Contact selection

    pub fn filtered_contacts(&self) -> Vec<&Contact> {
        filter_contacts(&self.contacts, &self.search_term)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_contacts.iter().any(|s| s == id)
    }

    pub fn toggle_contact_selection(&mut self, id: &str) {
        if let Some(pos) = self.selected_contacts.iter().position(|s| s == id) {
            self.selected_contacts.remove(pos);
        } else {
            self.selected_contacts.push(id.to_string());
        }
    }

    pub fn all_filtered_selected(&self) -> bool {
        self.selected_contacts.len() == self.filtered_contacts().len()
    }

    /// Selects exactly the filtered contacts, or clears the selection when
    /// its size already matches the filtered count.
    pub fn toggle_select_all(&mut self) {
        if self.all_filtered_selected() {
            self.selected_contacts.clear();
        } else {
            self.selected_contacts = self.filtered_contacts().iter().map(|c| c.id.clone()).collect();
        }
    }

    // Groups

    pub fn selected_group(&self) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == self.selected_group_id)
    }

    pub fn can_create_group(&self) -> bool {
        !self.new_group_name.trim().is_empty() && !self.selected_contacts.is_empty()
    }

    /// Snapshots the contacts named in `member_ids` (in contact-list order)
    /// into a new group and moves to the groups view. A blank name or an
    /// empty selection only raises an error toast.
    pub fn create_group(&mut self, name: &str, member_ids: &[String], now_millis: i64) -> Vec<Effect> {
        if name.trim().is_empty() || member_ids.is_empty() {
            return vec![self.show_toast(messages::GROUP_FORM_INCOMPLETE, ToastKind::Error)];
        }

        let mut stamp = now_millis;
        while self.groups.iter().any(|g| g.id == stamp.to_string()) {
            stamp += 1;
        }
        let group = Group {
            id: stamp.to_string(),
            name: name.to_string(),
            contacts: self
                .contacts
                .iter()
                .filter(|c| member_ids.contains(&c.id))
                .cloned()
                .collect(),
            created_at: now_millis,
        };
        self.groups.push(group);

        self.new_group_name.clear();
        self.selected_contacts.clear();
        self.search_term.clear();
        self.view = View::Groups;
        vec![
            Effect::PersistGroups(self.groups.clone()),
            self.show_toast(messages::GROUP_CREATED, ToastKind::Success),
        ]
    }

    /// Uses the create-group form's current name and selection.
    pub fn create_group_from_form(&mut self, now_millis: i64) -> Vec<Effect> {
        let name = self.new_group_name.clone();
        let members = self.selected_contacts.clone();
        self.create_group(&name, &members, now_millis)
    }

    pub fn delete_group(&mut self, id: &str) -> Vec<Effect> {
        self.groups.retain(|g| g.id != id);
        if self.selected_group_id == id {
            self.selected_group_id.clear();
        }
        vec![
            Effect::PersistGroups(self.groups.clone()),
            self.show_toast(messages::GROUP_DELETED, ToastKind::Info),
        ]
    }

    // Sending

    pub fn can_send(&self) -> bool {
        !self.selected_group_id.is_empty() && !self.message.trim().is_empty() && !self.is_sending
    }

    pub fn open_confirm(&mut self) {
        if self.can_send() {
            self.show_confirm_modal = true;
        }
    }

    pub fn dismiss_confirm(&mut self) {
        self.show_confirm_modal = false;
    }

    /// Starts a send run and returns the contacts to deliver to, or `None`
    /// when there is no target group, no message, or a run in progress.
    pub fn begin_send(&mut self) -> Option<Vec<Contact>> {
        if self.is_sending || self.message.trim().is_empty() {
            return None;
        }
        let contacts = self.selected_group()?.contacts.clone();
        self.show_confirm_modal = false;
        self.is_sending = true;
        self.send_results.clear();
        Some(contacts)
    }

    pub fn publish_results(&mut self, results: &[SendStatus]) {
        self.send_results = results.to_vec();
    }

    pub fn finish_send(&mut self) -> Vec<Effect> {
        self.is_sending = false;
        self.view = View::History;
        vec![self.show_toast(messages::SEND_COMPLETE, ToastKind::Success)]
    }

    // Contact sync

    /// Raises the loading flag. Returns false if a sync is already running.
    pub fn begin_sync(&mut self) -> bool {
        if self.is_loading_contacts {
            return false;
        }
        self.is_loading_contacts = true;
        true
    }

    pub fn end_sync(&mut self) {
        self.is_loading_contacts = false;
    }

    pub fn has_cloud_contacts(&self) -> bool {
        self.contacts.iter().any(|c| c.source == ContactSource::Cloud)
    }

    pub fn import_picked(&mut self, picked: Vec<Contact>) -> Vec<Effect> {
        if picked.is_empty() {
            return Vec::new();
        }
        let count = picked.len();
        self.contacts.extend(picked);
        vec![
            Effect::PersistContacts(self.contacts.clone()),
            self.show_toast(messages::contacts_imported(count), ToastKind::Success),
        ]
    }

    /// Appends the cloud backup unless a cloud contact is already present.
    pub fn import_cloud_backup(&mut self, backup: Vec<Contact>) -> Vec<Effect> {
        if self.has_cloud_contacts() {
            return vec![self.show_toast(messages::ALREADY_SYNCED, ToastKind::Info)];
        }
        self.contacts.extend(backup);
        vec![
            Effect::PersistContacts(self.contacts.clone()),
            self.show_toast(messages::CLOUD_SYNCED, ToastKind::Success),
        ]
    }

    pub fn sync_failed(&mut self) -> Vec<Effect> {
        vec![self.show_toast(messages::SYNC_FAILED, ToastKind::Error)]
    }

    // Drafting

    /// Returns the prompt to send, or `None` for a blank message or a
    /// request already in flight.
    pub fn begin_draft(&mut self) -> Option<String> {
        if self.is_generating || self.message.trim().is_empty() {
            return None;
        }
        self.is_generating = true;
        Some(self.message.clone())
    }

    /// A draft replaces the message. A failure leaves it as it was.
    pub fn finish_draft(&mut self, outcome: Result<String, DraftFailure>) -> Vec<Effect> {
        self.is_generating = false;
        match outcome {
            Ok(draft) => {
                self.message = draft;
                vec![self.show_toast(messages::DRAFT_IMPROVED, ToastKind::Info)]
            }
            Err(failure) => vec![self.show_toast(failure.message(), ToastKind::Error)],
        }
    }
}
