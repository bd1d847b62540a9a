use super::{dim_label, page_box, spawn_local, RenderGuard};
use crate::api::models::View;
use crate::state::{AppState, SMS_CHAR_HINT};
use crate::store::Store;
use gtk4 as gtk;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

const NO_GROUP: &str = "-- اختر مجموعة اتصال --";

/// The home view: pick a group, write the message, launch the send.
pub struct ComposePage {
    root: gtk::ScrolledWindow,
    groups: gtk::DropDown,
    group_ids: Rc<RefCell<Vec<String>>>,
    first_group_btn: gtk::Button,
    draft_btn: gtk::Button,
    buffer: gtk::TextBuffer,
    counter: gtk::Label,
    send_btn: gtk::Button,
}

impl ComposePage {
    pub fn new(store: &Store, guard: &RenderGuard) -> Self {
        let root = page_box();

        root.append(&dim_label("اختيار المستلمين"));
        let groups = gtk::DropDown::from_strings(&[NO_GROUP]);
        groups.set_hexpand(true);
        root.append(&groups);

        let first_group_btn = gtk::Button::with_label("+ أنشئ مجموعتك الأولى الآن");
        first_group_btn.add_css_class("flat");
        root.append(&first_group_btn);

        let message_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let message_label = dim_label("رسالتك");
        message_label.set_hexpand(true);
        message_row.append(&message_label);
        let draft_btn = gtk::Button::with_label("✨ تحسين المحتوى");
        draft_btn.add_css_class("pill");
        message_row.append(&draft_btn);
        root.append(&message_row);

        let text = gtk::TextView::new();
        text.set_wrap_mode(gtk::WrapMode::WordChar);
        text.set_height_request(120);
        text.add_css_class("card");
        let buffer = text.buffer();
        root.append(&text);

        let counter = gtk::Label::new(Some(&format!("0 / {SMS_CHAR_HINT}")));
        counter.add_css_class("caption");
        counter.set_halign(gtk::Align::End);
        root.append(&counter);

        let send_btn = gtk::Button::with_label("إطلاق الرسائل 🚀");
        send_btn.add_css_class("suggested-action");
        send_btn.add_css_class("pill");
        root.append(&send_btn);

        let page = Self {
            root: gtk::ScrolledWindow::builder().vexpand(true).child(&root).build(),
            groups,
            group_ids: Rc::new(RefCell::new(Vec::new())),
            first_group_btn,
            draft_btn,
            buffer,
            counter,
            send_btn,
        };
        page.connect(store, guard);
        page
    }

    fn connect(&self, store: &Store, guard: &RenderGuard) {
        {
            let store = store.clone();
            let guard = guard.clone();
            let ids = self.group_ids.clone();
            self.groups.connect_selected_notify(move |dd| {
                if guard.get() {
                    return;
                }
                // Index 0 is the "no group" placeholder.
                let id = match dd.selected() {
                    0 | gtk::INVALID_LIST_POSITION => String::new(),
                    n => ids.borrow().get(n as usize - 1).cloned().unwrap_or_default(),
                };
                store.select_group(&id);
            });
        }
        {
            let store = store.clone();
            self.first_group_btn
                .connect_clicked(move |_| store.navigate(View::CreateGroup));
        }
        {
            let store = store.clone();
            let guard = guard.clone();
            self.buffer.connect_changed(move |buf| {
                if guard.get() {
                    return;
                }
                let (start, end) = buf.bounds();
                store.set_message(&buf.text(&start, &end, false));
            });
        }
        {
            let store = store.clone();
            self.draft_btn.connect_clicked(move |_| {
                let store = store.clone();
                spawn_local(async move { store.improve_draft().await });
            });
        }
        {
            let store = store.clone();
            self.send_btn.connect_clicked(move |_| store.open_confirm());
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn render(&self, state: &AppState) {
        let ids: Vec<String> = state.groups.iter().map(|g| g.id.clone()).collect();
        if *self.group_ids.borrow() != ids {
            let mut labels = vec![NO_GROUP.to_string()];
            labels.extend(
                state
                    .groups
                    .iter()
                    .map(|g| format!("{} ({} عضو)", g.name, g.contacts.len())),
            );
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            self.groups.set_model(Some(&gtk::StringList::new(&refs)));
            *self.group_ids.borrow_mut() = ids;
        }
        let position = self
            .group_ids
            .borrow()
            .iter()
            .position(|id| *id == state.selected_group_id)
            .map_or(0, |i| i as u32 + 1);
        if self.groups.selected() != position {
            self.groups.set_selected(position);
        }
        self.first_group_btn.set_visible(state.groups.is_empty());

        let (start, end) = self.buffer.bounds();
        if self.buffer.text(&start, &end, false) != state.message {
            self.buffer.set_text(&state.message);
        }

        self.draft_btn.set_label(if state.is_generating {
            "جاري التحسين..."
        } else {
            "✨ تحسين المحتوى"
        });
        self.draft_btn
            .set_sensitive(!state.is_generating && !state.message.trim().is_empty());

        self.counter
            .set_label(&format!("{} / {SMS_CHAR_HINT}", state.message_length()));
        if state.message_over_limit() {
            self.counter.add_css_class("error");
        } else {
            self.counter.remove_css_class("error");
        }

        self.send_btn.set_label(if state.is_sending {
            "جاري الإرسال الجماعي..."
        } else {
            "إطلاق الرسائل 🚀"
        });
        self.send_btn.set_sensitive(state.can_send());
    }
}
