use super::{clear_list, dim_label, heading, page_box};
use crate::api::models::{Group, View};
use crate::state::AppState;
use crate::store::Store;
use gtk4 as gtk;
use gtk4::prelude::*;
use std::cell::RefCell;

pub struct GroupsPage {
    root: gtk::ScrolledWindow,
    summary: gtk::Label,
    empty: gtk::Box,
    list: gtk::ListBox,
    shown: RefCell<Vec<String>>,
    store: Store,
}

fn created_label(group: &Group) -> String {
    let date = glib::DateTime::from_unix_local(group.created_at / 1000)
        .and_then(|d| d.format("%x"))
        .map(|s| s.to_string())
        .unwrap_or_default();
    format!("أنشئت في {date}")
}

impl GroupsPage {
    pub fn new(store: &Store) -> Self {
        let root = page_box();

        let header = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let titles = gtk::Box::new(gtk::Orientation::Vertical, 2);
        titles.set_hexpand(true);
        titles.append(&heading("مجموعاتك"));
        let summary = dim_label("");
        titles.append(&summary);
        header.append(&titles);
        let add_btn = gtk::Button::with_label("+");
        add_btn.add_css_class("circular");
        add_btn.add_css_class("suggested-action");
        header.append(&add_btn);
        root.append(&header);

        let empty = gtk::Box::new(gtk::Orientation::Vertical, 8);
        empty.append(&gtk::Label::new(Some("📁")));
        empty.append(&dim_label("لا توجد قوائم إرسال حالياً."));
        let start_btn = gtk::Button::with_label("ابدأ بإضافة أول قائمة");
        start_btn.add_css_class("flat");
        empty.append(&start_btn);
        root.append(&empty);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::None);
        list.add_css_class("boxed-list");
        root.append(&list);

        for btn in [&add_btn, &start_btn] {
            let store = store.clone();
            btn.connect_clicked(move |_| store.navigate(View::CreateGroup));
        }

        Self {
            root: gtk::ScrolledWindow::builder().vexpand(true).child(&root).build(),
            summary,
            empty,
            list,
            shown: RefCell::new(Vec::new()),
            store: store.clone(),
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn render(&self, state: &AppState) {
        self.summary
            .set_label(&format!("لديك {} قوائم مجهزة", state.groups.len()));
        self.empty.set_visible(state.groups.is_empty());
        self.list.set_visible(!state.groups.is_empty());

        let ids: Vec<String> = state.groups.iter().map(|g| g.id.clone()).collect();
        if *self.shown.borrow() == ids {
            return;
        }
        *self.shown.borrow_mut() = ids;

        clear_list(&self.list);
        for group in &state.groups {
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 12);
            row.set_margin_top(8);
            row.set_margin_bottom(8);
            row.set_margin_start(8);
            row.set_margin_end(8);

            let count = gtk::Label::new(Some(&group.contacts.len().to_string()));
            count.add_css_class("title-3");
            row.append(&count);

            let text = gtk::Box::new(gtk::Orientation::Vertical, 2);
            text.set_hexpand(true);
            let name = gtk::Label::new(Some(&group.name));
            name.add_css_class("heading");
            name.set_halign(gtk::Align::Start);
            text.append(&name);
            text.append(&dim_label(&created_label(group)));
            row.append(&text);

            let delete_btn = gtk::Button::with_label("🗑️");
            delete_btn.add_css_class("destructive-action");
            {
                let store = self.store.clone();
                let id = group.id.clone();
                delete_btn.connect_clicked(move |_| store.delete_group(&id));
            }
            row.append(&delete_btn);

            self.list.append(&row);
        }
    }
}
