use super::{clear_list, dim_label, heading, page_box, RenderGuard};
use crate::api::models::Contact;
use crate::state::AppState;
use crate::store::Store;
use gtk4 as gtk;
use gtk4::prelude::*;

pub struct CreateGroupPage {
    root: gtk::ScrolledWindow,
    name_entry: gtk::Entry,
    search: gtk::SearchEntry,
    tally: gtk::Label,
    select_all_btn: gtk::Button,
    list: gtk::ListBox,
    save_btn: gtk::Button,
    store: Store,
    guard: RenderGuard,
}

impl CreateGroupPage {
    pub fn new(store: &Store, guard: &RenderGuard) -> Self {
        let root = page_box();
        root.append(&heading("قائمة جديدة"));
        root.append(&dim_label("اختر الأسماء التي ترغب في إرسال الرسائل إليها"));

        let name_entry = gtk::Entry::new();
        name_entry.set_placeholder_text(Some("اسم المجموعة (مثلاً: زبائن الجمعة)"));
        name_entry.set_hexpand(true);
        root.append(&name_entry);

        let search = gtk::SearchEntry::new();
        search.set_placeholder_text(Some("ابحث بالاسم أو الرقم..."));
        root.append(&search);

        let tally_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let tally = dim_label("");
        tally.set_hexpand(true);
        tally_row.append(&tally);
        let select_all_btn = gtk::Button::with_label("اختيار الكل");
        select_all_btn.add_css_class("flat");
        tally_row.append(&select_all_btn);
        root.append(&tally_row);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::None);
        list.add_css_class("boxed-list");
        root.append(&list);

        let save_btn = gtk::Button::with_label("حفظ القائمة الجديدة");
        save_btn.add_css_class("suggested-action");
        save_btn.add_css_class("pill");
        root.append(&save_btn);

        let page = Self {
            root: gtk::ScrolledWindow::builder().vexpand(true).child(&root).build(),
            name_entry,
            search,
            tally,
            select_all_btn,
            list,
            save_btn,
            store: store.clone(),
            guard: guard.clone(),
        };
        page.connect();
        page
    }

    fn connect(&self) {
        {
            let store = self.store.clone();
            let guard = self.guard.clone();
            self.name_entry.connect_changed(move |e| {
                if !guard.get() {
                    store.set_new_group_name(&e.text());
                }
            });
        }
        {
            let store = self.store.clone();
            let guard = self.guard.clone();
            // Immediate, unlike the debounced `search-changed`.
            self.search.connect_changed(move |e| {
                if !guard.get() {
                    store.set_search_term(&e.text());
                }
            });
        }
        {
            let store = self.store.clone();
            self.select_all_btn
                .connect_clicked(move |_| store.toggle_select_all());
        }
        {
            let store = self.store.clone();
            self.save_btn
                .connect_clicked(move |_| store.create_group_from_form());
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    fn contact_row(&self, contact: &Contact, selected: bool) -> gtk::Box {
        let row = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        row.set_margin_top(8);
        row.set_margin_bottom(8);
        row.set_margin_start(8);
        row.set_margin_end(8);

        let text = gtk::Box::new(gtk::Orientation::Vertical, 2);
        text.set_hexpand(true);
        let title = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let name = gtk::Label::new(Some(&contact.name));
        name.add_css_class("heading");
        title.append(&name);
        let source = gtk::Label::new(Some(contact.source.as_str()));
        source.add_css_class("caption");
        source.add_css_class("dim-label");
        title.append(&source);
        text.append(&title);
        let phone = dim_label(&contact.phone_number);
        phone.add_css_class("monospace");
        text.append(&phone);
        row.append(&text);

        let check = gtk::CheckButton::new();
        check.set_active(selected);
        {
            let store = self.store.clone();
            let guard = self.guard.clone();
            let id = contact.id.clone();
            check.connect_toggled(move |_| {
                if !guard.get() {
                    store.toggle_contact_selection(&id);
                }
            });
        }
        row.append(&check);
        row
    }

    pub fn render(&self, state: &AppState) {
        if self.name_entry.text() != state.new_group_name {
            self.name_entry.set_text(&state.new_group_name);
        }
        if self.search.text() != state.search_term {
            self.search.set_text(&state.search_term);
        }

        let filtered = state.filtered_contacts();
        self.tally.set_label(&format!(
            "تم اختيار {} من {}",
            state.selected_contacts.len(),
            filtered.len()
        ));
        self.select_all_btn.set_label(if state.all_filtered_selected() {
            "إلغاء الكل"
        } else {
            "اختيار الكل"
        });
        self.save_btn.set_sensitive(state.can_create_group());

        clear_list(&self.list);
        if state.is_loading_contacts {
            let loading = gtk::Box::new(gtk::Orientation::Vertical, 8);
            loading.set_margin_top(24);
            loading.set_margin_bottom(24);
            let spinner = gtk::Spinner::new();
            spinner.set_spinning(true);
            loading.append(&spinner);
            loading.append(&gtk::Label::new(Some("جاري جلب جهات الاتصال...")));
            self.list.append(&loading);
        } else if filtered.is_empty() {
            let none = gtk::Label::new(Some("لا توجد نتائج بحث"));
            none.add_css_class("dim-label");
            none.set_margin_top(24);
            none.set_margin_bottom(24);
            self.list.append(&none);
        } else {
            for contact in filtered {
                self.list
                    .append(&self.contact_row(contact, state.is_selected(&contact.id)));
            }
        }
    }
}
