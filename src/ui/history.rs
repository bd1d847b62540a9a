use super::{clear_list, dim_label, heading, page_box};
use crate::api::models::{DeliveryStatus, View};
use crate::state::AppState;
use crate::store::Store;
use gtk4 as gtk;
use gtk4::prelude::*;

/// Delivery report of the latest send run.
pub struct HistoryPage {
    root: gtk::ScrolledWindow,
    empty: gtk::Box,
    list: gtk::ListBox,
}

impl HistoryPage {
    pub fn new(store: &Store) -> Self {
        let root = page_box();

        let header = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let title = heading("تقرير التسليم");
        title.set_hexpand(true);
        header.append(&title);
        let new_send_btn = gtk::Button::with_label("إرسال جديد");
        new_send_btn.add_css_class("flat");
        {
            let store = store.clone();
            new_send_btn.connect_clicked(move |_| store.navigate(View::Home));
        }
        header.append(&new_send_btn);
        root.append(&header);

        let empty = gtk::Box::new(gtk::Orientation::Vertical, 8);
        empty.set_margin_top(48);
        empty.append(&gtk::Label::new(Some("📊")));
        let empty_label = gtk::Label::new(Some("السجل فارغ حالياً"));
        empty_label.add_css_class("dim-label");
        empty.append(&empty_label);
        root.append(&empty);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::None);
        list.add_css_class("boxed-list");
        root.append(&list);

        Self {
            root: gtk::ScrolledWindow::builder().vexpand(true).child(&root).build(),
            empty,
            list,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn render(&self, state: &AppState) {
        self.empty.set_visible(state.send_results.is_empty());
        self.list.set_visible(!state.send_results.is_empty());

        clear_list(&self.list);
        for result in &state.send_results {
            let row = gtk::Box::new(gtk::Orientation::Horizontal, 12);
            row.set_margin_top(8);
            row.set_margin_bottom(8);
            row.set_margin_start(8);
            row.set_margin_end(8);

            let text = gtk::Box::new(gtk::Orientation::Vertical, 2);
            text.set_hexpand(true);
            let name = gtk::Label::new(Some(&result.contact_name));
            name.add_css_class("heading");
            name.set_halign(gtk::Align::Start);
            text.append(&name);
            let phone = dim_label(&result.phone_number);
            phone.add_css_class("monospace");
            text.append(&phone);
            row.append(&text);

            let (label, class) = match result.status {
                DeliveryStatus::Success => ("تم الوصول", "success"),
                DeliveryStatus::Failed => ("فشل التسليم", "error"),
                DeliveryStatus::Pending => ("قيد الإرسال", "dim-label"),
            };
            let status = gtk::Label::new(Some(label));
            status.add_css_class(class);
            status.add_css_class("caption-heading");
            row.append(&status);

            self.list.append(&row);
        }
    }
}
