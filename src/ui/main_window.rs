use super::compose::ComposePage;
use super::create_group::CreateGroupPage;
use super::groups::GroupsPage;
use super::history::HistoryPage;
use super::{spawn_local, RenderGuard};
use crate::api::models::{ToastKind, View};
use crate::state::{AppState, TOAST_DURATION};
use crate::store::Store;
use adw::prelude::*;
use adw::Application;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const NAV_ITEMS: [(View, &str); 3] = [
    (View::Home, "✉️ الرئيسية"),
    (View::Groups, "👥 المجموعات"),
    (View::History, "📊 التقارير"),
];

struct MainWindow {
    window: adw::ApplicationWindow,
    overlay: adw::ToastOverlay,
    stack: gtk4::Stack,
    back_btn: gtk4::Button,
    sync_btn: gtk4::Button,
    nav: Vec<(View, gtk4::Button)>,
    compose: ComposePage,
    groups: GroupsPage,
    create_group: CreateGroupPage,
    history: HistoryPage,
    toast: RefCell<Option<(u64, adw::Toast)>>,
    dialog: RefCell<Option<gtk4::Dialog>>,
    guard: RenderGuard,
    store: Store,
}

pub fn show_main_window(app: &Application, store: Store) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("رسائلي SMART")
        .default_width(420)
        .default_height(760)
        .build();

    let guard: RenderGuard = Rc::new(Cell::new(false));
    let overlay = adw::ToastOverlay::new();

    let stack = gtk4::Stack::new();
    stack.set_vexpand(true);
    let compose = ComposePage::new(&store, &guard);
    let groups = GroupsPage::new(&store);
    let create_group = CreateGroupPage::new(&store, &guard);
    let history = HistoryPage::new(&store);
    stack.add_named(&compose.widget(), Some(View::Home.as_str()));
    stack.add_named(&groups.widget(), Some(View::Groups.as_str()));
    stack.add_named(&create_group.widget(), Some(View::CreateGroup.as_str()));
    stack.add_named(&history.widget(), Some(View::History.as_str()));
    overlay.set_child(Some(&stack));

    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some("رسائلي SMART"));
    title.add_css_class("heading");
    header.set_title_widget(Some(&title));
    let back_btn = gtk4::Button::with_label("←");
    back_btn.add_css_class("flat");
    header.pack_start(&back_btn);
    let sync_btn = gtk4::Button::with_label("🔄 مزامنة");
    header.pack_end(&sync_btn);

    let nav_bar = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
    nav_bar.set_homogeneous(true);
    nav_bar.set_margin_top(6);
    nav_bar.set_margin_bottom(6);
    nav_bar.set_margin_start(6);
    nav_bar.set_margin_end(6);
    let mut nav = Vec::new();
    for (view, label) in NAV_ITEMS {
        let btn = gtk4::Button::with_label(label);
        btn.add_css_class("flat");
        {
            let store = store.clone();
            btn.connect_clicked(move |_| store.navigate(view));
        }
        nav_bar.append(&btn);
        nav.push((view, btn));
    }

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    container.append(&header);
    container.append(&overlay);
    container.append(&nav_bar);
    window.set_content(Some(&container));

    {
        let store = store.clone();
        back_btn.connect_clicked(move |_| store.navigate(View::Home));
    }
    {
        let store = store.clone();
        sync_btn.connect_clicked(move |_| {
            let store = store.clone();
            spawn_local(async move { store.sync_contacts().await });
        });
    }

    let main = Rc::new(MainWindow {
        window,
        overlay,
        stack,
        back_btn,
        sync_btn,
        nav,
        compose,
        groups,
        create_group,
        history,
        toast: RefCell::new(None),
        dialog: RefCell::new(None),
        guard,
        store: store.clone(),
    });

    // Coalesce bursts of changes into one render on the next idle.
    let pending = Rc::new(Cell::new(false));
    let weak = Rc::downgrade(&main);
    store.subscribe(move |_| {
        if pending.replace(true) {
            return;
        }
        let pending = pending.clone();
        let weak = weak.clone();
        glib::idle_add_local_once(move || {
            pending.set(false);
            if let Some(main) = weak.upgrade() {
                let state = main.store.snapshot();
                main.render(&state);
            }
        });
    });

    main.render(&store.snapshot());
    main.window.present();
}

impl MainWindow {
    fn render(&self, state: &AppState) {
        self.guard.set(true);

        self.stack.set_visible_child_name(state.view.as_str());
        self.back_btn.set_visible(state.view != View::Home);
        self.sync_btn.set_sensitive(!state.is_loading_contacts);
        self.sync_btn.set_label(if state.is_loading_contacts {
            "⏳"
        } else {
            "🔄 مزامنة"
        });
        for (view, btn) in &self.nav {
            if *view == state.view {
                btn.add_css_class("accent");
            } else {
                btn.remove_css_class("accent");
            }
        }

        self.compose.render(state);
        self.groups.render(state);
        self.create_group.render(state);
        self.history.render(state);

        self.render_toast(state);
        self.render_dialog(state);

        self.guard.set(false);
    }

    fn render_toast(&self, state: &AppState) {
        let mut shown = self.toast.borrow_mut();
        let current = shown.as_ref().map(|(id, _)| *id);
        match (&state.toast, current) {
            (Some(toast), Some(id)) if toast.id == id => {}
            (Some(toast), _) => {
                if let Some((_, old)) = shown.take() {
                    old.dismiss();
                }
                let widget = adw::Toast::new(&toast.message);
                widget.set_timeout(TOAST_DURATION.as_secs() as u32);
                if toast.kind == ToastKind::Error {
                    widget.set_priority(adw::ToastPriority::High);
                }
                self.overlay.add_toast(widget.clone());
                *shown = Some((toast.id, widget));
            }
            (None, Some(_)) => {
                if let Some((_, old)) = shown.take() {
                    old.dismiss();
                }
            }
            (None, None) => {}
        }
    }

    fn render_dialog(&self, state: &AppState) {
        let open = self.dialog.borrow().is_some();
        if state.show_confirm_modal && !open {
            let count = state.selected_group().map_or(0, |g| g.contacts.len());
            let dialog = confirm_dialog(&self.window, count, &self.store);
            dialog.present();
            *self.dialog.borrow_mut() = Some(dialog);
        } else if !state.show_confirm_modal && open {
            if let Some(dialog) = self.dialog.borrow_mut().take() {
                dialog.close();
            }
        }
    }
}

fn confirm_dialog(parent: &adw::ApplicationWindow, count: usize, store: &Store) -> gtk4::Dialog {
    let dialog = gtk4::Dialog::builder()
        .title("تأكيد الإطلاق")
        .transient_for(parent)
        .modal(true)
        .build();
    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let info = gtk4::Label::new(Some(&format!(
        "سيتم إرسال الرسالة إلى {count} شخص في المجموعة المحددة."
    )));
    info.set_wrap(true);
    info.set_halign(gtk4::Align::Start);
    content.append(&info);
    let note = gtk4::Label::new(Some("* تأكد من وجود رصيد SMS كافي في شريحتك."));
    note.add_css_class("dim-label");
    note.add_css_class("caption");
    note.set_halign(gtk4::Align::Start);
    content.append(&note);
    dialog.content_area().append(&content);

    let send_btn = dialog.add_button("إرسال الآن", gtk4::ResponseType::Ok);
    send_btn.add_css_class("suggested-action");
    let _ = dialog.add_button("إلغاء", gtk4::ResponseType::Cancel);
    dialog.set_default_response(gtk4::ResponseType::Ok);

    let store = store.clone();
    dialog.connect_response(move |dlg, resp| {
        store.dismiss_confirm();
        if resp == gtk4::ResponseType::Ok {
            let store = store.clone();
            spawn_local(async move { store.send_bulk().await });
        }
        dlg.close();
    });
    dialog
}
