use adw::prelude::*;
use adw::Application;

static GLIB_LOGGER: glib::GlibLogger = glib::GlibLogger::new(
    glib::GlibLoggerFormat::Plain,
    glib::GlibLoggerDomain::CrateTarget,
);

fn main() -> glib::ExitCode {
    if log::set_logger(&GLIB_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let app = Application::builder()
        .application_id("com.example.Rasaili")
        .build();
    app.connect_activate(|app| {
        rasaili::app::build_ui(app);
    });
    app.run()
}
