use std::cell::RefCell;
use std::rc::Rc;

use adw::prelude::*;
use tracing::{info, warn};

use crate::capture::{Compositor, Controller, apply_window_rules};
use crate::config::RecorderConfig;
use crate::ui::build_recorder_window;

pub const APP_ID: &str = "io.cute.recorder";

pub fn run() {
    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_activate(build_ui);
    app.run();
}

fn build_ui(app: &adw::Application) {
    if let Some(window) = app.active_window() {
        window.present();
        return;
    }

    let config = RecorderConfig::load();
    info!(?config, "opening recorder window");

    if let Err(err) = apply_window_rules(Compositor::detect(), APP_ID) {
        warn!(error = %format!("{err:#}"), "window rule not applied");
    }

    let mut controller = Controller::new(config.helpers());
    let events = controller.subscribe();
    let controller = Rc::new(RefCell::new(controller));

    let _window = build_recorder_window(app, &config, controller, events);
}
