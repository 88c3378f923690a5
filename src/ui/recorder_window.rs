use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use adw::prelude::*;
use gtk::{
    Align, Box as GtkBox, Button, Entry, Image, Label, ListBox, Orientation, SelectionMode, Switch,
    ToggleButton,
};
use tracing::warn;

use crate::capture::{
    Controller, RegionRequest, SessionConfig, SessionEvent, SessionState, existing_destination,
    generated_name_template, shrink_home,
};
use crate::config::{RecorderConfig, split_flags};
use crate::ui::output_picker::show_output_picker;
use crate::ui::overwrite_prompt::show_overwrite_prompt;
use crate::ui::recording_hud::{RecordingHud, show_recording_hud};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq)]
enum CaptureMode {
    Area,
    Screen,
}

/// Widgets the event handler updates.
#[derive(Clone)]
struct StatusView {
    app: adw::Application,
    window: adw::ApplicationWindow,
    status_label: Label,
    start_button: Button,
    stop_button: Button,
    form: GtkBox,
    hud: Rc<RefCell<Option<RecordingHud>>>,
}

pub fn build_recorder_window(
    app: &adw::Application,
    config: &RecorderConfig,
    controller: Rc<RefCell<Controller>>,
    events: Receiver<SessionEvent>,
) -> adw::ApplicationWindow {
    let selected_mode = Rc::new(Cell::new(CaptureMode::Area));
    let destination = Rc::new(RefCell::new(config.file_dest.clone()));
    let events = Rc::new(events);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Cute Recorder")
        .resizable(false)
        .default_width(420)
        .build();

    let root = GtkBox::new(Orientation::Vertical, 0);
    let header_bar = adw::HeaderBar::new();

    let content = GtkBox::new(Orientation::Vertical, 16);
    content.set_margin_top(16);
    content.set_margin_bottom(16);
    content.set_margin_start(24);
    content.set_margin_end(24);

    let status_label = Label::new(Some("Not recording"));
    status_label.add_css_class("title-4");
    status_label.set_wrap(true);
    status_label.set_justify(gtk::Justification::Center);

    let form = GtkBox::new(Orientation::Vertical, 16);

    let capture_section = GtkBox::new(Orientation::Vertical, 6);
    let capture_label = Label::new(Some("Capture Area"));
    capture_label.set_halign(Align::Start);
    capture_section.append(&capture_label);

    let mode_row = GtkBox::new(Orientation::Horizontal, 0);
    mode_row.add_css_class("linked");
    mode_row.set_homogeneous(true);

    let area_button = build_mode_button("selection-mode-symbolic", "Select Area");
    let screen_button = build_mode_button("video-display-symbolic", "Whole Screen");
    screen_button.set_group(Some(&area_button));
    area_button.set_active(true);

    mode_row.append(&area_button);
    mode_row.append(&screen_button);
    capture_section.append(&mode_row);

    let options_list = ListBox::new();
    options_list.set_selection_mode(SelectionMode::None);
    options_list.add_css_class("boxed-list");

    let destination_row = adw::ActionRow::builder()
        .title("Save To")
        .subtitle(shrink_home(Path::new(&config.file_dest)))
        .build();
    let pick_button = Button::with_label("Pick Path");
    pick_button.set_valign(Align::Center);
    let random_button = Button::with_label("Random Name");
    random_button.set_valign(Align::Center);
    destination_row.add_suffix(&pick_button);
    destination_row.add_suffix(&random_button);
    options_list.append(&destination_row);

    let audio_row = adw::ActionRow::builder().title("Record Audio").build();
    let audio_switch = Switch::new();
    audio_switch.set_valign(Align::Center);
    audio_switch.set_active(config.include_audio);
    audio_row.add_suffix(&audio_switch);
    options_list.append(&audio_row);

    let delay_row = adw::ActionRow::builder().title("Delay in Seconds").build();
    let delay_spin = gtk::SpinButton::with_range(0.0, 3600.0, 1.0);
    delay_spin.set_valign(Align::Center);
    delay_spin.set_numeric(true);
    delay_spin.set_snap_to_ticks(true);
    delay_spin.set_value(f64::from(config.delay));
    delay_row.add_suffix(&delay_spin);
    options_list.append(&delay_row);

    let flags_row = adw::ActionRow::builder().title("Flags").build();
    let flags_entry = Entry::new();
    flags_entry.set_valign(Align::Center);
    flags_entry.set_hexpand(true);
    flags_entry.set_placeholder_text(Some("e.g. -c gif -r 10"));
    flags_entry.set_text(&config.flags);
    flags_row.add_suffix(&flags_entry);
    options_list.append(&flags_row);

    form.append(&capture_section);
    form.append(&options_list);

    let button_row = GtkBox::new(Orientation::Horizontal, 8);
    button_row.set_homogeneous(true);
    let start_button = Button::with_label("Start Recording");
    start_button.add_css_class("suggested-action");
    let stop_button = Button::with_label("Stop Recording");
    stop_button.add_css_class("destructive-action");
    stop_button.set_sensitive(false);
    button_row.append(&start_button);
    button_row.append(&stop_button);

    content.append(&status_label);
    content.append(&form);
    content.append(&button_row);

    root.append(&header_bar);
    root.append(&content);
    window.set_content(Some(&root));

    let view = StatusView {
        app: app.clone(),
        window: window.clone(),
        status_label,
        start_button: start_button.clone(),
        stop_button: stop_button.clone(),
        form,
        hud: Rc::new(RefCell::new(None)),
    };

    let missing = controller.borrow().helpers().missing();
    if !missing.is_empty() {
        view.show_status(
            &format!("{} not in PATH, please install it", missing.join(", ")),
            Some("error"),
        );
        start_button.set_sensitive(false);
    }

    {
        let selected_mode = selected_mode.clone();
        area_button.connect_toggled(move |button| {
            if button.is_active() {
                selected_mode.set(CaptureMode::Area);
            }
        });
    }

    {
        let selected_mode = selected_mode.clone();
        screen_button.connect_toggled(move |button| {
            if button.is_active() {
                selected_mode.set(CaptureMode::Screen);
            }
        });
    }

    {
        let destination = destination.clone();
        let destination_row = destination_row.clone();
        random_button.connect_clicked(move |_| {
            let template = generated_name_template(&destination.borrow());
            destination_row.set_subtitle(&shrink_home(Path::new(&template)));
            *destination.borrow_mut() = template;
        });
    }

    {
        let window = window.clone();
        let destination = destination.clone();
        let destination_row = destination_row.clone();
        let chooser_slot: Rc<RefCell<Option<gtk::FileChooserNative>>> =
            Rc::new(RefCell::new(None));
        pick_button.connect_clicked(move |_| {
            let chooser = gtk::FileChooserNative::builder()
                .title("Save Recording As")
                .action(gtk::FileChooserAction::Save)
                .transient_for(&window)
                .modal(true)
                .build();
            chooser.set_current_name("recording.mp4");

            let destination = destination.clone();
            let destination_row = destination_row.clone();
            chooser.connect_response(move |chooser, response| {
                if response != gtk::ResponseType::Accept {
                    return;
                }
                let Some(mut path) = chooser.file().and_then(|file| file.path()) else {
                    return;
                };
                if path.extension().is_none() {
                    path.set_extension("mp4");
                }
                destination_row.set_subtitle(&shrink_home(&path));
                *destination.borrow_mut() = path.to_string_lossy().into_owned();
            });
            chooser.show();
            *chooser_slot.borrow_mut() = Some(chooser);
        });
    }

    {
        let controller = controller.clone();
        let view = view.clone();
        let events = events.clone();
        start_button.connect_clicked(move |_| {
            let region = match selected_mode.get() {
                CaptureMode::Area => RegionRequest::Interactive,
                CaptureMode::Screen => RegionRequest::WholeOutput,
            };
            let session_config = SessionConfig {
                destination_template: destination.borrow().clone(),
                include_audio: audio_switch.is_active(),
                start_delay: Duration::from_secs(delay_spin.value_as_int().max(0) as u64),
                extra_flags: split_flags(&flags_entry.text()),
                region,
            };


            let Some(existing) = existing_destination(&session_config.destination_template)
            else {
                start_session(&view, &controller, &events, session_config);
                return;
            };

            let prompt_view = view.clone();
            let controller = controller.clone();
            let events = events.clone();
            show_overwrite_prompt(&view.app, &view.window, &existing, move || {
                start_session(&prompt_view, &controller, &events, session_config.clone());
            });
        });
    }

    {
        let controller = controller.clone();
        let view = view.clone();
        let events = events.clone();
        stop_button.connect_clicked(move |_| {
            request_stop_or_cancel(&controller);
            drain_events(&view, &controller, &events);
        });
    }

    {
        let controller = controller.clone();
        let view = view.clone();
        gtk::glib::timeout_add_local(POLL_INTERVAL, move || {
            controller.borrow_mut().poll();
            drain_events(&view, &controller, &events);
            gtk::glib::ControlFlow::Continue
        });
    }

    {
        let controller = controller.clone();
        window.connect_close_request(move |_| {
            if let Ok(mut controller) = controller.try_borrow_mut() {
                controller.shutdown(SHUTDOWN_TIMEOUT);
            }
            gtk::glib::Propagation::Proceed
        });
    }

    window.present();
    window
}

fn start_session(
    view: &StatusView,
    controller: &Rc<RefCell<Controller>>,
    events: &Receiver<SessionEvent>,
    session_config: SessionConfig,
) {
    let result = controller.borrow_mut().start(session_config);
    if let Err(err) = result {
        view.show_status(&err.to_string(), Some("error"));
    }
    drain_events(view, controller, events);
}

fn request_stop_or_cancel(controller: &Rc<RefCell<Controller>>) {
    let mut controller = controller.borrow_mut();
    let result = match controller.state() {
        SessionState::SelectingRegion | SessionState::Starting => controller.cancel(),
        _ => controller.stop(),
    };
    if let Err(err) = result {
        warn!(error = %err, "stop request ignored");
    }
}

fn drain_events(
    view: &StatusView,
    controller: &Rc<RefCell<Controller>>,
    events: &Receiver<SessionEvent>,
) {
    while let Ok(event) = events.try_recv() {
        apply_event(view, controller, event);
    }
}

fn apply_event(view: &StatusView, controller: &Rc<RefCell<Controller>>, event: SessionEvent) {
    match event {
        SessionEvent::Idle { cancelled } => {
            if cancelled {
                view.show_status("Not recording", None);
            }
            view.set_busy(false);
        }
        SessionEvent::SelectingRegion { outputs } => {
            view.set_busy(true);
            view.stop_button.set_label("Cancel");
            view.stop_button.set_sensitive(true);
            if outputs.is_empty() {
                view.show_status("Select an area…", None);
                return;
            }

            view.show_status("Pick a screen…", None);
            let choose_controller = controller.clone();
            let cancel_controller = controller.clone();
            show_output_picker(
                &view.app,
                &view.window,
                outputs,
                move |output| {
                    if let Err(err) = choose_controller.borrow_mut().choose_output(&output) {
                        warn!(error = %err, "output choice ignored");
                    }
                },
                move || {
                    if let Err(err) = cancel_controller.borrow_mut().cancel() {
                        warn!(error = %err, "cancel ignored");
                    }
                },
            );
        }
        SessionEvent::Starting { delay, .. } => {
            view.set_busy(true);
            view.stop_button.set_label("Cancel");
            view.stop_button.set_sensitive(true);
            if delay.is_zero() {
                view.show_status("Starting…", None);
            } else {
                view.show_status(&format!("Starting in {}s…", delay.as_secs()), None);
            }
        }
        SessionEvent::Recording { destination, .. } => {
            let with_audio = controller
                .borrow()
                .session()
                .is_some_and(|session| session.include_audio());
            let audio_note = if with_audio { " with audio" } else { "" };
            view.show_status(
                &format!("Recording to {}{audio_note}", shrink_home(&destination)),
                Some("error"),
            );
            view.stop_button.set_label("Stop Recording");
            view.stop_button.set_sensitive(true);

            let hud_controller = controller.clone();
            let hud = show_recording_hud(&view.app, &destination, move || {
                request_stop_or_cancel(&hud_controller);
            });
            view.window.set_visible(false);
            if let Some(previous) = view.hud.borrow_mut().replace(hud) {
                previous.close();
            }
        }
        SessionEvent::Stopping => {
            view.show_status("Finishing the file…", None);
            view.stop_button.set_sensitive(false);
            view.restore_window();
        }
        SessionEvent::Finished { destination } => {
            view.show_status(
                &format!("Saved to {}", shrink_home(&destination)),
                Some("success"),
            );
            view.restore_window();
            acknowledge(controller);
        }
        SessionEvent::Failed { error } => {
            view.show_status(&format!("Recording failed: {error}"), Some("error"));
            view.restore_window();
            acknowledge(controller);
        }
    }
}

fn acknowledge(controller: &Rc<RefCell<Controller>>) {
    if let Err(err) = controller.borrow_mut().acknowledge() {
        warn!(error = %err, "acknowledge ignored");
    }
}

impl StatusView {
    fn show_status(&self, text: &str, css_class: Option<&str>) {
        for class in ["error", "success"] {
            self.status_label.remove_css_class(class);
        }
        if let Some(class) = css_class {
            self.status_label.add_css_class(class);
        }
        self.status_label.set_text(text);
    }

    fn set_busy(&self, busy: bool) {
        self.form.set_sensitive(!busy);
        self.start_button.set_sensitive(!busy);
        if !busy {
            self.stop_button.set_label("Stop Recording");
            self.stop_button.set_sensitive(false);
        }
    }

    fn restore_window(&self) {
        if let Some(hud) = self.hud.borrow_mut().take() {
            hud.close();
        }
        self.window.present();
    }
}

fn build_mode_button(icon_name: &str, label_text: &str) -> ToggleButton {
    let button = ToggleButton::new();

    let content = GtkBox::new(Orientation::Vertical, 6);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let icon = Image::from_icon_name(icon_name);
    icon.set_pixel_size(32);

    let label = Label::new(Some(label_text));

    content.append(&icon);
    content.append(&label);
    button.set_child(Some(&content));

    button
}
