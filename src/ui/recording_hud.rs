use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use adw::prelude::*;
use gtk::glib::{self, ControlFlow, SourceId};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};

use crate::capture::shrink_home;

const TICK: Duration = Duration::from_millis(500);
const HUD_CSS: &str = "
window.cute-hud {
    background: alpha(@window_bg_color, 0.92);
    border-radius: 999px;
    box-shadow: 0 2px 8px alpha(black, 0.35);
}

window.cute-hud .rec-dot {
    color: @error_color;
}

window.cute-hud .rec-dot.dim {
    opacity: 0.25;
}

window.cute-hud .rec-file {
    font-size: smaller;
    opacity: 0.7;
}
";

/// Small always-on-top pill shown while the main window is hidden.
pub(super) struct RecordingHud {
    window: adw::ApplicationWindow,
    ticker: SourceId,
}

impl RecordingHud {
    pub(super) fn close(self) {
        self.ticker.remove();
        self.window.destroy();
    }
}

pub(super) fn show_recording_hud(
    app: &adw::Application,
    destination: &Path,
    on_stop: impl Fn() + 'static,
) -> RecordingHud {
    install_css();

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Recording")
        .decorated(false)
        .resizable(false)
        .build();
    window.add_css_class("cute-hud");

    if gtk4_layer_shell::is_supported() {
        window.init_layer_shell();
        window.set_namespace(Some("cute-recorder-hud"));
        window.set_layer(Layer::Overlay);
        window.set_keyboard_mode(KeyboardMode::OnDemand);
        window.set_anchor(Edge::Bottom, true);
        window.set_margin(Edge::Bottom, 24);
    }

    let dot = gtk::Image::from_icon_name("media-record-symbolic");
    dot.add_css_class("rec-dot");

    let elapsed = gtk::Label::new(Some("0:00"));
    elapsed.add_css_class("numeric");
    elapsed.add_css_class("heading");
    elapsed.set_xalign(0.0);

    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_label = gtk::Label::new(Some(&file_name));
    file_label.add_css_class("rec-file");
    file_label.set_xalign(0.0);
    file_label.set_ellipsize(gtk::pango::EllipsizeMode::Middle);
    file_label.set_max_width_chars(28);
    file_label.set_tooltip_text(Some(&shrink_home(destination)));

    let text = gtk::Box::new(gtk::Orientation::Vertical, 0);
    text.set_hexpand(true);
    text.append(&elapsed);
    text.append(&file_label);

    let stop = gtk::Button::from_icon_name("media-playback-stop-symbolic");
    stop.set_tooltip_text(Some("Stop Recording"));
    stop.set_valign(gtk::Align::Center);
    stop.add_css_class("circular");
    stop.add_css_class("destructive-action");

    let pill = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    pill.set_margin_top(6);
    pill.set_margin_bottom(6);
    pill.set_margin_start(16);
    pill.set_margin_end(8);
    pill.append(&dot);
    pill.append(&text);
    pill.append(&stop);
    window.set_content(Some(&pill));

    let started_at = Instant::now();
    let lit = Cell::new(true);
    let ticker = glib::timeout_add_local(TICK, move || {
        elapsed.set_text(&format_elapsed(started_at.elapsed()));
        lit.set(!lit.get());
        if lit.get() {
            dot.remove_css_class("dim");
        } else {
            dot.add_css_class("dim");
        }
        ControlFlow::Continue
    });

    let on_stop = Rc::new(on_stop);
    {
        let on_stop = on_stop.clone();
        stop.connect_clicked(move |button| {
            button.set_sensitive(false);
            on_stop();
        });
    }

    // the HUD only goes away once the controller reports the stop
    window.connect_close_request(move |_| {
        on_stop();
        glib::Propagation::Stop
    });

    window.present();

    RecordingHud { window, ticker }
}

fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

fn install_css() {
    let Some(display) = gtk::gdk::Display::default() else {
        return;
    };

    let provider = gtk::CssProvider::new();
    provider.load_from_data(HUD_CSS);
    gtk::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
