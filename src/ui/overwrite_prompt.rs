use std::path::Path;

use adw::prelude::*;

use crate::capture::shrink_home;

/// Asks before a recording replaces an existing file. `on_confirm` runs only
/// when the user agrees; closing the prompt abandons the start.
pub(super) fn show_overwrite_prompt(
    app: &adw::Application,
    parent: &adw::ApplicationWindow,
    existing: &Path,
    on_confirm: impl Fn() + 'static,
) {
    let prompt = adw::ApplicationWindow::builder()
        .application(app)
        .title("Replace Recording?")
        .transient_for(parent)
        .modal(true)
        .resizable(false)
        .default_width(340)
        .build();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(20);
    root.set_margin_bottom(16);
    root.set_margin_start(20);
    root.set_margin_end(20);

    let heading = gtk::Label::new(Some(&format!("Override {}?", shrink_home(existing))));
    heading.add_css_class("title-4");
    heading.set_wrap(true);
    heading.set_wrap_mode(gtk::pango::WrapMode::WordChar);

    let body = gtk::Label::new(Some("The existing file will be replaced by the new recording."));
    body.add_css_class("dim-label");
    body.set_wrap(true);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    buttons.set_halign(gtk::Align::End);
    let keep = gtk::Button::with_label("Cancel");
    let replace = gtk::Button::with_label("Override");
    replace.add_css_class("destructive-action");
    buttons.append(&keep);
    buttons.append(&replace);

    root.append(&heading);
    root.append(&body);
    root.append(&buttons);
    prompt.set_content(Some(&root));

    {
        let prompt = prompt.clone();
        keep.connect_clicked(move |_| prompt.close());
    }

    {
        let prompt = prompt.clone();
        replace.connect_clicked(move |_| {
            prompt.destroy();
            on_confirm();
        });
    }

    prompt.present();
}
