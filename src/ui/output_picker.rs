use std::cell::{Cell, RefCell};
use std::rc::Rc;

use adw::prelude::*;

/// Lets the user pick which output to record when several are connected.
///
/// Exactly one of `on_choose` or `on_cancel` runs.
pub(super) fn show_output_picker(
    app: &adw::Application,
    parent: &adw::ApplicationWindow,
    outputs: Vec<String>,
    on_choose: impl Fn(String) + 'static,
    on_cancel: impl Fn() + 'static,
) {
    let picker = adw::ApplicationWindow::builder()
        .application(app)
        .title("Select Screen")
        .transient_for(parent)
        .modal(true)
        .default_width(360)
        .resizable(false)
        .build();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(16);
    root.set_margin_bottom(16);
    root.set_margin_start(16);
    root.set_margin_end(16);

    let hint = gtk::Label::new(Some("Which screen should be recorded?"));
    hint.set_halign(gtk::Align::Start);
    root.append(&hint);

    let list = gtk::ListBox::new();
    list.set_selection_mode(gtk::SelectionMode::Single);
    list.add_css_class("boxed-list");

    for output in &outputs {
        let row = adw::ActionRow::builder()
            .title(output.as_str())
            .activatable(true)
            .build();
        row.add_prefix(&gtk::Image::from_icon_name("video-display-symbolic"));
        list.append(&row);
    }

    root.append(&list);

    let action_row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    action_row.set_halign(gtk::Align::End);
    let cancel = gtk::Button::with_label("Cancel");
    let record = gtk::Button::with_label("Record");
    record.add_css_class("suggested-action");
    action_row.append(&cancel);
    action_row.append(&record);
    root.append(&action_row);

    picker.set_content(Some(&root));

    let outputs = Rc::new(outputs);
    let selected_index = Rc::new(RefCell::new(Some(0usize)));
    let decided = Rc::new(Cell::new(false));
    list.select_row(list.row_at_index(0).as_ref());

    {
        let selected_index = selected_index.clone();
        list.connect_selected_rows_changed(move |listbox| {
            let row = listbox.selected_row();
            *selected_index.borrow_mut() = row.map(|r| r.index() as usize);
        });
    }

    let choose: Rc<dyn Fn()> = Rc::new({
        let picker = picker.clone();
        let decided = decided.clone();
        move || {
            let Some(idx) = *selected_index.borrow() else {
                return;
            };
            let Some(output) = outputs.get(idx) else {
                return;
            };
            if decided.replace(true) {
                return;
            }

            picker.destroy();
            on_choose(output.clone());
        }
    });

    {
        let choose = choose.clone();
        list.connect_row_activated(move |_, _| choose());
    }

    record.connect_clicked(move |_| choose());

    {
        let picker = picker.clone();
        cancel.connect_clicked(move |_| {
            picker.close();
        });
    }

    picker.connect_close_request(move |_| {
        if !decided.replace(true) {
            on_cancel();
        }
        gtk::glib::Propagation::Proceed
    });

    picker.present();
}
