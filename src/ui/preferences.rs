use std::cell::RefCell;
use std::rc::Rc;

use gtk::prelude::*;
use gtk::Orientation;
use tracing::warn;

use crate::mixer::CardRegistry;

use super::App;

/// Open the preferences window: card and control pickers plus the small
/// set of behaviour toggles. Everything is applied and persisted at once
/// when Apply is clicked.
pub(super) fn show(app: &Rc<App>) {
    let window = gtk::Window::new(gtk::WindowType::Toplevel);
    window.set_title("Voltray Preferences");
    window.set_border_width(12);
    window.set_position(gtk::WindowPosition::Center);

    let (current_card, current_selection, mixer_app, run_in_terminal, show_notify, emulate_mute) = {
        let settings = app.settings().r().app();
        (
            settings.card_index,
            settings.selection(settings.card_index),
            settings.mixer_app.clone(),
            settings.run_in_terminal,
            settings.show_notify,
            settings.emulate_mute,
        )
    };

    let vbox = gtk::Box::new(Orientation::Vertical, 6);

    let card_combo = gtk::ComboBoxText::new();
    for card in app.registry().cards() {
        let label = match &card.name {
            Some(name) => format!("{}: {}", card.index, name),
            None => format!("{}: (no usable controls)", card.index),
        };
        card_combo.append(Some(&card.index.to_string()), &label);
    }
    card_combo.set_active_id(Some(&current_card.to_string()));
    vbox.add(&gtk::Label::new(Some("Sound card")));
    vbox.add(&card_combo);

    let control_combo = gtk::ComboBoxText::new();
    let elements = Rc::new(RefCell::new(Vec::new()));
    refill_controls(
        app.registry(),
        current_card,
        &control_combo,
        &elements,
        current_selection,
    );
    {
        let registry = app.registry().clone();
        let control_combo = control_combo.clone();
        let elements = elements.clone();
        card_combo.connect_changed(move |combo| {
            if let Some(card) = active_card(combo) {
                refill_controls(&registry, card, &control_combo, &elements, None);
            }
        });
    }
    vbox.add(&gtk::Label::new(Some("Mixer control")));
    vbox.add(&control_combo);

    vbox.add(&gtk::Separator::new(Orientation::Horizontal));

    let mixer_entry = gtk::Entry::new();
    mixer_entry.set_text(&mixer_app);
    vbox.add(&gtk::Label::new(Some("External mixer")));
    vbox.add(&mixer_entry);

    let terminal_check = gtk::CheckButton::with_label("Run mixer in a terminal");
    terminal_check.set_active(run_in_terminal);
    vbox.add(&terminal_check);

    let notify_check = gtk::CheckButton::with_label("Show change notifications");
    notify_check.set_active(show_notify);
    vbox.add(&notify_check);

    let emulate_check = gtk::CheckButton::with_label("Always emulate mute in software");
    emulate_check.set_active(emulate_mute);
    vbox.add(&emulate_check);

    let buttons = gtk::Box::new(Orientation::Horizontal, 6);
    let apply = gtk::Button::with_label("Apply");
    let close = gtk::Button::with_label("Close");
    buttons.pack_end(&apply, false, false, 0);
    buttons.pack_end(&close, false, false, 0);
    vbox.add(&buttons);

    {
        let window = window.clone();
        close.connect_clicked(move |_| window.close());
    }
    {
        let app = app.clone();
        let window = window.clone();
        apply.connect_clicked(move |_| {
            {
                let mut settings = app.settings().w().app();
                settings.mixer_app = mixer_entry.get_text().to_string();
                settings.run_in_terminal = terminal_check.get_active();
                settings.show_notify = notify_check.get_active();
                settings.emulate_mute = emulate_check.get_active();
            }

            let card = match active_card(&card_combo) {
                Some(card) => card,
                None => {
                    warn!("no card selected");
                    return;
                }
            };
            let selected = control_combo
                .get_active_id()
                .and_then(|id| id.parse::<usize>().ok())
                .and_then(|i| elements.borrow().get(i).cloned());
            match selected {
                Some((control, cid)) => {
                    app.apply_selection(card, control, cid);
                    window.close();
                }
                None => warn!("no mixer control selected"),
            }
        });
    }

    window.add(&vbox);
    window.show_all();
}

fn active_card(combo: &gtk::ComboBoxText) -> Option<crate::mixer::CardId> {
    combo.get_active_id().and_then(|id| id.parse().ok())
}

fn refill_controls(
    registry: &Rc<CardRegistry>,
    card: crate::mixer::CardId,
    combo: &gtk::ComboBoxText,
    elements: &Rc<RefCell<Vec<(String, u32)>>>,
    select: Option<(String, u32)>,
) {
    combo.remove_all();
    let mut list = registry.mixer_elements(card);
    for (index, (name, cid)) in list.iter().enumerate() {
        // repeated names carry the instance id, like "PCM 1"
        let label = if *cid == 0 {
            name.clone()
        } else {
            format!("{} {}", name, cid)
        };
        combo.append(Some(&index.to_string()), &label);
    }
    let active = select
        .and_then(|sel| list.iter().position(|e| *e == sel))
        .unwrap_or(0);
    combo.set_active_id(Some(&active.to_string()));
    std::mem::swap(&mut *elements.borrow_mut(), &mut list);
}
