use eframe::egui;

use crate::app::AddressBookApp;
use crate::form::{FIRST_NAME, HOUSE_NUMBER, LAST_NAME, POST_CODE};
use crate::workflow::FetchState;

impl eframe::App for AddressBookApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_lookup();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.heading("Create your own address book!");
            ui.label("Enter an address by postcode add personal info and done! 👏");
            ui.add_space(4.0);
        });

        egui::SidePanel::right("address_book_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| show_address_book(self, ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                show_lookup_form(self, ui, ctx);
                ui.add_space(10.0);
                show_candidates(self, ui);
                ui.add_space(10.0);
                show_person_form(self, ui);
                ui.add_space(10.0);
                show_error(self, ui);

                if ui.button("Clear all fields").clicked() {
                    self.clear_all();
                }
            });
        });
    }
}

/// Single-line input bound to a form field. Returns true when Enter was
/// pressed inside it.
fn form_row(app: &mut AddressBookApp, ui: &mut egui::Ui, name: &str, hint: &str) -> bool {
    let mut value = app.workflow.fields().get(name).to_string();
    let response = ui.add(egui::TextEdit::singleline(&mut value).hint_text(hint));
    if response.changed() {
        app.workflow.on_change(name, value);
    }
    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
}

fn show_lookup_form(app: &mut AddressBookApp, ui: &mut egui::Ui, ctx: &egui::Context) {
    let mut submit = false;

    ui.group(|ui| {
        ui.strong("🏠 Find an address");
        ui.separator();

        submit |= form_row(app, ui, POST_CODE, "Post Code");
        submit |= form_row(app, ui, HOUSE_NUMBER, "House number");

        if ui.button("Find").clicked() {
            submit = true;
        }

        if !app.lookup_url.is_empty() {
            ui.weak(format!("Lookup service: {}", app.lookup_url));
        }
    });

    if submit {
        let ctx = ctx.clone();
        app.find_address(move || ctx.request_repaint());
    }
}

fn show_candidates(app: &mut AddressBookApp, ui: &mut egui::Ui) {
    match app.workflow.state() {
        FetchState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading...");
            });
            return;
        }
        FetchState::Results if app.workflow.addresses().is_empty() => {
            ui.weak("No addresses found for this postcode and house number.");
            return;
        }
        _ => {}
    }

    let mut selected = app.workflow.selected_address_id().unwrap_or_default().to_string();
    let mut changed = false;

    for address in app.workflow.addresses() {
        if ui
            .radio_value(&mut selected, address.id.clone(), address.label.as_str())
            .clicked()
        {
            changed = true;
        }
    }

    if changed {
        app.workflow.select_address(&selected);
    }
}

fn show_person_form(app: &mut AddressBookApp, ui: &mut egui::Ui) {
    if app.workflow.selected_address_id().is_none() {
        return;
    }

    let selected_label = app
        .workflow
        .selected_address()
        .map(|address| address.label.clone());
    let mut submit = false;

    ui.group(|ui| {
        ui.strong("✏ Add personal info to address");
        if let Some(label) = selected_label {
            ui.label(label);
        }
        ui.separator();

        submit |= form_row(app, ui, FIRST_NAME, "First name");
        submit |= form_row(app, ui, LAST_NAME, "Last name");

        if ui.button("Add to addressbook").clicked() {
            submit = true;
        }
    });

    if submit {
        // The error is kept on the workflow and shown by `show_error`.
        let _ = app.add_to_address_book();
    }
}

fn show_error(app: &mut AddressBookApp, ui: &mut egui::Ui) {
    let Some(message) = app.workflow.error_message() else {
        return;
    };

    let mut dismiss = false;
    ui.horizontal(|ui| {
        ui.colored_label(egui::Color32::RED, message);
        if ui.small_button("✖").clicked() {
            dismiss = true;
        }
    });
    ui.add_space(5.0);

    if dismiss {
        app.workflow.dismiss_error();
    }
}

fn show_address_book(app: &mut AddressBookApp, ui: &mut egui::Ui) {
    ui.heading("Address book");
    ui.separator();

    if app.address_book.entries().is_empty() {
        ui.weak("No addresses yet. Find one and add a name to it.");
        return;
    }

    let mut entry_to_remove: Option<usize> = None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, entry) in app.address_book.entries().iter().enumerate() {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.strong(entry.person.full_name());
                        ui.label(&entry.person.address.label);
                        ui.small(format!("Added {}", entry.added_at.format("%Y-%m-%d %H:%M")));
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑 Delete").clicked() {
                            entry_to_remove = Some(index);
                        }
                    });
                });
            });
            ui.add_space(5.0);
        }
    });

    if let Some(index) = entry_to_remove {
        app.remove_entry(index);
    }
}
