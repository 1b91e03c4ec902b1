mod app;
mod config;
mod form;
mod lookup;
mod store;
mod types;
mod ui;
mod workflow;

use app::AddressBookApp;
use clap::Parser;
use config::Config;

fn main() -> eframe::Result {
    tracing_subscriber::fmt::init();
    let config = Config::parse();
    tracing::info!(
        lookup_url = %config.lookup_url,
        "address-book v{}",
        env!("CARGO_PKG_VERSION")
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Address Book",
        options,
        Box::new(move |cc| Ok(Box::new(AddressBookApp::new(cc, &config)))),
    )
}
