mod error;
mod helper;
mod icons;
mod log;
mod mixer;
mod notify;
mod settings;
mod ui;

use std::rc::Rc;

use mixer::{AlsaBackend, CardRegistry, MixerBackend};
use settings::Settings;

fn main() {
    log::init();

    if gtk::init().is_err() {
        eprintln!("Failed to start GTK, please ensure all dependancies are installed");
        return;
    }

    let dirs = settings::scaffold();
    let settings = match Settings::init(dirs.config_dir()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            return;
        }
    };

    let backend: Rc<dyn MixerBackend> = Rc::new(AlsaBackend::new());
    let registry = Rc::new(CardRegistry::new(backend.clone()));

    let app = ui::App::new(settings, backend, registry);
    app.run();

    println!("Voltray exiting, goodbye");
}
