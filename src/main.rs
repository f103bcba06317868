//! Binary entry point for the cube viewer. Optionally takes a settings file path as the first argument.

use std::path::Path;

use cube_viewer::{Settings, Viewer};

fn main() {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(Path::new(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    if let Err(e) = Viewer::builder().with_settings(settings).build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
