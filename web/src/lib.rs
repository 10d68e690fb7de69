use clap::Parser;
use wasm_bindgen::prelude::*;

mod game;
mod pokeapi;
mod theme;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(flatten)]
    game: game::GameProps,
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window().location().hash().unwrap_or_default();
    let mut rejected = None;
    let args = Args::try_parse_from(location_hash.split(['#', '&'])).unwrap_or_else(|err| {
        rejected = Some(err);
        Args::parse_from(["pokeflip"])
    });

    if let Some(log_level) = args.verbose.log_level()
        && let Err(err) = console_log::init_with_level(log_level)
    {
        gloo::console::error!(format!("could not initialize logger: {err}"));
    }
    if let Some(err) = rejected {
        log::warn!("ignoring url arguments: {}", err);
    }
    log::debug!("args: {:?}", args.game);

    let Some(root) = document().get_element_by_id("game") else {
        log::error!("could not find id=\"game\" element");
        return;
    };

    log::debug!("App started");
    yew::Renderer::<game::GameView>::with_root_and_props(root, args.game).render();
}
