mod allocator;
mod batch;
mod config;
mod error;
mod plate;
mod users;
mod validation;
mod web;

use env_logger::Env;
use structopt::StructOpt;

#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

fn main() {
    let opt = config::Opt::from_args();

    // set up logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = match config::Settings::from_opt(&opt) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid plate settings: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Plate layout: {} rows x {} columns, {} samples per week",
        settings.plate_n_rows,
        settings.plate_n_cols,
        settings.capacity()
    );
    info!("Submissions accepted until ISO weekday {}", settings.last_submission_day);

    match web::App::new(settings) {
        Ok(app) => web::serve(app),
        Err(e) => {
            error!("Could not initialize allocator: {}", e);
            std::process::exit(1);
        }
    }
}
