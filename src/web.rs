//! JSON API over the intake core.
//!
//! Routes are thin: content validation, the submission window check and
//! the capacity-accounting calls into the allocator. All allocator access
//! goes through one mutex so the check-and-append in `add_sample` is
//! serialized per batch.

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};

use crate::allocator::{CompletionFlag, PlateAllocator, Sample, Submission};
use crate::batch;
use crate::config::Settings;
use crate::error::{Result, SampleFlowError};
use crate::users::UserRegistry;
use crate::validation;

/// Shared application state. Settings are read-only after startup; the
/// allocator and the user registry are the only mutable parts.
pub struct App {
    settings: Settings,
    allocator: Mutex<PlateAllocator>,
    users: Mutex<UserRegistry>,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl App {
    pub fn new(settings: Settings) -> Result<App> {
        let week = batch::batch_week(today());
        let allocator = PlateAllocator::new(week, &settings)?;
        info!(
            "Accepting samples for batch {} ({} wells)",
            week,
            allocator.capacity()
        );
        Ok(App {
            settings,
            allocator: Mutex::new(allocator),
            users: Mutex::new(UserRegistry::new()),
        })
    }

    /// Locks the allocator, swapping in a fresh one first if the ISO week
    /// has rolled over since the last request. Settings were validated at
    /// startup, so building the replacement cannot fail.
    fn allocator_for(&self, date: NaiveDate) -> MutexGuard<PlateAllocator> {
        let mut allocator = self.allocator.lock().expect("allocator lock poisoned");
        let week = batch::batch_week(date);
        if allocator.week() != week {
            info!("Week rolled over: starting batch {} (was {})", week, allocator.week());
            *allocator = PlateAllocator::new(week, &self.settings)
                .expect("settings were validated at startup");
        }
        allocator
    }
}

#[derive(Debug, Serialize)]
struct Message {
    message: String,
}

impl Message {
    fn new(message: &str) -> Json<Message> {
        Json(Message {
            message: message.to_string(),
        })
    }
}

fn reject(e: SampleFlowError) -> (Status, Json<Message>) {
    (Status::BadRequest, Message::new(&e.to_string()))
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct FlagUpdateRequest {
    primary_key: String,
    flag_name: CompletionFlag,
    value: bool,
}

#[derive(Debug, Deserialize)]
struct ResultRequest {
    primary_key: String,
    email: String,
    filetype: String,
}

#[derive(Debug, Deserialize)]
struct ReferenceSequenceRequest {
    primary_key: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct FilenameResponse {
    filename: String,
}

#[derive(Debug, Serialize)]
struct RunningOptionsResponse {
    running_options: Vec<String>,
}

#[get("/remaining")]
fn remaining(app: &State<App>) -> Json<batch::RemainingReport> {
    let date = today();
    let allocator = app.allocator_for(date);
    Json(batch::remaining_report(&allocator, &app.settings, date))
}

#[get("/running_options")]
fn running_options(app: &State<App>) -> Json<RunningOptionsResponse> {
    Json(RunningOptionsResponse {
        running_options: app.settings.running_options.clone(),
    })
}

#[get("/settings")]
fn get_settings(app: &State<App>) -> Json<Settings> {
    Json(app.settings.clone())
}

#[post("/signup", data = "<request>")]
fn signup(
    app: &State<App>,
    request: Json<CredentialsRequest>,
) -> std::result::Result<Json<Message>, (Status, Json<Message>)> {
    let request = request.into_inner();
    info!("Signup request from {}", request.email);
    let mut users = app.users.lock().expect("user lock poisoned");
    users.signup(&request.email, &request.password).map_err(reject)?;
    Ok(Message::new(&format!("Successful signup for {}", request.email)))
}

#[post("/login", data = "<request>")]
fn login(
    app: &State<App>,
    request: Json<CredentialsRequest>,
) -> std::result::Result<Json<Message>, (Status, Json<Message>)> {
    let request = request.into_inner();
    info!("Login request from {}", request.email);
    let users = app.users.lock().expect("user lock poisoned");
    let user = match users.get(&request.email) {
        Some(user) => user,
        None => return Err((Status::Unauthorized, Message::new("Unknown email address"))),
    };
    if !user.check_password(&request.password) {
        return Err((Status::Unauthorized, Message::new("Incorrect password")));
    }
    Ok(Message::new(&format!("Logged in as {}", user.email)))
}

#[post("/sample", data = "<request>")]
fn add_sample(
    app: &State<App>,
    request: Json<Submission>,
) -> std::result::Result<Json<Sample>, (Status, Json<Message>)> {
    let request = request.into_inner();
    info!("Adding sample {} from {}", request.name, request.email);
    validation::check_sample_name(&request.name).map_err(reject)?;
    validation::check_email(&request.email).map_err(reject)?;
    if !app.settings.running_options.contains(&request.running_option) {
        return Err(reject(SampleFlowError::InvalidRunningOption(
            request.running_option,
        )));
    }
    let date = today();
    if !batch::submission_open(date, app.settings.last_submission_day) {
        return Err((
            Status::BadRequest,
            Message::new("Sample submission is closed for this week."),
        ));
    }
    let mut allocator = app.allocator_for(date);
    let sample = allocator.add_sample(request, date).map_err(reject)?;
    info!("  -> assigned {}", sample.primary_key);
    Ok(Json(sample))
}

#[get("/samples?<email>")]
fn samples(app: &State<App>, email: String) -> Json<Vec<Sample>> {
    let allocator = app.allocator_for(today());
    Json(allocator.get_samples(&email))
}

/// Called by the artifact pipeline once it has produced an output for a
/// sample. Only ever sets flags; sample identity is untouchable here.
#[post("/admin/result", data = "<request>")]
fn update_result(
    app: &State<App>,
    request: Json<FlagUpdateRequest>,
) -> std::result::Result<Json<Message>, (Status, Json<Message>)> {
    let request = request.into_inner();
    info!("Result update for '{}'", request.primary_key);
    if !request.value {
        return Err((
            Status::BadRequest,
            Message::new("Completion flags can only be set, never cleared"),
        ));
    }
    let mut allocator = app.allocator_for(today());
    allocator
        .set_flag(&request.primary_key, request.flag_name)
        .map_err(reject)?;
    Ok(Message::new(&format!(
        "Flag set for '{}'",
        request.primary_key
    )))
}

/// Resolves the filename of a generated result artifact, if the pipeline
/// has produced it. Serving the file itself is the file server's job.
#[post("/result", data = "<request>")]
fn result_filename(
    app: &State<App>,
    request: Json<ResultRequest>,
) -> std::result::Result<Json<FilenameResponse>, (Status, Json<Message>)> {
    let request = request.into_inner();
    if !["fasta", "gbk", "zip"].contains(&request.filetype.as_str()) {
        return Err((
            Status::BadRequest,
            Message::new(&format!("Invalid filetype {} requested", request.filetype)),
        ));
    }
    info!(
        "User {} requesting {} results for key {}",
        request.email, request.filetype, request.primary_key
    );
    let allocator = app.allocator_for(today());
    let sample = allocator
        .get_sample(&request.primary_key)
        .filter(|s| s.email == request.email)
        .ok_or_else(|| (Status::NotFound, Message::new("Sample not found")))?;
    let available = match request.filetype.as_str() {
        "fasta" => sample.has_results_fasta,
        "gbk" => sample.has_results_gbk,
        _ => sample.has_results_zip,
    };
    if !available {
        return Err((
            Status::NotFound,
            Message::new(&format!("No {} results available", request.filetype)),
        ));
    }
    Ok(Json(FilenameResponse {
        filename: sample.results_filename(&request.filetype),
    }))
}

/// Resolves the filename of the reference sequence archive the submitter
/// handed in with the sample, if any.
#[post("/reference_sequence", data = "<request>")]
fn reference_sequence(
    app: &State<App>,
    request: Json<ReferenceSequenceRequest>,
) -> std::result::Result<Json<FilenameResponse>, (Status, Json<Message>)> {
    let request = request.into_inner();
    info!(
        "User {} requesting reference sequence with key {}",
        request.email, request.primary_key
    );
    let allocator = app.allocator_for(today());
    let sample = allocator
        .get_sample(&request.primary_key)
        .filter(|s| s.email == request.email)
        .ok_or_else(|| (Status::NotFound, Message::new("Sample not found")))?;
    if !sample.has_reference_seq_zip {
        return Err((
            Status::NotFound,
            Message::new("Sample does not contain a reference sequence"),
        ));
    }
    Ok(Json(FilenameResponse {
        filename: sample.reference_seq_filename(),
    }))
}

pub fn rocket(app: App) -> rocket::Rocket<rocket::Build> {
    let figment = rocket::Config::figment();
    rocket::custom(figment).manage(app).mount(
        "/api",
        routes![
            remaining,
            running_options,
            get_settings,
            signup,
            login,
            add_sample,
            samples,
            update_result,
            result_filename,
            reference_sequence
        ],
    )
}

pub fn serve(app: App) {
    if let Err(e) = rocket::execute(rocket(app).launch()) {
        error!("Could not launch rocket: {}", e);
    }
}
