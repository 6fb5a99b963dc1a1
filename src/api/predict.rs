//! Landing page and the prediction form

use axum::{extract::State, response::Html};
use serde::Deserialize;
use tracing::info;

use super::state::AppState;
use super::types::{ApiError, Form};
use crate::domain::record::{PublicationDay, PublicationTime, RawRecord};

/// Fields posted by the prediction form
///
/// Every field defaults to empty so a missing input is reported by record
/// validation rather than as a form rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictForm {
    #[serde(rename = "Podcast_Name", default)]
    pub podcast_name: String,
    #[serde(rename = "Episode_Length_minutes", default)]
    pub episode_length_minutes: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Publication_Day", default)]
    pub publication_day: String,
    #[serde(rename = "Publication_Time", default)]
    pub publication_time: String,
}

impl PredictForm {
    pub fn to_record(&self) -> Result<RawRecord, ApiError> {
        let raw_length = self.episode_length_minutes.trim();
        if raw_length.is_empty() {
            return Err(ApiError::bad_request("Missing required field: Episode_Length_minutes")
                .with_field("Episode_Length_minutes"));
        }
        let episode_length_minutes: f64 = raw_length.parse().map_err(|_| {
            ApiError::bad_request(format!(
                "Episode_Length_minutes must be a number, got '{}'",
                raw_length
            ))
            .with_field("Episode_Length_minutes")
        })?;

        RawRecord::builder()
            .podcast_name(self.podcast_name.trim())
            .episode_length_minutes(episode_length_minutes)
            .genre(self.genre.trim())
            .publication_day(self.publication_day.as_str())
            .publication_time(self.publication_time.as_str())
            .build()
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

pub async fn index() -> Html<String> {
    Html(page(
        "Podcast Listening Time",
        "<p>Estimate how many minutes listeners will spend on an episode.</p>\
         <p><a href=\"/predict\">Make a prediction</a></p>",
    ))
}

pub async fn predict_form() -> Html<String> {
    Html(page("Predict Listening Time", &form_html(&PredictForm::default())))
}

/// Predicts, stores the request with its prediction, and renders the result
pub async fn predict_submit(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>, ApiError> {
    let record = form.to_record()?;

    let prediction = state.prediction_service.predict(&record).await?;
    let (request, entry) = state
        .request_store
        .record_prediction(&record, prediction)
        .await?;

    info!(
        data_id = request.id,
        pred_id = entry.pred_id,
        prediction,
        "Served prediction"
    );

    let body = format!(
        "{}<section id=\"result\"><h2>Predicted listening time</h2>\
         <p class=\"prediction\">{:.2} minutes</p>{}</section>",
        form_html(&form),
        prediction,
        submitted_table(&record)
    );
    Ok(Html(page("Predict Listening Time", &body)))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title}</title></head><body><h1>{title}</h1>{body}</body></html>",
        title = escape_html(title),
        body = body
    )
}

fn form_html(form: &PredictForm) -> String {
    let days: Vec<&str> = PublicationDay::ALL.iter().map(|d| d.as_str()).collect();
    let times: Vec<&str> = PublicationTime::ALL.iter().map(|t| t.as_str()).collect();

    format!(
        "<form method=\"post\" action=\"/predict\">\
         {name}{length}{genre}{day}{time}\
         <button type=\"submit\">Predict</button></form>",
        name = text_input("Podcast_Name", "text", &form.podcast_name),
        length = text_input("Episode_Length_minutes", "number", &form.episode_length_minutes),
        genre = text_input("Genre", "text", &form.genre),
        day = select("Publication_Day", &days, &form.publication_day),
        time = select("Publication_Time", &times, &form.publication_time),
    )
}

fn text_input(name: &str, kind: &str, value: &str) -> String {
    let step = if kind == "number" { " step=\"any\" min=\"0\"" } else { "" };
    format!(
        "<label>{name} <input type=\"{kind}\" name=\"{name}\" value=\"{value}\"{step} required></label><br>",
        name = name,
        kind = kind,
        value = escape_html(value),
        step = step
    )
}

fn select(name: &str, options: &[&str], selected: &str) -> String {
    let options: String = options
        .iter()
        .map(|option| {
            let marker = if option.eq_ignore_ascii_case(selected.trim()) {
                " selected"
            } else {
                ""
            };
            format!("<option value=\"{0}\"{1}>{0}</option>", option, marker)
        })
        .collect();

    format!(
        "<label>{name} <select name=\"{name}\">{options}</select></label><br>",
        name = name,
        options = options
    )
}

fn submitted_table(record: &RawRecord) -> String {
    let length = record
        .episode_length_minutes
        .map(|m| m.to_string())
        .unwrap_or_default();
    let rows = [
        ("Podcast_Name", record.podcast_name.clone()),
        ("Episode_Length_minutes", length),
        ("Genre", record.genre.clone()),
        ("Publication_Day", record.publication_day.as_str().to_string()),
        ("Publication_Time", record.publication_time.as_str().to_string()),
    ];

    let body: String = rows
        .iter()
        .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>", k, escape_html(v)))
        .collect();
    format!("<table>{}</table>", body)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
