//! Dashboard Endpoint — serves the reading list and pushes live updates.
//!
//! `GET /` renders the filtered list server-side; `GET /events` is the SSE
//! push channel carrying one `new_data` event per ingested reading. A page
//! keeps its filter selection across reloads because the active filter state
//! is rendered back into the form.

use std::convert::Infallible;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::get,
    Router,
};
use chrono::Local;
use futures::Stream;
use log::{error, info, warn};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::db::{helpers::format_timestamp, models::Reading, Database};
use crate::ingest::LiveUpdate;

pub mod filters;

use filters::{resolve_range, RangeFilter};

/// Cap for the unfiltered path, used when no `filter` parameter is present.
const RECENT_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub live: broadcast::Sender<LiveUpdate>,
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    filter: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/events", get(events))
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind dashboard listener on {addr}"))?;
    info!("Dashboard listening on http://{addr}");
    axum::serve(listener, router(state))
        .await
        .context("dashboard server exited")
}

async fn index(State(state): State<AppState>, Query(query): Query<DashboardQuery>) -> Response {
    let readings = match &query.filter {
        // No filter requested at all: the recent-readings path.
        None => state.db.recent_readings(RECENT_LIMIT).await,
        Some(raw) => {
            let filter = RangeFilter::parse(raw);
            let now = Local::now().naive_local();
            match resolve_range(
                filter,
                query.start_date.as_deref(),
                query.end_date.as_deref(),
                now,
            ) {
                Ok((start, end)) => state.db.query_range(start, end).await,
                Err(err) => {
                    warn!("Rejected custom range: {err}");
                    return (
                        StatusCode::BAD_REQUEST,
                        Html(render_error_page(&err.to_string())),
                    )
                        .into_response();
                }
            }
        }
    };

    match readings {
        Ok(readings) => {
            let selected = query.filter.as_deref().map(RangeFilter::parse);
            Html(render_page(
                &readings,
                selected,
                query.start_date.as_deref().unwrap_or(""),
                query.end_date.as_deref().unwrap_or(""),
            ))
            .into_response()
        }
        Err(err) => {
            error!("Failed to query readings: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_error_page("failed to query readings")),
            )
                .into_response()
        }
    }
}

/// SSE stream of `new_data` events. Events are delivered at most once per
/// connected viewer; there is no backlog for late joiners.
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(live_events(state.live.subscribe())).keep_alive(KeepAlive::default())
}

/// The push-event name the dashboard page listens for.
const LIVE_EVENT_NAME: &str = "new_data";

fn encode_live_update(update: &LiveUpdate) -> Option<(&'static str, String)> {
    match serde_json::to_string(update) {
        Ok(json) => Some((LIVE_EVENT_NAME, json)),
        Err(err) => {
            error!("Failed to serialize live update: {err}");
            None
        }
    }
}

fn live_events(
    rx: broadcast::Receiver<LiveUpdate>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx)
        .filter_map(|msg| msg.ok())
        .filter_map(|update| {
            encode_live_update(&update)
                .map(|(name, json)| Ok(Event::default().event(name).data(json)))
        })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_page(
    readings: &[Reading],
    selected: Option<RangeFilter>,
    start_date: &str,
    end_date: &str,
) -> String {
    let effective = selected.unwrap_or_default();

    let mut options = String::new();
    for filter in [
        RangeFilter::Today,
        RangeFilter::Week,
        RangeFilter::Month,
        RangeFilter::Year,
        RangeFilter::Custom,
    ] {
        let marker = if filter == effective { " selected" } else { "" };
        let name = filter.as_str();
        options.push_str(&format!(
            "<option value=\"{name}\"{marker}>{}</option>",
            capitalize(name)
        ));
    }

    let mut rows = String::new();
    for reading in readings {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            format_timestamp(reading.timestamp),
            reading.value
        ));
    }
    if readings.is_empty() {
        rows.push_str("<tr class=\"empty\"><td colspan=\"2\">no readings in range</td></tr>");
    }

    PAGE_TEMPLATE
        .replace("{{filter_options}}", &options)
        .replace("{{start_date}}", &escape_attr(start_date))
        .replace("{{end_date}}", &escape_attr(end_date))
        .replace("{{rows}}", &rows)
}

fn render_error_page(message: &str) -> String {
    ERROR_TEMPLATE.replace("{{message}}", &escape_attr(message))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>sonda</title>
    <style>
      body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 640px; color: #1e293b; }
      h1 { font-size: 1.4rem; }
      form { display: flex; gap: 0.5rem; align-items: center; margin-bottom: 1rem; flex-wrap: wrap; }
      table { width: 100%; border-collapse: collapse; }
      th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #e2e8f0; }
      th { color: #64748b; font-size: 0.8rem; text-transform: uppercase; }
      .empty td { color: #94a3b8; font-style: italic; }
    </style>
  </head>
  <body>
    <h1>sonda readings</h1>
    <form method="get" action="/">
      <select name="filter">{{filter_options}}</select>
      <input type="date" name="start_date" value="{{start_date}}" />
      <input type="date" name="end_date" value="{{end_date}}" />
      <button type="submit">Apply</button>
    </form>
    <table>
      <thead><tr><th>Timestamp</th><th>Value</th></tr></thead>
      <tbody id="readings-body">{{rows}}</tbody>
    </table>
    <script>
      const source = new EventSource('/events');
      source.addEventListener('new_data', (e) => {
        const data = JSON.parse(e.data);
        const row = document.createElement('tr');
        const ts = document.createElement('td');
        ts.textContent = data.timestamp;
        const value = document.createElement('td');
        value.textContent = data.value;
        row.append(ts, value);
        const body = document.getElementById('readings-body');
        const placeholder = body.querySelector('.empty');
        if (placeholder) placeholder.remove();
        body.prepend(row);
      });
    </script>
  </body>
</html>
"#;

const ERROR_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>sonda — bad request</title>
  </head>
  <body>
    <h1>Bad request</h1>
    <p>{{message}}</p>
    <p><a href="/">Back to the dashboard</a></p>
  </body>
</html>
"#;
