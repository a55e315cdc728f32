//! Client for the OpenF1 timing API.

use super::{HttpFetcher, RawDocument};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A session (practice, qualifying, race) of a race weekend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub session_key: Option<u64>,
    pub session_type: Option<String>,
    pub session_name: Option<String>,
    pub date_start: Option<String>,
    pub meeting_key: Option<u64>,
    pub location: Option<String>,
    pub country_name: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Driver {
    pub driver_number: Option<u32>,
    pub full_name: Option<String>,
    pub team_name: Option<String>,
    pub country_code: Option<String>,
    pub session_key: Option<u64>,
}

/// A race weekend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Meeting {
    pub meeting_key: Option<u64>,
    pub meeting_name: Option<String>,
    pub location: Option<String>,
    pub country_name: Option<String>,
    pub date_start: Option<String>,
}

/// Classified result of one driver in a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceResult {
    pub session_key: Option<u64>,
    pub position: Option<u32>,
    pub driver_number: Option<u32>,
    pub points: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Lap {
    pub session_key: Option<u64>,
    pub driver_number: Option<u32>,
    pub lap_number: Option<u32>,
    pub lap_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub session_key: Option<u64>,
    pub driver_number: Option<u32>,
    pub position: Option<u32>,
    pub date: Option<String>,
}

/// Everything fetched for one season.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenF1Data {
    pub season: i32,
    pub sessions: Vec<Session>,
    pub drivers: Vec<Driver>,
    pub meetings: Vec<Meeting>,
    pub race_results: Vec<RaceResult>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Number of most recent race sessions whose results are fetched.
const LATEST_RACES: usize = 5;

/// Thin client over the OpenF1 REST endpoints.
pub struct OpenF1Client {
    http: HttpFetcher,
    base_url: String,
}

impl OpenF1Client {
    pub fn new(http: HttpFetcher, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    pub async fn sessions(&self, year: i32) -> Result<Vec<Session>> {
        let sessions: Vec<Session> = self
            .http
            .get_json(&self.endpoint("sessions"), &[("year", year.to_string())])
            .await?;
        tracing::debug!("Retrieved {} sessions from OpenF1", sessions.len());
        Ok(sessions)
    }

    pub async fn drivers(&self, session_key: Option<u64>) -> Result<Vec<Driver>> {
        let query: Vec<(&str, String)> = session_key
            .map(|key| vec![("session_key", key.to_string())])
            .unwrap_or_default();
        self.http.get_json(&self.endpoint("drivers"), &query).await
    }

    pub async fn laps(&self, session_key: u64, limit: usize) -> Result<Vec<Lap>> {
        self.http
            .get_json(
                &self.endpoint("laps"),
                &[("session_key", session_key.to_string()), ("limit", limit.to_string())],
            )
            .await
    }

    pub async fn results(&self, session_key: u64) -> Result<Vec<RaceResult>> {
        self.http
            .get_json(&self.endpoint("results"), &[("session_key", session_key.to_string())])
            .await
    }

    pub async fn meetings(&self, year: i32) -> Result<Vec<Meeting>> {
        self.http
            .get_json(&self.endpoint("meetings"), &[("year", year.to_string())])
            .await
    }

    pub async fn positions(&self, session_key: u64) -> Result<Vec<Position>> {
        self.http
            .get_json(&self.endpoint("position"), &[("session_key", session_key.to_string())])
            .await
    }

    /// Sessions, drivers, meetings and the results of the latest races of a season.
    ///
    /// Each endpoint is best effort; a failing one leaves its list empty.
    #[tracing::instrument(skip(self))]
    pub async fn comprehensive_data(&self, year: i32) -> OpenF1Data {
        let sessions = self.sessions(year).await.unwrap_or_else(|e| {
            tracing::warn!("OpenF1 sessions failed: {}", e);
            Vec::new()
        });
        let drivers = self.drivers(None).await.unwrap_or_else(|e| {
            tracing::warn!("OpenF1 drivers failed: {}", e);
            Vec::new()
        });
        let meetings = self.meetings(year).await.unwrap_or_else(|e| {
            tracing::warn!("OpenF1 meetings failed: {}", e);
            Vec::new()
        });

        let mut race_sessions: Vec<&Session> = sessions
            .iter()
            .filter(|s| s.session_type.as_deref() == Some("Race"))
            .collect();
        race_sessions.sort_by(|a, b| b.date_start.cmp(&a.date_start));

        let mut race_results = Vec::new();
        for session in race_sessions.into_iter().take(LATEST_RACES) {
            let Some(key) = session.session_key else { continue };
            match self.results(key).await {
                Ok(results) => race_results.extend(results),
                Err(e) => tracing::warn!("OpenF1 results for session {} failed: {}", key, e),
            }
        }

        tracing::info!(
            "OpenF1: {} sessions, {} drivers, {} meetings, {} results",
            sessions.len(),
            drivers.len(),
            meetings.len(),
            race_results.len()
        );

        OpenF1Data {
            season: year,
            sessions,
            drivers,
            meetings,
            race_results,
            timestamp: Some(Utc::now()),
        }
    }

    /// Turn fetched data into documents: a roster, per-race results and a calendar.
    pub fn format_for_rag(&self, data: &OpenF1Data) -> Vec<RawDocument> {
        let mut documents = Vec::new();

        if !data.drivers.is_empty() {
            // The unfiltered endpoint repeats drivers per session; keep the latest entry.
            let mut roster: BTreeMap<u32, &Driver> = BTreeMap::new();
            let mut unnumbered = Vec::new();
            for driver in &data.drivers {
                match driver.driver_number {
                    Some(number) => {
                        roster.insert(number, driver);
                    }
                    None => unnumbered.push(driver),
                }
            }

            let mut content = format!("Formula 1 Drivers {}:\n", data.season);
            for driver in roster.values().chain(unnumbered.iter()) {
                content.push_str(&format!(
                    "• {} (#{}) - {} - {}\n",
                    driver.full_name.as_deref().unwrap_or("Unknown Driver"),
                    driver
                        .driver_number
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    driver.team_name.as_deref().unwrap_or("Unknown Team"),
                    driver.country_code.as_deref().unwrap_or("Unknown"),
                ));
            }

            documents.push(
                RawDocument::new(
                    &format!("Current F1 Drivers {}", data.season),
                    &content,
                    &self.endpoint("drivers"),
                    "OpenF1 API",
                    "driver_data",
                )
                .scraped_now(),
            );
        }

        let mut by_session: BTreeMap<u64, Vec<&RaceResult>> = BTreeMap::new();
        for result in &data.race_results {
            if let Some(key) = result.session_key {
                by_session.entry(key).or_default().push(result);
            }
        }

        for (session_key, mut results) in by_session {
            results.sort_by_key(|r| r.position.unwrap_or(999));

            let mut content = format!("Race Results for Race Session {}:\n", session_key);
            for result in results.iter().take(10) {
                content.push_str(&format!(
                    "{}. Driver #{} - {} points\n",
                    result
                        .position
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    result
                        .driver_number
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    result.points.unwrap_or(0.0),
                ));
            }

            documents.push(
                RawDocument::new(
                    &format!("F1 Race Results - Session {}", session_key),
                    &content,
                    &format!("{}?session_key={}", self.endpoint("results"), session_key),
                    "OpenF1 API",
                    "race_results",
                )
                .scraped_now(),
            );
        }

        if !data.meetings.is_empty() {
            let mut content = format!("Formula 1 {} Race Calendar:\n", data.season);
            for meeting in &data.meetings {
                content.push_str(&format!(
                    "• {} - {}, {} ({})\n",
                    meeting.meeting_name.as_deref().unwrap_or("Unknown Race"),
                    meeting.location.as_deref().unwrap_or("Unknown Location"),
                    meeting.country_name.as_deref().unwrap_or("Unknown Country"),
                    meeting.date_start.as_deref().unwrap_or("TBD"),
                ));
            }

            documents.push(
                RawDocument::new(
                    &format!("Formula 1 {} Race Calendar", data.season),
                    &content,
                    &self.endpoint("meetings"),
                    "OpenF1 API",
                    "race_calendar",
                )
                .scraped_now(),
            );
        }

        tracing::info!("Formatted {} documents from OpenF1 data", documents.len());
        documents
    }
}
