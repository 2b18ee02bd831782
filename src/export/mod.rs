//! Export Module
//!
//! Writes completed measurements to JSON and CSV so they can be inspected
//! after the session is gone.

use bevy::prelude::*;
use bevy_egui::EguiContexts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::measure::MeasurementSession;
use crate::paths;

/// One completed measurement as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportedMeasurement {
    pub index: usize,
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub distance_m: f64,
    pub text: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Flat row for CSV, which cannot hold nested arrays.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    index: usize,
    start_x: f32,
    start_y: f32,
    start_z: f32,
    end_x: f32,
    end_y: f32,
    end_z: f32,
    distance_m: f64,
    text: &'a str,
    started_at: String,
    completed_at: String,
}

impl<'a> From<&'a ExportedMeasurement> for CsvRow<'a> {
    fn from(m: &'a ExportedMeasurement) -> Self {
        Self {
            index: m.index,
            start_x: m.start[0],
            start_y: m.start[1],
            start_z: m.start[2],
            end_x: m.end[0],
            end_y: m.end[1],
            end_z: m.end[2],
            distance_m: m.distance_m,
            text: &m.text,
            started_at: m.started_at.to_rfc3339(),
            completed_at: m.completed_at.to_rfc3339(),
        }
    }
}

/// Snapshot the completed measurements with their current anchor positions.
pub fn collect_measurements(session: &MeasurementSession) -> Vec<ExportedMeasurement> {
    session
        .completed()
        .iter()
        .enumerate()
        .filter_map(|(i, pair)| {
            let start = session.anchor(pair.start())?;
            let end = session.anchor(pair.end())?;
            Some(ExportedMeasurement {
                index: i + 1,
                start: start.position.to_array(),
                end: end.position.to_array(),
                distance_m: pair.distance().0,
                text: pair.distance().readout().inline(),
                started_at: start.created_at,
                completed_at: end.created_at,
            })
        })
        .collect()
}

pub fn export_to_json(measurements: &[ExportedMeasurement], output_path: &Path) -> Result<(), String> {
    let file = File::create(output_path).map_err(|e| format!("Failed to create file: {}", e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, measurements)
        .map_err(|e| format!("Failed to serialize measurements: {}", e))?;
    writer.flush().map_err(|e| format!("Write error: {}", e))
}

pub fn export_to_csv(measurements: &[ExportedMeasurement], output_path: &Path) -> Result<(), String> {
    let mut writer =
        csv::Writer::from_path(output_path).map_err(|e| format!("Failed to create file: {}", e))?;
    for m in measurements {
        writer
            .serialize(CsvRow::from(m))
            .map_err(|e| format!("Write error: {}", e))?;
    }
    writer.flush().map_err(|e| format!("Write error: {}", e))
}

/// Write both formats into `dir`, named after `stamp`.
pub fn export_session(
    session: &MeasurementSession,
    dir: &Path,
    stamp: &str,
) -> Result<Vec<PathBuf>, String> {
    let measurements = collect_measurements(session);
    if measurements.is_empty() {
        return Err("No completed measurements to export".to_string());
    }

    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create export directory: {}", e))?;
    }

    let json_path = dir.join(format!("measurements_{}.json", stamp));
    let csv_path = dir.join(format!("measurements_{}.csv", stamp));
    export_to_json(&measurements, &json_path)?;
    export_to_csv(&measurements, &csv_path)?;
    Ok(vec![json_path, csv_path])
}

/// Resource for export state
#[derive(Resource, Default)]
pub struct ExportState {
    /// Status message
    pub status_message: Option<String>,
}

/// `E` exports the completed measurements.
pub fn export_on_key(
    keyboard: Res<ButtonInput<KeyCode>>,
    session: Res<MeasurementSession>,
    mut state: ResMut<ExportState>,
    mut contexts: EguiContexts,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_keyboard_input() {
            return;
        }
    }

    if !keyboard.just_pressed(KeyCode::KeyE) {
        return;
    }

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    match export_session(&session, &paths::data_dir(), &stamp) {
        Ok(written) => {
            info!("Exported {} measurements to {:?}", session.completed().len(), written);
            state.status_message = Some(format!("Exported {} measurements", session.completed().len()));
        }
        Err(e) => {
            warn!("Export failed: {}", e);
            state.status_message = Some(e);
        }
    }
}

pub struct ExportPlugin;

impl Plugin for ExportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExportState>()
            .add_systems(Update, export_on_key);
    }
}
