use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::camera::SceneCamera;
use crate::config::AppConfig;
use crate::export::ExportState;
use crate::measure::{LiveReadout, MeasurementLabel, MeasurementSession, SessionState};
use crate::xr::XrSupport;

/// Font size for the secondary overlay text.
const SMALL_FONT: f32 = 11.0;

const HELP_TEXT: &str = "Click: place point | Backspace: cancel | Delete: remove last | E: export | X: end session";

/// Everything the measurement panel shows, detached from Bevy resources so
/// it can be rendered in tests.
#[derive(Debug, Clone, Default)]
pub struct OverlaySnapshot {
    pub status: String,
    pub supported: bool,
    pub state: Option<SessionState>,
    pub readout: Option<String>,
    pub measurements: Vec<String>,
    pub export_status: Option<String>,
}

impl OverlaySnapshot {
    pub fn capture(
        support: Option<&XrSupport>,
        session: &MeasurementSession,
        readout: &LiveReadout,
        export: &ExportState,
    ) -> Self {
        Self {
            status: support.map(XrSupport::status).unwrap_or_else(|| "AR: starting".to_string()),
            supported: support.is_some_and(|s| !matches!(s, XrSupport::Unsupported(_))),
            state: Some(session.state()),
            readout: readout.text.clone(),
            measurements: session
                .completed()
                .iter()
                .map(|pair| pair.distance().readout().inline())
                .collect(),
            export_status: export.status_message.clone(),
        }
    }
}

/// Draw the measurement panel contents.
pub fn render_measurement_panel(ui: &mut egui::Ui, snapshot: &OverlaySnapshot) {
    let status_color = if snapshot.supported {
        egui::Color32::LIGHT_GREEN
    } else {
        egui::Color32::LIGHT_RED
    };
    ui.label(egui::RichText::new(&snapshot.status).color(status_color).strong());

    if !snapshot.supported {
        return;
    }

    match snapshot.state {
        Some(SessionState::Pairing) => {
            ui.label("Tap to set the end point");
        }
        _ => {
            ui.label("Tap to set a start point");
        }
    }

    if let Some(text) = &snapshot.readout {
        ui.separator();
        for line in text.lines() {
            ui.label(egui::RichText::new(line).color(egui::Color32::WHITE).strong());
        }
    }

    if !snapshot.measurements.is_empty() {
        ui.separator();
        ui.label(egui::RichText::new("Measurements").color(egui::Color32::YELLOW));
        for (i, text) in snapshot.measurements.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("{}.", i + 1));
                ui.label(text);
            });
        }
    }

    if let Some(status) = &snapshot.export_status {
        ui.separator();
        ui.label(egui::RichText::new(status).size(SMALL_FONT).color(egui::Color32::LIGHT_GRAY));
    }

    ui.separator();
    ui.label(egui::RichText::new(HELP_TEXT).size(SMALL_FONT).color(egui::Color32::GRAY));
}

pub fn render_overlay(
    mut contexts: EguiContexts,
    support: Option<Res<XrSupport>>,
    session: Res<MeasurementSession>,
    readout: Res<LiveReadout>,
    export: Res<ExportState>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let snapshot = OverlaySnapshot::capture(support.as_deref(), &session, &readout, &export);

    egui::Window::new("Measure")
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            render_measurement_panel(ui, &snapshot);
        });
}

/// Floating labels at each measurement's world position.
pub fn render_measurement_labels(
    mut contexts: EguiContexts,
    config: Res<AppConfig>,
    camera_query: Query<(&Camera, &GlobalTransform), With<SceneCamera>>,
    labels: Query<(Entity, &MeasurementLabel)>,
) {
    if !config.measurement.show_labels {
        return;
    }

    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    for (entity, label) in labels.iter() {
        let Some(position) = label.position else {
            continue;
        };
        if label.text.is_empty() {
            continue;
        }
        let Ok(screen) = camera.world_to_viewport(camera_transform, position) else {
            continue;
        };

        egui::Area::new(egui::Id::new(("measurement_label", entity)))
            .fixed_pos(egui::pos2(screen.x, screen.y))
            .pivot(egui::Align2::CENTER_CENTER)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(30, 30, 30, 200))
                    .show(ui, |ui| {
                        for line in label.text.lines() {
                            ui.label(egui::RichText::new(line).color(egui::Color32::WHITE).size(SMALL_FONT));
                        }
                    });
            });
    }
}

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            EguiPrimaryContextPass,
            (render_overlay, render_measurement_labels),
        );
    }
}
