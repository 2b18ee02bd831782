use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::measure::{MeasurementAssets, MeasurementSession, SceneVisuals};

/// Measurement shortcuts that are not part of the XR input stream.
pub fn handle_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut session: ResMut<MeasurementSession>,
    assets: Option<Res<MeasurementAssets>>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    // Check if egui wants keyboard input (e.g., typing in a text field)
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.wants_keyboard_input() {
            return;
        }
    }

    let Some(assets) = assets else {
        return;
    };
    let mut visuals = SceneVisuals::new(&mut commands, &assets);

    // Backspace - Abandon the measurement in progress
    if keyboard.just_pressed(KeyCode::Backspace) && !session.cancel_pairing(&mut visuals) {
        debug!("Nothing to cancel");
    }

    // Delete - Remove the most recent measurement
    if keyboard.just_pressed(KeyCode::Delete) && session.remove_last(&mut visuals).is_none() {
        debug!("No measurement to remove");
    }
}
