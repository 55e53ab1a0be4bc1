//! Mock diagram cleanup.
//!
//! Produces a fixed three-step flowchart as canvas drawing commands. The
//! submitted image is only checked for being valid base64.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

const STEPS: [&str; 3] = ["Start", "Process", "End"];
const ORIGIN_X: i64 = 50;
const ORIGIN_Y: i64 = 50;
const BOX_WIDTH: i64 = 200;
const BOX_HEIGHT: i64 = 100;
const SPACING: i64 = 50;
const FONT_SIZE: i64 = 14;
const STROKE_COLOR: &str = "#000000";
const STROKE_WIDTH: i64 = 2;

/// A single canvas drawing command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawCommand {
    Rectangle {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        color: &'static str,
        #[serde(rename = "lineWidth")]
        line_width: i64,
    },
    Text {
        x: i64,
        y: i64,
        text: &'static str,
        #[serde(rename = "fontSize")]
        font_size: i64,
        color: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    Line {
        start_x: i64,
        start_y: i64,
        end_x: i64,
        end_y: i64,
        color: &'static str,
        line_width: i64,
    },
}

/// Decodes the submitted image. Returns its size in bytes.
///
/// Bytes outside the base64 alphabet (line breaks, data-URL noise) are
/// skipped before decoding; padding must still be correct.
pub fn decode_image(image_data: &str) -> Result<usize, base64::DecodeError> {
    let cleaned: Vec<u8> = image_data
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        .collect();
    STANDARD.decode(cleaned).map(|bytes| bytes.len())
}

/// Builds the flowchart: a box and label per step, joined by connectors.
pub fn cleanup_commands() -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(STEPS.len() * 3 - 1);
    let mut x = ORIGIN_X;
    let y = ORIGIN_Y;

    for (i, step) in STEPS.iter().enumerate() {
        commands.push(DrawCommand::Rectangle {
            x,
            y,
            width: BOX_WIDTH,
            height: BOX_HEIGHT,
            color: STROKE_COLOR,
            line_width: STROKE_WIDTH,
        });
        commands.push(DrawCommand::Text {
            x: x + BOX_WIDTH / 2,
            y: y + BOX_HEIGHT / 2 + 5,
            text: *step,
            font_size: FONT_SIZE,
            color: STROKE_COLOR,
        });
        if i + 1 < STEPS.len() {
            commands.push(DrawCommand::Line {
                start_x: x + BOX_WIDTH,
                start_y: y + BOX_HEIGHT / 2,
                end_x: x + BOX_WIDTH + SPACING,
                end_y: y + BOX_HEIGHT / 2,
                color: STROKE_COLOR,
                line_width: STROKE_WIDTH,
            });
        }
        x += BOX_WIDTH + SPACING;
    }

    commands
}
