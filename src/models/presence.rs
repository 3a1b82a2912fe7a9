use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Last reported pointer position of a participant within a document.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, ToSchema)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
    pub page: u32,
}

impl Default for CursorPosition {
    fn default() -> Self {
        // New connections start at the top of page 1.
        Self { x: 0.0, y: 0.0, page: 1 }
    }
}
