//! Form Description Route
//!
//! Describes the three input controls and the submit action so a client can
//! render the form. Rendering itself happens client-side.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// One input control
#[derive(Debug, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FormControl {
    Slider {
        name: &'static str,
        label: &'static str,
        min: i64,
        max: i64,
        default: i64,
    },
    Select {
        name: &'static str,
        label: &'static str,
        options: Vec<i64>,
    },
}

/// Response for the form endpoint
#[derive(Debug, Serialize)]
pub struct FormDescription {
    pub title: &'static str,
    pub description: &'static str,
    pub controls: Vec<FormControl>,
    pub submit: &'static str,
    pub action: &'static str,
}

/// Get the form description
pub async fn get_form(State(state): State<Arc<AppState>>) -> Json<FormDescription> {
    let limits = state.service.limits();

    Json(FormDescription {
        title: "Apprentice Status Prediction",
        description: "Fill in the information to predict the apprentice status.",
        controls: vec![
            FormControl::Slider {
                name: "age",
                label: "Age",
                min: limits.age.min,
                max: limits.age.max,
                default: limits.default_age,
            },
            FormControl::Select {
                name: "complaints",
                label: "Number of complaints",
                options: limits.complaints.options(),
            },
            FormControl::Select {
                name: "stratum",
                label: "Socioeconomic stratum",
                options: limits.stratum.options(),
            },
        ],
        submit: "Predict",
        action: "/api/v1/predict",
    })
}
