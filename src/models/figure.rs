use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Plotly-compatible figure document. The dashboard page hands it straight to
/// `Plotly.newPlot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceMode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub mode: TraceMode,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

impl Trace {
    pub fn scatter(name: impl Into<String>, mode: TraceMode, x: Vec<NaiveDate>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter".to_string(),
            name: name.into(),
            mode,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: AxisTitle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: AxisTitle,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

impl Layout {
    pub fn new(title: impl Into<String>, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
        Self {
            title: AxisTitle { text: title.into() },
            xaxis: Axis {
                title: AxisTitle { text: x_title.into() },
            },
            yaxis: Axis {
                title: AxisTitle { text: y_title.into() },
            },
        }
    }
}
