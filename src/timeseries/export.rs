//! Export of time-series points as JSON, CSV, XML or a Plotly figure

use super::TimeSeriesPoint;
use crate::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Value, json};
use std::str::FromStr;

pub const CSV_HEADER: [&str; 7] =
    ["series_name", "parameter_name", "time_step", "timestamp", "value", "unit", "notes"];

/// Vertical gap between stacked unit panels, as a fraction of the plot.
const PANEL_SPACING: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
    Plotly,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Plotly => "plotly",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json | ExportFormat::Plotly => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xml => "application/xml",
        }
    }

    /// File name offered for download, `None` for inline formats.
    pub fn attachment_name(&self, experiment_id: i64) -> Option<String> {
        match self {
            ExportFormat::Csv => Some(format!("experiment_{experiment_id}_timeseries.csv")),
            ExportFormat::Xml => Some(format!("experiment_{experiment_id}_timeseries.xml")),
            ExportFormat::Json | ExportFormat::Plotly => None,
        }
    }

    /// Serialise `points` in this format.
    pub fn render(&self, experiment_id: i64, points: &[TimeSeriesPoint]) -> Result<String> {
        match self {
            ExportFormat::Json => to_json(points),
            ExportFormat::Csv => to_csv(points),
            ExportFormat::Xml => to_xml(experiment_id, points),
            ExportFormat::Plotly => serde_json::to_string(&plotly_figure(points))
                .map_err(|e| Error::Export(e.to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "plotly" => Ok(ExportFormat::Plotly),
            other => Err(Error::validation(format!(
                "unsupported export format '{other}' (expected json, csv, xml or plotly)"
            ))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn to_json(points: &[TimeSeriesPoint]) -> Result<String> {
    serde_json::to_string_pretty(points).map_err(|e| Error::Export(e.to_string()))
}

pub fn to_csv(points: &[TimeSeriesPoint]) -> Result<String> {
    let export_err = |e: csv::Error| Error::Export(e.to_string());
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(export_err)?;
    for p in points {
        let time_step = p.time_step.to_string();
        let value = p.value.to_string();
        writer
            .write_record([
                p.series_name.as_deref().unwrap_or(""),
                p.parameter_name.as_str(),
                time_step.as_str(),
                p.timestamp.as_deref().unwrap_or(""),
                value.as_str(),
                p.unit_str(),
                p.notes.as_deref().unwrap_or(""),
            ])
            .map_err(export_err)?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(e.to_string()))
}

pub fn to_xml(experiment_id: i64, points: &[TimeSeriesPoint]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let experiment = experiment_id.to_string();

    write_xml(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("timeseries");
    root.push_attribute(("experiment_id", experiment.as_str()));
    write_xml(&mut writer, Event::Start(root))?;

    for p in points {
        let time_step = p.time_step.to_string();
        let mut point = BytesStart::new("point");
        point.push_attribute(("parameter", p.parameter_name.as_str()));
        point.push_attribute(("unit", p.unit_str()));
        point.push_attribute(("time_step", time_step.as_str()));
        write_xml(&mut writer, Event::Start(point))?;

        let value = p.value.to_string();
        let children = [
            ("series_name", p.series_name.as_deref()),
            ("timestamp", p.timestamp.as_deref()),
            ("value", Some(value.as_str())),
            ("notes", p.notes.as_deref()),
        ];
        for (name, text) in children {
            match text {
                Some(text) => {
                    write_xml(&mut writer, Event::Start(BytesStart::new(name)))?;
                    write_xml(&mut writer, Event::Text(BytesText::new(text)))?;
                    write_xml(&mut writer, Event::End(BytesEnd::new(name)))?;
                }
                None => write_xml(&mut writer, Event::Empty(BytesStart::new(name)))?,
            }
        }
        write_xml(&mut writer, Event::End(BytesEnd::new("point")))?;
    }

    write_xml(&mut writer, Event::End(BytesEnd::new("timeseries")))?;
    String::from_utf8(writer.into_inner()).map_err(|e| Error::Export(e.to_string()))
}

fn write_xml(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|e| Error::Export(e.to_string()))
}

/// Plotly figure with one line trace per parameter. Parameters measured in
/// different units are stacked in separate panels sharing the time axis.
pub fn plotly_figure(points: &[TimeSeriesPoint]) -> Value {
    // Units and parameters in order of first appearance
    let mut units: Vec<&str> = Vec::new();
    let mut series: Vec<(&str, &str)> = Vec::new();
    for p in points {
        let unit = p.unit_str();
        if !units.contains(&unit) {
            units.push(unit);
        }
        if !series.contains(&(p.parameter_name.as_str(), unit)) {
            series.push((p.parameter_name.as_str(), unit));
        }
    }

    let multi = units.len() > 1;
    let traces: Vec<Value> = series
        .iter()
        .map(|&(param, unit)| {
            let (x, y): (Vec<i64>, Vec<f64>) = points
                .iter()
                .filter(|p| p.parameter_name == param && p.unit_str() == unit)
                .map(|p| (p.time_step, p.value))
                .unzip();
            let name = if unit.is_empty() { param.to_string() } else { format!("{param} ({unit})") };
            let mut trace = json!({
                "type": "scatter",
                "mode": "lines+markers",
                "name": name,
                "x": x,
                "y": y,
                "line": {"width": 2},
                "marker": {"size": 4},
            });
            if multi {
                let row = units.iter().position(|u| *u == unit).unwrap_or(0) + 1;
                trace["xaxis"] = json!("x");
                trace["yaxis"] = json!(axis_ref(row));
            }
            trace
        })
        .collect();

    let value_title = |unit: &str| {
        if unit.is_empty() { "Value".to_string() } else { format!("Value ({unit})") }
    };

    let mut layout = json!({
        "title": {"text": "Time Series Analysis"},
        "height": if multi { 400 * units.len() } else { 500 },
        "showlegend": true,
        "template": "plotly_white",
        "font": {"size": 12},
    });

    if multi {
        let n = units.len() as f64;
        let panel = (1.0 - PANEL_SPACING * (n - 1.0)) / n;
        let mut annotations = Vec::new();
        for (i, unit) in units.iter().enumerate() {
            let top = 1.0 - i as f64 * (panel + PANEL_SPACING);
            let bottom = (top - panel).max(0.0);
            let key = if i == 0 { "yaxis".to_string() } else { format!("yaxis{}", i + 1) };
            layout[key] = json!({
                "title": {"text": value_title(unit)},
                "domain": [bottom, top],
                "anchor": "x",
            });
            let title =
                if unit.is_empty() { "Dimensionless Parameters".to_string() } else { format!("Parameters in {unit}") };
            annotations.push(json!({
                "text": title,
                "xref": "paper",
                "yref": "paper",
                "x": 0.5,
                "y": top,
                "xanchor": "center",
                "yanchor": "bottom",
                "showarrow": false,
            }));
        }
        layout["xaxis"] = json!({
            "title": {"text": "Time Step"},
            "anchor": axis_ref(units.len()),
        });
        layout["annotations"] = Value::Array(annotations);
    } else {
        layout["xaxis"] = json!({"title": {"text": "Time Step"}});
        layout["yaxis"] = json!({"title": {"text": value_title(units.first().copied().unwrap_or(""))}});
    }

    json!({"data": traces, "layout": layout})
}

fn axis_ref(row: usize) -> String {
    if row <= 1 { "y".to_string() } else { format!("y{row}") }
}
