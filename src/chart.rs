use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::config::Style;
use crate::models::{HourlyRecord, HourlyTable};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    #[default]
    Scatter,
}

/// Axis data and presentation metadata for one chart
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub x: Vec<DateTime<Utc>>,
    pub y: Vec<f64>,
    pub kind: ChartKind,
    pub title: String,
    pub y_title: String,
}

impl ChartSpec {
    /// Builds a chart from one table column against the datetime axis
    ///
    /// # Arguments
    ///
    /// * 'table' - the hourly table
    /// * 'kind' - chart kind
    /// * 'title' - chart title
    /// * 'y_title' - name of the plotted column
    /// * 'y_fn' - function that picks out the column from a record
    pub fn from_table(table: &HourlyTable, kind: ChartKind, title: &str, y_title: &str, y_fn: fn(&HourlyRecord) -> f64) -> ChartSpec {
        ChartSpec {
            x: table.datetimes(),
            y: table.column(y_fn),
            kind,
            title: title.to_string(),
            y_title: y_title.to_string(),
        }
    }

    /// Temperature per hour
    ///
    pub fn temperature(table: &HourlyTable, kind: ChartKind) -> ChartSpec {
        ChartSpec::from_table(table, kind, "Temperature", "temperature", |r| r.temperature)
    }

    /// Rain intensity in mm/h per hour
    ///
    pub fn precipitation(table: &HourlyTable) -> ChartSpec {
        ChartSpec::from_table(table, ChartKind::Bar, "Rain in mm/h", "precipIntensity", |r| r.precip_intensity)
    }

    /// Returns a plotly-compatible figure with the values as a continuous color scale
    ///
    /// # Arguments
    ///
    /// * 'style' - dashboard style, only the template and font are used here
    pub fn to_figure(&self, style: &Style) -> Value {
        let x: Vec<String> = self.x.iter().map(|d| d.to_rfc3339()).collect();
        let color = json!({ "color": self.y, "colorscale": "Viridis", "showscale": true });

        let trace = match self.kind {
            ChartKind::Scatter => json!({ "type": "scatter", "mode": "markers", "x": x, "y": self.y, "marker": color }),
            ChartKind::Line => json!({ "type": "scatter", "mode": "lines", "x": x, "y": self.y }),
            ChartKind::Bar => json!({ "type": "bar", "x": x, "y": self.y, "marker": color }),
        };

        json!({
            "data": [trace],
            "layout": {
                "title": { "text": self.title },
                "template": style.template,
                "font": { "family": style.font },
                "xaxis": { "title": { "text": "datetime" }, "type": "date" },
                "yaxis": { "title": { "text": self.y_title } },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::unix_to_hours;

    fn table(data: &[(i64, f64, f64)]) -> HourlyTable {
        HourlyTable::new(data.iter().map(|&(time, temperature, precip_intensity)| HourlyRecord {
            time,
            temperature,
            precip_intensity,
            datetime: unix_to_hours(time).unwrap(),
        }).collect())
    }

    #[test]
    fn test_temperature_chart() {
        let t = table(&[(1700000000, 5.0, 0.1), (1700003600, 6.0, 0.0)]);
        let chart = ChartSpec::temperature(&t, ChartKind::Scatter);

        assert_eq!(chart.kind, ChartKind::Scatter);
        assert_eq!(chart.x.len(), 2);
        assert_eq!(chart.y, vec![5.0, 6.0]);
        assert_eq!(chart.title, "Temperature");
    }

    #[test]
    fn test_precipitation_chart() {
        let t = table(&[(1700003600, 6.0, 0.0), (1700000000, 5.0, 0.1)]);
        let chart = ChartSpec::precipitation(&t);

        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.y, vec![0.1, 0.0]);
        assert!(chart.x[0] < chart.x[1]);
    }

    #[test]
    fn test_axis_length_matches_records() {
        let data: Vec<(i64, f64, f64)> = (0..48).map(|h| (1700000000 + h * 3600, h as f64, 0.0)).collect();
        let chart = ChartSpec::temperature(&table(&data), ChartKind::Scatter);

        assert_eq!(chart.x.len(), 48);
        assert_eq!(chart.y.len(), 48);
        assert!(chart.x.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_figure_shape() {
        let chart = ChartSpec::precipitation(&table(&[(1700000000, 5.0, 0.1)]));
        let figure = chart.to_figure(&Style::defaults());

        assert_eq!(figure["data"][0]["type"], "bar");
        assert_eq!(figure["data"][0]["x"][0], "2023-11-14T22:13:20+00:00");
        assert_eq!(figure["data"][0]["y"][0], 0.1);
        assert_eq!(figure["layout"]["template"], "plotly_white");
        assert_eq!(figure["layout"]["title"]["text"], "Rain in mm/h");
    }

    #[test]
    fn test_line_figure_has_no_color_scale() {
        let chart = ChartSpec::temperature(&table(&[(1700000000, 5.0, 0.1)]), ChartKind::Line);
        let figure = chart.to_figure(&Style::defaults());

        assert_eq!(figure["data"][0]["mode"], "lines");
        assert!(figure["data"][0]["marker"].is_null());
    }
}
