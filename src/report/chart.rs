#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Line,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
        }
    }
}

/// One channel's y-values, one entry per x-axis label.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Renderer-agnostic description of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Line smoothing hint. Cosmetic; renderers may ignore it.
    pub tension: Option<f64>,
}

impl ChartSpec {
    /// Number of points along the x axis.
    pub fn point_count(&self) -> usize {
        self.datasets
            .iter()
            .map(|dataset| dataset.data.len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_count_follows_longest_dataset() {
        let spec = ChartSpec {
            chart_type: ChartType::Line,
            labels: vec!["9:5".into(), "9:6".into()],
            datasets: vec![
                Dataset {
                    label: "Neutral".into(),
                    data: vec![0.1],
                },
                Dataset {
                    label: "Happy".into(),
                    data: vec![0.25, 0.5],
                },
            ],
            tension: Some(0.4),
        };
        assert_eq!(spec.point_count(), 2);
        assert_eq!(spec.chart_type.as_str(), "line");
    }

    #[test]
    fn chart_without_datasets_has_no_points() {
        let spec = ChartSpec {
            chart_type: ChartType::Bar,
            labels: vec!["all".into()],
            datasets: Vec::new(),
            tension: None,
        };
        assert_eq!(spec.point_count(), 0);
    }
}
