use super::{BarChart, Renderer, Rgb, ScatterPlot};
use anyhow::Result;
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::info;

/// Writes plots as PNG files into one directory.
pub struct BitmapRenderer {
    out_dir: PathBuf,
    dimensions: (u32, u32),
}

impl BitmapRenderer {
    /// 16x12 inch figures at 120 dpi.
    pub const DEFAULT_DIMENSIONS: (u32, u32) = (1920, 1440);

    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            dimensions: Self::DEFAULT_DIMENSIONS,
        })
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

impl Renderer for BitmapRenderer {
    fn scatter(&self, plot: &ScatterPlot) -> Result<()> {
        let path = self.out_dir.join(&plot.file_name);
        let root = BitMapBackend::new(&path, self.dimensions).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&plot.title, ("sans-serif", 40))
            .margin(40)
            .x_label_area_size(70)
            .y_label_area_size(100)
            .build_cartesian_2d(plot.bounds.x.clone(), plot.bounds.y.clone())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(plot.x_label.as_str())
            .y_desc(plot.y_label.as_str())
            .label_style(("sans-serif", 24))
            .draw()?;

        chart.draw_series(plot.points.iter().map(|p| {
            Circle::new((p.x, p.y), p.radius, rgb(p.color).mix(0.8).filled())
        }))?;

        root.present()?;
        info!(path = %path.display(), points = plot.points.len(), "Scatter plot written");
        Ok(())
    }

    fn bars(&self, bar_chart: &BarChart) -> Result<()> {
        let path = self.out_dir.join(&bar_chart.file_name);
        let root = BitMapBackend::new(&path, self.dimensions).into_drawing_area();
        root.fill(&WHITE)?;

        let count = bar_chart.bars.len();
        let mut chart = ChartBuilder::on(&root)
            .caption(&bar_chart.title, ("sans-serif", 40))
            .margin(40)
            .x_label_area_size(80)
            .y_label_area_size(100)
            .build_cartesian_2d(0..count.max(1), bar_chart.y_range.clone())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(count.clamp(1, 30))
            .x_label_formatter(&|idx| {
                bar_chart
                    .bars
                    .get(*idx)
                    .map(|b| b.category.clone())
                    .unwrap_or_default()
            })
            .x_desc(bar_chart.x_label.as_str())
            .y_desc(bar_chart.y_label.as_str())
            .label_style(("sans-serif", 24))
            .draw()?;

        chart.draw_series(bar_chart.bars.iter().enumerate().map(|(i, bar)| {
            Rectangle::new([(i, 0.0), (i + 1, bar.value)], BLUE.filled())
        }))?;

        root.present()?;
        info!(path = %path.display(), bars = count, "Bar chart written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::{Bar, Bounds, ScatterPoint};
    use std::fs;
    use tempdir::TempDir;

    fn written(dir: &TempDir, name: &str) -> u64 {
        fs::metadata(dir.path().join(name)).map(|m| m.len()).unwrap_or(0)
    }

    fn bar_chart(file_name: &str, bars: Vec<Bar>) -> BarChart {
        BarChart {
            file_name: file_name.to_string(),
            title: "Average Occupancy".to_string(),
            x_label: "Station Number".to_string(),
            y_label: "Average Occupancy".to_string(),
            y_range: 0.0..1.0,
            bars,
        }
    }

    #[test]
    fn test_scatter_writes_png() {
        let tmp = TempDir::new("bitmap-scatter").unwrap();
        let renderer = BitmapRenderer::new(tmp.path().join("diagrams")).unwrap();

        let plot = ScatterPlot {
            file_name: "s.png".to_string(),
            title: "Stations".to_string(),
            x_label: "Longitude".to_string(),
            y_label: "Latitude".to_string(),
            bounds: Bounds {
                x: -71.2..-71.0,
                y: 42.3..42.4,
            },
            points: vec![
                ScatterPoint { x: -71.1, y: 42.35, radius: 8, color: Rgb(255, 0, 0) },
                ScatterPoint { x: -71.05, y: 42.38, radius: 0, color: Rgb(31, 119, 180) },
            ],
        };
        renderer.scatter(&plot).unwrap();

        assert!(written(&tmp, "diagrams/s.png") > 0);
    }

    #[test]
    fn test_bar_charts_write_png_even_when_empty() {
        let tmp = TempDir::new("bitmap-bars").unwrap();
        let renderer = BitmapRenderer::new(tmp.path()).unwrap();

        let bars = vec![
            Bar { category: "1".to_string(), value: 0.42 },
            Bar { category: "2".to_string(), value: 0.0 },
            Bar { category: "10".to_string(), value: 0.9 },
        ];
        renderer.bars(&bar_chart("b.png", bars)).unwrap();
        renderer.bars(&bar_chart("e.png", Vec::new())).unwrap();

        assert!(written(&tmp, "b.png") > 0);
        assert!(written(&tmp, "e.png") > 0);
    }
}
