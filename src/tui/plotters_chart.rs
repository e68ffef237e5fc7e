//! Plotters-powered yield chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct YieldChart<'a> {
    /// Historical samples as `(planting month, kg/acre)`.
    pub observations: &'a [(f64, f64)],
    /// Fitted month trend; empty when no model was fitted.
    pub fitted: &'a [(f64, f64)],
    /// Seasonal baseline per month.
    pub baseline: &'a [(f64, f64)],
    /// The current prediction.
    pub target: Option<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for YieldChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(12)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let baseline_color = RGBColor(255, 255, 0); // yellow
            let fitted_color = RGBColor(0, 255, 255); // cyan
            let target_color = RGBColor(0, 255, 0); // green

            chart.draw_series(LineSeries::new(self.baseline.iter().copied(), &baseline_color))?;
            if !self.fitted.is_empty() {
                chart.draw_series(LineSeries::new(self.fitted.iter().copied(), &fitted_color))?;
            }

            // `Circle` radii are mis-scaled by the ratatui backend; pixels render
            // as clean dots.
            chart.draw_series(
                self.observations
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), WHITE)),
            )?;
            if let Some(target) = self.target {
                chart.draw_series(std::iter::once(Pixel::new(target, target_color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
