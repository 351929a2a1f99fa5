//! Canvas painters for the chart descriptions produced by the `charts`
//! crate. All layout is computed from the widget bounds at draw time.

use charts::{DivergingChart, PieChart};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::canvas::{self, Path, Stroke, Text};
use iced::{mouse, Color, Pixels, Point, Rectangle, Renderer, Size, Theme};
use std::collections::HashMap;

const AXIS_COLOR: Color = Color::from_rgb(0.45, 0.45, 0.45);

fn series_color(name: &str) -> Color {
    match name {
        "green" => Color::from_rgb(0.13, 0.55, 0.13),
        "red" => Color::from_rgb(0.80, 0.16, 0.13),
        "blue" => Color::from_rgb(0.12, 0.29, 0.69),
        _ => Color::from_rgb(0.55, 0.55, 0.55),
    }
}

fn axis_label(content: String, position: Point) -> Text {
    Text {
        content,
        position,
        color: AXIS_COLOR,
        size: Pixels(11.0),
        horizontal_alignment: Horizontal::Center,
        vertical_alignment: Vertical::Top,
        ..Text::default()
    }
}

/// Diverging sentiment bars with the price line on a secondary scale.
#[derive(Debug)]
pub struct DivergingView {
    chart: DivergingChart,
}

impl DivergingView {
    pub fn new(chart: DivergingChart) -> Self {
        Self { chart }
    }
}

impl<Message> canvas::Program<Message> for DivergingView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let width = frame.width();
        let height = frame.height();

        let months = &self.chart.months;
        if months.is_empty() {
            frame.fill_text(axis_label(
                "No data".to_string(),
                Point::new(width / 2.0, height / 2.0),
            ));
            return vec![frame.into_geometry()];
        }

        let left = 8.0_f32;
        let top = 8.0_f32;
        let plot_w = width - 16.0;
        let plot_h = height - 30.0;
        let mid = top + plot_h / 2.0;
        let step = plot_w / months.len() as f32;

        // Zero axis for the sentiment bars.
        let axis = Path::line(Point::new(left, mid), Point::new(left + plot_w, mid));
        frame.stroke(&axis, Stroke::default().with_color(AXIS_COLOR).with_width(1.0));

        let mut values: HashMap<&str, f64> = HashMap::new();
        for bar in self.chart.bullish.iter().chain(self.chart.bearish.iter()) {
            values.insert(bar.month.as_str(), bar.value);
        }

        let max_abs = values
            .values()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
            .max(f64::EPSILON);

        let bullish = series_color(charts::BULLISH_COLOR);
        let bearish = series_color(charts::BEARISH_COLOR);

        for (i, month) in months.iter().enumerate() {
            let Some(value) = values.get(month.as_str()) else {
                continue;
            };
            let extent = ((value.abs() / max_abs) as f32) * (plot_h / 2.0) * 0.9;
            let x = left + i as f32 * step + step * 0.15;
            let bar_w = (step * 0.7).max(1.0);

            if *value > 0.0 {
                frame.fill_rectangle(
                    Point::new(x, mid - extent),
                    Size::new(bar_w, extent),
                    bullish,
                );
            } else {
                frame.fill_rectangle(Point::new(x, mid), Size::new(bar_w, extent), bearish);
            }
        }

        // Price line, scaled independently of the bars.
        let max_price = self.chart.price.iter().fold(0.0_f64, |acc, p| acc.max(*p));
        if max_price > 0.0 {
            let price_point = |i: usize, close: f64| {
                Point::new(
                    left + i as f32 * step + step / 2.0,
                    top + plot_h - ((close / max_price) as f32) * plot_h,
                )
            };

            let line = Path::new(|builder| {
                for (i, close) in self.chart.price.iter().enumerate() {
                    let point = price_point(i, *close);
                    if i == 0 {
                        builder.move_to(point);
                    } else {
                        builder.line_to(point);
                    }
                }
            });
            frame.stroke(
                &line,
                Stroke::default()
                    .with_color(series_color(charts::PRICE_COLOR))
                    .with_width(2.0),
            );
        }

        // Month labels, thinned so they stay legible on long ranges.
        let stride = (months.len() + 7) / 8;
        for (i, month) in months.iter().enumerate().step_by(stride.max(1)) {
            frame.fill_text(axis_label(
                month.clone(),
                Point::new(left + i as f32 * step + step / 2.0, height - 18.0),
            ));
        }

        vec![frame.into_geometry()]
    }
}

/// Sentiment mix rendered as one proportional stacked bar with a legend.
#[derive(Debug)]
pub struct SentimentMixView {
    pie: PieChart,
}

impl SentimentMixView {
    pub fn new(pie: PieChart) -> Self {
        Self { pie }
    }
}

impl<Message> canvas::Program<Message> for SentimentMixView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let width = frame.width();

        let total = self.pie.total();
        if total <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let left = 8.0_f32;
        let top = 8.0_f32;
        let bar_w = width - 16.0;
        let bar_h = 28.0_f32;

        let mut x = left;
        for slice in &self.pie.slices {
            let w = ((slice.value / total) as f32) * bar_w;
            frame.fill_rectangle(
                Point::new(x, top),
                Size::new(w, bar_h),
                series_color(&slice.color),
            );
            x += w;
        }

        let mut legend_x = left;
        let legend_y = top + bar_h + 12.0;
        for slice in &self.pie.slices {
            frame.fill_rectangle(
                Point::new(legend_x, legend_y),
                Size::new(10.0, 10.0),
                series_color(&slice.color),
            );
            let label = format!(
                "{} {:.0}%",
                slice.label,
                slice.value / total * 100.0
            );
            frame.fill_text(Text {
                content: label.clone(),
                position: Point::new(legend_x + 14.0, legend_y - 1.0),
                color: AXIS_COLOR,
                size: Pixels(12.0),
                horizontal_alignment: Horizontal::Left,
                vertical_alignment: Vertical::Top,
                ..Text::default()
            });
            legend_x += 30.0 + label.len() as f32 * 6.5;
        }

        vec![frame.into_geometry()]
    }
}
