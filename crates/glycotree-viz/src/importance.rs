//! Horizontal bar chart of the largest feature importances.

use std::path::Path;

use glycotree_tree::RankedFeature;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{info, instrument};

use crate::VizError;
use crate::style::{BAR, DrawResult, FONT, render_err};

/// Draw the first `top_n` of `ranked` (already sorted descending) as
/// horizontal bars, largest at the top.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`VizError::EmptyInput`] | `ranked` is empty or `top_n` is zero |
/// | [`VizError::Render`] | Layout or file write failed |
#[instrument(skip_all, fields(path = %path.display(), top_n))]
pub fn render_importances(
    path: &Path,
    ranked: &[RankedFeature],
    top_n: usize,
) -> Result<(), VizError> {
    let top = &ranked[..ranked.len().min(top_n)];
    if top.is_empty() {
        return Err(VizError::EmptyInput {
            what: "feature importances",
        });
    }

    let height = 120 + 36 * top.len() as u32;
    let root = SVGBackend::new(path, (720, height)).into_drawing_area();
    draw(&root, top)
        .and_then(|()| root.present())
        .map_err(|e| render_err(path, &e))?;
    info!(n_bars = top.len(), "feature importances rendered");
    Ok(())
}

fn draw(root: &DrawingArea<SVGBackend<'_>, Shift>, top: &[RankedFeature]) -> DrawResult {
    root.fill(&WHITE)?;

    let n = top.len();
    let x_max = top
        .iter()
        .map(|f| f.importance)
        .fold(0.0f64, f64::max)
        .max(1e-9)
        * 1.1;

    // Row 0 is the bottom of the chart, so the top-ranked feature sits in row n - 1.
    let name_at = |row: usize| top.get(n - 1 - row.min(n - 1)).map_or("", |f| f.name.as_str());

    let mut chart = ChartBuilder::on(root)
        .caption(format!("Top {n} feature importances"), (FONT, 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(190)
        .build_cartesian_2d(0f64..x_max, (0usize..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(row) | SegmentValue::Exact(row) => name_at(*row).to_string(),
            SegmentValue::Last => String::new(),
        })
        .x_desc("Mean decrease in impurity")
        .draw()?;

    chart.draw_series(top.iter().enumerate().map(|(i, f)| {
        let row = n - 1 - i;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (f.importance, SegmentValue::Exact(row + 1)),
            ],
            BAR.filled(),
        );
        bar.set_margin(5, 5, 0, 0);
        bar
    }))?;

    Ok(())
}
