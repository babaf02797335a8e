//! ROC curve chart.

use std::path::Path;

use glycotree_tree::RocCurve;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{info, instrument};

use crate::VizError;
use crate::style::{CURVE, DrawResult, FONT, REFERENCE, render_err};

const SIZE: (u32, u32) = (640, 560);

/// Draw `curve` as FPR against TPR with a dashed no-skill diagonal and the
/// AUC in the legend.
///
/// # Errors
///
/// Returns [`VizError::Render`] if the chart cannot be laid out or the file
/// cannot be written.
#[instrument(skip_all, fields(path = %path.display(), n_points = curve.points().len()))]
pub fn render_roc(path: &Path, curve: &RocCurve, auc: f64) -> Result<(), VizError> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    draw(&root, curve, auc)
        .and_then(|()| root.present())
        .map_err(|e| render_err(path, &e))?;
    info!("ROC curve rendered");
    Ok(())
}

fn draw(root: &DrawingArea<SVGBackend<'_>, Shift>, curve: &RocCurve, auc: f64) -> DrawResult {
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption("Receiver operating characteristic", (FONT, 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..1f64, 0f64..1.02f64)?;

    chart
        .configure_mesh()
        .x_desc("False positive rate")
        .y_desc("True positive rate")
        .light_line_style(WHITE)
        .draw()?;

    chart
        .draw_series(dashes(20).map(|seg| PathElement::new(seg, REFERENCE.stroke_width(1))))?
        .label("No skill")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE.stroke_width(1)));

    chart
        .draw_series(LineSeries::new(
            curve.points().iter().map(|p| (p.fpr, p.tpr)),
            CURVE.stroke_width(2),
        ))?
        .label(format!("ROC (AUC = {auc:.3})"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CURVE.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .label_font((FONT, 14))
        .draw()?;

    Ok(())
}

/// Dashed diagonal from (0, 0) to (1, 1) as `n` drawn segments.
fn dashes(n: usize) -> impl Iterator<Item = Vec<(f64, f64)>> {
    let step = 1.0 / n as f64;
    (0..n).map(move |i| {
        let start = i as f64 * step;
        let end = start + step * 0.6;
        vec![(start, start), (end, end)]
    })
}
