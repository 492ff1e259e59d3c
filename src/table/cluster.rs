use crate::core::model::{Detection, Row};

/// Greedy single-pass row clustering over vertical centers.
///
/// Detections are stably sorted by `y_center`. Each one joins the current row
/// when its distance to the row's running mean center is strictly below
/// `row_tolerance`, otherwise it opens a new row. Because the center moves as
/// members are added, a run of boxes each shifted by just under the tolerance
/// chains into one tall row.
pub fn cluster_rows(mut detections: Vec<Detection>, row_tolerance: f32) -> Vec<Row> {
    detections.sort_by(|a, b| a.y_center().total_cmp(&b.y_center()));

    let mut rows: Vec<Row> = Vec::new();
    for det in detections {
        match rows.last_mut() {
            Some(current) if (det.y_center() - current.center()).abs() < row_tolerance => {
                current.push(det);
            }
            _ => rows.push(Row::new(det)),
        }
    }
    rows
}
