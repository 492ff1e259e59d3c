use crate::config::TableConfig;
use crate::core::model::{Column, Detection, Row, RowRecord, PLACEHOLDER};
use crate::core::text::join_cell;

/// Column for one detection: class synonyms first, horizontal position second.
pub fn assign_column(det: &Detection, config: &TableConfig) -> Column {
    if let Some(column) = config.column_synonyms.column_for(&det.label) {
        return column;
    }

    let x_center = det.x_center();
    if x_center < config.x_desc_max {
        Column::Description
    } else if x_center < config.x_cant_max {
        Column::Quantity
    } else {
        Column::Price
    }
}

/// Merge the text of a row's members per column, in member order.
pub fn assemble_row(row: &Row, config: &TableConfig) -> RowRecord {
    let mut description = Vec::new();
    let mut quantity = Vec::new();
    let mut price = Vec::new();

    for det in row.members() {
        let cell = match assign_column(det, config) {
            Column::Description => &mut description,
            Column::Quantity => &mut quantity,
            Column::Price => &mut price,
        };
        cell.push(det.text.as_str());
    }

    RowRecord {
        description: join_cell(description, PLACEHOLDER),
        quantity: join_cell(quantity, PLACEHOLDER),
        price: join_cell(price, PLACEHOLDER),
        confidence: config.row_confidence.score(row.members()),
    }
}
