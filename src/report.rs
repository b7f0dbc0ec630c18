//! PDF rendering for employee reports. Layout is done by hand on a US
//! Letter page: the bulk report is a bordered table with a shaded
//! header row repeated on every page, the single-employee report is a
//! labeled vertical list under a title banner.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use crate::service::employee::EmployeeRecord;

const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN: f32 = 15.0;
const ROW_H: f32 = 8.0;
const COL_WIDTHS: [f32; 5] = [30.0, 30.0, 52.0, 30.0, 43.9];
const HEADERS: [&str; 5] = ["Last name", "First name", "Email", "Department", "Account types"];

fn table_width() -> f32 {
    COL_WIDTHS.iter().sum()
}

pub fn employee_report_filename(record: &EmployeeRecord) -> String {
    format!("{}_{}_{}.pdf", record.first_name, record.last_name, record.id)
}

/// Snapshot of all employees as a paginated table.
pub fn bulk_report(records: &[EmployeeRecord]) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, page, layer) = PdfDocument::new(
        "Employee report",
        Mm(PAGE_W),
        Mm(PAGE_H),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut layer_ref = doc.get_page(page).get_layer(layer);
    layer_ref.use_text(
        "Employee report with departments and accounts",
        16.0,
        Mm(MARGIN),
        Mm(PAGE_H - MARGIN - 5.0),
        &bold,
    );

    let mut y = PAGE_H - MARGIN - 20.0;
    draw_header_row(&layer_ref, &bold, y);

    for record in records {
        y -= ROW_H;
        if y < MARGIN {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            layer_ref = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_H - MARGIN - ROW_H;
            draw_header_row(&layer_ref, &bold, y);
            y -= ROW_H;
        }
        draw_data_row(&layer_ref, &regular, y, record);
    }

    doc.save_to_bytes()
}

/// One employee as a labeled vertical list.
pub fn employee_report(record: &EmployeeRecord) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, page, layer) = PdfDocument::new(
        "Employee report",
        Mm(PAGE_W),
        Mm(PAGE_H),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let layer_ref = doc.get_page(page).get_layer(layer);
    let title = format!(
        "Report of {} {} ({})",
        record.first_name, record.last_name, record.id
    );
    layer_ref.use_text(&title, 22.0, Mm(MARGIN + 10.0), Mm(PAGE_H - 30.0), &bold);

    let department = record.department.clone().unwrap_or_default();
    let accounts = record.account_types_joined();
    let fields: [(&str, &str); 5] = [
        ("Last name", record.last_name.as_str()),
        ("First name", record.first_name.as_str()),
        ("Email", record.email.as_str()),
        ("Department", department.as_str()),
        ("Account types", accounts.as_str()),
    ];

    let mut y = PAGE_H - 55.0;
    for (label, value) in fields {
        layer_ref.use_text(format!("{}:", label), 14.0, Mm(MARGIN + 10.0), Mm(y), &bold);
        layer_ref.use_text(value, 14.0, Mm(MARGIN + 55.0), Mm(y), &regular);
        y -= 10.0;
    }

    doc.save_to_bytes()
}

fn draw_header_row(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(0.45, 0.45, 0.45, None)));
    layer.add_rect(
        Rect::new(Mm(MARGIN), Mm(y), Mm(MARGIN + table_width()), Mm(y + ROW_H))
            .with_mode(PaintMode::Fill),
    );
    stroke_row(layer, y);

    layer.set_fill_color(Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None)));
    let mut x = MARGIN;
    for (i, header) in HEADERS.iter().enumerate() {
        layer.use_text(*header, 9.0, Mm(x + 2.0), Mm(y + 2.5), bold);
        x += COL_WIDTHS[i];
    }
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn draw_data_row(
    layer: &PdfLayerReference,
    regular: &IndirectFontRef,
    y: f32,
    record: &EmployeeRecord,
) {
    stroke_row(layer, y);
    let department = record.department.clone().unwrap_or_default();
    let accounts = record.account_types_joined();
    let cells: [&str; 5] = [
        record.last_name.as_str(),
        record.first_name.as_str(),
        record.email.as_str(),
        department.as_str(),
        accounts.as_str(),
    ];
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    let mut x = MARGIN;
    for (i, cell) in cells.iter().enumerate() {
        layer.use_text(fit_cell(cell, COL_WIDTHS[i]), 9.0, Mm(x + 2.0), Mm(y + 2.5), regular);
        x += COL_WIDTHS[i];
    }
}

fn stroke_row(layer: &PdfLayerReference, y: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(0.6);
    let mut x = MARGIN;
    for width in COL_WIDTHS {
        layer.add_rect(
            Rect::new(Mm(x), Mm(y), Mm(x + width), Mm(y + ROW_H)).with_mode(PaintMode::Stroke),
        );
        x += width;
    }
}

// Rough Helvetica 9pt advance; enough to keep cell text inside its
// borders without a text-measuring pass.
fn fit_cell(text: &str, width: f32) -> String {
    let max = (width / 1.9) as usize;
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i32, first: &str, last: &str) -> EmployeeRecord {
        EmployeeRecord {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@corp.test", first.to_lowercase()),
            department_id: None,
            department: Some("IT".to_string()),
            account_type_ids: vec![],
            account_types: vec!["VPN".to_string(), "Mail".to_string()],
            hire_date: None,
        }
    }

    #[test]
    fn bulk_report_produces_pdf_bytes() {
        let records: Vec<EmployeeRecord> = (1..=5)
            .map(|i| record(i, "John", &format!("Doe{}", i)))
            .collect();
        let bytes = bulk_report(&records).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn bulk_report_paginates_large_sets() {
        let records: Vec<EmployeeRecord> = (1..=120)
            .map(|i| record(i, "John", &format!("Doe{}", i)))
            .collect();
        let many = bulk_report(&records).unwrap();
        let few = bulk_report(&records[..3]).unwrap();
        assert!(many.starts_with(b"%PDF"));
        assert!(many.len() > few.len());
    }

    #[test]
    fn single_report_and_filename() {
        let r = record(7, "John", "Doe");
        let bytes = employee_report(&r).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(employee_report_filename(&r), "John_Doe_7.pdf");
    }

    #[test]
    fn long_cell_text_is_truncated() {
        let fitted = fit_cell(&"x".repeat(200), 30.0);
        assert!(fitted.ends_with("..."));
        assert!(fitted.chars().count() <= 30);
    }
}
