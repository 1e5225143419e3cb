//! Excel export of an event's registrations

use rust_xlsxwriter::{Format, Workbook};

use crate::models::{Event, EventRegistration};
use crate::utils::errors::Result;
use crate::utils::helpers::{format_optional_timestamp, format_timestamp, sanitize_filename};

const SHEET_NAME: &str = "Registrations";

const HEADER: [&str; 8] = [
    "id",
    "user_id",
    "status",
    "registered_at",
    "canceled_at",
    "cancel_reason",
    "check_in_time",
    "form_data",
];

const COLUMN_WIDTHS: [f64; 8] = [8.0, 10.0, 12.0, 22.0, 22.0, 30.0, 22.0, 40.0];

/// Rendered export ready to be sent as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl ExportFile {
    pub const CONTENT_TYPE: &'static str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    /// `Content-Disposition` value with an ASCII fallback and an RFC 5987 name
    pub fn content_disposition(&self) -> String {
        let ascii: String = self
            .filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();

        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii,
            urlencoding::encode(&self.filename)
        )
    }
}

/// One worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// Cells of one registration row, in header order
pub fn registration_row(registration: &EventRegistration) -> [Cell; 8] {
    let form_data = registration
        .form_data
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_default();

    [
        Cell::Number(registration.id as f64),
        Cell::Number(registration.user_id as f64),
        Cell::Text(registration.status.to_string()),
        Cell::Text(format_timestamp(registration.registered_at)),
        Cell::Text(format_optional_timestamp(registration.canceled_at)),
        Cell::Text(registration.cancel_reason.clone().unwrap_or_default()),
        Cell::Text(format_optional_timestamp(registration.check_in_time)),
        Cell::Text(form_data),
    ]
}

/// Render `registrations` of `event` as an `.xlsx` workbook
pub fn registrations_workbook(event: &Event, registrations: &[EventRegistration]) -> Result<ExportFile> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in HEADER.iter().zip(COLUMN_WIDTHS).enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        sheet.set_column_width(col as u16, width)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (index, registration) in registrations.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, cell) in registration_row(registration).into_iter().enumerate() {
            match cell {
                Cell::Number(value) => sheet.write_number(row, col as u16, value)?,
                // Empty cells stay blank
                Cell::Text(text) if text.is_empty() => continue,
                Cell::Text(text) => sheet.write_string(row, col as u16, text)?,
            };
        }
    }

    Ok(ExportFile {
        filename: sanitize_filename(&format!("{}-registrations.xlsx", event.title)),
        content: workbook.save_to_buffer()?,
    })
}
