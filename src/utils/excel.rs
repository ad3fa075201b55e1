//! Staff spreadsheets: `.xlsx` export of selected users and bulk import of new ones.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};

use crate::error::{AppError, AppResult};
use crate::model::user::UserStatus;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_HEADERS: [&str; 5] = ["Name", "Email", "Department", "Date joined", "Status"];
pub const MAX_SHEET_BYTES: usize = 5 * 1024 * 1024;

/// One exported user, joined with the name of their department.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffExportRow {
    pub realname: String,
    pub email: String,
    pub department: Option<String>,
    pub date_joined: NaiveDateTime,
    pub status: UserStatus,
}

/// One user to create, as read from an uploaded sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffImportRow {
    pub realname: String,
    pub email: String,
    pub department: Option<String>,
}

pub fn staff_workbook(rows: &[StaffExportRow]) -> AppResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Staff").map_err(xlsx_error)?;

    for (col, title) in EXPORT_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, &header)
            .map_err(xlsx_error)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.realname).map_err(xlsx_error)?;
        sheet.write_string(r, 1, &row.email).map_err(xlsx_error)?;
        sheet
            .write_string(r, 2, row.department.as_deref().unwrap_or_default())
            .map_err(xlsx_error)?;
        sheet
            .write_string(r, 3, row.date_joined.format("%Y-%m-%d %H:%M:%S").to_string())
            .map_err(xlsx_error)?;
        sheet
            .write_string(r, 4, row.status.to_string())
            .map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::Internal(format!("failed to build spreadsheet: {e}"))
}

/// Reads the first sheet. The header row names the columns (`Name` or
/// `Realname`, `Email`, optionally `Department`, in any order and case);
/// blank rows are skipped.
pub fn read_staff_sheet(bytes: Vec<u8>) -> AppResult<Vec<StaffImportRow>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::Validation(format!("not a readable xlsx file: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Validation("the workbook has no sheets".to_string()))?
        .map_err(|e| AppError::Validation(format!("failed to read the first sheet: {e}")))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| AppError::Validation("the sheet is empty".to_string()))?
        .iter()
        .map(|cell| cell.to_string().trim().to_ascii_lowercase())
        .collect();

    let column = |names: &[&str]| header.iter().position(|h| names.contains(&h.as_str()));
    let name_col = column(&["name", "realname"])
        .ok_or_else(|| AppError::Validation("missing a Name column".to_string()))?;
    let email_col = column(&["email", "e-mail"])
        .ok_or_else(|| AppError::Validation("missing an Email column".to_string()))?;
    let department_col = column(&["department"]);

    let mut staff = Vec::new();
    for (i, row) in rows.enumerate() {
        // header is line 1
        let line = i + 2;
        let cell = |col: usize| row.get(col).map(text).unwrap_or_default();

        let realname = cell(name_col);
        let email = cell(email_col);
        let department = department_col.map(cell).filter(|d| !d.is_empty());
        if realname.is_empty() && email.is_empty() && department.is_none() {
            continue;
        }

        if realname.is_empty() {
            return Err(AppError::Validation(format!("row {line}: name is required")));
        }
        if !email.contains('@') {
            return Err(AppError::Validation(format!(
                "row {line}: a valid e-mail is required"
            )));
        }

        staff.push(StaffImportRow {
            realname,
            email,
            department,
        });
    }

    if staff.is_empty() {
        return Err(AppError::Validation("the sheet has no staff rows".to_string()));
    }
    Ok(staff)
}

fn text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}
