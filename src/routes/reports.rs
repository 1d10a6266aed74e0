use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminSession;
use crate::db::{self, CashFilter, DonationFilter};
use crate::format::format_rupiah;
use crate::AppState;

use super::{db_error, ok, parse_date_param, validation_failed, ValidationErrors};

#[derive(Deserialize)]
pub struct ExportParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        let escaped = s.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

fn csv_attachment(body: String, filename: &'static str) -> Response {
    let mut resp = Response::new(body.into());
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(filename),
    );
    resp
}

pub async fn list_available_years(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::ledger_years(&state.db) {
        Ok(years) => ok(json!({ "years": years })),
        Err(e) => db_error("List report years failed", e),
    }
}

/// Tabular ledger document for the date range, consumed by the external
/// document renderer.
pub async fn export_cash(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<ExportParams>,
) -> Response {
    let mut errors = ValidationErrors::new();
    let from = parse_date_param(&mut errors, "from", &params.from);
    let to = parse_date_param(&mut errors, "to", &params.to);
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let filter = CashFilter {
        from,
        to,
        direction: None,
    };

    let entries = match db::list_cash_entries(&state.db, &filter) {
        Ok(entries) => entries,
        Err(e) => return db_error("Cash export failed", e),
    };
    let summary = match db::cash_summary(&state.db, &filter) {
        Ok(summary) => summary,
        Err(e) => return db_error("Cash export summary failed", e),
    };

    let mut w = String::new();
    w.push_str("id,date,direction,category,amount,description\n");
    for entry in &entries {
        let date = entry.date.format("%Y-%m-%d").to_string();
        let amount = format!("{:.2}", entry.amount);
        let description = entry.description.clone().unwrap_or_default();
        w.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_escape(&entry.id),
            csv_escape(&date),
            entry.direction.as_str(),
            csv_escape(&entry.category),
            csv_escape(&amount),
            csv_escape(&description),
        ));
    }
    w.push('\n');
    w.push_str(&format!(
        "Total Masuk,,,,{:.2},{}\n",
        summary.total_in,
        csv_escape(&format_rupiah(summary.total_in)),
    ));
    w.push_str(&format!(
        "Total Keluar,,,,{:.2},{}\n",
        summary.total_out,
        csv_escape(&format_rupiah(summary.total_out)),
    ));
    w.push_str(&format!(
        "Saldo,,,,{:.2},{}\n",
        summary.balance,
        csv_escape(&format_rupiah(summary.balance)),
    ));

    csv_attachment(w, "attachment; filename=laporan-kas.csv")
}

#[derive(Deserialize)]
pub struct DonationExportParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub async fn export_donations(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<DonationExportParams>,
) -> Response {
    let mut errors = ValidationErrors::new();
    let from = parse_date_param(&mut errors, "from", &params.from);
    let to = parse_date_param(&mut errors, "to", &params.to);
    let category = match params.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match db::models::DonationCategory::parse(raw) {
            Some(c) => Some(c),
            None => {
                errors.insert("category", format!("'{}' is not a donation category", raw));
                None
            }
        },
    };
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match db::models::DonationStatus::parse(raw) {
            Some(s) => Some(s),
            None => {
                errors.insert("status", format!("'{}' is not a donation status", raw));
                None
            }
        },
    };
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let filter = DonationFilter {
        from,
        to,
        category,
        status,
    };

    let donations = match db::list_donations(&state.db, &filter) {
        Ok(list) => list,
        Err(e) => return db_error("Donation export failed", e),
    };
    let stats = match db::donation_stats(&state.db, &filter) {
        Ok(stats) => stats,
        Err(e) => return db_error("Donation export stats failed", e),
    };

    let mut w = String::new();
    w.push_str("id,date,donor,category,program,payment_method,status,amount,description\n");
    for d in &donations {
        let date = d.date.format("%Y-%m-%d").to_string();
        let program = d.program.clone().unwrap_or_default();
        let amount = format!("{:.2}", d.amount);
        let description = d.description.clone().unwrap_or_default();
        w.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&d.id),
            csv_escape(&date),
            csv_escape(&d.donor_name),
            d.category.as_str(),
            csv_escape(&program),
            d.payment_method.as_str(),
            d.status.as_str(),
            csv_escape(&amount),
            csv_escape(&description),
        ));
    }
    w.push('\n');
    w.push_str(&format!(
        "Total,,,,,,,{:.2},{}\n",
        stats.total,
        csv_escape(&format_rupiah(stats.total)),
    ));
    w.push_str(&format!("Jumlah Donasi,,,,,,,{},\n", stats.count));
    w.push_str(&format!("Jumlah Donatur,,,,,,,{},\n", stats.donor_count));
    w.push_str(&format!(
        "Rata-rata,,,,,,,{:.2},{}\n",
        stats.average,
        csv_escape(&format_rupiah(stats.average)),
    ));

    csv_attachment(w, "attachment; filename=laporan-donasi.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_fields_with_separators_and_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"bismillah\""), "\"say \"\"bismillah\"\"\"");
    }
}
