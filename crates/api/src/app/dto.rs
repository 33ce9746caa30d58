//! Query-string DTOs.
//!
//! Values arrive as raw strings and are parsed here so malformed input
//! yields the same JSON error body as every other validation failure.

use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde::Deserialize;

use tallyerp_reporting::Dimension;

use crate::app::errors::json_error;

#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl PeriodParams {
    pub fn bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), Response> {
        Ok((
            parse_date("start_date", self.start_date.as_deref())?,
            parse_date("end_date", self.end_date.as_deref())?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfitLossParams {
    #[serde(flatten)]
    pub period: PeriodParams,
    pub group_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyParams {
    pub year: Option<String>,
}

impl MonthlyParams {
    pub fn year(&self) -> Result<Option<i32>, Response> {
        match non_empty(self.year.as_deref()) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i32>()
                .map(Some)
                .map_err(|_| invalid("year", format!("expected a year, got {raw:?}"))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AgingParams {
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommissionParams {
    #[serde(flatten)]
    pub period: PeriodParams,
    /// `true` reports across every company instead of the header's.
    pub all_companies: Option<String>,
}

impl CommissionParams {
    pub fn all_companies(&self) -> Result<bool, Response> {
        match non_empty(self.all_companies.as_deref()) {
            None => Ok(false),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(other) => Err(invalid("all_companies", format!("expected true or false, got {other:?}"))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesParams {
    #[serde(flatten)]
    pub period: PeriodParams,
    pub group_by: Option<String>,
}

/// `None` for absent or blank values, otherwise the dimension.
pub fn parse_group_by(raw: Option<&str>) -> Result<Option<Dimension>, Response> {
    match non_empty(raw) {
        None | Some("none") => Ok(None),
        Some(value) => value
            .parse::<Dimension>()
            .map(Some)
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())),
    }
}

pub fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, Response> {
    match non_empty(raw) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(field, format!("expected YYYY-MM-DD, got {value:?}"))),
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(field: &'static str, detail: String) -> Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", format!("{field}: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(parse_date("start_date", Some("  ")).ok(), Some(None));
        assert!(matches!(parse_group_by(Some("")), Ok(None)));
        assert!(matches!(parse_group_by(Some("none")), Ok(None)));
    }

    #[test]
    fn malformed_values_are_bad_requests() {
        let err = parse_date("start_date", Some("03/01/2026")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(parse_group_by(Some("region")).is_err());
        assert!(MonthlyParams { year: Some("twenty".into()) }.year().is_err());
    }

    #[test]
    fn dates_parse_as_iso() {
        assert_eq!(
            parse_date("end_date", Some("2026-02-28")).ok().flatten(),
            NaiveDate::from_ymd_opt(2026, 2, 28)
        );
    }
}
