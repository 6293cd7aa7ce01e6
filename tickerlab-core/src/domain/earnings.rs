//! Reported EPS figures per fiscal period.
//!
//! Earnings providers send numbers as strings and use `"None"` when a figure
//! has not been reported. Such points are kept (they are real rows in the
//! store) but their EPS is `None` and they never enter aggregation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Fiscal period a report covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    #[default]
    Quarterly,
    Annual,
}

/// Reported earnings for one symbol and fiscal period end.
///
/// Unique per `(symbol, fiscal_date_ending, period)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsPoint {
    pub symbol: String,
    pub fiscal_date_ending: NaiveDate,
    #[serde(default, rename = "reportedEPS", deserialize_with = "lenient_number")]
    pub reported_eps: Option<f64>,
    #[serde(default, rename = "estimatedEPS", deserialize_with = "lenient_number")]
    pub estimated_eps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub surprise: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub surprise_percentage: Option<f64>,
    #[serde(default)]
    pub period: ReportPeriod,
}

impl EarningsPoint {
    /// A quarterly report carrying only the reported EPS.
    pub fn quarterly(
        symbol: impl Into<String>,
        fiscal_date_ending: NaiveDate,
        reported_eps: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            fiscal_date_ending,
            reported_eps,
            estimated_eps: None,
            surprise: None,
            surprise_percentage: None,
            period: ReportPeriod::Quarterly,
        }
    }

    /// An annual report carrying only the reported EPS.
    pub fn annual(
        symbol: impl Into<String>,
        fiscal_date_ending: NaiveDate,
        reported_eps: Option<f64>,
    ) -> Self {
        Self {
            period: ReportPeriod::Annual,
            ..Self::quarterly(symbol, fiscal_date_ending, reported_eps)
        }
    }

    /// True when this report can contribute to trailing EPS aggregation.
    pub fn is_aggregatable(&self) -> bool {
        self.period == ReportPeriod::Quarterly && self.reported_eps.is_some()
    }
}

/// Earnings payload as sent by the provider: one symbol, two report lists
/// whose entries carry no symbol of their own.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub symbol: String,
    #[serde(default)]
    pub annual_earnings: Vec<ProviderReport>,
    #[serde(default)]
    pub quarterly_earnings: Vec<ProviderReport>,
}

/// One entry of [`EarningsResponse`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReport {
    pub fiscal_date_ending: NaiveDate,
    #[serde(default, rename = "reportedEPS", deserialize_with = "lenient_number")]
    pub reported_eps: Option<f64>,
    #[serde(default, rename = "estimatedEPS", deserialize_with = "lenient_number")]
    pub estimated_eps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub surprise: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub surprise_percentage: Option<f64>,
}

impl EarningsResponse {
    /// Flatten into points, annual reports first.
    pub fn into_points(self) -> Vec<EarningsPoint> {
        let symbol = self.symbol;
        let tagged = self
            .annual_earnings
            .into_iter()
            .map(|r| (r, ReportPeriod::Annual))
            .chain(
                self.quarterly_earnings
                    .into_iter()
                    .map(|r| (r, ReportPeriod::Quarterly)),
            );
        tagged
            .map(|(r, period)| EarningsPoint {
                symbol: symbol.clone(),
                fiscal_date_ending: r.fiscal_date_ending,
                reported_eps: r.reported_eps,
                estimated_eps: r.estimated_eps,
                surprise: r.surprise,
                surprise_percentage: r.surprise_percentage,
                period,
            })
            .collect()
    }
}

/// Parse a provider EPS string. `"None"`, empty, and non-numeric text yield `None`.
pub fn parse_reported_eps(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawNumber> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Number(v)) => v.is_finite().then_some(v),
        Some(RawNumber::Text(s)) => parse_reported_eps(&s),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_strings() {
        assert_eq!(parse_reported_eps("1.25"), Some(1.25));
        assert_eq!(parse_reported_eps(" -0.4 "), Some(-0.4));
    }

    #[test]
    fn sentinel_and_garbage_are_undefined() {
        assert_eq!(parse_reported_eps("None"), None);
        assert_eq!(parse_reported_eps(""), None);
        assert_eq!(parse_reported_eps("n/a"), None);
        assert_eq!(parse_reported_eps("NaN"), None);
    }

    #[test]
    fn deserializes_provider_shape() {
        let json = r#"{
            "symbol": "NVDA",
            "fiscalDateEnding": "2023-04-30",
            "reportedEPS": "1.09",
            "estimatedEPS": "0.92",
            "surprise": "0.17",
            "surprisePercentage": "None"
        }"#;
        let p: EarningsPoint = serde_json::from_str(json).unwrap();
        assert_eq!(p.reported_eps, Some(1.09));
        assert_eq!(p.estimated_eps, Some(0.92));
        assert_eq!(p.surprise_percentage, None);
        assert_eq!(p.period, ReportPeriod::Quarterly);
        assert!(p.is_aggregatable());
    }

    #[test]
    fn unreported_eps_is_kept_but_not_aggregatable() {
        let json = r#"{"symbol":"NVDA","fiscalDateEnding":"2023-07-31","reportedEPS":"None"}"#;
        let p: EarningsPoint = serde_json::from_str(json).unwrap();
        assert_eq!(p.reported_eps, None);
        assert!(!p.is_aggregatable());
    }

    #[test]
    fn flattens_provider_response() {
        let json = r#"{
            "symbol": "IBM",
            "annualEarnings": [{"fiscalDateEnding": "2022-12-31", "reportedEPS": "9.13"}],
            "quarterlyEarnings": [
                {"fiscalDateEnding": "2023-03-31", "reportedEPS": "1.36", "estimatedEPS": "1.27"},
                {"fiscalDateEnding": "2023-06-30", "reportedEPS": "None"}
            ]
        }"#;
        let response: EarningsResponse = serde_json::from_str(json).unwrap();
        let points = response.into_points();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.symbol == "IBM"));
        assert_eq!(points[0].period, ReportPeriod::Annual);
        assert_eq!(points[1].estimated_eps, Some(1.27));
        assert_eq!(points[2].reported_eps, None);
        assert_eq!(points[2].period, ReportPeriod::Quarterly);
    }

    #[test]
    fn annual_reports_are_not_aggregatable() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert!(!EarningsPoint::annual("NVDA", d, Some(3.3)).is_aggregatable());
        assert!(EarningsPoint::quarterly("NVDA", d, Some(0.8)).is_aggregatable());
    }
}
