use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Parse an enum value using serde-deserialization.
///
/// Hyphens become underscores, and both the lower and upper case spellings
/// are tried so `audit-member`, `AUDIT_MEMBER` and `forward-to-hod` all work.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().replace('-', "_");
    let attempt = |candidate: String| serde_json::from_value::<T>(serde_json::Value::String(candidate));
    attempt(normalized.to_lowercase())
        .or_else(|_| attempt(normalized.to_uppercase()))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` as midnight UTC.
pub fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid timestamp '{raw}': expected RFC 3339 or YYYY-MM-DD"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow::anyhow!("invalid timestamp '{raw}'"))
}

/// Parse repeated `key=value` rating pairs.
pub fn parse_ratings(pairs: &[String]) -> anyhow::Result<BTreeMap<String, f64>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("invalid rating '{pair}': expected key=value"))?;
            let score = value
                .trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("invalid rating '{pair}': value is not a number"))?;
            Ok((key.trim().to_string(), score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cfms_core::enums::{ConvenerDecision, Role, Verdict};
    use cfms_core::feedback::FeedbackStage;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_screaming_and_snake_enums() {
        let role: Role = parse_enum("audit-member", "role").expect("role should parse");
        assert_eq!(role, Role::AuditMember);
        let verdict: Verdict = parse_enum("APPROVE", "verdict").expect("verdict should parse");
        assert_eq!(verdict, Verdict::Approve);
        let decision: ConvenerDecision =
            parse_enum("forward-to-hod", "decision").expect("decision should parse");
        assert_eq!(decision, ConvenerDecision::ForwardToHod);
        let stage: FeedbackStage = parse_enum("audit_member", "stage").expect("stage should parse");
        assert_eq!(stage, FeedbackStage::AuditMember);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<Role>("dean", "role").expect_err("should fail");
        assert!(err.to_string().contains("invalid role 'dean'"));
    }

    #[test]
    fn timestamps_accept_dates() {
        assert_eq!(
            parse_timestamp("2026-11-01").expect("date should parse"),
            Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2026-11-01T12:30:00+05:00").expect("rfc3339 should parse"),
            Utc.with_ymd_and_hms(2026, 11, 1, 7, 30, 0).unwrap()
        );
        assert!(parse_timestamp("next week").is_err());
    }

    #[test]
    fn ratings_need_numbers() {
        let ratings = parse_ratings(&["clarity=4".into(), " coverage = 3.5".into()])
            .expect("ratings should parse");
        assert_eq!(ratings.get("clarity"), Some(&4.0));
        assert_eq!(ratings.get("coverage"), Some(&3.5));
        assert!(parse_ratings(&["clarity".into()]).is_err());
        assert!(parse_ratings(&["clarity=good".into()]).is_err());
    }
}
