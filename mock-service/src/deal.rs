use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A deal as received; every field may be missing and is checked by [`DealRequest::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealRequest {
    pub deal_unique_id: Option<String>,
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deal_timestamp: Option<OffsetDateTime>,
    pub deal_amount: Option<f64>,
}

/// A validated deal.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub deal_unique_id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub deal_timestamp: OffsetDateTime,
    pub deal_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success_count: u32,
    pub failure_count: u32,
    pub failures: Vec<FailedDeal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDeal {
    pub deal_id: Option<String>,
    pub error: String,
}

impl DealRequest {
    /// Check every field against the import rules, collecting all violations.
    pub fn validate(&self, now: OffsetDateTime) -> Result<Deal, String> {
        let mut violations = vec![];

        if self.deal_unique_id.is_none() {
            violations.push("Deal Unique Id cannot be null");
        }

        match &self.from_currency {
            None => violations.push("From Currency ISO Code cannot be null"),
            Some(c) if c.chars().count() != 3 => {
                violations.push("From Currency ISO Code must be 3 characters")
            }
            Some(_) => {}
        }

        match &self.to_currency {
            None => violations.push("To Currency ISO Code cannot be null"),
            Some(c) if c.chars().count() != 3 => {
                violations.push("To Currency ISO Code must be 3 characters")
            }
            Some(_) => {}
        }

        match self.deal_timestamp {
            None => violations.push("Deal timestamp cannot be null"),
            Some(ts) if ts > now => violations.push("Deal timestamp cannot be in the future"),
            Some(_) => {}
        }

        match self.deal_amount {
            None => violations.push("Deal Amount cannot be null"),
            Some(amount) if !(amount > 0.) => violations.push("Deal Amount must be positive"),
            Some(_) => {}
        }

        match (
            &self.deal_unique_id,
            &self.from_currency,
            &self.to_currency,
            self.deal_timestamp,
            self.deal_amount,
        ) {
            (Some(id), Some(from), Some(to), Some(ts), Some(amount)) if violations.is_empty() => {
                Ok(Deal {
                    deal_unique_id: id.clone(),
                    from_currency: from.clone(),
                    to_currency: to.clone(),
                    deal_timestamp: ts,
                    deal_amount: amount,
                })
            }
            _ => Err(format!("Validation failed: {}", violations.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

    fn valid(id: &str) -> DealRequest {
        DealRequest {
            deal_unique_id: Some(id.to_string()),
            from_currency: Some("USD".to_string()),
            to_currency: Some("JPY".to_string()),
            deal_timestamp: Some(datetime!(2024-03-01 11:59 UTC)),
            deal_amount: Some(1000.5),
        }
    }

    #[test]
    fn accepts_valid_deal() {
        let deal = valid("id-1").validate(NOW).unwrap();
        assert_eq!(deal.deal_unique_id, "id-1");
        assert_eq!(deal.deal_amount, 1000.5);
    }

    #[test]
    fn rejects_bad_currency() {
        let req = DealRequest {
            from_currency: Some("INVALID".to_string()),
            ..valid("id-200")
        };
        assert_eq!(
            req.validate(NOW).unwrap_err(),
            "Validation failed: From Currency ISO Code must be 3 characters"
        );
    }

    #[test]
    fn rejects_non_positive_amount() {
        let req = DealRequest {
            deal_amount: Some(-100.),
            ..valid("id-302")
        };
        assert_eq!(
            req.validate(NOW).unwrap_err(),
            "Validation failed: Deal Amount must be positive"
        );

        let req = DealRequest {
            deal_amount: Some(0.),
            ..valid("id-303")
        };
        assert!(req.validate(NOW).is_err());
    }

    #[test]
    fn rejects_future_timestamp() {
        let req = DealRequest {
            deal_timestamp: Some(datetime!(2024-03-01 12:01 UTC)),
            ..valid("id-4")
        };
        assert_eq!(
            req.validate(NOW).unwrap_err(),
            "Validation failed: Deal timestamp cannot be in the future"
        );
    }

    #[test]
    fn collects_every_violation() {
        let err = DealRequest::default().validate(NOW).unwrap_err();
        assert_eq!(
            err,
            "Validation failed: Deal Unique Id cannot be null, \
             From Currency ISO Code cannot be null, \
             To Currency ISO Code cannot be null, \
             Deal timestamp cannot be null, \
             Deal Amount cannot be null"
        );
    }

    #[test]
    fn decodes_camel_case_request() {
        let req: DealRequest = serde_json::from_str(
            r#"{"dealUniqueId":"load-1-0","fromCurrency":"USD","toCurrency":"JPY",
                "dealTimestamp":"2024-03-01T11:00:00.123Z","dealAmount":1042.17}"#,
        )
        .unwrap();
        assert!(req.validate(NOW).is_ok());

        let req: DealRequest = serde_json::from_str(r#"{"dealUniqueId":"x"}"#).unwrap();
        assert!(req.deal_timestamp.is_none());
    }

    #[test]
    fn serializes_result_camel_case() {
        let result = ImportResult {
            success_count: 0,
            failure_count: 1,
            failures: vec![FailedDeal {
                deal_id: Some("id-1".to_string()),
                error: "boom".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"successCount":0,"failureCount":1,"failures":[{"dealId":"id-1","error":"boom"}]}"#
        );
    }
}
