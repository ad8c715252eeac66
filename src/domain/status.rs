use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment state shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Refunded,
    Expired,
    #[default]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_successful(&self) -> bool {
        *self == Self::Succeeded
    }

    /// No further changes are expected once a payment reaches a final state.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Cancelled | Self::Refunded | Self::Expired
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Payment is waiting to be processed",
            Self::Processing => "Payment is being processed",
            Self::Succeeded => "Payment completed successfully",
            Self::Failed => "Payment failed or was declined",
            Self::Cancelled => "Payment was cancelled",
            Self::Refunded => "Payment was refunded",
            Self::Expired => "Payment session expired",
            Self::Unknown => "Payment status is unknown",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use TransactionStatus::*;

const STRIPE_STATUSES: &[(&str, TransactionStatus)] = &[
    ("requires_payment_method", Pending),
    ("requires_confirmation", Pending),
    ("requires_action", Pending),
    ("processing", Processing),
    ("requires_capture", Processing),
    ("succeeded", Succeeded),
    ("canceled", Cancelled),
    ("payment_failed", Failed),
    ("refunded", Refunded),
    ("partially_refunded", Refunded),
];

const VIPPS_STATUSES: &[(&str, TransactionStatus)] = &[
    ("INITIATE", Pending),
    ("REGISTER", Pending),
    ("RESERVE", Processing),
    ("CAPTURE", Succeeded),
    ("SALE", Succeeded),
    ("CANCEL", Cancelled),
    ("VOID", Cancelled),
    ("REFUND", Refunded),
    ("FAILED", Failed),
    ("REJECTED", Failed),
    ("EXPIRED", Expired),
    ("ABANDONED", Cancelled),
];

const ZETTLE_STATUSES: &[(&str, TransactionStatus)] = &[
    ("PENDING", Pending),
    ("COMPLETED", Succeeded),
    ("FAILED", Failed),
    ("CANCELLED", Cancelled),
    ("REFUNDED", Refunded),
    ("VOIDED", Cancelled),
    ("PROCESSING", Processing),
    ("AUTHORIZED", Processing),
    ("CAPTURED", Succeeded),
];

// Checked in order; the first category with a matching keyword wins.
const INFERENCE_KEYWORDS: &[(&[&str], TransactionStatus)] = &[
    (&["success", "complete", "paid", "capture"], Succeeded),
    (&["pending", "waiting", "initiated"], Pending),
    (&["processing", "authorized"], Processing),
    (&["fail", "reject", "decline"], Failed),
    (&["cancel", "void", "abandon"], Cancelled),
    (&["refund"], Refunded),
    (&["expir", "timeout"], Expired),
];

/// Converts a provider-specific status into the unified vocabulary.
///
/// Known providers are resolved through their mapping table only; anything
/// missing from the table is `Unknown`. Statuses from any other source are
/// inferred from common payment keywords.
pub fn normalize_status(provider_status: &str, source: &str) -> TransactionStatus {
    let status = provider_status.trim();

    let table = match source.trim().to_lowercase().as_str() {
        "stripe" => STRIPE_STATUSES,
        "vipps" => VIPPS_STATUSES,
        "zettle" => ZETTLE_STATUSES,
        _ => return infer_status(status),
    };

    table
        .iter()
        .find(|(raw, _)| raw.eq_ignore_ascii_case(status))
        .map(|(_, unified)| *unified)
        .unwrap_or(Unknown)
}

fn infer_status(status: &str) -> TransactionStatus {
    let lower = status.to_lowercase();
    INFERENCE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, unified)| *unified)
        .unwrap_or(Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::stripe_succeeded("succeeded", "stripe", Succeeded)]
    #[case::stripe_uppercase("SUCCEEDED", "stripe", Succeeded)]
    #[case::stripe_requires_capture("requires_capture", "stripe", Processing)]
    #[case::stripe_canceled("canceled", "stripe", Cancelled)]
    #[case::stripe_partial_refund("partially_refunded", "Stripe", Refunded)]
    #[case::stripe_unmapped("totally_new_status", "stripe", Unknown)]
    #[case::vipps_capture("CAPTURE", "vipps", Succeeded)]
    #[case::vipps_lowercase("reserve", "vipps", Processing)]
    #[case::vipps_abandoned("ABANDONED", "vipps", Cancelled)]
    #[case::vipps_expired(" EXPIRED ", "vipps", Expired)]
    #[case::zettle_completed("COMPLETED", "zettle", Succeeded)]
    #[case::zettle_voided("voided", "zettle", Cancelled)]
    #[case::zettle_authorized("AUTHORIZED", "ZETTLE", Processing)]
    #[case::zettle_unmapped("SETTLED", "zettle", Unknown)]
    fn test_provider_tables(
        #[case] raw: &str,
        #[case] source: &str,
        #[case] expected: TransactionStatus,
    ) {
        assert_eq!(normalize_status(raw, source), expected);
    }

    #[rstest]
    #[case::failed("payment_failed", Failed)]
    #[case::paid("PAID_OUT", Succeeded)]
    #[case::waiting("waiting_for_user", Pending)]
    #[case::authorized("authorized", Processing)]
    #[case::declined("card_declined", Failed)]
    #[case::voided("voided", Cancelled)]
    #[case::refund("refund_issued", Refunded)]
    #[case::timeout("session_timeout", Expired)]
    #[case::nothing("mystery", Unknown)]
    #[case::empty("", Unknown)]
    fn test_inference_for_unknown_source(#[case] raw: &str, #[case] expected: TransactionStatus) {
        assert_eq!(normalize_status(raw, "some_new_provider"), expected);
    }

    #[test]
    fn test_inference_priority_prefers_success() {
        // Both "capture" and "fail" appear; success keywords are checked first.
        assert_eq!(normalize_status("capture_failed", "acme"), Succeeded);
        assert_eq!(normalize_status("pending_refund", "acme"), Pending);
    }

    #[test]
    fn test_final_states() {
        assert!(Succeeded.is_final());
        assert!(Expired.is_final());
        assert!(!Pending.is_final());
        assert!(!Processing.is_final());
        assert!(!Unknown.is_final());
        assert!(Succeeded.is_successful());
        assert!(!Refunded.is_successful());
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!(Refunded.to_string(), "refunded");
        assert_eq!(Unknown.description(), "Payment status is unknown");
    }
}
