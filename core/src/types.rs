//! Request and response shapes for the loans API.
//!
//! # Design
//! Response types only cover endpoints whose body the client interprets.
//! Everything else is handed back as a `Payload`. Quoted terms keep fields
//! they do not model in a flattened `extra` map; other responses ignore them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::{LoanRequestToken, Session};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Parameters of a new or updated loan request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<u64>,
    /// Any further attributes the API accepts, sent as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoanRequestOptions {
    pub fn new(amount: u64, mobile_phone: impl Into<String>, store_id: u64) -> Self {
        Self {
            amount: Some(amount),
            mobile_phone: Some(mobile_phone.into()),
            store_id: Some(store_id),
            extra: Map::new(),
        }
    }
}

/// Loan finalization parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeLoan {
    pub code: Option<String>,
    /// Consent to SMS notifications, `"0"` or `"1"`.
    pub sms_info: String,
    /// Finalize without a confirmation code; `code` is not sent.
    pub skip_confirmation: bool,
}

impl FinalizeLoan {
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn skipping_confirmation() -> Self {
        Self {
            skip_confirmation: true,
            ..Self::default()
        }
    }
}

impl Default for FinalizeLoan {
    fn default() -> Self {
        Self {
            code: None,
            sms_info: "0".to_string(),
            skip_confirmation: false,
        }
    }
}

/// A return against an existing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReturn {
    pub order_id: u64,
    #[serde(rename = "confirmation_code")]
    pub code: String,
    pub amount: f64,
    pub store_id: u64,
}

/// Output format of a loan request document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Html,
    Pdf,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Html => "html",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// One line of a repayment schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    /// Fields not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A quoted repayment option for a loan request.
///
/// Only `term_id` is required; it is what `create_loan` and friends take.
/// Everything the server adds beyond the known fields lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term_id: u64,
    #[serde(default)]
    pub term: Option<u32>,
    #[serde(default)]
    pub product_code: Option<u32>,
    #[serde(default)]
    pub monthly_payment: Option<f64>,
    #[serde(default)]
    pub min_amount: Option<f64>,
    #[serde(default)]
    pub max_amount: Option<f64>,
    #[serde(default)]
    pub sms_info: Option<f64>,
    #[serde(default)]
    pub sum_with_discount: Option<f64>,
    #[serde(default)]
    pub total_of_payments: Option<f64>,
    #[serde(default)]
    pub total_overpayment: Option<f64>,
    #[serde(default)]
    pub schedule: Vec<ScheduleItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A freshly created loan request with its quoted terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequestSummary {
    pub token: LoanRequestToken,
    pub insurance_available: Option<bool>,
    pub terms: Vec<Term>,
}

/// Terms re-quoted after a loan request update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequestTerms {
    pub terms: Vec<Term>,
}

/// Scoring decision for the client behind a confirmed loan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClient {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub credit_limit: Option<String>,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub decision_code: Option<i64>,
    #[serde(default)]
    pub decision_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barcode {
    pub image: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    #[serde(default)]
    pub barcodes: Vec<Barcode>,
}

/// Result of a finalized loan: the order it produced and its barcodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finalization {
    pub offer_id: String,
    pub loan_application: LoanApplication,
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct SessionRequest<'a> {
    pub user: Credentials<'a>,
}

#[derive(Serialize)]
pub(crate) struct Credentials<'a> {
    pub login: Option<&'a str>,
    pub password: Option<&'a str>,
}

#[derive(Deserialize)]
pub(crate) struct SessionEnvelope {
    pub user: SessionUser,
}

#[derive(Deserialize)]
pub(crate) struct SessionUser {
    pub authentication_token: String,
}

impl From<SessionEnvelope> for Session {
    fn from(envelope: SessionEnvelope) -> Self {
        Session::with_token(envelope.user.authentication_token)
    }
}

#[derive(Serialize)]
pub(crate) struct LoanRequestBody<'a> {
    pub loan_request: &'a LoanRequestOptions,
}

#[derive(Deserialize)]
pub(crate) struct LoanRequestEnvelope {
    pub loan_request: CreatedLoanRequest,
}

#[derive(Deserialize)]
pub(crate) struct CreatedLoanRequest {
    pub token: LoanRequestToken,
    #[serde(default)]
    pub insurance_available: Option<bool>,
}

#[derive(Deserialize)]
pub(crate) struct TermsEnvelope {
    pub loan_request: Vec<Term>,
}

#[derive(Deserialize)]
pub(crate) struct ScoredClientEnvelope {
    pub client: ScoredClient,
}

#[derive(Serialize)]
pub(crate) struct ReturnBody<'a> {
    #[serde(rename = "return")]
    pub new_return: &'a NewReturn,
}
