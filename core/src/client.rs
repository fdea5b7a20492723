//! The loans API client.
//!
//! # Design
//! `LoansClient` holds configuration and a `Dispatcher`; it carries no
//! session state between calls. Operations come in three shapes:
//!
//! - single call: one request, the classified outcome returned as-is;
//! - chained call: a first request whose failure short-circuits, then a
//!   dependent terms fetch whose result is merged into the first one
//!   (`create_loan_request`, `update_loan_request`);
//! - post-processing call: the payload is reshaped and failures collapse to
//!   an empty list (`get_loan_request_info`, `get_loan_request_attributes`).
//!
//! `ApiError`s abort a chain at whichever step raises them.

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::dispatch::{Dispatcher, EmptyBody, APPLICATION_SOURCE_HEADER};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::outcome::{Failure, Outcome, Payload};
use crate::session::{LoanRequestToken, Session};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Credentials, DocumentFormat, FinalizeLoan, Finalization, LoanRequestBody, LoanRequestEnvelope,
    LoanRequestOptions, LoanRequestSummary, LoanRequestTerms, NewReturn, ReturnBody, ScoredClient,
    ScoredClientEnvelope, SessionEnvelope, SessionRequest, Term, TermsEnvelope,
};

/// Outcome of an operation, or the fatal condition that interrupted it.
pub type ApiResult<T> = Result<Outcome<T>, ApiError>;

/// Synchronous client for the loans API.
///
/// One instance talks to one base URL over one persistent connection and is
/// meant to be used from a single thread.
#[derive(Debug, Clone)]
pub struct LoansClient<T = UreqTransport> {
    config: ClientConfig,
    dispatcher: Dispatcher<T>,
}

impl LoansClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> LoansClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let dispatcher = Dispatcher::new(config.base_url(), transport);
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Log in with the configured credentials.
    pub fn create_session(&self) -> ApiResult<Session> {
        let body = SessionRequest {
            user: Credentials {
                login: self.config.login(),
                password: self.config.password(),
            },
        };
        self.post(&Session::anonymous(), "sessions", &body)?
            .try_map(|payload| payload.decode::<SessionEnvelope>().map(Session::from))
    }

    // -----------------------------------------------------------------------
    // Loan requests
    // -----------------------------------------------------------------------

    /// Create a loan request, then fetch the terms quoted for it.
    pub fn create_loan_request(
        &self,
        session: &Session,
        options: &LoanRequestOptions,
    ) -> ApiResult<LoanRequestSummary> {
        let body = LoanRequestBody { loan_request: options };
        let created = match self.post(session, "loan_requests", &body)? {
            Outcome::Success(payload) => payload.decode::<LoanRequestEnvelope>()?.loan_request,
            Outcome::Failure(failure) => return Ok(Outcome::Failure(failure)),
        };

        let terms = self.loan_request_terms(session, &created.token)?;
        Ok(terms.map(|terms| LoanRequestSummary {
            token: created.token,
            insurance_available: created.insurance_available,
            terms,
        }))
    }

    /// Update a loan request, then re-fetch its terms.
    pub fn update_loan_request(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        options: &LoanRequestOptions,
    ) -> ApiResult<LoanRequestTerms> {
        let body = LoanRequestBody { loan_request: options };
        if let Outcome::Failure(failure) = self.put(session, &loan_request_path(token, ""), &body)? {
            return Ok(Outcome::Failure(failure));
        }

        Ok(self
            .loan_request_terms(session, token)?
            .map(|terms| LoanRequestTerms { terms }))
    }

    /// Terms quoted for a loan request. Any business failure is reported as
    /// `Failure::TermsUnavailable`.
    pub fn loan_request_terms(&self, session: &Session, token: &LoanRequestToken) -> ApiResult<Vec<Term>> {
        match self.get(session, &loan_request_path(token, ""))? {
            Outcome::Success(payload) => Ok(Outcome::Success(payload.decode::<TermsEnvelope>()?.loan_request)),
            Outcome::Failure(_) => Ok(Outcome::Failure(Failure::TermsUnavailable)),
        }
    }

    /// The `loan_request` section for a given amount, or an empty list if the
    /// server refused.
    pub fn get_loan_request_info(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        amount: u64,
    ) -> Result<Value, ApiError> {
        let outcome = self.get(session, &format!("loan_requests/{token}?amount={amount}"))?;
        Ok(extract_or_empty(outcome, "loan_request"))
    }

    /// The `loan_request_attributes` section, or an empty list if the server
    /// refused.
    pub fn get_loan_request_attributes(&self, session: &Session, token: &LoanRequestToken) -> Result<Value, ApiError> {
        let outcome = self.get(session, &loan_request_path(token, ""))?;
        Ok(extract_or_empty(outcome, "loan_request_attributes"))
    }

    /// A rendered loan document (`offer`, `agreement`, ...). A client with the
    /// loan request's phone number must already exist.
    pub fn document(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        kind: &str,
        format: DocumentFormat,
    ) -> ApiResult<Payload> {
        let path = loan_request_path(token, &format!("/documents/{kind}.{}", format.extension()));
        self.get(session, &path)
    }

    pub fn send_loan_confirmation_message(&self, session: &Session, token: &LoanRequestToken) -> ApiResult<Payload> {
        self.post(session, &loan_request_path(token, "/client/confirmation"), &EmptyBody {})
    }

    /// Confirm the loan request with the client's code; the answer carries
    /// the scoring decision.
    pub fn complete_loan_request(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        code: &str,
    ) -> ApiResult<ScoredClient> {
        self.post(session, &loan_request_path(token, "/confirmation"), &json!({ "code": code }))?
            .try_map(|payload| payload.decode::<ScoredClientEnvelope>().map(|envelope| envelope.client))
    }

    pub fn create_loan(&self, session: &Session, token: &LoanRequestToken, term_id: u64) -> ApiResult<Payload> {
        self.post_with_source(session, &loan_request_path(token, "/loan"), term_id)
    }

    pub fn finalize_loan(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        params: &FinalizeLoan,
    ) -> ApiResult<Finalization> {
        let mut loan = Map::new();
        loan.insert("agree_processing".to_string(), json!("1"));
        if params.skip_confirmation {
            loan.insert("skip_confirmation".to_string(), json!(true));
        } else {
            loan.insert("confirmation_code".to_string(), json!(params.code));
        }
        loan.insert("agree_sms_info".to_string(), json!(params.sms_info));

        self.post(session, &loan_request_path(token, "/loan/finalization"), &json!({ "loan": loan }))?
            .try_map(Payload::decode::<Finalization>)
    }

    pub fn confirm_loan(&self, session: &Session, token: &LoanRequestToken, bill: &Value) -> ApiResult<Payload> {
        self.put(session, &loan_request_path(token, "/loan/bill"), &json!({ "loan": { "bill": bill } }))
    }

    pub fn create_virtual_card(&self, session: &Session, token: &LoanRequestToken, term_id: u64) -> ApiResult<Payload> {
        self.post_with_source(session, &loan_request_path(token, "/virtual_card"), term_id)
    }

    pub fn create_card_loan(&self, session: &Session, token: &LoanRequestToken, term_id: u64) -> ApiResult<Payload> {
        self.post_with_source(session, &loan_request_path(token, "/card_loan"), term_id)
    }

    // -----------------------------------------------------------------------
    // Client registration
    // -----------------------------------------------------------------------

    pub fn start_self_registration(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        mobile_phone: &str,
        skip_message: bool,
    ) -> ApiResult<Payload> {
        let body = json!({ "mobile_phone": mobile_phone, "skip_message": skip_message });
        self.post(session, &loan_request_path(token, "/client/self_registration"), &body)
    }

    pub fn check_client_code(&self, session: &Session, token: &LoanRequestToken, code: &str) -> ApiResult<Payload> {
        self.post(session, &loan_request_path(token, "/client/check_code"), &json!({ "code": code }))
    }

    pub fn create_client(
        &self,
        session: &Session,
        token: &LoanRequestToken,
        client_params: &Value,
        provider_data: &Value,
    ) -> ApiResult<Payload> {
        let body = json!({ "client": client_params, "provider_data": provider_data });
        self.post(session, &loan_request_path(token, "/client"), &body)
    }

    pub fn update_client(&self, session: &Session, client_id: u64, client_params: &Value) -> ApiResult<Payload> {
        self.patch(session, &format!("clients/{client_id}"), &json!({ "client": client_params }))
    }

    pub fn get_client(&self, session: &Session, guid: Uuid) -> ApiResult<Payload> {
        self.get(session, &format!("clients/{guid}"))
    }

    // -----------------------------------------------------------------------
    // Client services
    // -----------------------------------------------------------------------

    pub fn send_billing_shift_confirmation_code(&self, session: &Session, client_id: u64) -> ApiResult<Payload> {
        self.post(session, &format!("clients/{client_id}/billing_shift"), &EmptyBody {})
    }

    pub fn billing_shift_info(&self, session: &Session, client_id: u64) -> ApiResult<Payload> {
        self.get(session, &format!("clients/{client_id}/billing_shift/info"))
    }

    pub fn confirm_billing_shift(
        &self,
        session: &Session,
        client_id: u64,
        code: &str,
        billing_chain: &Value,
    ) -> ApiResult<Payload> {
        let body = json!({ "code": code, "billing_chain": billing_chain });
        self.post(session, &format!("clients/{client_id}/billing_shift/confirmation"), &body)
    }

    pub fn increase_client_limit(&self, session: &Session, client_id: u64, amount: u64) -> ApiResult<Payload> {
        self.patch(session, &format!("clients/{client_id}/limit"), &json!({ "amount": amount }))
    }

    pub fn client_loan_documents(
        &self,
        session: &Session,
        client_id: u64,
        loan_application_id: u64,
    ) -> ApiResult<Payload> {
        self.get(session, &format!("clients/{client_id}/loans/{loan_application_id}"))
    }

    pub fn get_client_additional_services(&self, session: &Session, client_id: u64) -> ApiResult<Payload> {
        self.get(session, &format!("clients/{client_id}/additional_services"))
    }

    /// `additional_services` is sent as the whole request body.
    pub fn update_client_additional_services(
        &self,
        session: &Session,
        client_id: u64,
        additional_services: &Value,
    ) -> ApiResult<Payload> {
        self.patch(session, &format!("clients/{client_id}/additional_services"), additional_services)
    }

    // -----------------------------------------------------------------------
    // Orders and returns
    // -----------------------------------------------------------------------

    pub fn orders(&self, session: &Session, store_id: u64, filters: &Map<String, Value>) -> ApiResult<Payload> {
        self.get_with_body(session, "orders", &json!({ "store_id": store_id, "filters": filters }))
    }

    pub fn send_return_confirmation_code(&self, session: &Session, order_id: u64) -> ApiResult<Payload> {
        self.post(session, &format!("orders/{order_id}/send_return_confirmation_code"), &EmptyBody {})
    }

    pub fn create_return(&self, session: &Session, new_return: &NewReturn) -> ApiResult<Payload> {
        self.post(session, "returns", &ReturnBody { new_return })
    }

    pub fn confirm_return(&self, session: &Session, return_id: u64) -> ApiResult<Payload> {
        self.post(session, &format!("returns/{return_id}/confirm"), &EmptyBody {})
    }

    pub fn cancel_return(&self, session: &Session, return_id: u64) -> ApiResult<Payload> {
        self.post(session, &format!("returns/{return_id}/cancel"), &EmptyBody {})
    }

    // -----------------------------------------------------------------------
    // Dispatch helpers
    // -----------------------------------------------------------------------

    fn get(&self, session: &Session, endpoint: &str) -> ApiResult<Payload> {
        self.get_with_body(session, endpoint, &EmptyBody {})
    }

    fn get_with_body<B: Serialize + ?Sized>(&self, session: &Session, endpoint: &str, body: &B) -> ApiResult<Payload> {
        self.dispatcher.dispatch(session, HttpMethod::Get, endpoint, body, &[])
    }

    fn post<B: Serialize + ?Sized>(&self, session: &Session, endpoint: &str, body: &B) -> ApiResult<Payload> {
        self.dispatcher.dispatch(session, HttpMethod::Post, endpoint, body, &[])
    }

    fn put<B: Serialize + ?Sized>(&self, session: &Session, endpoint: &str, body: &B) -> ApiResult<Payload> {
        self.dispatcher.dispatch(session, HttpMethod::Put, endpoint, body, &[])
    }

    fn patch<B: Serialize + ?Sized>(&self, session: &Session, endpoint: &str, body: &B) -> ApiResult<Payload> {
        self.dispatcher.dispatch(session, HttpMethod::Patch, endpoint, body, &[])
    }

    /// POST `{term_id}` tagged with the configured `Application-Source`.
    fn post_with_source(&self, session: &Session, endpoint: &str, term_id: u64) -> ApiResult<Payload> {
        let headers = [(APPLICATION_SOURCE_HEADER, self.config.application_source())];
        self.dispatcher
            .dispatch(session, HttpMethod::Post, endpoint, &json!({ "term_id": term_id }), &headers)
    }
}

fn loan_request_path(token: &LoanRequestToken, suffix: &str) -> String {
    format!("loan_requests/{token}{suffix}")
}

fn extract_or_empty(outcome: Outcome<Payload>, key: &str) -> Value {
    match outcome {
        Outcome::Success(payload) => payload
            .into_json()
            .and_then(|mut body| body.get_mut(key).map(Value::take))
            .unwrap_or(Value::Null),
        Outcome::Failure(_) => Value::Array(Vec::new()),
    }
}
