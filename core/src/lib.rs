//! Synchronous client for the loans REST API.
//!
//! # Overview
//! `LoansClient` exposes the lending workflow as method calls: session
//! login, loan-request creation and quoting, client registration, loan
//! confirmation and finalization, orders and returns, and client services
//! (billing shift, credit limit, additional services).
//!
//! # Design
//! - Every operation goes through one `Dispatcher`, which attaches the
//!   `Authorization` header, encodes the JSON body and classifies the
//!   response into an `Outcome` (see `dispatch` for the full table).
//! - Business failures are values (`Outcome::Failure`); a rejected session
//!   token (401) and transport failures are `ApiError`s that end the call.
//! - Session state is explicit: `Session` and `LoanRequestToken` are returned
//!   by the calls that create them and passed back in by the caller.
//! - The network sits behind the `Transport` trait; `UreqTransport` is the
//!   blocking default.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod outcome;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{ApiResult, LoansClient};
pub use config::ClientConfig;
pub use dispatch::Dispatcher;
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use outcome::{Failure, Outcome, Payload};
pub use session::{LoanRequestToken, Session};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Barcode, DocumentFormat, FinalizeLoan, Finalization, LoanApplication, LoanRequestOptions,
    LoanRequestSummary, LoanRequestTerms, NewReturn, ScheduleItem, ScoredClient, Term,
};
