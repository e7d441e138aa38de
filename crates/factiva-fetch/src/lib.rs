//! Credentials and HTTP transport for the Factiva Analytics client.
//!
//! - [`Credential`] / [`UserKey`] - Authentication headers
//! - [`Transport`] - The single network seam: send a request, get status and body
//! - [`ReqwestTransport`] - Pooled reqwest implementation
//! - [`url`] - Job and status URL construction

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factiva-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod credential;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod url;

pub use client::{ClientConfig, ReqwestTransport, Transport, TransportError};
pub use credential::{Credential, USER_KEY_LEN, UserKey};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
