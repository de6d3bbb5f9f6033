//! Advertising API infrastructure adapter.
//!
//! Implements the [`pipeline::AdsService`] trait over the REST encoding of the
//! API: a `googleAds:search` call for budget lookups and a
//! `campaignBudgets:mutate` call for amount updates.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication headers, request
//! formatting, response parsing, and error unwrapping live here. The
//! [`pipeline`] crate sees only [`pipeline::AdsService`] and
//! [`pipeline::ApiError`].
//!
//! Credentials are supplied ready to use; token refresh is the caller's
//! concern.

pub mod client;
pub mod wire;

pub use client::{
    AdsConnection, ClientBuildError, RestAdsClient, DEFAULT_API_VERSION, DEFAULT_BASE_URL,
};
