pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiRequest, ApiResponse, ContractApiClient, HttpMethod, RetryPolicy};
pub use error::ApiError;
pub use types::{
    Contract, ContractStatus, DeactivationRequest, Equipment, Negotiation, Protocol,
};
