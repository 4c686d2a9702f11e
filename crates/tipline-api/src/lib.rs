#![forbid(unsafe_code)]
//! Wire contract for the tipline HTTP surface.

mod dto;
mod error_mapping;
mod errors;

pub use dto::{
    CreateOrderRequest, OtpSendRequest, OtpVerifyRequest, PlanPayload, ProfileUpdateRequest,
    PushTokenRequest, SigninRequest, SigninResponse, TipPayload, TipUpdatePayload, UserView,
    VerifyPaymentRequest,
};
pub use error_mapping::map_error_status;
pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "tipline-api";
