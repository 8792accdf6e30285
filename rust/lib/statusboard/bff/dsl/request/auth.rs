//! Auth screen requests.

use flux_derive::request;

#[request("auth/sign-in")]
pub struct SignInReq {
    pub email: String,
    pub password: String,
}

#[request("auth/sign-up")]
pub struct SignUpReq {
    pub email: String,
    pub password: String,
}

/// The auth screen's single button: signs in or up depending on the
/// current mode.
#[request("auth/submit")]
pub struct SubmitAuthReq {
    pub email: String,
    pub password: String,
}

#[request("auth/sign-out")]
pub struct SignOutReq {}

/// Switch between the sign-in and sign-up forms.
#[request("auth/toggle-mode")]
pub struct ToggleAuthModeReq {}
