//! Flux proc macros for the status board.
//!
//! - `#[state("path")]`: mark a struct as a Flux state type
//! - `#[request("path")]`: mark a struct as a Flux request type
//!
//! Both generate `impl StructName { pub const PATH: &'static str = "the/path"; }`
//! and add any missing derives:
//!
//! - states: `Debug, Clone, PartialEq, serde::Serialize` (they are read by
//!   the shells as JSON)
//! - requests: `Debug, Clone, serde::Deserialize` (the shells send them as
//!   JSON)
//!
//! Paths must be concrete: no `+`/`#` wildcards and no empty levels.

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod expand;

use expand::Kind;

/// Define a Flux state type.
///
/// ```ignore
/// #[state("auth/state")]
/// #[serde(rename_all = "camelCase")]
/// pub struct AuthState {
///     pub phase: AuthPhase,
///     pub busy: bool,
/// }
/// ```
#[proc_macro_attribute]
pub fn state(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as syn::ItemStruct);
    expand::expand(Kind::State, attr.into(), item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Define a Flux request type.
///
/// ```ignore
/// #[request("auth/sign-in")]
/// pub struct SignInReq {
///     pub email: String,
///     pub password: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn request(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as syn::ItemStruct);
    expand::expand(Kind::Request, attr.into(), item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
