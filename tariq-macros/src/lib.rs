//! Procedural macros for Tariq controllers.
//!
//! - `#[derive(Inject)]` describes the injectable fields of a struct
//! - `#[controller]` turns an inherent impl into a controller

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemImpl, parse_macro_input};

mod controller;
mod inject;

/// Implements `Injectable` for a struct with named fields.
///
/// Every field is filled from the registry when a provider of its type
/// exists, otherwise it keeps its `Default` value. An `Option<T>` field is
/// filled from a provider of `T`.
///
/// # Example
///
/// ```ignore
/// use tariq::Inject;
///
/// #[derive(Default, Inject)]
/// struct UserController {
///     service: Arc<UserService>,
///     #[inject(skip)]
///     hits: usize,
/// }
/// ```
///
/// # Attributes
///
/// - `#[inject(skip)]` - Never inject this field
#[proc_macro_derive(Inject, attributes(inject))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    inject::derive_inject_impl(input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}

/// Implements `Controller` from an inherent impl.
///
/// Every `pub fn` taking `&self` or `&mut self` is listed as a method and
/// becomes a route when its name starts with an HTTP verb, `all` or `any`.
/// A reference parameter receives the request context; all others are
/// injected. `begin_request`, `end_request` and `on_activate` are moved
/// into the `Controller` impl as hooks.
///
/// # Example
///
/// ```ignore
/// use tariq::{Context, controller};
///
/// #[controller]
/// impl UserController {
///     pub fn begin_request(&mut self, ctx: &mut Context) { /* ... */ }
///
///     pub fn get_by(&self, id: i64) -> Json<User> { /* ... */ }
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemImpl);

    controller::controller_impl(args.into(), input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
