//! Plain functions as handlers.
//!
//! Any `Fn(&mut Context, A0, .., A3) -> R` whose arguments can be resolved
//! from a registry becomes a [`Handler`]: arguments are injected like
//! controller method arguments and `R` is written by the same dispatcher.

use std::any::type_name;
use std::sync::Arc;

use http::StatusCode;
use tariq_container::{Args, Dependencies, FuncInjector, InjectError, Param};
use tracing::error;

use crate::context::{Context, Handler};
use crate::result::{DispatchOptions, IntoOutputs, dispatch_func_result};

/// Stops a request whose inputs could not be produced.
///
/// Path values that do not convert are the client's fault (400); anything
/// else is a server error (500).
pub(crate) fn fail_request(ctx: &mut Context, err: &InjectError) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    error!(method = %ctx.method(), path = ctx.path(), error = %err, status = status.as_u16(), "Failed to inject request inputs");
    ctx.stop_with_status(status);
    if err.is_client_error() {
        ctx.text(&err.to_string());
    }
}

/// Functions that can be turned into handlers.
///
/// `Marker` is the return type followed by the injected argument types; it
/// only exists to keep the implementations for different arities apart.
pub trait IntoHandler<Marker> {
    fn into_handler(
        self,
        deps: &Dependencies<Context>,
        options: DispatchOptions,
    ) -> Result<Handler, InjectError>;
}

macro_rules! impl_into_handler {
    ($([$ty:ident $idx:literal]),*) => {
        impl<F, R, $($ty,)*> IntoHandler<(R, $($ty,)*)> for F
        where
            F: Fn(&mut Context, $($ty),*) -> R + Send + Sync + 'static,
            R: IntoOutputs,
            $($ty: 'static,)*
        {
            #[allow(non_snake_case)]
            fn into_handler(
                self,
                deps: &Dependencies<Context>,
                options: DispatchOptions,
            ) -> Result<Handler, InjectError> {
                let params = vec![Param::context(), $(Param::value::<$ty>()),*];
                let injector = FuncInjector::new(&params, deps, type_name::<F>())?;

                Ok(Arc::new(move |ctx: &mut Context| {
                    let mut args = Args::with_len(injector.len());
                    if let Err(err) = injector.inject(&mut args, ctx) {
                        fail_request(ctx, &err);
                        return;
                    }
                    $(
                        let $ty = match args.take::<$ty>($idx) {
                            Ok(value) => value,
                            Err(err) => {
                                fail_request(ctx, &err);
                                return;
                            }
                        };
                    )*
                    let outputs = (self)(ctx, $($ty),*).into_outputs();
                    dispatch_func_result(ctx, outputs, &options);
                }))
            }
        }
    };
}

impl_into_handler!();
impl_into_handler!([A0 1]);
impl_into_handler!([A0 1], [A1 2]);
impl_into_handler!([A0 1], [A1 2], [A2 3]);
impl_into_handler!([A0 1], [A1 2], [A2 3], [A3 4]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use http::Method;

    #[derive(Clone)]
    struct Prefix(&'static str);

    fn deps() -> Dependencies<Context> {
        let mut deps = Dependencies::new();
        deps.bind(Prefix("say"));
        deps.bind_with(|ctx: &mut Context| ctx.params().get("param").unwrap_or_default().to_string());
        deps
    }

    #[test]
    fn context_only() {
        let handler = (|ctx: &mut Context| {
            ctx.set_status(StatusCode::ACCEPTED);
        })
        .into_handler(&deps(), DispatchOptions::default())
        .unwrap();

        let mut router = Router::new();
        router.get("/", handler);
        assert_eq!(router.serve(Method::GET, "/").status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn injected_arguments() {
        let handler = (|_ctx: &mut Context, prefix: Prefix, param: String| {
            format!("{} {param}", prefix.0)
        })
        .into_handler(&deps(), DispatchOptions::default())
        .unwrap();

        let mut router = Router::new();
        router.get("/param/{param:string}", handler);
        assert_eq!(
            router.serve(Method::GET, "/param/the_param_value").body_text(),
            "say the_param_value"
        );
    }

    #[test]
    fn missing_provider() {
        let err = (|_ctx: &mut Context, _n: u64| {})
            .into_handler(&deps(), DispatchOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, InjectError::NotBound(_)));
    }

    #[test]
    fn client_errors_are_bad_requests() {
        let mut ctx = Context::new(Method::GET, "/");
        let err = InjectError::PathParam {
            name: "id".into(),
            value: "x".into(),
            target: tariq_container::TypeKey::of::<i64>(),
        };
        fail_request(&mut ctx, &err);
        assert_eq!(ctx.status(), StatusCode::BAD_REQUEST);
        assert!(ctx.is_stopped());

        let mut ctx = Context::new(Method::GET, "/");
        fail_request(&mut ctx, &InjectError::MissingArgument { index: 1 });
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(ctx.body().is_empty());
    }
}
