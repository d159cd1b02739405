//! Path-parameter binding.
//!
//! Converts route parameters into method arguments. A template parameter
//! binds to the next method parameter whose type can hold it; each binding
//! becomes a consumable provider in the route's registry.

use std::sync::Arc;

use tariq_container::{BoxedValue, InjectError, Param, PathParam, Provider, TypeKey};
use tracing::trace;

use crate::context::Context;
use crate::template::{ParamType, Template, parse_bool};

macro_rules! is_any_of {
    ($key:expr; $($ty:ty),*) => {
        false $(|| $key.is::<$ty>())*
    };
}

fn is_signed(key: TypeKey) -> bool {
    is_any_of!(key; i8, i16, i32, i64, i128, isize)
}

fn is_unsigned(key: TypeKey) -> bool {
    is_any_of!(key; u8, u16, u32, u64, u128, usize)
}

/// The template type a method parameter of type `key` is read as.
///
/// ```
/// use tariq_container::TypeKey;
/// use tariq_mvc::binding::param_type_of;
/// use tariq_mvc::template::ParamType;
///
/// assert_eq!(param_type_of(TypeKey::of::<String>()), Some(ParamType::String));
/// assert_eq!(param_type_of(TypeKey::of::<i32>()), Some(ParamType::Int));
/// assert_eq!(param_type_of(TypeKey::of::<u64>()), Some(ParamType::Uint));
/// assert_eq!(param_type_of(TypeKey::of::<bool>()), Some(ParamType::Boolean));
/// assert_eq!(param_type_of(TypeKey::of::<f64>()), None);
/// ```
pub fn param_type_of(key: TypeKey) -> Option<ParamType> {
    if key.is::<String>() {
        Some(ParamType::String)
    } else if key.is::<bool>() {
        Some(ParamType::Boolean)
    } else if is_signed(key) {
        Some(ParamType::Int)
    } else if is_unsigned(key) {
        Some(ParamType::Uint)
    } else {
        None
    }
}

/// Returns `true` if a parameter of template type `kind` can be stored in
/// a method parameter of type `key`.
pub fn accepts_key(kind: ParamType, key: TypeKey) -> bool {
    match kind {
        ParamType::String | ParamType::Path => key.is::<String>(),
        ParamType::Int | ParamType::Uint => is_signed(key) || is_unsigned(key),
        ParamType::Boolean => key.is::<bool>(),
    }
}

/// Converts a raw path value into a value of type `key`.
pub fn parse_path_value(key: TypeKey, raw: &str) -> Option<BoxedValue> {
    macro_rules! parse_as {
        ($($ty:ty),*) => {
            $(
                if key.is::<$ty>() {
                    return raw.parse::<$ty>().ok().map(|v| Box::new(v) as BoxedValue);
                }
            )*
        };
    }

    if key.is::<String>() {
        return Some(Box::new(raw.to_string()));
    }
    if key.is::<bool>() {
        return parse_bool(raw).map(|v| Box::new(v) as BoxedValue);
    }
    parse_as!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    None
}

/// Builds one provider per template parameter that a method parameter
/// can receive.
///
/// Template parameters are matched in order against the method's value
/// parameters; parameters that no method parameter can hold are left to
/// the handler (`ctx.params()`).
pub fn path_params_for_input(template: &Template, params: &[Param]) -> Vec<Provider<Context>> {
    let inputs: Vec<TypeKey> = params
        .iter()
        .filter(|p| !p.is_context())
        .map(Param::key)
        .collect();

    let mut providers = Vec::new();
    let mut cursor = 0;

    for tp in template.params() {
        let Some(offset) = inputs[cursor.min(inputs.len())..]
            .iter()
            .position(|key| accepts_key(tp.kind, *key))
        else {
            trace!(param = %tp.name, kind = %tp.kind, "Path parameter not bound to an input");
            continue;
        };

        let key = inputs[cursor + offset];
        cursor += offset + 1;

        let name = tp.name.clone();
        let binder = Arc::new(move |ctx: &mut Context| {
            let raw = ctx.params().get(&name).unwrap_or_default();
            parse_path_value(key, raw).ok_or_else(|| InjectError::PathParam {
                name: name.clone(),
                value: raw.to_string(),
                target: key,
            })
        });

        providers.push(Provider::path_param(
            key,
            PathParam {
                name: tp.name.clone(),
                index: tp.index,
            },
            binder,
        ));
    }

    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use tariq_container::{Dependencies, FuncInjector, Args, PlanSource};

    fn route_deps(template: &str, params: &[Param]) -> Dependencies<Context> {
        let template = Template::parse(template).unwrap();
        let mut deps = Dependencies::new();
        for provider in path_params_for_input(&template, params) {
            deps.add_path_param(provider);
        }
        deps
    }

    #[test]
    fn binds_in_template_order() {
        let params = [Param::context(), Param::value::<bool>(), Param::value::<i32>()];
        let deps = route_deps("/something/{param0:boolean}/else/this/{param1:int}", &params);
        let injector = FuncInjector::new(&params, &deps, "get_something_by_else_this_by").unwrap();

        assert_eq!(
            injector.plan()[2].source,
            PlanSource::PathParameter {
                name: "param1".into(),
                index: 1
            }
        );

        let mut ctx = Context::new(Method::GET, "/something/true/else/this/42");
        ctx.params_mut().set("param0", "true");
        ctx.params_mut().set("param1", "42");

        let mut args = Args::with_len(3);
        injector.inject(&mut args, &mut ctx).unwrap();
        assert!(args.take::<bool>(1).unwrap());
        assert_eq!(args.take::<i32>(2).unwrap(), 42);
    }

    #[test]
    fn two_strings_receive_two_segments() {
        let params = [Param::value::<String>(), Param::value::<String>()];
        let deps = route_deps("/{first}/{second}", &params);
        let injector = FuncInjector::new(&params, &deps, "get_by").unwrap();

        let mut ctx = Context::new(Method::GET, "/a/b");
        ctx.params_mut().set("first", "a");
        ctx.params_mut().set("second", "b");

        let mut args = Args::with_len(2);
        injector.inject(&mut args, &mut ctx).unwrap();
        assert_eq!(args.take::<String>(0).unwrap(), "a");
        assert_eq!(args.take::<String>(1).unwrap(), "b");
    }

    #[test]
    fn overflow_is_a_client_error() {
        let params = [Param::value::<u8>()];
        let deps = route_deps("/{param0:uint}", &params);
        let injector = FuncInjector::new(&params, &deps, "get_by").unwrap();

        let mut ctx = Context::new(Method::GET, "/300");
        ctx.params_mut().set("param0", "300");

        let err = injector.inject(&mut Args::with_len(1), &mut ctx).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn unmatched_template_params_are_skipped() {
        let params = [Param::value::<i64>()];
        let template = Template::parse("/{name:string}/{id:int}").unwrap();
        let providers = path_params_for_input(&template, &params);

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].path().map(|p| p.index), Some(1));
    }
}
