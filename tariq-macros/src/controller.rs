//! Implementation of the `#[controller]` macro

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{
    Error, FnArg, ImplItem, ImplItemFn, ItemImpl, Result, ReturnType, Type, Visibility,
};

/// Methods moved into the `Controller` impl instead of being listed.
const HOOKS: &[&str] = &["begin_request", "end_request", "on_activate"];

/// Builds the `ControllerMethod` entry of one public method.
fn method_entry(method: &ImplItemFn) -> Result<TokenStream> {
    let sig = &method.sig;
    let name = &sig.ident;
    let label = name.to_string();

    let Some(receiver) = sig.receiver() else {
        return Err(Error::new_spanned(sig, "controller methods must take `&self` or `&mut self`"));
    };
    if receiver.reference.is_none() {
        return Err(Error::new_spanned(
            receiver,
            "controller methods must take `&self` or `&mut self`, not `self`",
        ));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(Error::new_spanned(asyncness, "controller methods cannot be async"));
    }
    if !sig.generics.params.is_empty() {
        return Err(Error::new_spanned(&sig.generics, "controller methods cannot be generic"));
    }

    let mut params = Vec::new();
    let mut takes = Vec::new();
    let mut call_args = Vec::new();
    let mut has_context = false;

    let typed = sig.inputs.iter().filter_map(|arg| match arg {
        FnArg::Typed(pat) => Some(pat),
        FnArg::Receiver(_) => None,
    });

    for (index, arg) in typed.enumerate() {
        match &*arg.ty {
            Type::Reference(reference) => {
                if has_context {
                    return Err(Error::new_spanned(
                        arg,
                        "only one parameter can receive the request context",
                    ));
                }
                has_context = true;
                params.push(quote! { ::tariq::Param::context() });
                if reference.mutability.is_some() {
                    call_args.push(quote! { __ctx });
                } else {
                    call_args.push(quote! { &*__ctx });
                }
            }
            ty => {
                let value = format_ident!("__a{}", index);
                params.push(quote! { ::tariq::Param::value::<#ty>() });
                takes.push(quote! { let #value = __args.take::<#ty>(#index)?; });
                call_args.push(quote! { #value });
            }
        }
    }

    let output = match &sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    Ok(quote! {
        ::tariq::ControllerMethod::new(
            #label,
            ::std::vec![#(#params),*],
            <#output as ::tariq::IntoOutputs>::kinds(),
            |__this: &mut Self, __ctx: &mut ::tariq::Context, __args: &mut ::tariq::Args| {
                #(#takes)*
                ::std::result::Result::Ok(::tariq::IntoOutputs::into_outputs(__this.#name(#(#call_args),*)))
            },
        )
    })
}

pub fn controller_impl(args: TokenStream, input: ItemImpl) -> Result<TokenStream> {
    if !args.is_empty() {
        return Err(Error::new(args.span(), "#[controller] takes no arguments"));
    }
    if let Some((_, path, _)) = &input.trait_ {
        return Err(Error::new_spanned(path, "#[controller] must be placed on an inherent impl"));
    }

    let mut inherent = input.clone();
    inherent.items.clear();

    let mut hooks = Vec::new();
    let mut entries = Vec::new();
    let mut has_lifecycle = false;

    for item in input.items {
        let ImplItem::Fn(mut method) = item else {
            inherent.items.push(item);
            continue;
        };

        let name = method.sig.ident.to_string();
        if HOOKS.contains(&name.as_str()) {
            has_lifecycle |= name != "on_activate";
            method.vis = Visibility::Inherited;
            hooks.push(method);
            continue;
        }

        if matches!(method.vis, Visibility::Public(_)) && method.sig.receiver().is_some() {
            entries.push(method_entry(&method)?);
        }
        inherent.items.push(ImplItem::Fn(method));
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #inherent

        impl #impl_generics ::tariq::Controller for #self_ty #where_clause {
            const HAS_LIFECYCLE: bool = #has_lifecycle;

            fn methods() -> ::std::vec::Vec<::tariq::ControllerMethod<Self>> {
                ::std::vec![#(#entries),*]
            }

            #(#hooks)*
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: ItemImpl) -> Result<String> {
        controller_impl(TokenStream::new(), input).map(|t| t.to_string())
    }

    #[test]
    fn hooks_move_into_the_trait_impl() {
        let out = expand(parse_quote! {
            impl Home {
                pub fn begin_request(&mut self, ctx: &mut Context) {}
                pub fn get(&self) -> String { String::new() }
                fn helper(&self) {}
            }
        })
        .unwrap();

        assert!(out.contains("const HAS_LIFECYCLE : bool = true"));
        assert!(out.contains("\"get\""));
        assert!(!out.contains("\"helper\""));
        assert!(!out.contains("pub fn begin_request"));
    }

    #[test]
    fn on_activate_alone_has_no_lifecycle() {
        let out = expand(parse_quote! {
            impl Home {
                pub fn on_activate(a: &mut ControllerActivator<'_, Self>) {}
            }
        })
        .unwrap();
        assert!(out.contains("const HAS_LIFECYCLE : bool = false"));
    }

    #[test]
    fn context_and_values() {
        let out = expand(parse_quote! {
            impl Home {
                pub fn get_by(&self, ctx: &Context, id: i64) {}
            }
        })
        .unwrap();
        assert!(out.contains(":: tariq :: Param :: context ()"));
        assert!(out.contains("take :: < i64 > (1usize)"));
    }

    #[test]
    fn rejected_signatures() {
        assert!(expand(parse_quote! { impl Home { pub fn get(self) {} } }).is_err());
        assert!(expand(parse_quote! { impl Home { pub async fn get(&self) {} } }).is_err());
        assert!(expand(parse_quote! { impl Home { pub fn get<T>(&self) {} } }).is_err());
        assert!(
            expand(parse_quote! { impl Home { pub fn get(&self, a: &Context, b: &mut Context) {} } })
                .is_err()
        );
        assert!(expand(parse_quote! { impl Default for Home { fn default() -> Self { Home } } }).is_err());
    }
}
