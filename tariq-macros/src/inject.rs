//! Implementation of `#[derive(Inject)]`

use darling::{FromDeriveInput, FromField, ast};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericArgument, Ident, PathArguments, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(inject), supports(struct_named, struct_unit))]
struct InjectInput {
    ident: Ident,
    generics: syn::Generics,
    data: ast::Data<(), InjectField>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    skip: bool,
}

/// Returns `T` when `ty` is written as `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }

    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }

    match &last.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

pub fn derive_inject_impl(input: DeriveInput) -> darling::Result<TokenStream> {
    let input = InjectInput::from_derive_input(&input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = input
        .data
        .take_struct()
        .map(|fields| fields.fields)
        .unwrap_or_default();

    let mut entries = Vec::new();
    for field in fields.iter().filter(|f| !f.skip) {
        let Some(ident) = &field.ident else {
            continue;
        };
        let label = ident.to_string();

        let entry = match option_inner(&field.ty) {
            Some(inner) => quote! {
                ::tariq::Field::new(#label, |c: &mut Self, v: #inner| c.#ident = ::std::option::Option::Some(v))
            },
            None => {
                let ty = &field.ty;
                quote! {
                    ::tariq::Field::new(#label, |c: &mut Self, v: #ty| c.#ident = v)
                }
            }
        };
        entries.push(entry);
    }

    Ok(quote! {
        impl #impl_generics ::tariq::Injectable for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::tariq::Field<Self>> {
                ::std::vec![#(#entries),*]
            }
        }
    })
}
