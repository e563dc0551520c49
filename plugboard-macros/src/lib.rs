use proc_macro::TokenStream;
use quote::{format_ident, quote};

use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned as _;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Token, Type};

const REQUIRE_ATTR: &str = "require";
const INJECTOR_ATTR: &str = "injector";
const INJECTOR_FIELD: &str = "injector";

/// A single `name: Type` entry of a `#[require(...)]` attribute.
struct Requirement {
    name: Ident,
    ty: Type,
}

impl Parse for Requirement {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty = input.parse()?;
        Ok(Self { name, ty })
    }
}

fn extract_requirements(attrs: &[Attribute]) -> syn::Result<Vec<Requirement>> {
    let mut requirements: Vec<Requirement> = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident(REQUIRE_ATTR) {
            continue;
        }
        let entries =
            attr.parse_args_with(Punctuated::<Requirement, Token![,]>::parse_terminated)?;
        for entry in entries {
            if requirements.iter().any(|v| v.name == entry.name) {
                return Err(Error::new(
                    entry.name.span(),
                    format!("Dependency `{}` is required twice", entry.name),
                ));
            }
            requirements.push(entry);
        }
    }
    Ok(requirements)
}

/// Derive macro for the Consumer trait.
///
/// Dependencies are declared with `#[require(name: Type, ...)]` on the struct.
/// The struct must contain one `plugboard::Injector` field, either named
/// `injector` or marked with `#[injector]`.
#[proc_macro_derive(Consumer, attributes(require, injector))]
pub fn derive_consumer(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    handle_derive_consumer(input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

fn handle_derive_consumer(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Generic consumers are not supported",
        ));
    }
    let fields = match &input.data {
        Data::Struct(s) => &s.fields,
        _ => return Err(Error::new(name.span(), "Only structs are supported")),
    };
    let fields = match fields {
        Fields::Named(fields) => &fields.named,
        Fields::Unnamed(_) => {
            return Err(Error::new(name.span(), "Tuple structs are not supported"));
        }
        Fields::Unit => {
            return Err(Error::new(
                name.span(),
                format!("Consumer requires an `{INJECTOR_FIELD}` field"),
            ));
        }
    };

    let marked: Vec<_> = fields
        .iter()
        .filter(|field| {
            field
                .attrs
                .iter()
                .any(|attr| attr.path().is_ident(INJECTOR_ATTR))
        })
        .collect();
    let injector = match marked.as_slice() {
        [field] => field.ident.clone(),
        [] => fields
            .iter()
            .find(|field| field.ident.as_ref().is_some_and(|v| v == INJECTOR_FIELD))
            .and_then(|field| field.ident.clone()),
        [_, second, ..] => {
            return Err(Error::new(
                second.span(),
                format!("Only one #[{INJECTOR_ATTR}] field allowed"),
            ));
        }
    };
    let injector = injector.ok_or_else(|| {
        Error::new(
            name.span(),
            format!("Consumer requires an `{INJECTOR_FIELD}` field or a #[{INJECTOR_ATTR}] field"),
        )
    })?;

    let requirements = extract_requirements(&input.attrs)?;
    let names: Vec<_> = requirements
        .iter()
        .map(|v| LitStr::new(&v.name.to_string(), v.name.span()))
        .collect();

    let mut accessors = Vec::new();
    for (requirement, name_lit) in requirements.iter().zip(&names) {
        let getter = &requirement.name;
        let setter = format_ident!("set_{}", requirement.name);
        let ty = &requirement.ty;
        accessors.push(quote! {
            #[doc = concat!("Resolves the `", #name_lit, "` dependency.")]
            pub fn #getter(
                &self,
            ) -> ::std::result::Result<::std::sync::Arc<#ty>, ::plugboard::ResolutionError> {
                ::plugboard::resolve::<Self, #ty>(self, #name_lit)
            }

            #[doc = concat!("Overrides the `", #name_lit, "` dependency for this instance.")]
            pub fn #setter(&self, value: #ty) {
                self.#injector.set_override(#name_lit, ::std::sync::Arc::new(value));
            }
        });
    }

    Ok(quote! {
        impl ::plugboard::Consumer for #name {
            fn binding() -> &'static ::plugboard::Binding {
                static BINDING: ::std::sync::LazyLock<::plugboard::Binding> =
                    ::std::sync::LazyLock::new(|| {
                        ::plugboard::Binding::new::<#name>([#(#names),*])
                    });
                &BINDING
            }

            fn injector(&self) -> &::plugboard::Injector {
                &self.#injector
            }
        }

        impl #name {
            #(#accessors)*
        }
    })
}
