use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, LitStr, parse_macro_input};

/// Implements `plugboard_base::ConfigSection` with the given key.
///
/// ```rust,ignore
/// #[config_section("database")]
/// #[derive(Deserialize)]
/// struct DatabaseConfig {
///     host: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn config_section(args: TokenStream, input: TokenStream) -> TokenStream {
    let key = parse_macro_input!(args as LitStr);
    let item = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    if key.value().is_empty() {
        return syn::Error::new(key.span(), "Config section key must not be empty")
            .to_compile_error()
            .into();
    }
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();

    quote! {
        #item

        impl #impl_generics ::plugboard_base::ConfigSection for #name #ty_generics #where_clause {
            fn key() -> &'static str {
                #key
            }
        }
    }
    .into()
}
