use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Maps a struct with named fields onto form values, one field per member.
#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "FormModel derive supports only non-generic structs",
        ));
    }

    let model_ident = input.ident;
    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &model_ident,
                    "FormModel derive requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &model_ident,
                "FormModel derive is only supported on structs",
            ));
        }
    };

    let unoui = unoui_path();
    let mut names = Vec::new();
    let mut writes = Vec::new();
    let mut reads = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_name = field_ident.unraw().to_string();

        writes.push(quote! {
            #unoui::form::write_model_field(
                &mut values,
                #field_name,
                ::core::clone::Clone::clone(&self.#field_ident),
            );
        });
        reads.push(quote! {
            #field_ident: #unoui::form::read_model_field(values, #field_name)?,
        });
        names.push(field_name);
    }

    Ok(quote! {
        impl #unoui::form::FormModel for #model_ident {
            fn field_names() -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn to_values(&self) -> #unoui::form::FormValues {
                let mut values = #unoui::form::FormValues::new();
                #(#writes)*
                values
            }

            fn from_values(
                values: &#unoui::form::FormValues,
            ) -> #unoui::form::FormResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#reads)*
                })
            }
        }
    })
}

fn unoui_path() -> TokenStream2 {
    match crate_name("unoui") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::unoui),
    }
}
