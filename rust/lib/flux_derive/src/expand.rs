//! Shared expansion for `#[state]` and `#[request]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    State,
    Request,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::State => "state",
            Kind::Request => "request",
        }
    }

    /// (derive name as written by users, tokens to add when missing)
    fn required_derives(self) -> Vec<(&'static str, TokenStream)> {
        let mut out = vec![("Debug", quote!(Debug)), ("Clone", quote!(Clone))];
        match self {
            Kind::State => {
                out.push(("PartialEq", quote!(PartialEq)));
                out.push(("Serialize", quote!(::serde::Serialize)));
            }
            Kind::Request => {
                out.push(("Deserialize", quote!(::serde::Deserialize)));
            }
        }
        out
    }
}

pub fn expand(kind: Kind, attr: TokenStream, item: ItemStruct) -> syn::Result<TokenStream> {
    let path = parse_path(kind, attr)?;

    let struct_name = &item.ident;
    let vis = &item.vis;
    let generics = &item.generics;

    let doc_attrs: Vec<_> = item.attrs.iter().filter(|a| a.path().is_ident("doc")).collect();
    let user_derive_attrs: Vec<_> = item
        .attrs
        .iter()
        .filter(|a| a.path().is_ident("derive"))
        .collect();
    let other_attrs: Vec<_> = item
        .attrs
        .iter()
        .filter(|a| !a.path().is_ident("derive") && !a.path().is_ident("doc"))
        .collect();

    let user_derives = collect_derives(&item);
    let extra_derives: Vec<TokenStream> = kind
        .required_derives()
        .into_iter()
        .filter(|(name, _)| !user_derives.iter().any(|d| d == name))
        .map(|(_, tokens)| tokens)
        .collect();

    let extra_attr = if extra_derives.is_empty() {
        quote! {}
    } else {
        quote! { #[derive(#(#extra_derives),*)] }
    };

    let fields = &item.fields;
    let struct_body = match fields {
        syn::Fields::Named(_) => quote! { #fields },
        syn::Fields::Unnamed(_) => quote! { #fields ; },
        syn::Fields::Unit => quote! { ; },
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let path_doc = format!("The {} path for Flux routing.", kind.label());

    // Helper attributes (`#[serde(..)]`) must follow the derive that owns them.
    Ok(quote! {
        #(#doc_attrs)*
        #(#user_derive_attrs)*
        #extra_attr
        #(#other_attrs)*
        #vis struct #struct_name #generics #struct_body

        impl #impl_generics #struct_name #ty_generics #where_clause {
            #[doc = #path_doc]
            pub const PATH: &'static str = #path;
        }
    })
}

fn parse_path(kind: Kind, attr: TokenStream) -> syn::Result<String> {
    let lit: syn::LitStr = syn::parse2(attr)?;
    let path = lit.value();
    if path.is_empty() {
        return Err(syn::Error::new(
            lit.span(),
            format!("{} path cannot be empty", kind.label()),
        ));
    }
    for level in path.split('/') {
        if level.is_empty() {
            return Err(syn::Error::new(
                lit.span(),
                format!("{} path `{}` has an empty level", kind.label(), path),
            ));
        }
        if level == "+" || level == "#" {
            return Err(syn::Error::new(
                lit.span(),
                format!("{} path `{}` must not contain wildcards", kind.label(), path),
            ));
        }
    }
    Ok(path)
}

/// Last path segment of every `#[derive(..)]` entry, so `serde::Serialize`
/// and `Serialize` are both recognized.
fn collect_derives(item: &ItemStruct) -> Vec<String> {
    let mut derives = Vec::new();
    for attr in &item.attrs {
        if attr.path().is_ident("derive") {
            if let Ok(meta) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, syn::Token![,]>::parse_terminated,
            ) {
                for path in meta {
                    if let Some(seg) = path.segments.last() {
                        derives.push(seg.ident.to_string());
                    }
                }
            }
        }
    }
    derives
}
