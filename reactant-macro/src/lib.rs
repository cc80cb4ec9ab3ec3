/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Reactant Macro Library
//!
//! Procedural macros for the Reactant actor runtime.
//!
//! ```ignore
//! #[reactant_message]
//! pub struct Ping(pub u32);
//!
//! #[reactant_state]
//! #[derive(Default)]
//! pub struct Counter {
//!     hits: u64,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

fn derive_missing(input: &DeriveInput, wanted: &[&str]) -> proc_macro2::TokenStream {
    let traits: Vec<_> = wanted
        .iter()
        .filter(|name| !has_derive(input, name))
        .map(|name| quote::format_ident!("{}", name))
        .collect();
    if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    }
}

/// Marks a type as a Reactant message.
///
/// Expands to `#[derive(Clone, Debug)]` (only the traits not already derived) and a
/// compile-time assertion that the type is `Send + Sync + 'static`, which is what the
/// runtime's blanket `Message` implementation needs.
///
/// ```ignore
/// use reactant_macro::reactant_message;
///
/// #[reactant_message]
/// pub struct Increment {
///     pub amount: u32,
/// }
/// ```
#[proc_macro_attribute]
pub fn reactant_message(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let derives = derive_missing(&input, &["Clone", "Debug"]);
    let assert_ident = quote::format_ident!("_AssertReactantMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}

/// Marks a type as the private state of a reactor.
///
/// Expands to `#[derive(Debug)]` when missing and asserts that the type is
/// `Send + 'static`; reactor state travels with its continuation between worker threads.
///
/// ```ignore
/// use reactant_macro::reactant_state;
///
/// #[reactant_state]
/// #[derive(Default)]
/// pub struct Tally {
///     seen: Vec<u32>,
/// }
/// ```
#[proc_macro_attribute]
pub fn reactant_state(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let derives = derive_missing(&input, &["Debug"]);
    let assert_ident = quote::format_ident!("_AssertReactantState_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
