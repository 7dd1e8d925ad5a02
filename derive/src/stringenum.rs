/* Copyright (C) 2023 Open Information Security Foundation
 *
 * You can copy, redistribute or modify this Program under the terms of
 * the GNU General Public License version 2 as published by the Free
 * Software Foundation.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * version 2 along with this program; if not, write to the Free Software
 * Foundation, Inc., 51 Franklin Street, Fifth Floor, Boston, MA
 * 02110-1301, USA.
 */

//! String-enumeration derive macro

/*
String enumeration allows a compact representation, and ensure that
there is no discrepancy between what is logged, and what can be parser
in signature keywords.

Usage: derive EnumStringU16 on an enum with explicit u16 values

    #[derive(EnumStringU16)]
    #[repr(u16)]
    pub enum TemplateField {
        Length = 0,
        Payload = 1,
    }

Parser field enums use this to map a local parser id to the name
registered in the dispatch table.

Then, get 4 functions to translate from u16 <-> TemplateField <-> string
- from_u : takes an unsigned and return an Option<TemplateField>
- into_u : takes a TemplateField and return an unsigned
- from_str : takes a string and return an Option<TemplateField>
- to_str : takes a TemplateField and return a string (&'static str)

Names are snake_case:
TemplateField::Payload.to_str() is "payload"

Strings parsed to get an enumeration value are case insensitive
*/

extern crate proc_macro;
use crate::utils::{self, transform_name};
use proc_macro::TokenStream;
use quote::quote;
use std::str::FromStr;
use syn::{self, parse_macro_input, DeriveInput};

pub fn derive_enum_string<T: std::str::FromStr + quote::ToTokens>(
    input: TokenStream, ustr: &str,
) -> TokenStream
where
    <T as FromStr>::Err: std::fmt::Display,
{
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;
    let mut values = Vec::new();
    let mut names = Vec::new();
    let mut names_upper = Vec::new();
    let mut fields = Vec::new();

    if let syn::Data::Enum(ref data) = input.data {
        for v in (&data.variants).into_iter() {
            if let Some((_, val)) = &v.discriminant {
                let fname = transform_name(&v.ident.to_string(), '_');
                names_upper.push(fname.to_ascii_uppercase());
                names.push(fname);
                fields.push(v.ident.clone());
                if let syn::Expr::Lit(l) = val {
                    if let syn::Lit::Int(li) = &l.lit {
                        if let Ok(value) = li.base10_parse::<T>() {
                            values.push(value);
                        } else {
                            panic!("EnumString requires explicit {}", ustr);
                        }
                    } else {
                        panic!("EnumString requires explicit literal integer");
                    }
                } else {
                    panic!("EnumString requires explicit literal");
                }
            } else {
                panic!("EnumString requires explicit values");
            }
        }
    } else {
        panic!("EnumString can only be derived for enums");
    }

    let crate_id = utils::crate_id();

    let utype_str = syn::Ident::new(ustr, proc_macro2::Span::call_site());

    let expanded = quote! {
        impl #crate_id::applayer::EnumString<#utype_str> for #name {
            fn from_u(v: #utype_str) -> Option<Self> {
                match v {
                    #( #values => Some(#name::#fields) ,)*
                    _ => None,
                }
            }
            fn into_u(self) -> #utype_str {
                match self {
                    #( #name::#fields => #values ,)*
                }
            }
            fn to_str(&self) -> &'static str {
                match *self {
                    #( #name::#fields => #names ,)*
                }
            }
            fn from_str(s: &str) -> Option<Self> {
                match s.to_ascii_uppercase().as_str() {
                    #( #names_upper => Some(#name::#fields) ,)*
                    _ => None
                }
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}
