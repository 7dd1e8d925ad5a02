/* Copyright (C) 2021 Open Information Security Foundation
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

extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::{self, parse_macro_input, DeriveInput};

use crate::utils;

pub fn derive_app_layer_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let mut fields = Vec::new();
    let mut vals = Vec::new();
    let mut names = Vec::new();

    match input.data {
        syn::Data::Enum(ref data) => {
            for (i, v) in (&data.variants).into_iter().enumerate() {
                fields.push(v.ident.clone());
                let name = utils::get_attr_name(&v.attrs)
                    .unwrap_or_else(|| utils::transform_name(&v.ident.to_string(), '_'));
                names.push(name);
                if i > u8::MAX as usize {
                    panic!("AppLayerEvent supports at most 256 variants");
                }
                vals.push(i as u8);
            }
        }
        _ => panic!("AppLayerEvent can only be derived for enums"),
    }

    let crate_id = utils::crate_id();
    let expanded = quote! {
        impl #crate_id::applayer::AppLayerEvent for #name {
            fn from_id(id: u8) -> Option<#name> {
                match id {
                    #( #vals => Some(#name::#fields) ,)*
                    _ => None,
                }
            }

            fn as_u8(&self) -> u8 {
                match *self {
                    #( #name::#fields => #vals ,)*
                }
            }

            fn to_str(&self) -> &'static str {
                match *self {
                    #( #name::#fields => #names ,)*
                }
            }

            fn from_string(s: &str) -> Option<#name> {
                match s {
                    #( #names => Some(#name::#fields) ,)*
                    _ => None
                }
            }

            fn get_event_info(event_name: &str)
                -> Option<(u8, #crate_id::core::AppLayerEventType)>
            {
                #crate_id::applayer::get_event_info::<#name>(event_name)
            }

            fn get_event_info_by_id(event_id: u8)
                -> Option<(&'static str, #crate_id::core::AppLayerEventType)>
            {
                #crate_id::applayer::get_event_info_by_id::<#name>(event_id)
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}
