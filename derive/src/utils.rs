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

/// Path of the framework crate as seen from the crate being expanded:
/// `crate` inside suricata-applayer itself (its unit and integration
/// tests included), `suricata_applayer` for everyone else.
pub fn crate_id() -> syn::Ident {
    let is_framework = std::env::var("CARGO_PKG_NAME")
        .map(|var| var == "suricata-applayer")
        .unwrap_or(false);
    let is_lib = std::env::var("CARGO_CRATE_NAME")
        .map(|var| var == "suricata_applayer")
        .unwrap_or(false);
    if is_framework && is_lib {
        syn::Ident::new("crate", proc_macro2::Span::call_site())
    } else {
        syn::Ident::new("suricata_applayer", proc_macro2::Span::call_site())
    }
}

/// Return the value of a `#[name("...")]` attribute, if present.
pub fn get_attr_name(attrs: &[syn::Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path.is_ident("name") {
            continue;
        }
        if let Ok(syn::Meta::List(l)) = attr.parse_meta() {
            for n in l.nested {
                if let syn::NestedMeta::Lit(syn::Lit::Str(s)) = n {
                    return Some(s.value());
                }
            }
        }
        panic!("name attribute expects a string literal");
    }
    None
}

/// Transform names such as "OneTwoThree" to "one_two_three".
pub fn transform_name(name: &str, delim: char) -> String {
    let mut out = String::new();
    let chars: Vec<char> = name.chars().collect();

    for i in 0..chars.len() {
        if i > 0
            && i < chars.len() - 1
            && chars[i].is_uppercase()
            && (chars[i - 1].is_lowercase() || chars[i + 1].is_lowercase())
        {
            out.push(delim);
        }
        out.push_str(&chars[i].to_lowercase().to_string());
    }
    out
}
