/* Copyright (C) 2017-2026 Open Information Security Foundation
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

//! Application layer parser framework.
//!
//! Protocol registration, per flow parser state, field extraction,
//! transaction tracking and protocol probing for the app-layer.

#![cfg_attr(feature = "strict", deny(warnings))]

// Clippy lints we want to suppress due to style, or simply too noisy
// and not a priority right now.
#![allow(clippy::needless_return)]
#![allow(clippy::redundant_field_names)]
#![allow(clippy::len_zero)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate suricata_applayer_derive;

#[macro_use]
pub mod debug;

#[macro_use]
pub mod core;

pub mod conf;
pub mod direction;
pub mod flow;

#[macro_use]
pub mod applayer;
pub mod filecontainer;

pub mod parser;
pub mod probing;
pub mod pstate;
pub mod app_layer;
pub mod transaction;

pub mod applayertemplate;
