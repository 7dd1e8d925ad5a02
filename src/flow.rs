/* Copyright (C) 2017-2025 Open Information Security Foundation
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

//! The parts of a flow the app-layer works on.

use crate::core::{AppProto, ALPROTO_UNKNOWN};
use crate::direction::Direction;
use crate::parser::AlState;
use crate::probing::AppLayerProbingFlowState;
use crate::pstate::AppLayerParserStateStore;

bitflags! {
    #[derive(Default)]
    pub struct FlowFlags: u32 {
        const NOPAYLOAD_INSPECTION = BIT_U32!(0);
        const NO_APPLAYER_INSPECTION = BIT_U32!(1);
        const NO_REASSEMBLY_TS = BIT_U32!(2);
        const NO_REASSEMBLY_TC = BIT_U32!(3);
    }
}

pub struct Flow {
    pub proto: u8,
    pub sp: u16,
    pub dp: u16,
    pub alproto: AppProto,
    pub flags: FlowFlags,
    /// Protocol state, allocated by the protocol on first data.
    pub alstate: Option<AlState>,
    /// Parser state, allocated on first data.
    pub alparser: Option<Box<AppLayerParserStateStore>>,
    pub probing: AppLayerProbingFlowState,
}

impl Flow {
    pub fn new(proto: u8, sp: u16, dp: u16) -> Self {
        Self {
            proto,
            sp,
            dp,
            alproto: ALPROTO_UNKNOWN,
            flags: FlowFlags::empty(),
            alstate: None,
            alparser: None,
            probing: AppLayerProbingFlowState::default(),
        }
    }

    pub fn set_no_app_layer_inspection(&mut self) {
        SCLogDebug!("flow: no app-layer inspection");
        self.flags |= FlowFlags::NO_APPLAYER_INSPECTION;
    }

    pub fn set_no_payload_inspection(&mut self) {
        self.flags |= FlowFlags::NOPAYLOAD_INSPECTION;
    }

    pub fn set_no_reassembly(&mut self) {
        self.flags |= FlowFlags::NO_REASSEMBLY_TS | FlowFlags::NO_REASSEMBLY_TC;
    }

    pub fn is_no_app_layer_inspection(&self) -> bool {
        self.flags.contains(FlowFlags::NO_APPLAYER_INSPECTION)
    }

    pub fn is_no_reassembly(&self, direction: Direction) -> bool {
        match direction {
            Direction::ToServer => self.flags.contains(FlowFlags::NO_REASSEMBLY_TS),
            Direction::ToClient => self.flags.contains(FlowFlags::NO_REASSEMBLY_TC),
        }
    }

    /// Port used to look up probing parsers for data in `direction`.
    pub fn probing_port(&self, direction: Direction) -> u16 {
        match direction {
            Direction::ToServer => self.dp,
            Direction::ToClient => self.sp,
        }
    }
}
