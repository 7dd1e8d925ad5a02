/* Copyright (C) 2024 Open Information Security Foundation
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

//! Probing parsers: protocol detection by payload on a port.
//!
//! Detectors are registered per (ipproto, port) and direction and kept
//! sorted by priority. Port 0 holds detectors that apply to any port.

use crate::core::{AppProto, ALPROTO_FAILED, ALPROTO_MAX, ALPROTO_UNKNOWN};
use crate::direction::Direction;
use crate::parser::RegistrationError;

pub const PRIORITY_HIGH: u8 = 1;
pub const PRIORITY_MEDIUM: u8 = 2;
pub const PRIORITY_LOW: u8 = 3;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProbeResult {
    /// Payload belongs to the detector's protocol.
    Match,
    /// Not recognized yet, more data may help.
    NoMatch,
    /// Payload can not be this protocol.
    Failed,
}

pub type ProbeFn = fn(input: &[u8], direction: Direction) -> ProbeResult;

#[derive(Clone)]
pub struct AppLayerProbingParserElement {
    pub name: String,
    pub alproto: AppProto,
    pub alproto_mask: u64,
    pub min_depth: u16,
    pub max_depth: u16,
    pub priority: u8,
    pub probe: ProbeFn,
}

/// Detectors of one (ipproto, port).
#[derive(Clone)]
pub struct AppLayerProbingParser {
    pub ipproto: u8,
    pub port: u16,
    pub toserver_alproto_mask: u64,
    pub toclient_alproto_mask: u64,
    pub toserver_max_depth: u16,
    pub toclient_max_depth: u16,
    pub toserver: Vec<AppLayerProbingParserElement>,
    pub toclient: Vec<AppLayerProbingParserElement>,
}

impl AppLayerProbingParser {
    fn new(ipproto: u8, port: u16) -> Self {
        Self {
            ipproto,
            port,
            toserver_alproto_mask: 0,
            toclient_alproto_mask: 0,
            toserver_max_depth: 0,
            toclient_max_depth: 0,
            toserver: Vec::new(),
            toclient: Vec::new(),
        }
    }

    pub fn get(&self, direction: Direction) -> (&[AppLayerProbingParserElement], u64, u16) {
        match direction {
            Direction::ToServer => {
                (&self.toserver, self.toserver_alproto_mask, self.toserver_max_depth)
            }
            Direction::ToClient => {
                (&self.toclient, self.toclient_alproto_mask, self.toclient_max_depth)
            }
        }
    }

    fn insert(&mut self, direction: Direction, elem: AppLayerProbingParserElement) {
        let (list, mask, max_depth) = match direction {
            Direction::ToServer => (
                &mut self.toserver,
                &mut self.toserver_alproto_mask,
                &mut self.toserver_max_depth,
            ),
            Direction::ToClient => (
                &mut self.toclient,
                &mut self.toclient_alproto_mask,
                &mut self.toclient_max_depth,
            ),
        };
        *mask |= elem.alproto_mask;
        if elem.max_depth > *max_depth {
            *max_depth = elem.max_depth;
        }
        // after all entries of the same priority
        let pos = list
            .iter()
            .position(|e| e.priority > elem.priority)
            .unwrap_or(list.len());
        list.insert(pos, elem);
    }
}

/// Name to detector binding, a name always maps to one function.
#[derive(Clone)]
pub struct AppLayerProbingParserInfo {
    pub name: String,
    pub alproto: AppProto,
    pub probe: ProbeFn,
}

#[derive(Default, Clone)]
pub struct AppLayerProbingParsers {
    ports: Vec<AppLayerProbingParser>,
    info: Vec<AppLayerProbingParserInfo>,
}

fn same_fn(a: ProbeFn, b: ProbeFn) -> bool {
    a as usize == b as usize
}

impl AppLayerProbingParsers {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    fn check_info(&mut self, name: &str, alproto: AppProto, probe: ProbeFn) -> Result<(), RegistrationError> {
        if let Some(info) = self.info.iter().find(|i| i.name == name) {
            if info.alproto != alproto || !same_fn(info.probe, probe) {
                SCLogError!("probing parser \"{}\" registered with a different detector", name);
                return Err(RegistrationError::ProbingParserMismatch(name.to_string()));
            }
            return Ok(());
        }
        self.info.push(AppLayerProbingParserInfo {
            name: name.to_string(),
            alproto,
            probe,
        });
        Ok(())
    }

    pub fn register(
        &mut self, ipproto: u8, port: u16, name: &str, alproto: AppProto, min_depth: u16,
        max_depth: u16, direction: Direction, priority: u8, probe: ProbeFn,
    ) -> Result<(), RegistrationError> {
        if min_depth > max_depth {
            return Err(RegistrationError::InvalidDepth { min_depth, max_depth });
        }
        if alproto == ALPROTO_UNKNOWN || alproto >= ALPROTO_MAX {
            return Err(RegistrationError::UnknownProtocol(alproto));
        }
        self.check_info(name, alproto, probe)?;

        let elem = AppLayerProbingParserElement {
            name: name.to_string(),
            alproto,
            alproto_mask: BIT_U64!(alproto),
            min_depth,
            max_depth,
            priority,
            probe,
        };
        SCLogDebug!("registering probing parser {} ipproto {} port {} dir {}",
                    name, ipproto, port, direction);

        let idx = match self.ports.iter().position(|p| p.ipproto == ipproto && p.port == port) {
            Some(idx) => idx,
            None => {
                self.ports.push(AppLayerProbingParser::new(ipproto, port));
                self.ports.len() - 1
            }
        };
        let pp = &mut self.ports[idx];
        let (list, _, _) = pp.get(direction);
        if list.iter().any(|e| e.alproto == alproto) {
            return Err(RegistrationError::AlreadyRegistered {
                alproto,
                what: "probing parser for port",
            });
        }
        pp.insert(direction, elem);
        Ok(())
    }

    /// Detectors for the port, falling back to the any-port entry.
    pub fn get_probing_parsers(&self, ipproto: u8, port: u16) -> Option<&AppLayerProbingParser> {
        self.ports
            .iter()
            .find(|p| p.ipproto == ipproto && p.port == port)
            .or_else(|| self.ports.iter().find(|p| p.ipproto == ipproto && p.port == 0))
    }

    /// Run the detectors for `port` on `buf`. Returns the detected
    /// protocol, `ALPROTO_UNKNOWN` if more data is needed or
    /// `ALPROTO_FAILED` once no detector can match anymore.
    pub fn probe(
        &self, flow_state: &mut AppLayerProbingFlowState, ipproto: u8, port: u16,
        direction: Direction, buf: &[u8],
    ) -> AppProto {
        if flow_state.is_done(direction) {
            return ALPROTO_FAILED;
        }
        let pp = match self.get_probing_parsers(ipproto, port) {
            Some(pp) => pp,
            None => {
                SCLogDebug!("no probing parsers for port {}", port);
                flow_state.set_done(direction);
                return ALPROTO_FAILED;
            }
        };
        let (list, port_mask, port_max_depth) = pp.get(direction);
        let len = buf.len();
        let mask = flow_state.mask_mut(direction);

        for elem in list {
            if *mask & elem.alproto_mask != 0 {
                continue;
            }
            if len < elem.min_depth as usize {
                continue;
            }
            if len > elem.max_depth as usize {
                SCLogDebug!("{} depth {} exceeded", elem.name, elem.max_depth);
                *mask |= elem.alproto_mask;
                continue;
            }
            match (elem.probe)(buf, direction) {
                ProbeResult::Match => return elem.alproto,
                ProbeResult::Failed => *mask |= elem.alproto_mask,
                ProbeResult::NoMatch => {}
            }
        }

        if *mask == port_mask || len > port_max_depth as usize {
            flow_state.set_done(direction);
            return ALPROTO_FAILED;
        }
        ALPROTO_UNKNOWN
    }

    /// Dump the index at debug level.
    pub fn print(&self) {
        for pp in &self.ports {
            SCLogDebug!("ipproto {} port {}", pp.ipproto, pp.port);
            for (dir, list, depth) in [
                (Direction::ToServer, &pp.toserver, pp.toserver_max_depth),
                (Direction::ToClient, &pp.toclient, pp.toclient_max_depth),
            ] {
                SCLogDebug!("  {} max depth {}", dir, depth);
                for e in list {
                    SCLogDebug!("    {} alproto {} priority {} depth {}..{}",
                                e.name, e.alproto, e.priority, e.min_depth, e.max_depth);
                }
            }
        }
    }
}

/// Probing progress of one flow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppLayerProbingFlowState {
    pub toserver_mask: u64,
    pub toclient_mask: u64,
    toserver_done: bool,
    toclient_done: bool,
}

impl AppLayerProbingFlowState {
    pub fn is_done(&self, direction: Direction) -> bool {
        match direction {
            Direction::ToServer => self.toserver_done,
            Direction::ToClient => self.toclient_done,
        }
    }

    fn set_done(&mut self, direction: Direction) {
        match direction {
            Direction::ToServer => self.toserver_done = true,
            Direction::ToClient => self.toclient_done = true,
        }
    }

    fn mask_mut(&mut self, direction: Direction) -> &mut u64 {
        match direction {
            Direction::ToServer => &mut self.toserver_mask,
            Direction::ToClient => &mut self.toclient_mask,
        }
    }
}
