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

//! Protocol registry and parser dispatch table.
//!
//! Registration happens once at startup on an [`AppLayerParserRegistry`].
//! [`AppLayerParserRegistry::freeze`] validates the registrations and
//! returns the read-only [`AppLayerParserCtx`] used by the packet path.

use std::any::Any;

use thiserror::Error;

use crate::applayer::{AppLayerDecoderEvents, AppLayerParserResult, AppLayerResult};
use crate::conf::{Conf, ConfError};
use crate::core::*;
use crate::direction::{Direction, DIR_BOTH};
use crate::filecontainer::FileContainer;
use crate::probing::{AppLayerProbingParsers, ProbeFn};
use crate::pstate::{AppLayerParserState, APP_LAYER_PARSER_BUFFER_LIMIT_DEFAULT};

/// Option flags, see `register_option_flags`.
pub const APP_LAYER_PARSER_OPT_ACCEPT_GAPS: u32 = BIT_U32!(0);

/// Opaque per flow protocol state.
pub type AlState = Box<dyn Any + Send>;
/// Opaque per thread protocol storage.
pub type LocalStorage = Box<dyn Any + Send>;

/// Context of a single parser invocation.
pub struct AppLayerParseCtx<'a> {
    pub direction: Direction,
    /// Stream flags of the current call.
    pub flags: u8,
    pub local_storage: Option<&'a mut (dyn Any + Send)>,
    /// Flow level decoder events.
    pub events: &'a mut AppLayerDecoderEvents,
}

impl<'a> AppLayerParseCtx<'a> {
    /// Thread local storage of the protocol, if it is of type `T`.
    pub fn local_storage<T: 'static>(&mut self) -> Option<&mut T> {
        self.local_storage.as_deref_mut()?.downcast_mut::<T>()
    }
}

pub type AppLayerParserFn = for<'i> fn(
    state: &mut (dyn Any + Send),
    pstate: &mut AppLayerParserState,
    input: &'i [u8],
    ctx: &mut AppLayerParseCtx<'_>,
    result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult;

pub type StateAllocFn = fn() -> Option<AlState>;
pub type StateFreeFn = fn(AlState);
pub type StateTxFreeFn = fn(&mut (dyn Any + Send), u64);
pub type StateGetTxCntFn = fn(&(dyn Any + Send)) -> u64;
pub type StateGetTxFn = fn(&(dyn Any + Send), u64) -> Option<&dyn Any>;
pub type StateGetProgressFn = fn(&dyn Any, Direction) -> i32;
pub type StateGetProgressCompletionStatusFn = fn(Direction) -> i32;
pub type StateGetEventsFn = fn(&(dyn Any + Send), u64) -> Option<&AppLayerDecoderEvents>;
pub type StateHasEventsFn = fn(&(dyn Any + Send)) -> bool;
pub type StateTruncateFn = fn(&mut (dyn Any + Send), Direction);
pub type StateGetFilesFn = fn(&mut (dyn Any + Send), Direction) -> Option<&mut FileContainer>;
pub type GetEventInfoFn = fn(&str) -> Option<(u8, AppLayerEventType)>;
pub type LocalStorageAllocFn = fn() -> Option<LocalStorage>;
pub type LocalStorageFreeFn = fn(LocalStorage);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("name {0} already registered")]
    DuplicateName(String),
    #[error("protocol table full ({} protocols)", ALPROTO_MAX)]
    ProtocolTableFull,
    #[error("parser table full ({} parsers)", MAX_PARSERS)]
    ParserTableFull,
    #[error("unknown protocol id {0}")]
    UnknownProtocol(AppProto),
    #[error("invalid direction flags {0:#04x}")]
    InvalidDirection(u8),
    #[error("{what} already registered for protocol {alproto}")]
    AlreadyRegistered { alproto: AppProto, what: &'static str },
    #[error("invalid probing depth {min_depth}..{max_depth}")]
    InvalidDepth { min_depth: u16, max_depth: u16 },
    #[error("probing parser {0} registered with different detectors")]
    ProbingParserMismatch(String),
    #[error("parser {parser} depends on unknown parser {dependency}")]
    MissingDependency { parser: String, dependency: String },
    #[error("protocol {proto} is missing {what}")]
    MissingCallback { proto: String, what: &'static str },
}

/// Global parser table entry.
pub struct AppLayerParserTableElement {
    pub name: String,
    pub alproto: AppProto,
    /// None for the root parser of a direction.
    pub local_id: Option<u16>,
    pub parser: AppLayerParserFn,
    pub dependency: Option<String>,
}

/// Registration of one protocol.
pub struct AppLayerProto {
    pub name: String,
    pub alproto: AppProto,
    /// Root parser ids, 0 if the direction has no parser.
    pub to_server: u16,
    pub to_client: u16,
    /// Local field id to global parser id.
    pub map: Vec<Option<u16>>,
    pub logger: bool,
    /// Direction the first data has to arrive in, 0 for any.
    pub first_data_dir: u8,
    pub option_flags: u32,

    pub(crate) state_alloc: Option<StateAllocFn>,
    pub(crate) state_free: Option<StateFreeFn>,
    pub(crate) local_storage_alloc: Option<LocalStorageAllocFn>,
    pub(crate) local_storage_free: Option<LocalStorageFreeFn>,
    pub(crate) get_files: Option<StateGetFilesFn>,
    pub(crate) get_events: Option<StateGetEventsFn>,
    pub(crate) has_events: Option<StateHasEventsFn>,
    pub(crate) truncate: Option<StateTruncateFn>,
    pub(crate) get_progress: Option<StateGetProgressFn>,
    pub(crate) get_tx_cnt: Option<StateGetTxCntFn>,
    pub(crate) get_tx: Option<StateGetTxFn>,
    pub(crate) completion_status: Option<StateGetProgressCompletionStatusFn>,
    pub(crate) tx_free: Option<StateTxFreeFn>,
    pub(crate) get_event_info: Option<GetEventInfoFn>,
}

impl AppLayerProto {
    fn new(name: &str, alproto: AppProto) -> Self {
        Self {
            name: name.to_string(),
            alproto,
            to_server: 0,
            to_client: 0,
            map: Vec::new(),
            logger: false,
            first_data_dir: 0,
            option_flags: 0,
            state_alloc: None,
            state_free: None,
            local_storage_alloc: None,
            local_storage_free: None,
            get_files: None,
            get_events: None,
            has_events: None,
            truncate: None,
            get_progress: None,
            get_tx_cnt: None,
            get_tx: None,
            completion_status: None,
            tx_free: None,
            get_event_info: None,
        }
    }

    pub fn map_size(&self) -> usize {
        self.map.len()
    }

    pub fn root_parser(&self, direction: Direction) -> u16 {
        match direction {
            Direction::ToServer => self.to_server,
            Direction::ToClient => self.to_client,
        }
    }

    pub fn has_parser(&self) -> bool {
        self.to_server != 0 || self.to_client != 0
    }

    /// Global parser id of a local field id.
    pub fn map_local(&self, local_id: u16) -> Option<u16> {
        self.map.get(local_id as usize).copied().flatten()
    }

    fn tx_funcs_count(&self) -> usize {
        [
            self.get_tx_cnt.is_some(),
            self.get_tx.is_some(),
            self.get_progress.is_some(),
            self.completion_status.is_some(),
        ]
        .iter()
        .filter(|x| **x)
        .count()
    }
}

fn set_once<T>(
    slot: &mut Option<T>, val: T, alproto: AppProto, what: &'static str,
) -> Result<(), RegistrationError> {
    if slot.is_some() {
        SCLogError!("{} already registered for protocol {}", what, alproto);
        return Err(RegistrationError::AlreadyRegistered { alproto, what });
    }
    *slot = Some(val);
    Ok(())
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppLayerConfEnabled {
    Yes,
    No,
    DetectionOnly,
}

fn conf_enabled(conf: &Conf, ipproto: &str, name: &str) -> Result<AppLayerConfEnabled, ConfError> {
    let mut param = format!("app-layer.protocols.{}.enabled", name);
    let val = match conf.get(&param) {
        Some(val) => val,
        None => {
            SCLogDebug!("Entry for {} not found.", param);
            param = format!("app-layer.protocols.{}.{}.enabled", name, ipproto);
            match conf.get(&param) {
                Some(val) => val,
                None => {
                    SCLogDebug!("Entry for {} not found.", param);
                    return Ok(AppLayerConfEnabled::Yes);
                }
            }
        }
    };
    match val.to_lowercase().as_str() {
        "yes" => Ok(AppLayerConfEnabled::Yes),
        "no" => Ok(AppLayerConfEnabled::No),
        "detection-only" => Ok(AppLayerConfEnabled::DetectionOnly),
        _ => {
            SCLogError!("Invalid value found for {}.", param);
            Err(ConfError::InvalidValue { key: param, value: val })
        }
    }
}

/// Is the parser of protocol `name` enabled for `ipproto`. A missing
/// entry means enabled, `detection-only` keeps the parser enabled.
pub fn conf_parser_enabled(conf: &Conf, ipproto: &str, name: &str) -> Result<bool, ConfError> {
    Ok(conf_enabled(conf, ipproto, name)? != AppLayerConfEnabled::No)
}

/// Is protocol detection for `name` enabled for `ipproto`.
pub fn conf_proto_detection_enabled(
    conf: &Conf, ipproto: &str, name: &str,
) -> Result<bool, ConfError> {
    Ok(conf_enabled(conf, ipproto, name)? != AppLayerConfEnabled::No)
}

/// Mutable registration table, used during startup only.
pub struct AppLayerParserRegistry {
    protos: Vec<AppLayerProto>,
    /// Parser id is the index plus one.
    parsers: Vec<AppLayerParserTableElement>,
    probing: AppLayerProbingParsers,
    buffer_limit: usize,
}

impl Default for AppLayerParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AppLayerParserRegistry {
    pub fn new() -> Self {
        Self {
            protos: Vec::new(),
            parsers: Vec::new(),
            probing: AppLayerProbingParsers::new(),
            buffer_limit: APP_LAYER_PARSER_BUFFER_LIMIT_DEFAULT,
        }
    }

    fn proto_mut(&mut self, alproto: AppProto) -> Result<&mut AppLayerProto, RegistrationError> {
        if alproto == ALPROTO_UNKNOWN {
            return Err(RegistrationError::UnknownProtocol(alproto));
        }
        self.protos
            .get_mut(alproto as usize - 1)
            .ok_or(RegistrationError::UnknownProtocol(alproto))
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.protos.iter().any(|p| p.name == name) || self.parsers.iter().any(|p| p.name == name)
    }

    fn add_parser(&mut self, elem: AppLayerParserTableElement) -> Result<u16, RegistrationError> {
        if self.name_in_use(&elem.name) {
            SCLogError!("parser name {} already registered", elem.name);
            return Err(RegistrationError::DuplicateName(elem.name));
        }
        if self.parsers.len() + 1 >= MAX_PARSERS {
            SCLogError!("parser table full, can not register {}", elem.name);
            return Err(RegistrationError::ParserTableFull);
        }
        self.parsers.push(elem);
        Ok(self.parsers.len() as u16)
    }

    /// Register a protocol and its root parser for the direction(s) in
    /// `flags`. Returns the new protocol id.
    pub fn register_proto(
        &mut self, name: &str, flags: u8, parser: AppLayerParserFn,
    ) -> Result<AppProto, RegistrationError> {
        if flags & DIR_BOTH == 0 {
            return Err(RegistrationError::InvalidDirection(flags));
        }
        if self.name_in_use(name) {
            SCLogError!("protocol {} already registered", name);
            return Err(RegistrationError::DuplicateName(name.to_string()));
        }
        if self.protos.len() + 1 >= ALPROTO_MAX as usize {
            SCLogError!("protocol table full, can not register {}", name);
            return Err(RegistrationError::ProtocolTableFull);
        }
        let alproto = self.protos.len() as AppProto + 1;
        let mut proto = AppLayerProto::new(name, alproto);
        // the protocol entry holds the name, the root parser shares it
        let id = self.add_parser(AppLayerParserTableElement {
            name: name.to_string(),
            alproto,
            local_id: None,
            parser,
            dependency: None,
        })?;
        if flags & STREAM_TOSERVER != 0 {
            proto.to_server = id;
        }
        if flags & STREAM_TOCLIENT != 0 {
            proto.to_client = id;
        }
        self.protos.push(proto);
        SCLogDebug!("registered protocol {} as {} parser id {}", name, alproto, id);
        Ok(alproto)
    }

    /// Register the root parser of a direction left empty by
    /// `register_proto`.
    pub fn register_proto_direction(
        &mut self, alproto: AppProto, flags: u8, name: &str, parser: AppLayerParserFn,
    ) -> Result<(), RegistrationError> {
        let direction = Direction::from_flags(flags)
            .ok_or(RegistrationError::InvalidDirection(flags))?;
        if self.proto_mut(alproto)?.root_parser(direction) != 0 {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "root parser" });
        }
        let id = self.add_parser(AppLayerParserTableElement {
            name: name.to_string(),
            alproto,
            local_id: None,
            parser,
            dependency: None,
        })?;
        let proto = self.proto_mut(alproto)?;
        match direction {
            Direction::ToServer => proto.to_server = id,
            Direction::ToClient => proto.to_client = id,
        }
        Ok(())
    }

    /// Register the sub-parser for field `local_id` of a protocol.
    pub fn register_parser(
        &mut self, name: &str, alproto: AppProto, local_id: u16, parser: AppLayerParserFn,
        dependency: Option<&str>,
    ) -> Result<u16, RegistrationError> {
        if self.proto_mut(alproto)?.map_local(local_id).is_some() {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "field parser" });
        }
        let id = self.add_parser(AppLayerParserTableElement {
            name: name.to_string(),
            alproto,
            local_id: Some(local_id),
            parser,
            dependency: dependency.map(|d| d.to_string()),
        })?;
        let proto = self.proto_mut(alproto)?;
        if proto.map.len() <= local_id as usize {
            proto.map.resize(local_id as usize + 1, None);
        }
        proto.map[local_id as usize] = Some(id);
        SCLogDebug!("registered parser {} local id {} global id {}", name, local_id, id);
        Ok(id)
    }

    pub fn register_state_funcs(
        &mut self, alproto: AppProto, alloc: StateAllocFn, free: StateFreeFn,
    ) -> Result<(), RegistrationError> {
        let proto = self.proto_mut(alproto)?;
        if proto.state_alloc.is_some() {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "state funcs" });
        }
        proto.state_alloc = Some(alloc);
        proto.state_free = Some(free);
        Ok(())
    }

    pub fn register_local_storage_func(
        &mut self, alproto: AppProto, alloc: LocalStorageAllocFn, free: LocalStorageFreeFn,
    ) -> Result<(), RegistrationError> {
        let proto = self.proto_mut(alproto)?;
        if proto.local_storage_alloc.is_some() {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "local storage funcs" });
        }
        proto.local_storage_alloc = Some(alloc);
        proto.local_storage_free = Some(free);
        Ok(())
    }

    pub fn register_get_files_func(
        &mut self, alproto: AppProto, f: StateGetFilesFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.get_files, f, alproto, "get files")
    }

    pub fn register_get_events_func(
        &mut self, alproto: AppProto, f: StateGetEventsFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.get_events, f, alproto, "get events")
    }

    pub fn register_has_events_func(
        &mut self, alproto: AppProto, f: StateHasEventsFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.has_events, f, alproto, "has events")
    }

    pub fn register_truncate_func(
        &mut self, alproto: AppProto, f: StateTruncateFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.truncate, f, alproto, "truncate")
    }

    pub fn register_get_state_progress_func(
        &mut self, alproto: AppProto, f: StateGetProgressFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.get_progress, f, alproto, "state progress")
    }

    pub fn register_get_tx_cnt(
        &mut self, alproto: AppProto, f: StateGetTxCntFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.get_tx_cnt, f, alproto, "tx count")
    }

    pub fn register_get_tx(
        &mut self, alproto: AppProto, f: StateGetTxFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.get_tx, f, alproto, "get tx")
    }

    pub fn register_get_state_progress_completion_status(
        &mut self, alproto: AppProto, f: StateGetProgressCompletionStatusFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.completion_status, f, alproto, "completion status")
    }

    pub fn register_tx_free_func(
        &mut self, alproto: AppProto, f: StateTxFreeFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.tx_free, f, alproto, "tx free")
    }

    pub fn register_get_event_info(
        &mut self, alproto: AppProto, f: GetEventInfoFn,
    ) -> Result<(), RegistrationError> {
        set_once(&mut self.proto_mut(alproto)?.get_event_info, f, alproto, "event info")
    }

    pub fn register_logger(&mut self, alproto: AppProto) -> Result<(), RegistrationError> {
        let proto = self.proto_mut(alproto)?;
        if proto.logger {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "logger" });
        }
        proto.logger = true;
        Ok(())
    }

    /// Restrict the direction the first data of a flow may arrive in.
    pub fn register_parser_acceptable_data_direction(
        &mut self, alproto: AppProto, direction: u8,
    ) -> Result<(), RegistrationError> {
        if direction & DIR_BOTH == 0 {
            return Err(RegistrationError::InvalidDirection(direction));
        }
        let proto = self.proto_mut(alproto)?;
        if proto.first_data_dir != 0 {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "first data direction" });
        }
        proto.first_data_dir = direction & DIR_BOTH;
        Ok(())
    }

    pub fn register_option_flags(
        &mut self, alproto: AppProto, flags: u32,
    ) -> Result<(), RegistrationError> {
        let proto = self.proto_mut(alproto)?;
        if proto.option_flags != 0 {
            return Err(RegistrationError::AlreadyRegistered { alproto, what: "option flags" });
        }
        proto.option_flags = flags;
        Ok(())
    }

    pub fn register_probing_parser(
        &mut self, ipproto: u8, port: u16, name: &str, alproto: AppProto, min_depth: u16,
        max_depth: u16, direction: Direction, priority: u8, probe: ProbeFn,
    ) -> Result<(), RegistrationError> {
        self.proto_mut(alproto)?;
        self.probing.register(
            ipproto, port, name, alproto, min_depth, max_depth, direction, priority, probe,
        )
    }

    pub fn set_parser_buffer_limit(&mut self, limit: usize) {
        self.buffer_limit = limit;
    }

    /// Apply `app-layer.parser-buffer-limit`.
    pub fn configure(&mut self, conf: &Conf) -> Result<(), ConfError> {
        if let Some(limit) = conf.get_memval("app-layer.parser-buffer-limit")? {
            SCLogConfig!("app-layer parser buffer limit {}", limit);
            self.buffer_limit = limit as usize;
        }
        Ok(())
    }

    /// Validate the registrations and produce the read-only context.
    pub fn freeze(self) -> Result<AppLayerParserCtx, RegistrationError> {
        for proto in &self.protos {
            if !proto.has_parser() {
                SCLogDebug!("protocol {} has no parser, detection only", proto.name);
                continue;
            }
            if proto.state_alloc.is_none() {
                return Err(RegistrationError::MissingCallback {
                    proto: proto.name.clone(),
                    what: "state funcs",
                });
            }
            let tx_funcs = proto.tx_funcs_count();
            if tx_funcs != 0 && tx_funcs != 4 {
                return Err(RegistrationError::MissingCallback {
                    proto: proto.name.clone(),
                    what: "complete set of transaction funcs",
                });
            }
            if proto.tx_free.is_some() && tx_funcs == 0 {
                return Err(RegistrationError::MissingCallback {
                    proto: proto.name.clone(),
                    what: "transaction getters",
                });
            }
            // transactions are only walked for protocols that can free them
            if proto.tx_free.is_none() && tx_funcs == 4 {
                return Err(RegistrationError::MissingCallback {
                    proto: proto.name.clone(),
                    what: "tx free",
                });
            }
        }
        for elem in &self.parsers {
            if let Some(dep) = &elem.dependency {
                if !self.parsers.iter().any(|p| &p.name == dep) {
                    return Err(RegistrationError::MissingDependency {
                        parser: elem.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        self.probing.print();
        Ok(AppLayerParserCtx {
            protos: self.protos,
            parsers: self.parsers,
            probing: self.probing,
            buffer_limit: self.buffer_limit,
        })
    }
}

/// Frozen registrations. Shared between threads through an `Arc`.
pub struct AppLayerParserCtx {
    protos: Vec<AppLayerProto>,
    parsers: Vec<AppLayerParserTableElement>,
    probing: AppLayerProbingParsers,
    buffer_limit: usize,
}

impl AppLayerParserCtx {
    pub fn proto(&self, alproto: AppProto) -> Option<&AppLayerProto> {
        if alproto == ALPROTO_UNKNOWN {
            return None;
        }
        self.protos.get(alproto as usize - 1)
    }

    pub fn parser(&self, id: u16) -> Option<&AppLayerParserTableElement> {
        if id == 0 {
            return None;
        }
        self.parsers.get(id as usize - 1)
    }

    pub fn parser_buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    pub fn probing_parsers(&self) -> &AppLayerProbingParsers {
        &self.probing
    }

    pub(crate) fn protos(&self) -> &[AppLayerProto] {
        &self.protos
    }

    pub fn get_proto_by_name(&self, name: &str) -> AppProto {
        self.protos
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.alproto)
            .unwrap_or(ALPROTO_UNKNOWN)
    }

    pub fn get_proto_name(&self, alproto: AppProto) -> Option<&str> {
        self.proto(alproto).map(|p| p.name.as_str())
    }

    pub fn list_supported_protocols(&self) -> Vec<&str> {
        self.protos.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn has_parser(&self, alproto: AppProto) -> bool {
        self.proto(alproto).map(|p| p.has_parser()).unwrap_or(false)
    }

    pub fn has_logger(&self, alproto: AppProto) -> bool {
        self.proto(alproto).map(|p| p.logger).unwrap_or(false)
    }

    pub fn supports_txs(&self, alproto: AppProto) -> bool {
        self.proto(alproto).map(|p| p.tx_free.is_some()).unwrap_or(false)
    }

    pub fn is_tx_event_aware(&self, alproto: AppProto) -> bool {
        self.proto(alproto).map(|p| p.has_events.is_some()).unwrap_or(false)
    }

    pub fn get_first_data_dir(&self, alproto: AppProto) -> u8 {
        self.proto(alproto).map(|p| p.first_data_dir).unwrap_or(0)
    }

    pub fn get_option_flags(&self, alproto: AppProto) -> u32 {
        self.proto(alproto).map(|p| p.option_flags).unwrap_or(0)
    }

    /// Transaction count, `None` if the protocol has no transactions.
    pub fn get_tx_cnt(&self, alproto: AppProto, state: &(dyn Any + Send)) -> Option<u64> {
        let f = self.proto(alproto)?.get_tx_cnt?;
        Some(f(state))
    }

    pub fn get_tx<'a>(
        &self, alproto: AppProto, state: &'a (dyn Any + Send), tx_id: u64,
    ) -> Option<&'a dyn Any> {
        let f = self.proto(alproto)?.get_tx?;
        f(state, tx_id)
    }

    pub fn get_state_progress(
        &self, alproto: AppProto, tx: &dyn Any, direction: Direction,
    ) -> Option<i32> {
        let f = self.proto(alproto)?.get_progress?;
        Some(f(tx, direction))
    }

    pub fn get_state_progress_completion_status(
        &self, alproto: AppProto, direction: Direction,
    ) -> Option<i32> {
        let f = self.proto(alproto)?.completion_status?;
        Some(f(direction))
    }

    pub fn get_events_by_tx<'a>(
        &self, alproto: AppProto, state: &'a (dyn Any + Send), tx_id: u64,
    ) -> Option<&'a AppLayerDecoderEvents> {
        let f = self.proto(alproto)?.get_events?;
        f(state, tx_id)
    }

    pub fn state_has_events(&self, alproto: AppProto, state: &(dyn Any + Send)) -> bool {
        match self.proto(alproto).and_then(|p| p.has_events) {
            Some(f) => f(state),
            None => false,
        }
    }

    pub fn get_files<'a>(
        &self, alproto: AppProto, state: &'a mut (dyn Any + Send), direction: Direction,
    ) -> Option<&'a mut FileContainer> {
        let f = self.proto(alproto)?.get_files?;
        f(state, direction)
    }

    /// Event id and type of a protocol event name.
    pub fn get_event_info(
        &self, alproto: AppProto, event_name: &str,
    ) -> Option<(u8, AppLayerEventType)> {
        let f = self.proto(alproto)?.get_event_info?;
        f(event_name)
    }

    pub fn get_local_storage(&self, alproto: AppProto) -> Option<LocalStorage> {
        let f = self.proto(alproto)?.local_storage_alloc?;
        f()
    }

    pub fn destroy_local_storage(&self, alproto: AppProto, storage: LocalStorage) {
        match self.proto(alproto).and_then(|p| p.local_storage_free) {
            Some(f) => f(storage),
            None => drop(storage),
        }
    }

    pub(crate) fn state_alloc(&self, alproto: AppProto) -> Option<AlState> {
        let f = self.proto(alproto)?.state_alloc?;
        f()
    }

    pub(crate) fn state_free(&self, alproto: AppProto, state: AlState) {
        match self.proto(alproto).and_then(|p| p.state_free) {
            Some(f) => f(state),
            None => drop(state),
        }
    }

    pub(crate) fn truncate(&self, alproto: AppProto, state: &mut (dyn Any + Send), direction: Direction) {
        if let Some(f) = self.proto(alproto).and_then(|p| p.truncate) {
            f(state, direction);
        }
    }

    pub(crate) fn tx_free(&self, alproto: AppProto, state: &mut (dyn Any + Send), tx_id: u64) {
        if let Some(f) = self.proto(alproto).and_then(|p| p.tx_free) {
            f(state, tx_id);
        }
    }
}
