/* Copyright (C) 2018-2026 Open Information Security Foundation
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

use std::any::Any;
use std::collections::VecDeque;

use thiserror::Error;

use super::parser;
use crate::applayer::{
    AppLayerDecoderEvents, AppLayerEvent, AppLayerParserResult, AppLayerResult, EnumString,
};
use crate::conf::{Conf, ConfError};
use crate::core::{ipproto_name, AppProto, IPPROTO_TCP, STREAM_TOSERVER};
use crate::direction::{Direction, DIR_BOTH};
use crate::parser::{
    conf_proto_detection_enabled, AlState, AppLayerParseCtx, AppLayerParserRegistry,
    RegistrationError, APP_LAYER_PARSER_OPT_ACCEPT_GAPS,
};
use crate::probing::{ProbeResult, PRIORITY_HIGH};
use crate::pstate::{AppLayerParserState, FieldError, FieldStatus};

pub const PARSER_NAME: &str = "template";
const DEFAULT_PORT: u16 = 7000;

#[derive(AppLayerEvent, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TemplateEvent {
    EmptyMessage,
    ResponseWithoutRequest,
}

/// Fields of a message, used as local parser ids.
#[derive(EnumStringU16, Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum TemplateField {
    Length = 0,
    Payload = 1,
}

pub struct TemplateTransaction {
    tx_id: u64,
    pub request: Option<Vec<u8>>,
    pub response: Option<Vec<u8>>,
    events: AppLayerDecoderEvents,
}

impl TemplateTransaction {
    pub fn new() -> TemplateTransaction {
        TemplateTransaction {
            tx_id: 0,
            request: None,
            response: None,
            events: AppLayerDecoderEvents::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.tx_id
    }

    pub fn events(&self) -> &AppLayerDecoderEvents {
        &self.events
    }
}

pub struct TemplateState {
    tx_id: u64,
    transactions: VecDeque<TemplateTransaction>,
    /// Announced payload length, per direction, once the length field
    /// has been seen.
    msg_len: [Option<usize>; 2],
    gap: [bool; 2],
}

impl TemplateState {
    pub fn new() -> Self {
        Self {
            tx_id: 0,
            transactions: VecDeque::new(),
            msg_len: [None; 2],
            gap: [false; 2],
        }
    }

    pub fn tx_count(&self) -> u64 {
        self.tx_id
    }

    // Free a transaction by ID.
    fn free_tx(&mut self, tx_id: u64) {
        if let Some(index) = self.transactions.iter().position(|tx| tx.tx_id == tx_id + 1) {
            self.transactions.remove(index);
        }
    }

    pub fn get_tx(&self, tx_id: u64) -> Option<&TemplateTransaction> {
        self.transactions.iter().find(|tx| tx.tx_id == tx_id + 1)
    }

    fn new_tx(&mut self) -> TemplateTransaction {
        let mut tx = TemplateTransaction::new();
        self.tx_id += 1;
        tx.tx_id = self.tx_id;
        tx
    }

    fn find_request(&mut self) -> Option<&mut TemplateTransaction> {
        self.transactions.iter_mut().find(|tx| tx.response.is_none())
    }

    fn on_request(&mut self, payload: &[u8]) {
        SCLogDebug!("Request: {:?}", payload);
        let mut tx = self.new_tx();
        if payload.is_empty() {
            tx.events.set_event(TemplateEvent::EmptyMessage);
        }
        tx.request = Some(payload.to_vec());
        self.transactions.push_back(tx);
    }

    fn on_response(&mut self, payload: &[u8]) {
        match self.find_request() {
            Some(tx) => {
                SCLogDebug!("Found response for request {}", tx.tx_id);
                if payload.is_empty() {
                    tx.events.set_event(TemplateEvent::EmptyMessage);
                }
                tx.response = Some(payload.to_vec());
            }
            None => {
                SCLogDebug!("Response without request");
                let mut tx = self.new_tx();
                tx.events.set_event(TemplateEvent::ResponseWithoutRequest);
                tx.response = Some(payload.to_vec());
                self.transactions.push_back(tx);
            }
        }
    }

    /// Forget the partial message of `direction`. Data is skipped until
    /// something that looks like a message header shows up.
    fn on_gap(&mut self, direction: Direction) {
        self.msg_len[direction.index()] = None;
        self.gap[direction.index()] = true;
    }

    fn has_events(&self) -> bool {
        self.transactions.iter().any(|tx| !tx.events.is_empty())
    }
}

fn cast_state(state: &(dyn Any + Send)) -> Option<&TemplateState> {
    state.downcast_ref::<TemplateState>()
}

fn cast_state_mut(state: &mut (dyn Any + Send)) -> Option<&mut TemplateState> {
    state.downcast_mut::<TemplateState>()
}

/// Root parser, used for both directions. Splits the stream into the
/// length and payload fields of each message.
fn parse_template<'i>(
    state: &mut (dyn Any + Send), pstate: &mut AppLayerParserState, input: &'i [u8],
    ctx: &mut AppLayerParseCtx<'_>, result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let state = unwrap_or_return!(cast_state_mut(state), AppLayerResult::err());
    let dir = ctx.direction.index();

    let mut input = input;
    if state.gap[dir] {
        // Wait for a message header before parsing again.
        if parser::probe(input).is_err() {
            SCLogDebug!("not in sync after gap, skipping {} bytes", input.len());
            return AppLayerResult::ok();
        }
        state.gap[dir] = false;
    }

    loop {
        let res = match state.msg_len[dir] {
            None => pstate.parse_field_by_delimiter(
                result,
                TemplateField::Length.into_u(),
                b":",
                input,
            ),
            Some(len) => pstate.parse_field_by_size(
                result,
                TemplateField::Payload.into_u(),
                len,
                input,
            ),
        };
        match res {
            Ok(FieldStatus::Found(consumed)) => {
                input = &input[consumed..];
                if state.msg_len[dir].take().is_some() {
                    continue;
                }
                let len = result
                    .iter()
                    .last()
                    .and_then(|elmt| parser::parse_message_len(elmt.data()).ok());
                match len {
                    Some((_, len)) => state.msg_len[dir] = Some(len as usize),
                    None => {
                        SCLogDebug!("invalid length field");
                        return AppLayerResult::err();
                    }
                }
            }
            Ok(FieldStatus::Incomplete) => {
                if state.msg_len[dir].is_none() && pstate.store_len() > parser::MAX_LEN_DIGITS {
                    SCLogDebug!("length field too long");
                    return AppLayerResult::err();
                }
                return AppLayerResult::ok();
            }
            Err(FieldError::UnexpectedEof { needed }) => {
                SCLogDebug!("message truncated at end of stream, {} bytes missing", needed);
                state.msg_len[dir] = None;
                return AppLayerResult::ok();
            }
            Err(err) => {
                SCLogDebug!("field error: {}", err);
                return AppLayerResult::err();
            }
        }
    }
}

/// Payload field: turns a complete message into a request or response.
fn parse_payload<'i>(
    state: &mut (dyn Any + Send), _pstate: &mut AppLayerParserState, input: &'i [u8],
    ctx: &mut AppLayerParseCtx<'_>, _result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let state = unwrap_or_return!(cast_state_mut(state), AppLayerResult::err());
    match ctx.direction {
        Direction::ToServer => state.on_request(input),
        Direction::ToClient => state.on_response(input),
    }
    AppLayerResult::ok()
}

/// Probing parser. Needs at least 2 bytes.
pub fn probing_parser(input: &[u8], _direction: Direction) -> ProbeResult {
    if input.len() < 2 {
        return ProbeResult::NoMatch;
    }
    match parser::probe(input) {
        Ok(_) => ProbeResult::Match,
        Err(nom7::Err::Incomplete(_)) => ProbeResult::NoMatch,
        Err(_) => {
            // a short digit run may still become a header
            if input.len() <= parser::MAX_LEN_DIGITS && input.iter().all(|c| c.is_ascii_digit()) {
                ProbeResult::NoMatch
            } else {
                ProbeResult::Failed
            }
        }
    }
}

fn state_new() -> Option<AlState> {
    Some(Box::new(TemplateState::new()))
}

fn state_free(state: AlState) {
    std::mem::drop(state);
}

fn state_tx_free(state: &mut (dyn Any + Send), tx_id: u64) {
    if let Some(state) = cast_state_mut(state) {
        state.free_tx(tx_id);
    }
}

fn state_get_tx(state: &(dyn Any + Send), tx_id: u64) -> Option<&dyn Any> {
    let state = cast_state(state)?;
    state.get_tx(tx_id).map(|tx| tx as &dyn Any)
}

fn state_get_tx_count(state: &(dyn Any + Send)) -> u64 {
    cast_state(state).map(|s| s.tx_count()).unwrap_or(0)
}

fn tx_get_alstate_progress(tx: &dyn Any, direction: Direction) -> i32 {
    let tx = unwrap_or_return!(tx.downcast_ref::<TemplateTransaction>(), 0);
    let done = match direction {
        Direction::ToServer => tx.request.is_some(),
        // Transaction is done if we have a response.
        Direction::ToClient => tx.response.is_some(),
    };
    if done {
        1
    } else {
        0
    }
}

fn tx_completion_status(_direction: Direction) -> i32 {
    1
}

fn state_get_events(state: &(dyn Any + Send), tx_id: u64) -> Option<&AppLayerDecoderEvents> {
    cast_state(state)?.get_tx(tx_id).map(|tx| tx.events())
}

fn state_has_events(state: &(dyn Any + Send)) -> bool {
    cast_state(state).map(|s| s.has_events()).unwrap_or(false)
}

fn state_truncate(state: &mut (dyn Any + Send), direction: Direction) {
    if let Some(state) = cast_state_mut(state) {
        state.on_gap(direction);
    }
}

#[derive(Error, Debug)]
pub enum TemplateRegisterError {
    #[error(transparent)]
    Conf(#[from] ConfError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

fn detection_port(conf: &Conf) -> u16 {
    let key = format!("app-layer.protocols.{}.detection-ports.dp", PARSER_NAME);
    match conf.get(&key) {
        Some(val) => match val.trim().parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                SCLogWarning!("Invalid port {} for {}, using {}", val, key, DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
        None => DEFAULT_PORT,
    }
}

/// Register the template protocol. Returns `None` when it is disabled
/// in the configuration.
pub fn register(
    reg: &mut AppLayerParserRegistry, conf: &Conf,
) -> Result<Option<AppProto>, TemplateRegisterError> {
    let ipproto = ipproto_name(IPPROTO_TCP).unwrap_or("tcp");
    if !conf_proto_detection_enabled(conf, ipproto, PARSER_NAME)? {
        SCLogNotice!("Protocol detector and parser disabled for TEMPLATE.");
        return Ok(None);
    }

    let alproto = reg.register_proto(PARSER_NAME, DIR_BOTH, parse_template)?;
    reg.register_parser(
        "template-payload",
        alproto,
        TemplateField::Payload.into_u(),
        parse_payload,
        None,
    )?;
    reg.register_state_funcs(alproto, state_new, state_free)?;
    reg.register_tx_free_func(alproto, state_tx_free)?;
    reg.register_get_tx_cnt(alproto, state_get_tx_count)?;
    reg.register_get_tx(alproto, state_get_tx)?;
    reg.register_get_state_progress_func(alproto, tx_get_alstate_progress)?;
    reg.register_get_state_progress_completion_status(alproto, tx_completion_status)?;
    reg.register_get_events_func(alproto, state_get_events)?;
    reg.register_has_events_func(alproto, state_has_events)?;
    reg.register_get_event_info(alproto, TemplateEvent::get_event_info)?;
    reg.register_truncate_func(alproto, state_truncate)?;
    reg.register_option_flags(alproto, APP_LAYER_PARSER_OPT_ACCEPT_GAPS)?;
    reg.register_parser_acceptable_data_direction(alproto, STREAM_TOSERVER)?;

    let port = detection_port(conf);
    for direction in [Direction::ToServer, Direction::ToClient] {
        reg.register_probing_parser(
            IPPROTO_TCP,
            port,
            PARSER_NAME,
            alproto,
            0,
            16,
            direction,
            PRIORITY_HIGH,
            probing_parser,
        )?;
    }
    SCLogNotice!("Template parser registered on port {}.", port);
    Ok(Some(alproto))
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(state: &mut TemplateState, direction: Direction, buf: &[u8]) -> AppLayerResult {
        let mut pstate = AppLayerParserState::default();
        let mut events = AppLayerDecoderEvents::new();
        let mut ctx = AppLayerParseCtx {
            direction,
            flags: direction.into(),
            local_storage: None,
            events: &mut events,
        };
        let mut result = AppLayerParserResult::new();
        let r = parse_template(state, &mut pstate, buf, &mut ctx, &mut result);
        for elmt in result.iter() {
            if elmt.name_idx == TemplateField::Payload.into_u() {
                parse_payload(state, &mut pstate, elmt.data(), &mut ctx, &mut AppLayerParserResult::new());
            }
        }
        r
    }

    #[test]
    fn test_field_names() {
        assert_eq!(TemplateField::Payload.to_str(), "payload");
        assert_eq!(TemplateField::from_str("LENGTH"), Some(TemplateField::Length));
        assert_eq!(TemplateField::from_u(1), Some(TemplateField::Payload));
        assert_eq!(TemplateField::from_u(2), None);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(TemplateEvent::EmptyMessage.to_str(), "empty_message");
        assert_eq!(
            TemplateEvent::get_event_info("response_without_request").map(|e| e.0),
            Some(1)
        );
        assert!(TemplateEvent::get_event_info("nope").is_none());
    }

    #[test]
    fn test_probing_parser() {
        assert_eq!(probing_parser(b"1", Direction::ToServer), ProbeResult::NoMatch);
        assert_eq!(probing_parser(b"12", Direction::ToServer), ProbeResult::NoMatch);
        assert_eq!(probing_parser(b"5:Hello", Direction::ToServer), ProbeResult::Match);
        assert_eq!(probing_parser(b"GET /", Direction::ToServer), ProbeResult::Failed);
    }

    #[test]
    fn test_request_response() {
        let mut state = TemplateState::new();
        let r = parse(&mut state, Direction::ToServer, b"5:Hello3:bye");
        assert!(r.is_ok());
        assert_eq!(state.tx_count(), 2);
        assert_eq!(state.get_tx(0).unwrap().request.as_deref(), Some(&b"Hello"[..]));
        assert_eq!(state.get_tx(1).unwrap().request.as_deref(), Some(&b"bye"[..]));

        let r = parse(&mut state, Direction::ToClient, b"2:ok");
        assert!(r.is_ok());
        let tx = state.get_tx(0).unwrap();
        assert_eq!(tx.response.as_deref(), Some(&b"ok"[..]));
        assert_eq!(tx_get_alstate_progress(tx, Direction::ToClient), 1);
        assert_eq!(tx_get_alstate_progress(state.get_tx(1).unwrap(), Direction::ToClient), 0);
    }

    #[test]
    fn test_response_without_request() {
        let mut state = TemplateState::new();
        assert!(parse(&mut state, Direction::ToClient, b"2:ok").is_ok());
        let tx = state.get_tx(0).unwrap();
        assert!(tx.request.is_none());
        assert!(tx.events().has_event(TemplateEvent::ResponseWithoutRequest.as_u8()));
        assert!(state.has_events());
    }

    #[test]
    fn test_empty_message() {
        let mut state = TemplateState::new();
        assert!(parse(&mut state, Direction::ToServer, b"0:").is_ok());
        assert_eq!(state.tx_count(), 1);
        assert!(state.get_tx(0).unwrap().events().has_event(TemplateEvent::EmptyMessage.as_u8()));
    }

    #[test]
    fn test_invalid_length() {
        let mut state = TemplateState::new();
        assert!(parse(&mut state, Direction::ToServer, b"abc:def").is_err());
        let mut state = TemplateState::new();
        assert!(parse(&mut state, Direction::ToServer, b"12345678901").is_err());
    }

    #[test]
    fn test_gap_resync() {
        let mut state = TemplateState::new();
        state_truncate(&mut state, Direction::ToServer);
        assert!(parse(&mut state, Direction::ToServer, b"llo World").is_ok());
        assert_eq!(state.tx_count(), 0);
        assert!(parse(&mut state, Direction::ToServer, b"3:abc").is_ok());
        assert_eq!(state.tx_count(), 1);
    }

    #[test]
    fn test_free_tx() {
        let mut state = TemplateState::new();
        assert!(parse(&mut state, Direction::ToServer, b"1:a1:b").is_ok());
        state_tx_free(&mut state, 0);
        assert!(state.get_tx(0).is_none());
        assert!(state.get_tx(1).is_some());
        assert_eq!(state_get_tx_count(&state), 2);
    }
}
