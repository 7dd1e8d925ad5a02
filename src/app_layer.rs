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

//! Per flow parsing: runs the registered parsers on stream data.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::applayer::{
    AppLayerDecoderEvents, AppLayerEvent, AppLayerParserEvent, AppLayerParserResult,
    AppLayerParserResultElmt,
};
use crate::core::*;
use crate::direction::Direction;
use crate::filecontainer::FileContainer;
use crate::flow::Flow;
use crate::parser::{
    AppLayerParseCtx, AppLayerParserCtx, AppLayerProto, LocalStorage,
    APP_LAYER_PARSER_OPT_ACCEPT_GAPS,
};
use crate::pstate::{
    AppLayerParserState, AppLayerParserStateFlags, AppLayerParserStateStore, StageRequest,
};
use crate::transaction;

/// Stage changes allowed within one call.
const MAX_STAGE_TRANSITIONS: usize = 32;
/// Nesting of sub-parser fields.
const MAX_FIELD_DEPTH: usize = 8;

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppLayerError {
    #[error("parser error")]
    Parse,
    #[error("gap in stream")]
    StreamGap,
    #[error("failed to allocate protocol state")]
    AllocationFailed,
    #[error("first data in wrong direction")]
    WrongDirection,
    #[error("parser buffer limit reached")]
    BufferLimit,
}

/// Per thread parser context: the frozen registry and the thread local
/// storage of every protocol.
pub struct AppLayerParserThreadCtx {
    ctx: Arc<AppLayerParserCtx>,
    /// Indexed by protocol id.
    storage: Vec<Option<LocalStorage>>,
}

impl AppLayerParserThreadCtx {
    pub fn new(ctx: Arc<AppLayerParserCtx>) -> Self {
        let mut storage: Vec<Option<LocalStorage>> = vec![None];
        for proto in ctx.protos() {
            storage.push(ctx.get_local_storage(proto.alproto));
        }
        Self { ctx, storage }
    }

    pub fn ctx(&self) -> &Arc<AppLayerParserCtx> {
        &self.ctx
    }

    pub fn local_storage(&mut self, alproto: AppProto) -> Option<&mut (dyn Any + Send)> {
        self.storage.get_mut(alproto as usize)?.as_deref_mut()
    }
}

impl Drop for AppLayerParserThreadCtx {
    fn drop(&mut self) {
        let ctx = &self.ctx;
        for (alproto, storage) in self.storage.drain(..).enumerate() {
            if let Some(storage) = storage {
                ctx.destroy_local_storage(alproto as AppProto, storage);
            }
        }
    }
}

fn parser_store(f: &mut Flow, limit: usize) -> &mut AppLayerParserStateStore {
    f.alparser
        .get_or_insert_with(|| Box::new(AppLayerParserStateStore::new(limit)))
}

/// Mark the flow as failed. The parsers of both directions are not
/// called again and the flow reaches end of stream.
fn set_error(f: &mut Flow, limit: usize, event: AppLayerParserEvent) {
    let pstore = parser_store(f, limit);
    pstore.decoder_events.set_event(event);
    pstore.to_server.set_done();
    pstore.to_client.set_done();
    pstore.set_eof();
    f.set_no_app_layer_inspection();
}

fn handle_gap(
    ctx: &AppLayerParserCtx, proto: &AppLayerProto, f: &mut Flow, direction: Direction,
) -> Result<(), AppLayerError> {
    if let Some(state) = f.alstate.as_mut() {
        ctx.truncate(proto.alproto, &mut **state, direction);
    }
    if proto.option_flags & APP_LAYER_PARSER_OPT_ACCEPT_GAPS != 0 {
        SCLogDebug!("{} accepts gaps, resetting {} buffers", proto.name, direction);
        if let Some(pstore) = f.alparser.as_mut() {
            let pstate = pstore.get_mut(direction);
            pstate.reset_buffers();
            if pstate.flags.contains(AppLayerParserStateFlags::USE) {
                pstate.cur_parser = proto.root_parser(direction);
            }
            pstore.bump_version();
        }
        return Ok(());
    }
    SCLogDebug!("app-layer parser {} does not accept gaps", proto.name);
    set_error(f, ctx.parser_buffer_limit(), AppLayerParserEvent::StreamGap);
    Err(AppLayerError::StreamGap)
}

/// Feed `input` of one direction to the parser of `alproto`.
///
/// `flags` holds the direction and the STREAM_* flags of the call. An
/// error leaves the flow without app-layer inspection.
pub fn app_layer_parse(
    tctx: &mut AppLayerParserThreadCtx, f: &mut Flow, alproto: AppProto, flags: u8, input: &[u8],
) -> Result<(), AppLayerError> {
    let ctx = Arc::clone(&tctx.ctx);
    let proto = match ctx.proto(alproto) {
        Some(proto) if proto.has_parser() => proto,
        _ => {
            SCLogDebug!("no parser for protocol {}", alproto);
            return Ok(());
        }
    };
    let direction = Direction::from(flags);
    let limit = ctx.parser_buffer_limit();
    if f.alproto == ALPROTO_UNKNOWN {
        f.alproto = alproto;
    }

    if flags & STREAM_GAP != 0 {
        return handle_gap(&ctx, proto, f, direction);
    }

    let pstore = parser_store(f, limit);
    pstore.bump_version();

    if proto.first_data_dir != 0
        && !input.is_empty()
        && !pstore.to_server.flags.contains(AppLayerParserStateFlags::USE)
        && !pstore.to_client.flags.contains(AppLayerParserStateFlags::USE)
        && flags & proto.first_data_dir == 0
    {
        SCLogDebug!("first data for {} in wrong direction {}", proto.name, direction);
        set_error(f, limit, AppLayerParserEvent::WrongDirectionFirstData);
        return Err(AppLayerError::WrongDirection);
    }

    let pstate = pstore.get_mut(direction);
    if !pstate.flags.contains(AppLayerParserStateFlags::USE) {
        pstate.flags |= AppLayerParserStateFlags::USE;
        pstate.cur_parser = proto.root_parser(direction);
    }
    if flags & STREAM_EOF != 0 {
        pstate.flags |= AppLayerParserStateFlags::EOF;
    }

    if f.alstate.is_none() {
        match ctx.state_alloc(alproto) {
            Some(state) => f.alstate = Some(state),
            None => {
                SCLogError!("failed to allocate {} state", proto.name);
                f.set_no_app_layer_inspection();
                return Err(AppLayerError::AllocationFailed);
            }
        }
    }

    let res = {
        let Flow { alstate, alparser, .. } = &mut *f;
        match (alstate.as_mut(), alparser.as_mut()) {
            (Some(state), Some(pstore)) => {
                let AppLayerParserStateStore {
                    to_server, to_client, decoder_events, ..
                } = &mut **pstore;
                let pstate = match direction {
                    Direction::ToServer => to_server,
                    Direction::ToClient => to_client,
                };
                if pstate.is_done() {
                    // transactions are still released below
                    SCLogDebug!("parser done for {}", direction);
                    Ok(())
                } else if pstate.cur_parser != 0 && (!input.is_empty() || pstate.needs_flush()) {
                    let mut pctx = AppLayerParseCtx {
                        direction,
                        flags,
                        local_storage: tctx.local_storage(alproto),
                        events: decoder_events,
                    };
                    run_parser(&ctx, proto, &mut **state, pstate, input, &mut pctx)
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    };
    if let Err(err) = res {
        let event = match err {
            AppLayerError::BufferLimit => AppLayerParserEvent::BufferLimitReached,
            _ => AppLayerParserEvent::ParserError,
        };
        SCLogDebug!("{} parser error: {}", proto.name, err);
        set_error(f, limit, event);
        return Err(err);
    }

    let pflags = match f.alparser.as_ref() {
        Some(pstore) => pstore.get(direction).flags,
        None => AppLayerParserStateFlags::empty(),
    };
    if pflags.intersects(AppLayerParserStateFlags::NO_INSPECTION | AppLayerParserStateFlags::NO_REASSEMBLY) {
        if let Some(pstore) = f.alparser.as_mut() {
            if !pstore.is_eof() {
                pstore.set_eof();
            }
        }
    }
    if pflags.contains(AppLayerParserStateFlags::NO_INSPECTION) {
        SCLogDebug!("no further inspection for {}", proto.name);
        f.set_no_payload_inspection();
        f.set_no_app_layer_inspection();
    }
    if pflags.contains(AppLayerParserStateFlags::NO_REASSEMBLY) {
        f.set_no_reassembly();
    }

    transaction::cleanup(&ctx, alproto, f);

    if flags & STREAM_DEPTH != 0 {
        SCLogDebug!("stream depth reached for {}", direction);
        if let Some(state) = f.alstate.as_mut() {
            ctx.truncate(alproto, &mut **state, direction);
        }
    }
    Ok(())
}

fn run_parser(
    ctx: &AppLayerParserCtx, proto: &AppLayerProto, state: &mut (dyn Any + Send),
    pstate: &mut AppLayerParserState, input: &[u8], pctx: &mut AppLayerParseCtx<'_>,
) -> Result<(), AppLayerError> {
    let mut input = input;
    let mut transitions = 0;
    loop {
        let needed = pstate.needed();
        let mut pending = pstate.take_pending();
        let buf: &[u8] = if pending.is_empty() {
            input
        } else {
            pending.extend_from_slice(input);
            &pending
        };
        if transitions == 0 && buf.len() < needed && !pstate.is_eof() {
            SCLogDebug!("have {} bytes, waiting for {}", buf.len(), needed);
            return pstate.retain(buf, needed).map_err(|_| AppLayerError::BufferLimit);
        }

        let parser = match ctx.parser(pstate.cur_parser) {
            Some(parser) => parser,
            None => return Ok(()),
        };
        let mut result = AppLayerParserResult::new();
        let res = (parser.parser)(state, pstate, buf, pctx, &mut result);
        if res.is_err() {
            SCLogDebug!("parser {} returned error", parser.name);
            return Err(AppLayerError::Parse);
        }
        if res.is_incomplete() {
            let consumed = res.consumed as usize;
            let needed = res.needed as usize;
            if consumed > buf.len() || consumed + needed < buf.len() {
                SCLogDebug!("parser {} bad incomplete {}/{} for {} bytes",
                            parser.name, consumed, needed, buf.len());
                return Err(AppLayerError::Parse);
            }
            if pstate.is_eof() {
                SCLogDebug!("incomplete at end of stream, dropping {} bytes", buf.len() - consumed);
            } else {
                pstate.retain(&buf[consumed..], needed).map_err(|_| AppLayerError::BufferLimit)?;
            }
        }

        dispatch_fields(ctx, proto, state, pstate, result.take(), pctx, 0)?;

        let prev = pstate.cur_parser;
        match pstate.take_stage() {
            Some(StageRequest::Set(local_id)) => match proto.map_local(local_id) {
                Some(id) => pstate.cur_parser = id,
                None => {
                    SCLogDebug!("no parser for local id {}", local_id);
                    return Err(AppLayerError::Parse);
                }
            },
            Some(StageRequest::Reset) => pstate.cur_parser = proto.root_parser(pctx.direction),
            None => {}
        }
        if pstate.cur_parser == prev || !pstate.has_pending() {
            return Ok(());
        }
        transitions += 1;
        if transitions > MAX_STAGE_TRANSITIONS {
            SCLogDebug!("too many stage transitions");
            return Err(AppLayerError::Parse);
        }
        input = &[];
    }
}

/// Run the sub-parser of each field. Sub-parsers see the field as a
/// complete stream: their direction state starts at end of stream.
fn dispatch_fields(
    ctx: &AppLayerParserCtx, proto: &AppLayerProto, state: &mut (dyn Any + Send),
    pstate: &mut AppLayerParserState, fields: Vec<AppLayerParserResultElmt<'_>>,
    pctx: &mut AppLayerParseCtx<'_>, depth: usize,
) -> Result<(), AppLayerError> {
    if fields.is_empty() {
        return Ok(());
    }
    if depth >= MAX_FIELD_DEPTH {
        SCLogDebug!("field nesting too deep");
        return Err(AppLayerError::Parse);
    }
    let propagate = AppLayerParserStateFlags::DONE
        | AppLayerParserStateFlags::NO_INSPECTION
        | AppLayerParserStateFlags::NO_REASSEMBLY;
    for elmt in fields {
        let id = match proto.map_local(elmt.name_idx) {
            Some(id) => id,
            None => {
                SCLogDebug!("no parser for field {}", elmt.name_idx);
                continue;
            }
        };
        let sub = match ctx.parser(id) {
            Some(sub) => sub,
            None => continue,
        };
        let mut scratch = AppLayerParserState::new(pstate.limit());
        scratch.flags = AppLayerParserStateFlags::USE | AppLayerParserStateFlags::EOF;
        scratch.cur_parser = id;
        let mut sub_result = AppLayerParserResult::new();
        let res = (sub.parser)(state, &mut scratch, elmt.data(), pctx, &mut sub_result);
        if res.is_err() {
            SCLogDebug!("sub-parser {} returned error", sub.name);
            return Err(AppLayerError::Parse);
        }
        pstate.flags |= scratch.flags & propagate;
        if let Some(stage) = scratch.take_stage() {
            pstate.request_stage(stage);
        }
        dispatch_fields(ctx, proto, state, pstate, sub_result.take(), pctx, depth + 1)?;
    }
    Ok(())
}

/// Run protocol detection on `buf` using the probing parsers of the
/// flow's port. A detected protocol is stored in the flow.
pub fn app_layer_protocol_detect(
    ctx: &AppLayerParserCtx, f: &mut Flow, direction: Direction, buf: &[u8],
) -> AppProto {
    if f.alproto != ALPROTO_UNKNOWN {
        return f.alproto;
    }
    let port = f.probing_port(direction);
    let alproto = ctx.probing_parsers().probe(&mut f.probing, f.proto, port, direction, buf);
    if alproto == ALPROTO_FAILED {
        SCLogDebug!("protocol detection failed on port {}", port);
        parser_store(f, ctx.parser_buffer_limit())
            .decoder_events
            .set_event(AppLayerParserEvent::ProtocolDetectionFailed);
    } else if alproto != ALPROTO_UNKNOWN {
        SCLogDebug!("detected {:?} on port {}", ctx.get_proto_name(alproto), port);
        f.alproto = alproto;
    }
    alproto
}

/// Mark the flow as finished, making its transactions loggable.
pub fn app_layer_set_eof(f: &mut Flow) {
    if let Some(pstore) = f.alparser.as_mut() {
        pstore.set_eof();
    }
}

pub fn get_state_version(f: &Flow) -> u16 {
    f.alparser.as_ref().map(|p| p.version).unwrap_or(0)
}

/// Release protocol and parser state of the flow. Safe to call more
/// than once.
pub fn app_layer_parser_state_cleanup(ctx: &AppLayerParserCtx, f: &mut Flow) {
    if let Some(state) = f.alstate.take() {
        ctx.state_free(f.alproto, state);
    }
    f.alparser = None;
}

pub fn get_decoder_events_for_flow(f: &Flow) -> Option<&AppLayerDecoderEvents> {
    f.alparser.as_ref().map(|p| &p.decoder_events)
}

pub fn get_events_from_flow_by_tx<'a>(
    ctx: &AppLayerParserCtx, f: &'a Flow, tx_id: u64,
) -> Option<&'a AppLayerDecoderEvents> {
    let state = f.alstate.as_ref()?;
    ctx.get_events_by_tx(f.alproto, &**state, tx_id)
}

/// Files tracked by the flow's protocol state in `direction`.
pub fn app_layer_get_files<'a>(
    ctx: &AppLayerParserCtx, f: &'a mut Flow, direction: Direction,
) -> Option<&'a mut FileContainer> {
    let alproto = f.alproto;
    let state = f.alstate.as_mut()?;
    ctx.get_files(alproto, &mut **state, direction)
}

/// Does the flow have flow level events, or transaction events not
/// inspected yet in the direction of `flags`.
pub fn flow_has_decoder_events(ctx: &AppLayerParserCtx, f: &Flow, flags: u8) -> bool {
    if let Some(events) = get_decoder_events_for_flow(f) {
        if !events.is_empty() {
            return true;
        }
    }
    let state = match f.alstate.as_ref() {
        Some(state) => &**state,
        None => return false,
    };
    if ctx.is_tx_event_aware(f.alproto) && !ctx.state_has_events(f.alproto, state) {
        return false;
    }
    let total = match ctx.get_tx_cnt(f.alproto, state) {
        Some(total) => total,
        None => return false,
    };
    let start = transaction::get_inspect_id(f, flags);
    (start..total).any(|tx_id| {
        ctx.get_events_by_tx(f.alproto, state, tx_id)
            .map(|e| !e.is_empty())
            .unwrap_or(false)
    })
}

/// Event lookup for rule keywords: protocol events first, then the
/// events raised by the framework itself.
pub fn app_layer_get_event_info(
    ctx: &AppLayerParserCtx, alproto: AppProto, event_name: &str,
) -> Option<(u8, AppLayerEventType)> {
    if let Some(info) = ctx.get_event_info(alproto, event_name) {
        return Some(info);
    }
    AppLayerParserEvent::from_string(event_name)
        .map(|e| (e.as_u8(), AppLayerEventType::APP_LAYER_EVENT_TYPE_PACKET))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::applayertemplate::template::{TemplateEvent, TemplateState};
    use crate::applayertemplate;
    use crate::conf::Conf;
    use crate::flow::FlowFlags;
    use crate::parser::AppLayerParserRegistry;

    fn setup() -> (AppLayerParserThreadCtx, AppProto) {
        let mut reg = AppLayerParserRegistry::new();
        let alproto = applayertemplate::register(&mut reg, &Conf::default())
            .unwrap()
            .unwrap();
        let ctx = Arc::new(reg.freeze().unwrap());
        (AppLayerParserThreadCtx::new(ctx), alproto)
    }

    fn template_state(f: &Flow) -> &TemplateState {
        f.alstate.as_ref().unwrap().downcast_ref::<TemplateState>().unwrap()
    }

    fn has_flow_event(f: &Flow, event: AppLayerParserEvent) -> bool {
        get_decoder_events_for_flow(f)
            .map(|e| e.has_event(event.as_u8()))
            .unwrap_or(false)
    }

    #[test]
    fn test_parse_request_response() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"5:Hello").is_ok());
        assert_eq!(f.alproto, alproto);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOCLIENT, b"2:ok").is_ok());

        let state = template_state(&f);
        assert_eq!(state.tx_count(), 1);
        let tx = state.get_tx(0).unwrap();
        assert_eq!(tx.request.as_deref(), Some(&b"Hello"[..]));
        assert_eq!(tx.response.as_deref(), Some(&b"ok"[..]));
        assert_eq!(get_state_version(&f), 2);
    }

    #[test]
    fn test_parse_byte_by_byte() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        let buf = b"5:Hello3:bye10:0123456789";
        for i in 0..buf.len() {
            assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, &buf[i..i + 1]).is_ok());
        }
        let state = template_state(&f);
        assert_eq!(state.tx_count(), 3);
        assert_eq!(state.get_tx(1).unwrap().request.as_deref(), Some(&b"bye"[..]));
        assert_eq!(state.get_tx(2).unwrap().request.as_deref(), Some(&b"0123456789"[..]));
    }

    #[test]
    fn test_unknown_protocol() {
        let (mut tctx, _) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert!(app_layer_parse(&mut tctx, &mut f, 42, STREAM_TOSERVER, b"1:a").is_ok());
        assert!(f.alstate.is_none());
        assert!(f.alparser.is_none());
    }

    #[test]
    fn test_wrong_direction_first_data() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert_eq!(
            app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOCLIENT, b"2:ok"),
            Err(AppLayerError::WrongDirection)
        );
        assert!(has_flow_event(&f, AppLayerParserEvent::WrongDirectionFirstData));
        assert!(f.is_no_app_layer_inspection());
        assert!(f.alparser.as_ref().unwrap().is_eof());
    }

    #[test]
    fn test_parser_error() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert_eq!(
            app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"abc:def"),
            Err(AppLayerError::Parse)
        );
        assert!(has_flow_event(&f, AppLayerParserEvent::ParserError));
        assert!(f.flags.contains(FlowFlags::NO_APPLAYER_INSPECTION));
        assert!(f.alparser.as_ref().unwrap().is_eof());
    }

    #[test]
    fn test_no_parse_after_error() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert_eq!(
            app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"abc:def"),
            Err(AppLayerError::Parse)
        );
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"3:abc").is_ok());
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOCLIENT, b"2:ok").is_ok());
        assert_eq!(template_state(&f).tx_count(), 0);
        let pstore = f.alparser.as_ref().unwrap();
        assert!(pstore.to_server.is_done());
        assert!(pstore.to_client.is_done());
    }

    #[test]
    fn test_gap_accepted() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"5:He").is_ok());
        assert_eq!(f.alparser.as_ref().unwrap().to_server.store_len(), 2);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER | STREAM_GAP, &[]).is_ok());
        assert_eq!(f.alparser.as_ref().unwrap().to_server.store_len(), 0);
        assert_eq!(get_state_version(&f), 2);
        assert!(!has_flow_event(&f, AppLayerParserEvent::StreamGap));

        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"llo").is_ok());
        assert_eq!(template_state(&f).tx_count(), 0);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"3:abc").is_ok());
        let state = template_state(&f);
        assert_eq!(state.tx_count(), 1);
        assert_eq!(state.get_tx(0).unwrap().request.as_deref(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_state_cleanup() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"1:a").is_ok());
        let ctx = Arc::clone(tctx.ctx());
        app_layer_parser_state_cleanup(&ctx, &mut f);
        assert!(f.alstate.is_none());
        assert!(f.alparser.is_none());
        app_layer_parser_state_cleanup(&ctx, &mut f);
        assert_eq!(get_state_version(&f), 0);
    }

    #[test]
    fn test_set_eof() {
        let (mut tctx, alproto) = setup();
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        app_layer_set_eof(&mut f);
        assert!(f.alparser.is_none());
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"1:a").is_ok());
        let version = get_state_version(&f);
        app_layer_set_eof(&mut f);
        let pstore = f.alparser.as_ref().unwrap();
        assert!(pstore.is_eof());
        assert_eq!(pstore.version, version.wrapping_add(1));
    }

    #[test]
    fn test_protocol_detect() {
        let (tctx, alproto) = setup();
        let ctx = tctx.ctx();

        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert_eq!(app_layer_protocol_detect(ctx, &mut f, Direction::ToServer, b"5"), ALPROTO_UNKNOWN);
        assert_eq!(app_layer_protocol_detect(ctx, &mut f, Direction::ToServer, b"5:Hello"), alproto);
        assert_eq!(f.alproto, alproto);

        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert_eq!(
            app_layer_protocol_detect(ctx, &mut f, Direction::ToServer, b"GET / HTTP/1.1"),
            ALPROTO_FAILED
        );
        assert_eq!(f.alproto, ALPROTO_UNKNOWN);
        assert!(has_flow_event(&f, AppLayerParserEvent::ProtocolDetectionFailed));

        let mut f = Flow::new(IPPROTO_TCP, 1234, 80);
        assert_eq!(app_layer_protocol_detect(ctx, &mut f, Direction::ToServer, b"5:Hello"), ALPROTO_FAILED);
    }

    #[test]
    fn test_event_info() {
        let (tctx, alproto) = setup();
        let ctx = tctx.ctx();
        assert_eq!(
            app_layer_get_event_info(ctx, alproto, "empty_message"),
            Some((0, AppLayerEventType::APP_LAYER_EVENT_TYPE_TRANSACTION))
        );
        assert_eq!(
            app_layer_get_event_info(ctx, alproto, "stream_gap"),
            Some((1, AppLayerEventType::APP_LAYER_EVENT_TYPE_PACKET))
        );
        assert_eq!(app_layer_get_event_info(ctx, alproto, "nope"), None);
    }

    #[test]
    fn test_no_files() {
        let (mut tctx, alproto) = setup();
        let ctx = Arc::clone(tctx.ctx());
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert!(app_layer_get_files(&ctx, &mut f, Direction::ToServer).is_none());
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"1:a").is_ok());
        assert!(app_layer_get_files(&ctx, &mut f, Direction::ToServer).is_none());
    }

    #[test]
    fn test_tx_events() {
        let (mut tctx, alproto) = setup();
        let ctx = Arc::clone(tctx.ctx());
        let mut f = Flow::new(IPPROTO_TCP, 1234, 7000);
        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"1:a").is_ok());
        assert!(!flow_has_decoder_events(&ctx, &f, STREAM_TOSERVER));

        assert!(app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"0:").is_ok());
        assert!(flow_has_decoder_events(&ctx, &f, STREAM_TOSERVER));
        let events = get_events_from_flow_by_tx(&ctx, &f, 1).unwrap();
        assert!(events.has_event(TemplateEvent::EmptyMessage.as_u8()));
        assert!(get_events_from_flow_by_tx(&ctx, &f, 0).unwrap().is_empty());
    }
}
