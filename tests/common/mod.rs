/* Copyright (C) 2024-2026 Open Information Security Foundation
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

//! Protocols used by the integration tests.
//!
//! "test": field 0 is terminated by '|', field 1 is 2 bytes. Every
//! value field sent to the server opens a transaction, every value
//! field sent to the client completes the oldest open one.
//!
//! "records": fixed 4 byte records, relies on the framework to buffer
//! partial records.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use suricata_applayer::app_layer::AppLayerParserThreadCtx;
use suricata_applayer::applayer::{AppLayerParserResult, AppLayerResult};
use suricata_applayer::core::{AppProto, STREAM_TOCLIENT, STREAM_TOSERVER};
use suricata_applayer::direction::Direction;
use suricata_applayer::flow::Flow;
use suricata_applayer::parser::{
    AlState, AppLayerParseCtx, AppLayerParserRegistry, LocalStorage,
};
use suricata_applayer::pstate::{AppLayerParserState, FieldStatus};

pub const FIELD_NAME: u16 = 0;
pub const FIELD_VALUE: u16 = 1;
/// Stage entered after a "RAW" name, left again at "END". The next
/// field after the raw block is a name again.
pub const STAGE_RAW: u16 = 2;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Default)]
pub struct TestTx {
    pub progress: [i32; 2],
}

#[derive(Debug, Default)]
pub struct TestState {
    pub fields: Vec<(u16, Vec<u8>)>,
    pub raw: Vec<u8>,
    pub txs: Vec<TestTx>,
    pub freed: Vec<u64>,
    /// Value of the thread local call counter, per root parser call.
    pub calls: Vec<u64>,
    pub truncated: Vec<Direction>,
}

impl TestState {
    pub fn values(&self, field: u16) -> Vec<&[u8]> {
        self.fields
            .iter()
            .filter(|(idx, _)| *idx == field)
            .map(|(_, data)| data.as_slice())
            .collect()
    }
}

fn test_state(state: &mut (dyn Any + Send)) -> Option<&mut TestState> {
    state.downcast_mut::<TestState>()
}

fn parse_test<'i>(
    state: &mut (dyn Any + Send), pstate: &mut AppLayerParserState, input: &'i [u8],
    ctx: &mut AppLayerParseCtx<'_>, result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let s = match test_state(state) {
        Some(s) => s,
        None => return AppLayerResult::err(),
    };
    if let Some(counter) = ctx.local_storage::<u64>() {
        *counter += 1;
        s.calls.push(*counter);
    }

    let total = input.len();
    let mut input = input;
    loop {
        let res = match pstate.parse_field {
            FIELD_NAME => pstate.parse_field_by_delimiter(result, FIELD_NAME, b"|", input),
            _ => pstate.parse_field_by_size(result, FIELD_VALUE, 2, input),
        };
        match res {
            Ok(FieldStatus::Found(consumed)) => {
                input = &input[consumed..];
                if pstate.parse_field == FIELD_NAME
                    && result.iter().last().map(|e| e.data() == b"RAW").unwrap_or(false)
                {
                    // the raw stage takes over the rest of the input
                    let done = total - input.len();
                    return AppLayerResult::incomplete(done as u32, input.len() as u32);
                }
                pstate.parse_field = (pstate.parse_field + 1) % 2;
                if input.is_empty() && !pstate.has_pending_field() {
                    return AppLayerResult::ok();
                }
            }
            Ok(FieldStatus::Incomplete) => return AppLayerResult::ok(),
            Err(_) => return AppLayerResult::err(),
        }
    }
}

fn parse_name<'i>(
    state: &mut (dyn Any + Send), pstate: &mut AppLayerParserState, input: &'i [u8],
    _ctx: &mut AppLayerParseCtx<'_>, _result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let s = match test_state(state) {
        Some(s) => s,
        None => return AppLayerResult::err(),
    };
    s.fields.push((FIELD_NAME, input.to_vec()));
    match input {
        b"RAW" => pstate.set_stage(STAGE_RAW),
        b"STOP" => pstate.set_done(),
        b"NOINSPECT" => pstate.set_no_inspection(false),
        b"NOREASSEMBLY" => pstate.set_no_inspection(true),
        b"BAD" => return AppLayerResult::err(),
        _ => {}
    }
    AppLayerResult::ok()
}

fn parse_value<'i>(
    state: &mut (dyn Any + Send), _pstate: &mut AppLayerParserState, input: &'i [u8],
    ctx: &mut AppLayerParseCtx<'_>, _result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let s = match test_state(state) {
        Some(s) => s,
        None => return AppLayerResult::err(),
    };
    s.fields.push((FIELD_VALUE, input.to_vec()));
    match ctx.direction {
        Direction::ToServer => s.txs.push(TestTx { progress: [1, 0] }),
        Direction::ToClient => {
            if let Some(tx) = s.txs.iter_mut().find(|tx| tx.progress[1] == 0) {
                tx.progress[1] = 1;
            }
        }
    }
    AppLayerResult::ok()
}

/// Raw stage: everything up to "END" is collected as is.
fn parse_raw<'i>(
    state: &mut (dyn Any + Send), pstate: &mut AppLayerParserState, input: &'i [u8],
    _ctx: &mut AppLayerParseCtx<'_>, _result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let s = match test_state(state) {
        Some(s) => s,
        None => return AppLayerResult::err(),
    };
    match input.windows(3).position(|w| w == b"END") {
        Some(pos) => {
            s.raw.extend_from_slice(&input[..pos]);
            pstate.reset_stage();
            let consumed = pos + 3;
            AppLayerResult::incomplete(consumed as u32, (input.len() - consumed) as u32)
        }
        None => {
            s.raw.extend_from_slice(input);
            AppLayerResult::ok()
        }
    }
}

fn parse_records<'i>(
    state: &mut (dyn Any + Send), _pstate: &mut AppLayerParserState, input: &'i [u8],
    _ctx: &mut AppLayerParseCtx<'_>, _result: &mut AppLayerParserResult<'i>,
) -> AppLayerResult {
    let s = match test_state(state) {
        Some(s) => s,
        None => return AppLayerResult::err(),
    };
    let n = input.len() / 4 * 4;
    for rec in input[..n].chunks(4) {
        s.fields.push((0, rec.to_vec()));
    }
    if n < input.len() {
        return AppLayerResult::incomplete(n as u32, 4);
    }
    AppLayerResult::ok()
}

fn state_alloc() -> Option<AlState> {
    Some(Box::new(TestState::default()))
}

fn state_free(_state: AlState) {}

fn tx_cnt(state: &(dyn Any + Send)) -> u64 {
    state.downcast_ref::<TestState>().map(|s| s.txs.len() as u64).unwrap_or(0)
}

fn get_tx(state: &(dyn Any + Send), tx_id: u64) -> Option<&dyn Any> {
    let s = state.downcast_ref::<TestState>()?;
    if s.freed.contains(&tx_id) {
        return None;
    }
    s.txs.get(tx_id as usize).map(|tx| tx as &dyn Any)
}

fn progress(tx: &dyn Any, direction: Direction) -> i32 {
    tx.downcast_ref::<TestTx>().map(|tx| tx.progress[direction.index()]).unwrap_or(0)
}

fn completion(_direction: Direction) -> i32 {
    1
}

fn tx_free(state: &mut (dyn Any + Send), tx_id: u64) {
    if let Some(s) = test_state(state) {
        s.freed.push(tx_id);
    }
}

fn truncate(state: &mut (dyn Any + Send), direction: Direction) {
    if let Some(s) = test_state(state) {
        s.truncated.push(direction);
    }
}

fn local_storage_alloc() -> Option<LocalStorage> {
    Some(Box::new(0u64))
}

fn local_storage_free(_storage: LocalStorage) {}

/// Register the "test" protocol with its two field parsers, the raw
/// stage and transaction support.
pub fn register_test(reg: &mut AppLayerParserRegistry) -> AppProto {
    let alproto = reg
        .register_proto("test", STREAM_TOSERVER | STREAM_TOCLIENT, parse_test)
        .unwrap();
    reg.register_parser("test-name", alproto, FIELD_NAME, parse_name, None).unwrap();
    reg.register_parser("test-value", alproto, FIELD_VALUE, parse_value, Some("test-name"))
        .unwrap();
    reg.register_parser("test-raw", alproto, STAGE_RAW, parse_raw, None).unwrap();
    reg.register_state_funcs(alproto, state_alloc, state_free).unwrap();
    reg.register_get_tx_cnt(alproto, tx_cnt).unwrap();
    reg.register_get_tx(alproto, get_tx).unwrap();
    reg.register_get_state_progress_func(alproto, progress).unwrap();
    reg.register_get_state_progress_completion_status(alproto, completion).unwrap();
    reg.register_tx_free_func(alproto, tx_free).unwrap();
    reg.register_truncate_func(alproto, truncate).unwrap();
    reg.register_local_storage_func(alproto, local_storage_alloc, local_storage_free).unwrap();
    alproto
}

/// Register the "records" protocol, to server only.
pub fn register_records(reg: &mut AppLayerParserRegistry) -> AppProto {
    let alproto = reg.register_proto("records", STREAM_TOSERVER, parse_records).unwrap();
    reg.register_state_funcs(alproto, state_alloc, state_free).unwrap();
    alproto
}

pub fn thread_ctx(reg: AppLayerParserRegistry) -> AppLayerParserThreadCtx {
    init_logging();
    AppLayerParserThreadCtx::new(Arc::new(reg.freeze().unwrap()))
}

pub fn state(f: &Flow) -> &TestState {
    f.alstate.as_ref().unwrap().downcast_ref::<TestState>().unwrap()
}

/// Stream flags of a direction.
pub fn dir_flags(direction: Direction) -> u8 {
    match direction {
        Direction::ToServer => STREAM_TOSERVER,
        Direction::ToClient => STREAM_TOCLIENT,
    }
}
