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

//! Transaction cursors.
//!
//! Detection inspects transactions per direction through `inspect_id`,
//! output walks them through `log_id`. Transactions behind every cursor
//! are released to the protocol.

use crate::core::AppProto;
use crate::direction::Direction;
use crate::flow::Flow;
use crate::parser::AppLayerParserCtx;

/// Is transaction `tx_id` complete in `direction`. A transaction the
/// protocol no longer returns counts as complete.
fn tx_complete(
    ctx: &AppLayerParserCtx, alproto: AppProto, f: &Flow, tx_id: u64, direction: Direction,
) -> bool {
    let state = match f.alstate.as_ref() {
        Some(state) => &**state,
        None => return false,
    };
    let tx = match ctx.get_tx(alproto, state, tx_id) {
        Some(tx) => tx,
        None => return true,
    };
    match (
        ctx.get_state_progress(alproto, tx, direction),
        ctx.get_state_progress_completion_status(alproto, direction),
    ) {
        (Some(progress), Some(status)) => progress >= status,
        _ => false,
    }
}

fn tx_cnt(ctx: &AppLayerParserCtx, alproto: AppProto, f: &Flow) -> Option<u64> {
    if !ctx.supports_txs(alproto) {
        return None;
    }
    let state = f.alstate.as_ref()?;
    ctx.get_tx_cnt(alproto, &**state)
}

/// Next transaction to inspect in the direction of `flags`, 0 when the
/// flow has no parser state yet.
pub fn get_inspect_id(f: &Flow, flags: u8) -> u64 {
    let direction = Direction::from(flags);
    f.alparser.as_ref().map(|p| p.inspect_id[direction.index()]).unwrap_or(0)
}

/// Move the inspect cursor of `direction` past the current transaction
/// if that one is complete.
pub fn update_inspect_id(ctx: &AppLayerParserCtx, f: &mut Flow, direction: Direction) {
    let alproto = f.alproto;
    let total = match tx_cnt(ctx, alproto, f) {
        Some(total) => total,
        None => return,
    };
    let idx = get_inspect_id(f, direction.into());
    if idx >= total {
        return;
    }
    if tx_complete(ctx, alproto, f, idx, direction) {
        if let Some(pstore) = f.alparser.as_mut() {
            pstore.inspect_id[direction.index()] = idx + 1;
            SCLogDebug!("{} inspect id now {}", direction, idx + 1);
        }
    }
}

pub fn get_log_id(f: &Flow) -> u64 {
    f.alparser.as_ref().map(|p| p.log_id).unwrap_or(0)
}

/// Move the log cursor past the current transaction if it is complete
/// in both directions or the flow reached end of stream.
pub fn update_log_id(ctx: &AppLayerParserCtx, f: &mut Flow) {
    let alproto = f.alproto;
    let total = match tx_cnt(ctx, alproto, f) {
        Some(total) => total,
        None => return,
    };
    let (idx, eof) = match f.alparser.as_ref() {
        Some(pstore) => (pstore.log_id, pstore.is_eof()),
        None => return,
    };
    if idx >= total {
        return;
    }
    if eof
        || (tx_complete(ctx, alproto, f, idx, Direction::ToServer)
            && tx_complete(ctx, alproto, f, idx, Direction::ToClient))
    {
        if let Some(pstore) = f.alparser.as_mut() {
            pstore.log_id = idx + 1;
        }
    }
}

/// Lowest transaction still needed in the direction of `flags`.
pub fn get_transaction_active(ctx: &AppLayerParserCtx, f: &Flow, flags: u8) -> Option<u64> {
    if !ctx.supports_txs(f.alproto) {
        return None;
    }
    let inspect_id = get_inspect_id(f, flags);
    if ctx.has_logger(f.alproto) {
        Some(std::cmp::min(inspect_id, get_log_id(f)))
    } else {
        Some(inspect_id)
    }
}

/// Release every transaction behind all cursors.
pub fn transactions_cleanup(ctx: &AppLayerParserCtx, f: &mut Flow) {
    let alproto = f.alproto;
    cleanup(ctx, alproto, f);
}

pub(crate) fn cleanup(ctx: &AppLayerParserCtx, alproto: AppProto, f: &mut Flow) {
    if !ctx.supports_txs(alproto) {
        return;
    }
    let Flow { alstate, alparser, .. } = f;
    let (state, pstore) = match (alstate.as_mut(), alparser.as_mut()) {
        (Some(state), Some(pstore)) => (state, pstore),
        _ => return,
    };
    let mut min = std::cmp::min(pstore.inspect_id[0], pstore.inspect_id[1]);
    if ctx.has_logger(alproto) && pstore.log_id < min {
        min = pstore.log_id;
    }
    while pstore.tx_freed < min {
        SCLogDebug!("freeing tx {}", pstore.tx_freed);
        ctx.tx_free(alproto, &mut **state, pstore.tx_freed);
        pstore.tx_freed += 1;
    }
}
