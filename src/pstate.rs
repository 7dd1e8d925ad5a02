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

//! Per flow parser state and field extraction.
//!
//! Each direction of a flow has an [`AppLayerParserState`] holding the
//! active parser, the field cursor and the buffer that accumulates a
//! field split over several chunks. The primitives in this module cut
//! fields out of the input and append them to an
//! [`AppLayerParserResult`], borrowing the input where possible.

use memchr::memmem;
use thiserror::Error;

use crate::applayer::{AppLayerDecoderEvents, AppLayerParserResult};
use crate::direction::Direction;

/// Default limit for field and retained input buffers.
pub const APP_LAYER_PARSER_BUFFER_LIMIT_DEFAULT: usize = 1024 * 1024;

/// The flow reached end of stream, set through `app_layer_set_eof`.
pub const APP_LAYER_TRANSACTION_EOF: u8 = 0x01;

bitflags! {
    #[derive(Default)]
    pub struct AppLayerParserStateFlags: u8 {
        /// Direction has seen data.
        const USE = 0x01;
        const EOF = 0x02;
        /// Parser is done, further data is ignored.
        const DONE = 0x04;
        const NO_INSPECTION = 0x08;
        const NO_REASSEMBLY = 0x10;
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldStatus {
    /// Field complete, this many bytes of the input were consumed.
    Found(usize),
    /// All input was stored, more data is needed.
    Incomplete,
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldError {
    #[error("end of stream with {needed} bytes of field missing")]
    UnexpectedEof { needed: usize },
    #[error("field exceeds buffer limit of {limit} bytes")]
    BufferLimit { limit: usize },
    #[error("empty delimiter")]
    EmptyDelimiter,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum StageRequest {
    Set(u16),
    Reset,
}

/// Parser state of one direction.
#[derive(Debug)]
pub struct AppLayerParserState {
    pub flags: AppLayerParserStateFlags,
    /// Global id of the parser handling new input, 0 if none.
    pub cur_parser: u16,
    /// Field cursor, owned by the protocol parser.
    pub parse_field: u16,
    store: Vec<u8>,
    pending: Vec<u8>,
    needed: usize,
    limit: usize,
    stage: Option<StageRequest>,
}

impl Default for AppLayerParserState {
    fn default() -> Self {
        Self::new(APP_LAYER_PARSER_BUFFER_LIMIT_DEFAULT)
    }
}

impl AppLayerParserState {
    pub fn new(limit: usize) -> Self {
        Self {
            flags: AppLayerParserStateFlags::empty(),
            cur_parser: 0,
            parse_field: 0,
            store: Vec::new(),
            pending: Vec::new(),
            needed: 0,
            limit,
            stage: None,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.flags.contains(AppLayerParserStateFlags::EOF)
    }

    pub fn is_done(&self) -> bool {
        self.flags.contains(AppLayerParserStateFlags::DONE)
    }

    pub fn set_done(&mut self) {
        self.flags |= AppLayerParserStateFlags::DONE;
    }

    /// Ask the framework to stop inspecting this flow. With
    /// `no_reassembly` stream reassembly is disabled as well.
    pub fn set_no_inspection(&mut self, no_reassembly: bool) {
        self.flags |= AppLayerParserStateFlags::NO_INSPECTION;
        if no_reassembly {
            self.flags |= AppLayerParserStateFlags::NO_REASSEMBLY;
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    /// True at end of stream while a partial field waits to be flushed.
    pub fn has_pending_field(&self) -> bool {
        self.is_eof() && !self.store.is_empty()
    }

    /// Continue with the sub-parser registered under `local_id` for the
    /// next input of this direction.
    pub fn set_stage(&mut self, local_id: u16) {
        self.stage = Some(StageRequest::Set(local_id));
    }

    /// Go back to the root parser of this direction.
    pub fn reset_stage(&mut self) {
        self.stage = Some(StageRequest::Reset);
    }

    pub(crate) fn take_stage(&mut self) -> Option<StageRequest> {
        self.stage.take()
    }

    pub(crate) fn request_stage(&mut self, stage: StageRequest) {
        self.stage = Some(stage);
    }

    pub(crate) fn needs_flush(&self) -> bool {
        self.is_eof() && (!self.store.is_empty() || !self.pending.is_empty())
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn needed(&self) -> usize {
        self.needed
    }

    pub(crate) fn take_pending(&mut self) -> Vec<u8> {
        self.needed = 0;
        std::mem::take(&mut self.pending)
    }

    /// Keep unconsumed input until `needed` bytes are available.
    pub(crate) fn retain(&mut self, tail: &[u8], needed: usize) -> Result<(), FieldError> {
        if tail.len() > self.limit {
            return Err(FieldError::BufferLimit { limit: self.limit });
        }
        self.pending.clear();
        self.pending.extend_from_slice(tail);
        self.needed = needed;
        Ok(())
    }

    /// Drop buffered data, used when the stream has a gap.
    pub fn reset_buffers(&mut self) {
        self.store.clear();
        self.pending.clear();
        self.needed = 0;
        self.parse_field = 0;
        self.stage = None;
    }

    fn store_append(&mut self, data: &[u8]) -> Result<(), FieldError> {
        if self.store.len() + data.len() > self.limit {
            SCLogDebug!("field store limit {} reached", self.limit);
            return Err(FieldError::BufferLimit { limit: self.limit });
        }
        self.store.extend_from_slice(data);
        Ok(())
    }

    /// Extract a field of exactly `size` bytes.
    pub fn parse_field_by_size<'i>(
        &mut self, result: &mut AppLayerParserResult<'i>, name_idx: u16, size: usize,
        input: &'i [u8],
    ) -> Result<FieldStatus, FieldError> {
        if self.store.is_empty() {
            if input.len() >= size {
                result.push_borrowed(name_idx, &input[..size]);
                return Ok(FieldStatus::Found(size));
            }
            if self.is_eof() {
                return Err(FieldError::UnexpectedEof { needed: size - input.len() });
            }
            if size > self.limit {
                return Err(FieldError::BufferLimit { limit: self.limit });
            }
            self.store_append(input)?;
            return Ok(FieldStatus::Incomplete);
        }

        let diff = size.saturating_sub(self.store.len());
        if input.len() >= diff {
            self.store_append(&input[..diff])?;
            result.push_owned(name_idx, std::mem::take(&mut self.store));
            return Ok(FieldStatus::Found(diff));
        }
        if self.is_eof() {
            let needed = diff - input.len();
            self.store.clear();
            return Err(FieldError::UnexpectedEof { needed });
        }
        if size > self.limit {
            return Err(FieldError::BufferLimit { limit: self.limit });
        }
        self.store_append(input)?;
        Ok(FieldStatus::Incomplete)
    }

    /// Extract a field terminated by `delim`. The delimiter is consumed
    /// but not part of the field. At end of stream whatever is buffered
    /// is returned as the field.
    pub fn parse_field_by_delimiter<'i>(
        &mut self, result: &mut AppLayerParserResult<'i>, name_idx: u16, delim: &[u8],
        input: &'i [u8],
    ) -> Result<FieldStatus, FieldError> {
        if delim.is_empty() {
            return Err(FieldError::EmptyDelimiter);
        }

        if self.store.is_empty() {
            if let Some(pos) = memmem::find(input, delim) {
                result.push_borrowed(name_idx, &input[..pos]);
                return Ok(FieldStatus::Found(pos + delim.len()));
            }
            if self.is_eof() {
                if input.is_empty() {
                    return Ok(FieldStatus::Incomplete);
                }
                result.push_borrowed(name_idx, input);
                return Ok(FieldStatus::Found(input.len()));
            }
            self.store_append(input)?;
            return Ok(FieldStatus::Incomplete);
        }

        // The delimiter may start in the stored part.
        let prev = self.store.len();
        let start = prev.saturating_sub(delim.len() - 1);
        let mut combined = std::mem::take(&mut self.store);
        combined.extend_from_slice(input);
        if let Some(pos) = memmem::find(&combined[start..], delim) {
            let end = start + pos;
            let consumed = (end + delim.len()).saturating_sub(prev);
            combined.truncate(end);
            result.push_owned(name_idx, combined);
            return Ok(FieldStatus::Found(consumed));
        }
        if self.is_eof() {
            result.push_owned(name_idx, combined);
            return Ok(FieldStatus::Found(input.len()));
        }
        if combined.len() > self.limit {
            combined.truncate(prev);
            self.store = combined;
            return Err(FieldError::BufferLimit { limit: self.limit });
        }
        self.store = combined;
        Ok(FieldStatus::Incomplete)
    }

    /// Extract a field running until end of stream.
    pub fn parse_field_by_eof<'i>(
        &mut self, result: &mut AppLayerParserResult<'i>, name_idx: u16, input: &'i [u8],
    ) -> Result<FieldStatus, FieldError> {
        if !self.is_eof() {
            self.store_append(input)?;
            return Ok(FieldStatus::Incomplete);
        }
        if self.store.is_empty() {
            if input.is_empty() {
                return Ok(FieldStatus::Incomplete);
            }
            result.push_borrowed(name_idx, input);
            return Ok(FieldStatus::Found(input.len()));
        }
        self.store_append(input)?;
        result.push_owned(name_idx, std::mem::take(&mut self.store));
        Ok(FieldStatus::Found(input.len()))
    }
}

/// Parser state of a flow: both directions plus transaction cursors.
#[derive(Debug)]
pub struct AppLayerParserStateStore {
    pub to_server: AppLayerParserState,
    pub to_client: AppLayerParserState,
    pub id_flags: u8,
    /// Next transaction to inspect, per direction.
    pub inspect_id: [u64; 2],
    /// Next transaction to log.
    pub log_id: u64,
    /// Bumped on every parse call and state change.
    pub version: u16,
    pub decoder_events: AppLayerDecoderEvents,
    /// Transactions below this id were handed to the free callback.
    pub(crate) tx_freed: u64,
}

impl Default for AppLayerParserStateStore {
    fn default() -> Self {
        Self::new(APP_LAYER_PARSER_BUFFER_LIMIT_DEFAULT)
    }
}

impl AppLayerParserStateStore {
    pub fn new(limit: usize) -> Self {
        Self {
            to_server: AppLayerParserState::new(limit),
            to_client: AppLayerParserState::new(limit),
            id_flags: 0,
            inspect_id: [0; 2],
            log_id: 0,
            version: 0,
            decoder_events: AppLayerDecoderEvents::new(),
            tx_freed: 0,
        }
    }

    pub fn get(&self, direction: Direction) -> &AppLayerParserState {
        match direction {
            Direction::ToServer => &self.to_server,
            Direction::ToClient => &self.to_client,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut AppLayerParserState {
        match direction {
            Direction::ToServer => &mut self.to_server,
            Direction::ToClient => &mut self.to_client,
        }
    }

    pub fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Mark the whole flow as finished.
    pub fn set_eof(&mut self) {
        self.id_flags |= APP_LAYER_TRANSACTION_EOF;
        self.to_server.flags |= AppLayerParserStateFlags::EOF;
        self.to_client.flags |= AppLayerParserStateFlags::EOF;
        self.bump_version();
    }

    /// True when `set_eof` was called or both directions saw end of
    /// stream.
    pub fn is_eof(&self) -> bool {
        self.id_flags & APP_LAYER_TRANSACTION_EOF != 0
            || (self.to_server.is_eof() && self.to_client.is_eof())
    }
}
