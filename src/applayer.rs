/* Copyright (C) 2017-2024 Open Information Security Foundation
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

//! Parser result, decoder event and enum helper types shared by all
//! app-layer parsers.

use crate::core::AppLayerEventType;

#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub struct AppLayerResult {
    pub status: i32,
    pub consumed: u32,
    pub needed: u32,
}

impl AppLayerResult {
    /// parser has successfully processed in the input, and has consumed all of it
    pub fn ok() -> Self {
        Default::default()
    }
    /// parser has hit an unrecoverable error. Returning this to the API
    /// leads to no further calls to the parser.
    pub fn err() -> Self {
        return Self {
            status: -1,
            ..Default::default()
        };
    }
    /// parser needs more data. Through 'consumed' it will indicate how many
    /// of the input bytes it has consumed. Through 'needed' it will indicate
    /// how many more bytes it needs before getting called again.
    /// Note: consumed should never be more than the input len
    ///       needed + consumed should be more than the input len
    pub fn incomplete(consumed: u32, needed: u32) -> Self {
        return Self {
            status: 1,
            consumed,
            needed,
        };
    }

    pub fn is_ok(self) -> bool {
        self.status == 0
    }

    pub fn is_err(self) -> bool {
        self.status == -1
    }

    pub fn is_incomplete(self) -> bool {
        self.status == 1
    }
}

impl From<bool> for AppLayerResult {
    fn from(v: bool) -> Self {
        if !v {
            Self::err()
        } else {
            Self::ok()
        }
    }
}

/// Trait implemented by app-layer event enums, usually through
/// `#[derive(AppLayerEvent)]`.
pub trait AppLayerEvent {
    /// Return the enum variant of the given ID.
    fn from_id(id: u8) -> Option<Self> where Self: std::marker::Sized;

    /// Convert the enum variant to an ID.
    fn as_u8(&self) -> u8;

    /// Return the event name as used in rules and logs.
    fn to_str(&self) -> &'static str;

    /// Return the enum variant for the given name.
    fn from_string(s: &str) -> Option<Self> where Self: std::marker::Sized;

    /// Event id and type for a rule keyword lookup.
    fn get_event_info(event_name: &str) -> Option<(u8, AppLayerEventType)>;

    /// Event name and type for an id.
    fn get_event_info_by_id(event_id: u8) -> Option<(&'static str, AppLayerEventType)>;
}

/// Generic `get_event_info` implementation for AppLayerEvent enums.
#[inline(always)]
pub fn get_event_info<T: AppLayerEvent>(event_name: &str) -> Option<(u8, AppLayerEventType)> {
    match T::from_string(event_name) {
        Some(event) => Some((event.as_u8(), AppLayerEventType::APP_LAYER_EVENT_TYPE_TRANSACTION)),
        None => {
            SCLogDebug!("unknown event {}", event_name);
            None
        }
    }
}

/// Generic `get_event_info_by_id` implementation for AppLayerEvent enums.
#[inline(always)]
pub fn get_event_info_by_id<T: AppLayerEvent>(
    event_id: u8,
) -> Option<(&'static str, AppLayerEventType)> {
    T::from_id(event_id)
        .map(|e| (e.to_str(), AppLayerEventType::APP_LAYER_EVENT_TYPE_TRANSACTION))
}

/// EnumString trait that will be implemented on enums that
/// derive StringEnum.
pub trait EnumString<T> {
    /// Return the enum variant of the given numeric value.
    fn from_u(v: T) -> Option<Self> where Self: Sized;

    /// Convert the enum variant to the numeric value.
    fn into_u(self) -> T;

    /// Return the string for logging the enum value.
    fn to_str(&self) -> &'static str;

    /// Get an enum variant from parsing a string.
    fn from_str(s: &str) -> Option<Self> where Self: Sized;
}

/// Anomalies raised by the framework itself rather than by a protocol
/// parser. Stored in the flow's decoder events.
#[derive(AppLayerEvent, Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppLayerParserEvent {
    ParserError,
    StreamGap,
    BufferLimitReached,
    #[name("wrong_direction_first_data")]
    WrongDirectionFirstData,
    ProtocolDetectionFailed,
}

/// Append only list of decoder event ids.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct AppLayerDecoderEvents {
    events: Vec<u8>,
}

impl AppLayerDecoderEvents {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn set_raw(&mut self, event: u8) {
        self.events.push(event);
    }

    pub fn set_event<T: AppLayerEvent>(&mut self, event: T) {
        self.set_raw(event.as_u8());
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<u8> {
        self.events.get(idx).copied()
    }

    pub fn has_event(&self, event: u8) -> bool {
        self.events.contains(&event)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.events.iter().copied()
    }
}

/// Data of an extracted field. Fields that lie inside a single input
/// chunk borrow it, fields stitched together from several chunks own a
/// copy.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AppLayerFieldData<'i> {
    Borrowed(&'i [u8]),
    Owned(Vec<u8>),
}

impl<'i> AppLayerFieldData<'i> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            AppLayerFieldData::Borrowed(b) => b,
            AppLayerFieldData::Owned(v) => v.as_slice(),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, AppLayerFieldData::Owned(_))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AppLayerParserResultElmt<'i> {
    /// Local parser id of the field, routed through the protocol map.
    pub name_idx: u16,
    pub data: AppLayerFieldData<'i>,
}

impl<'i> AppLayerParserResultElmt<'i> {
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

/// Ordered list of fields produced by one parser invocation.
#[derive(Default, Debug)]
pub struct AppLayerParserResult<'i> {
    elements: Vec<AppLayerParserResultElmt<'i>>,
}

impl<'i> AppLayerParserResult<'i> {
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    pub fn push_borrowed(&mut self, name_idx: u16, data: &'i [u8]) {
        self.elements.push(AppLayerParserResultElmt {
            name_idx,
            data: AppLayerFieldData::Borrowed(data),
        });
    }

    pub fn push_owned(&mut self, name_idx: u16, data: Vec<u8>) {
        self.elements.push(AppLayerParserResultElmt {
            name_idx,
            data: AppLayerFieldData::Owned(data),
        });
    }

    pub fn push(&mut self, elmt: AppLayerParserResultElmt<'i>) {
        self.elements.push(elmt);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AppLayerParserResultElmt<'i>> {
        self.elements.iter()
    }

    pub fn take(&mut self) -> Vec<AppLayerParserResultElmt<'i>> {
        std::mem::take(&mut self.elements)
    }
}
