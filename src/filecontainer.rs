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

//! Files extracted from a protocol state, see `get_files`.

use crate::direction::Direction;

/// Do not keep file data, only track size.
pub const FILE_NOSTORE: u16 = BIT_U16!(0);
/// File was closed before all data was seen.
pub const FILE_TRUNCATED: u16 = BIT_U16!(1);
pub const FILE_HAS_GAPS: u16 = BIT_U16!(2);

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileState {
    Opened,
    Closed,
    Truncated,
}

#[derive(Debug)]
pub struct File {
    pub track_id: u32,
    pub name: Vec<u8>,
    pub flags: u16,
    pub state: FileState,
    pub direction: Direction,
    pub size: u64,
    pub txid: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FileContainer {
    files: Vec<File>,
}

impl FileContainer {
    pub fn new() -> FileContainer {
        FileContainer { files: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, File> {
        self.files.iter()
    }

    fn get_open(&mut self, track_id: u32) -> Option<&mut File> {
        self.files
            .iter_mut()
            .find(|f| f.track_id == track_id && f.state == FileState::Opened)
    }

    pub fn file_open(&mut self, track_id: u32, name: &[u8], direction: Direction, flags: u16) -> i32 {
        SCLogDebug!("FILE {} OPEN flags {:04X}", track_id, flags);
        if self.get_open(track_id).is_some() {
            SCLogDebug!("file {} already open", track_id);
            return -1;
        }
        self.files.push(File {
            track_id,
            name: name.to_vec(),
            flags,
            state: FileState::Opened,
            direction,
            size: 0,
            txid: 0,
            data: Vec::new(),
        });
        0
    }

    pub fn file_append(&mut self, track_id: u32, data: &[u8], is_gap: bool) -> i32 {
        SCLogDebug!("FILECONTAINER: append {}", data.len());
        if data.len() == 0 {
            return 0
        }
        let file = match self.get_open(track_id) {
            Some(f) => f,
            None => return -1,
        };
        file.size += data.len() as u64;
        if is_gap {
            SCLogDebug!("appending GAP");
            file.flags |= FILE_HAS_GAPS;
        } else if file.flags & FILE_NOSTORE == 0 {
            file.data.extend_from_slice(data);
        }
        0
    }

    pub fn file_close(&mut self, track_id: u32, flags: u16) -> i32 {
        SCLogDebug!("FILECONTAINER: CLOSEing");
        let file = match self.get_open(track_id) {
            Some(f) => f,
            None => return -1,
        };
        file.flags |= flags;
        file.state = if flags & FILE_TRUNCATED != 0 {
            FileState::Truncated
        } else {
            FileState::Closed
        };
        0
    }

    /// Close every open file as truncated, e.g. on a stream gap.
    pub fn files_truncate(&mut self) {
        for file in self.files.iter_mut().filter(|f| f.state == FileState::Opened) {
            file.flags |= FILE_TRUNCATED;
            file.state = FileState::Truncated;
        }
    }

    /// Remove closed files.
    pub fn files_prune(&mut self) {
        SCLogDebug!("FILECONTAINER: pruning");
        self.files.retain(|f| f.state == FileState::Opened);
    }

    pub fn file_set_txid_on_last_file(&mut self, tx_id: u64) {
        if let Some(f) = self.files.last_mut() {
            f.txid = tx_id;
        }
    }
}
