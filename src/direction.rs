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

use crate::core::{STREAM_TOCLIENT, STREAM_TOSERVER};

pub const DIR_BOTH: u8 = STREAM_TOSERVER | STREAM_TOCLIENT;

#[repr(C)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Direction {
    ToServer = 0x04,
    ToClient = 0x08,
}

impl Direction {
    /// Return true if the direction is to server.
    pub fn is_to_server(&self) -> bool {
        matches!(self, Self::ToServer)
    }

    /// Return true if the direction is to client.
    pub fn is_to_client(&self) -> bool {
        matches!(self, Self::ToClient)
    }

    /// Index into per direction arrays such as `inspect_id`.
    pub fn index(&self) -> usize {
        match self {
            Self::ToServer => 0,
            Self::ToClient => 1,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Self::ToServer => Self::ToClient,
            Self::ToClient => Self::ToServer,
        }
    }

    /// Strict conversion from stream flags: exactly one direction bit
    /// must be set.
    pub fn from_flags(flags: u8) -> Option<Direction> {
        match flags & DIR_BOTH {
            STREAM_TOSERVER => Some(Direction::ToServer),
            STREAM_TOCLIENT => Some(Direction::ToClient),
            _ => None,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::ToServer
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToServer => write!(f, "toserver"),
            Self::ToClient => write!(f, "toclient"),
        }
    }
}

impl From<u8> for Direction {
    fn from(d: u8) -> Self {
        if d & DIR_BOTH == DIR_BOTH {
            debug_validate_fail!("Both directions are set");
            Direction::ToServer
        } else if d & STREAM_TOSERVER != 0 {
            Direction::ToServer
        } else if d & STREAM_TOCLIENT != 0 {
            Direction::ToClient
        } else {
            debug_validate_fail!("Unknown direction!!");
            Direction::ToServer
        }
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> u8 {
        d as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_direction() {
        assert!(Direction::ToServer.is_to_server());
        assert!(!Direction::ToServer.is_to_client());

        assert!(Direction::ToClient.is_to_client());
        assert!(!Direction::ToClient.is_to_server());

        assert_eq!(Direction::ToServer.opposite(), Direction::ToClient);
        assert_eq!(Direction::ToServer.index(), 0);
        assert_eq!(Direction::ToClient.index(), 1);
    }

    #[test]
    fn test_direction_flags() {
        assert_eq!(Direction::from(STREAM_TOCLIENT | 0x02), Direction::ToClient);
        assert_eq!(u8::from(Direction::ToServer), STREAM_TOSERVER);
        assert_eq!(Direction::from_flags(STREAM_TOSERVER), Some(Direction::ToServer));
        assert_eq!(Direction::from_flags(DIR_BOTH), None);
        assert_eq!(Direction::from_flags(0), None);
    }
}
