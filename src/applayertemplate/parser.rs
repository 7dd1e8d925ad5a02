/* Copyright (C) 2018-2024 Open Information Security Foundation
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

use nom7::bytes::complete::{tag, take, take_while1};
use nom7::character::is_digit;
use nom7::combinator::{all_consuming, map_res};
use nom7::sequence::terminated;
use nom7::IResult;

/// Longest accepted length prefix, in digits.
pub const MAX_LEN_DIGITS: usize = 9;

fn parse_len(input: &str) -> Result<u32, std::num::ParseIntError> {
    input.parse::<u32>()
}

/// Parse a complete length field: the digits before the ':'.
pub fn parse_message_len(input: &[u8]) -> IResult<&[u8], u32> {
    all_consuming(map_res(
        map_res(take_while1(is_digit), std::str::from_utf8),
        parse_len,
    ))(input)
}

/// Look for a length prefix at the start of `input`.
///
/// As this protocol uses messages prefixed with the size as a string
/// followed by a ':', we look at up to the first 10 characters for
/// that pattern.
pub fn probe(input: &[u8]) -> IResult<&[u8], ()> {
    let size = std::cmp::min(MAX_LEN_DIGITS + 1, input.len());
    let (rem, prefix) = take(size)(input)?;
    terminated(take_while1(is_digit), tag(":"))(prefix)?;
    Ok((rem, ()))
}
