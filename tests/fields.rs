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

//! Field extraction through the per flow parse path.

mod common;

use common::*;
use suricata_applayer::app_layer::app_layer_parse;
use suricata_applayer::core::{IPPROTO_TCP, STREAM_EOF, STREAM_TOSERVER};
use suricata_applayer::flow::Flow;
use suricata_applayer::parser::AppLayerParserRegistry;

fn parse_chunks(chunks: &[&[u8]]) -> (Vec<(u16, Vec<u8>)>, usize) {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);
    for chunk in chunks {
        app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, chunk).unwrap();
    }
    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER | STREAM_EOF, &[]).unwrap();
    let s = state(&f);
    (s.fields.clone(), s.txs.len())
}

#[test]
fn test_single_call() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);

    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"AB|CD").unwrap();
    let s = state(&f);
    assert_eq!(s.values(FIELD_NAME), vec![&b"AB"[..]]);
    assert_eq!(s.values(FIELD_VALUE), vec![&b"CD"[..]]);
    let pstate = &f.alparser.as_ref().unwrap().to_server;
    assert_eq!(pstate.store_len(), 0);
    assert_eq!(pstate.parse_field, FIELD_NAME);
}

#[test]
fn test_two_calls() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);

    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"AB").unwrap();
    assert!(state(&f).fields.is_empty());
    assert_eq!(f.alparser.as_ref().unwrap().to_server.store_len(), 2);
    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"|CD").unwrap();

    let s = state(&f);
    assert_eq!(s.values(FIELD_NAME), vec![&b"AB"[..]]);
    assert_eq!(s.values(FIELD_VALUE), vec![&b"CD"[..]]);
    assert_eq!(f.alparser.as_ref().unwrap().to_server.store_len(), 0);
}

#[test]
fn test_eof_flush() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);

    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"AB|CDEF").unwrap();
    assert_eq!(state(&f).values(FIELD_NAME), vec![&b"AB"[..]]);
    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER | STREAM_EOF, &[]).unwrap();

    let s = state(&f);
    assert_eq!(s.values(FIELD_NAME), vec![&b"AB"[..], &b"EF"[..]]);
    let pstate = &f.alparser.as_ref().unwrap().to_server;
    assert!(pstate.is_eof());
    assert_eq!(pstate.store_len(), 0);
}

#[test]
fn test_eof_flush_same_call() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);

    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER | STREAM_EOF, b"EF").unwrap();
    assert_eq!(state(&f).fields, vec![(FIELD_NAME, b"EF".to_vec())]);
}

#[test]
fn test_chunking_invariance() {
    let stream: &[u8] = b"AB|CDxyz|12|34long name|ZZtail";
    let (expected, expected_txs) = parse_chunks(&[stream]);
    assert_eq!(expected_txs, 4);
    assert_eq!(expected.last(), Some(&(FIELD_NAME, b"tail".to_vec())));

    // every split in two
    for i in 1..stream.len() {
        let (fields, txs) = parse_chunks(&[&stream[..i], &stream[i..]]);
        assert_eq!(fields, expected, "split at {}", i);
        assert_eq!(txs, expected_txs);
    }

    // every split in three
    for i in 1..stream.len() - 1 {
        for j in i + 1..stream.len() {
            let (fields, txs) = parse_chunks(&[&stream[..i], &stream[i..j], &stream[j..]]);
            assert_eq!(fields, expected, "split at {} and {}", i, j);
            assert_eq!(txs, expected_txs);
        }
    }

    // byte by byte
    let bytes: Vec<&[u8]> = stream.chunks(1).collect();
    let (fields, txs) = parse_chunks(&bytes);
    assert_eq!(fields, expected);
    assert_eq!(txs, expected_txs);
}

#[test]
fn test_records_buffered_by_framework() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_records(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);

    for chunk in [&b"ab"[..], b"c", b"def", b"gh", b"ijklmn"] {
        app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, chunk).unwrap();
    }
    let s = state(&f);
    assert_eq!(s.values(0), vec![&b"abcd"[..], &b"efgh"[..], &b"ijkl"[..]]);

    // the partial record is dropped at end of stream
    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER | STREAM_EOF, &[]).unwrap();
    assert_eq!(state(&f).values(0).len(), 3);
}

#[test]
fn test_raw_stage() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);
    let mut f = Flow::new(IPPROTO_TCP, 1234, 4000);

    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"AB|CDRAW|some ").unwrap();
    app_layer_parse(&mut tctx, &mut f, alproto, STREAM_TOSERVER, b"raw | dataENDXY|12").unwrap();

    let s = state(&f);
    assert_eq!(s.raw, b"some raw | data".to_vec());
    assert_eq!(s.values(FIELD_NAME), vec![&b"AB"[..], &b"RAW"[..], &b"XY"[..]]);
    assert_eq!(s.values(FIELD_VALUE), vec![&b"CD"[..], &b"12"[..]]);
}

#[test]
fn test_local_storage_per_thread() {
    let mut reg = AppLayerParserRegistry::new();
    let alproto = register_test(&mut reg);
    let mut tctx = thread_ctx(reg);

    let mut f1 = Flow::new(IPPROTO_TCP, 1234, 4000);
    let mut f2 = Flow::new(IPPROTO_TCP, 1235, 4000);
    app_layer_parse(&mut tctx, &mut f1, alproto, STREAM_TOSERVER, b"A|").unwrap();
    app_layer_parse(&mut tctx, &mut f2, alproto, STREAM_TOSERVER, b"B|").unwrap();
    app_layer_parse(&mut tctx, &mut f1, alproto, STREAM_TOSERVER, b"12").unwrap();

    assert_eq!(state(&f1).calls, vec![1, 3]);
    assert_eq!(state(&f2).calls, vec![2]);
    assert_eq!(
        tctx.local_storage(alproto).and_then(|s| s.downcast_ref::<u64>().copied()),
        Some(3)
    );
}
