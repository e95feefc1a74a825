//! Chunk codec and ring properties

use bluebox_core::memory::{Chunk, ChunkError, KeyRing, CHUNK_SIZE, MAX_KEYS, SENTINEL};
use bluebox_core::{Key, ToneMode};
use proptest::prelude::*;

fn any_key() -> impl Strategy<Value = Key> {
    (1u8..=13).prop_map(|code| Key::from_code(code).unwrap())
}

fn any_mode() -> impl Strategy<Value = ToneMode> {
    (1u8..=5).prop_map(|byte| ToneMode::from_byte(byte).unwrap())
}

proptest! {
    #[test]
    fn prop_recorded_chunk_decodes_to_same_keys(
        mode in any_mode(),
        keys in prop::collection::vec(any_key(), 0..=MAX_KEYS),
    ) {
        let chunk = Chunk::Sequence {
            mode,
            keys: heapless::Vec::from_slice(&keys).unwrap(),
        };
        let bytes = chunk.encode();
        prop_assert!(bytes[1 + keys.len()..].iter().all(|b| *b == SENTINEL));
        prop_assert_eq!(Chunk::decode(&bytes), Ok(chunk));
    }

    #[test]
    fn prop_decode_never_reads_past_a_bad_byte(raw in prop::array::uniform32(any::<u8>())) {
        let mut bytes = [SENTINEL; CHUNK_SIZE];
        bytes[..32].copy_from_slice(&raw);
        match Chunk::decode(&bytes) {
            Ok(Chunk::Empty) => prop_assert_eq!(bytes[0], SENTINEL),
            Ok(Chunk::Sequence { mode, keys }) => {
                prop_assert_eq!(mode.as_byte(), bytes[0]);
                for (i, key) in keys.iter().enumerate() {
                    prop_assert_eq!(key.code(), bytes[i + 1]);
                }
                // Decoding stopped at a non-key byte or the chunk end
                let end = 1 + keys.len();
                prop_assert!(end == CHUNK_SIZE || Key::from_code(bytes[end]).is_none());
            }
            Err(ChunkError::InvalidMode(byte)) => {
                prop_assert_eq!(byte, bytes[0]);
                prop_assert!(ToneMode::from_byte(byte).is_none());
            }
        }
    }

    #[test]
    fn prop_ring_holds_the_newest_keys(keys in prop::collection::vec(any_key(), 0..120)) {
        let mut ring = KeyRing::new();
        for key in &keys {
            ring.push(*key);
        }
        prop_assert_eq!(ring.len(), keys.len().min(MAX_KEYS));
        let expected = &keys[keys.len().saturating_sub(MAX_KEYS)..];
        let drained = ring.drain();
        prop_assert_eq!(drained.as_slice(), expected);
        prop_assert!(ring.is_empty());
    }
}

#[test]
fn test_zero_byte_ends_sequence() {
    let mut bytes = [SENTINEL; CHUNK_SIZE];
    bytes[..4].copy_from_slice(&[3, 1, 0, 2]);
    match Chunk::decode(&bytes) {
        Ok(Chunk::Sequence { mode, keys }) => {
            assert_eq!(mode, ToneMode::Redbox);
            assert_eq!(keys.as_slice(), &[Key::One]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_mode_zero_is_invalid() {
    let mut bytes = [SENTINEL; CHUNK_SIZE];
    bytes[0] = 0;
    assert_eq!(Chunk::decode(&bytes), Err(ChunkError::InvalidMode(0)));
}
