//! GrowableBuffer and BufferPool integration tests.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ulc_core::{BufferPool, GrowableBuffer};

/// Helper: append every chunk and return the offsets reported.
fn append_all(buf: &mut GrowableBuffer, chunks: &[Vec<u8>]) -> Vec<usize> {
    chunks.iter().map(|c| buf.append(c)).collect()
}

#[test]
fn test_recycled_storage_is_reused() {
    let pool = BufferPool::new(2);
    let mut buf = pool.acquire(100, 32);
    buf.append(b"some transient text");
    pool.release(buf);
    assert_eq!(pool.len(), 1);

    let again = pool.acquire(50, 32);
    assert!(again.is_empty());
    assert!(again.capacity() >= 100);
    assert!(pool.is_empty());
}

#[test]
fn test_global_pool_round_trip() {
    let buf = BufferPool::global().acquire(8, 8);
    buf.recycle();
    assert!(BufferPool::global().len() >= 1);
}

proptest! {
    #[test]
    fn prop_append_matches_concatenation(
        chunks in prop::collection::vec(prop::collection::vec(1u8..=255, 0..40), 0..20),
        increment in 1usize..64,
    ) {
        let mut buf = GrowableBuffer::new(increment);
        let offsets = append_all(&mut buf, &chunks);

        let mut expected = Vec::new();
        for (chunk, offset) in chunks.iter().zip(offsets) {
            prop_assert_eq!(offset, expected.len());
            expected.extend_from_slice(chunk);
        }
        prop_assert_eq!(buf.as_bytes(), &expected[..]);
        prop_assert!(buf.len() <= buf.capacity());
        prop_assert_eq!(buf.capacity() % increment, 0);
        prop_assert_eq!(*buf.as_bytes_with_nul().last().unwrap(), 0u8);
    }

    #[test]
    fn prop_modify_matches_vec_model(
        base in prop::collection::vec(any::<u8>(), 0..64),
        patch in prop::collection::vec(any::<u8>(), 0..32),
        at in 0usize..64,
    ) {
        let mut buf = GrowableBuffer::new(16);
        buf.append(&base);
        let offset = at.min(base.len());

        let mut model = base.clone();
        let end = offset + patch.len();
        if end > model.len() {
            model.resize(end, 0);
        }
        model[offset..end].copy_from_slice(&patch);

        prop_assert_eq!(buf.modify(offset, &patch).unwrap(), model.len());
        prop_assert_eq!(buf.as_bytes(), &model[..]);
    }
}
