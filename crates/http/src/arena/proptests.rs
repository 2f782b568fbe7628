use proptest::collection::vec;
use proptest::prelude::*;

use super::{Arena, View};

fn page_sizes() -> impl Strategy<Value = u32> {
    prop_oneof![Just(1u32), Just(4), Just(7), Just(64), Just(2048)]
}

proptest! {
    #[test]
    fn views_survive_growth(page_size in page_sizes(), parts in vec(vec(any::<u8>(), 0..300), 1..24)) {
        let mut arena = Arena::new(page_size);
        let mut written: Vec<(View, Vec<u8>)> = Vec::new();

        for part in parts {
            let view = arena.append(&part).unwrap();
            written.push((view, part));

            for (view, bytes) in &written {
                prop_assert!(arena.equal(*view, bytes));
            }
        }

        let total: usize = written.iter().map(|(_, bytes)| bytes.len()).sum();
        prop_assert_eq!(arena.len() as usize, total);
        prop_assert_eq!(arena.capacity() % arena.page_size() as usize, 0);
    }

    #[test]
    fn write_then_read_same_bytes(page_size in page_sizes(), offset in 0u32..5000, bytes in vec(any::<u8>(), 0..5000)) {
        let mut arena = Arena::new(page_size);
        let view = arena.write_at(offset, &bytes).unwrap();

        let mut out = vec![0u8; bytes.len()];
        prop_assert_eq!(arena.read(view, &mut out), bytes.len());
        prop_assert_eq!(&out, &bytes);
        prop_assert_eq!(arena.to_vec(view), bytes);
        prop_assert!(arena.len() >= offset);
    }

    #[test]
    fn split_reads_extend_one_view(
        page_size in page_sizes(),
        bytes in vec(any::<u8>(), 1..3000),
        cuts in vec(1usize..200, 0..20),
    ) {
        let mut arena = Arena::new(page_size);
        let mut view: Option<View> = None;
        let mut rest = &bytes[..];

        for cut in cuts.into_iter().chain(std::iter::repeat(usize::MAX)) {
            if rest.is_empty() {
                break;
            }
            let buf = arena.last_page_for_write().unwrap();
            let n = cut.min(buf.len()).min(rest.len());
            buf[..n].copy_from_slice(&rest[..n]);
            let chunk = arena.commit(n as u32).unwrap();
            rest = &rest[n..];

            match view.as_mut() {
                Some(view) => view.extend(chunk.len()),
                None => view = Some(chunk),
            }
        }

        prop_assert_eq!(view, Some(View::new(0, bytes.len() as u32)));
        prop_assert_eq!(arena.to_vec(View::new(0, arena.len())), bytes);
    }
}
