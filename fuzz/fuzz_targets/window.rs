#![no_main]

use chunkio::prelude::*;
use libfuzzer_sys::fuzz_target;

// Windowed and direct streams over the same bytes must agree on every read and seek.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let window = u64::from(data[0]) + 1;
    let (ops, store) = data[1..].split_at(data.len().min(17) - 1);

    let mut windowed = Stream::new();
    let mut direct = Stream::new();
    if windowed
        .open(Source::Memory(store.to_vec()), StreamOptions::default().with_window(window))
        .is_err()
        || direct
            .open(Source::Memory(store.to_vec()), StreamOptions::default())
            .is_err()
    {
        return;
    }

    for op in ops {
        let amount = u64::from(op >> 2);
        match op & 3 {
            0 => assert_eq!(
                windowed.set_offset(amount).is_ok(),
                direct.set_offset(amount).is_ok()
            ),
            1 => assert_eq!(windowed.read_bytes(amount).ok(), direct.read_bytes(amount).ok()),
            2 => assert_eq!(windowed.read::<u32>().ok(), direct.read::<u32>().ok()),
            _ => assert_eq!(
                windowed.search_bytes(&[*op]).ok(),
                direct.search_bytes(&[*op]).ok()
            ),
        }
        assert_eq!(windowed.offset().ok(), direct.offset().ok());
    }
});
