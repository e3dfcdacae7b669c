#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use readqc::{PairedReader, Record};


fuzz_target!(|data: &[u8]| {
    // Split the input into the two files of a pair.
    let mid = data.len() / 2;
    let reader1 = Cursor::new(&data[..mid]);
    let reader2 = Cursor::new(&data[mid..]);

    let mut reader = match PairedReader::from_readers(reader1, reader2, None) {
        Ok(reader) => reader,
        Err(_) => return,
    };
    let mut sum: usize = 0;
    while let Ok(Some(pair)) = reader.read_pair() {
        assert_eq!(pair.r1.seq().len(), pair.r1.qual().len());
        sum += pair.r1.len() + pair.r2.len();
    }
    std::hint::black_box(sum);
    reader.close();
});
