use std::path::PathBuf;

use nasa::crc::crc16;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

pub const RESPONSE: [u8; 3] = [0xc0, 0x15, 0x01];
pub const REQUEST: [u8; 3] = [0xc0, 0x13, 0x02];

/// Build a valid frame from its parts.
pub fn frame(source: [u8; 3], destination: [u8; 3], command: [u8; 3], sets: &[&[u8]]) -> Vec<u8> {
    let mut dat = vec![0x32, 0x00, 0x00];
    dat.extend_from_slice(&source);
    dat.extend_from_slice(&destination);
    dat.extend_from_slice(&command);
    dat.push(u8::try_from(sets.len()).expect("too many message sets"));
    for set in sets {
        dat.extend_from_slice(set);
    }
    let size = u16::try_from(dat.len() - 3 + 4).expect("frame too big");
    dat[1..3].copy_from_slice(&size.to_be_bytes());
    let crc = crc16(&dat, 3, dat.len() - 3);
    dat.extend_from_slice(&crc.to_be_bytes());
    dat.push(0x34);
    dat
}

pub fn variable(number: u16, value: u16) -> Vec<u8> {
    [number.to_be_bytes(), value.to_be_bytes()].concat()
}
