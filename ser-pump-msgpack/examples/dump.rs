//! Print every MessagePack value read from stdin as a line of JSON.
//!
//! ```text
//! printf '\x92\xa2hi\xc3' | cargo run --example dump
//! ```
use std::io;

use ser_pump::ReadSource;
use ser_pump_msgpack::Unpacker;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut source = ReadSource::new(io::stdin().lock());
    let mut unpacker = Unpacker::new();
    for value in unpacker.values(&mut source) {
        let value = value?;
        println!("{}", serde_json::to_string(&value)?);
    }
    Ok(())
}
