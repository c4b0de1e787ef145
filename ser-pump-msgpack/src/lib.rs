//! A resumable MessagePack unpacker for [`ser-pump`](`ser_pump`) byte sources and a packer for its sinks.
/*!

[`DecodeContext`] decodes a single MessagePack item from a [`ByteSource`] that
may hand out its bytes in arbitrarily small pieces. Each call to
[`DecodeContext::pump`] advances as far as the available bytes allow and
returns one of:

| Result                    | Meaning
|---------------------------|------------------------------------------------
| `Ok(Pump::Ready(item))`   | the item is complete, see [`DecodeContext::consumed`]
| `Ok(Pump::NeedMoreData)`  | the source has nothing right now, call again later
| `Ok(Pump::EndOfStream)`   | the source ended cleanly before the next item
| `Err(error)`              | the stream is truncated or corrupt

No hidden state survives between calls other than the context itself, so the
decoder can be driven from a blocking loop, an event loop or an `async` task
(see `AsyncUnpacker` with the `tokio` feature).

[`Unpacker`] drives a context repeatedly and assembles arrays and maps into
complete [`Value`] trees.

[`Packer`] writes values using the smallest representation.

MessagePack type -> [`Value`]:

| MessagePack type               | Value
|--------------------------------|---------------------------------
| `nil`                          | `Nil`
| `bool`                         | `Boolean`
| `fixint`, `int`, `uint`        | `Integer`
| `float-32`                     | `F32`
| `float-64`                     | `F64`
| `fixstr`, `str`                | `String` (text and binary view)
| `bin`                          | `Binary` (binary view only)
| `fixarray`, `array`            | `Array` (header only in [`Decoded`])
| `fixmap`, `map`                | `Map` (header only in [`Decoded`])
| `fixext`, `ext`                | `Extension`
*/
#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

#[cfg(feature = "tracing")]
macro_rules! log {
    ($level:ident, $($arg:tt)+) => { tracing::$level!($($arg)+) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log {
    ($level:ident, $($arg:tt)+) => { { let _ = format_args!($($arg)+); } };
}

mod config;
mod context;
mod error;
mod header;
mod pack;
mod unpack;
mod value;
#[cfg(feature = "tokio")]
mod tokio_io;

pub use ser_pump;
pub use ser_pump::{ByteSource, ByteSink, Fill};

pub use config::{Config, Utf8Policy};
pub use context::{DecodeContext, Decoded, Phase, Pump};
pub use error::{Error, Result};
pub use pack::{Packer, to_vec, to_writer};
pub use unpack::{Unpacker, Values, from_slice, from_slice_split_tail};
pub use value::{AccessError, Integer, Kind, Str, Value};
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub use tokio_io::AsyncUnpacker;

mod magick {
    /* MessagePack MAGICK */
    pub const MAX_POSFIXINT: u8 = 0x7f;
    pub const NEGFIXINT: u8 = 0b11100000;
    pub const MIN_NEGFIXINT: i8 = NEGFIXINT as i8; //-32
    pub const NIL: u8      = 0xc0;
    pub const RESERVED: u8 = 0xc1;
    pub const FALSE: u8    = 0xc2;
    pub const TRUE: u8     = 0xc3;

    pub const FIXMAP: u8   = 0x80; /* 1000xxxx */
    pub const MAX_FIXMAP_SIZE: usize = 0b1111;
    pub const FIXMAP_MAX: u8 = FIXMAP + MAX_FIXMAP_SIZE as u8; /* 10001111 */

    pub const FIXARRAY: u8 = 0x90; /* 1001xxxx */
    pub const MAX_FIXARRAY_SIZE: usize = 0b1111;
    pub const FIXARRAY_MAX: u8 = FIXARRAY + MAX_FIXARRAY_SIZE as u8; /* 10011111 */

    pub const FIXSTR: u8   = 0xa0; /* 101xxxxx */
    pub const MAX_FIXSTR_SIZE: usize = 0b11111;
    pub const FIXSTR_MAX: u8 = FIXSTR + MAX_FIXSTR_SIZE as u8; /* 10111111 */

    pub const BIN_8: u8     = 0xc4;
    pub const BIN_16: u8    = 0xc5;
    pub const BIN_32: u8    = 0xc6;

    pub const EXT_8: u8     = 0xc7;
    pub const EXT_16: u8    = 0xc8;
    pub const EXT_32: u8    = 0xc9;

    pub const FLOAT_32: u8  = 0xca;
    pub const FLOAT_64: u8  = 0xcb;

    pub const UINT_8: u8    = 0xcc;
    pub const UINT_16: u8   = 0xcd;
    pub const UINT_32: u8   = 0xce;
    pub const UINT_64: u8   = 0xcf;

    pub const INT_8: u8     = 0xd0;
    pub const INT_16: u8    = 0xd1;
    pub const INT_32: u8    = 0xd2;
    pub const INT_64: u8    = 0xd3;

    pub const FIXEXT_1: u8  = 0xd4;
    pub const FIXEXT_2: u8  = 0xd5;
    pub const FIXEXT_4: u8  = 0xd6;
    pub const FIXEXT_8: u8  = 0xd7;
    pub const FIXEXT_16: u8 = 0xd8;

    pub const STR_8: u8     = 0xd9;
    pub const STR_16: u8    = 0xda;
    pub const STR_32: u8    = 0xdb;

    pub const ARRAY_16: u8  = 0xdc;
    pub const ARRAY_32: u8  = 0xdd;

    pub const MAP_16: u8    = 0xde;
    pub const MAP_32: u8    = 0xdf;
}
