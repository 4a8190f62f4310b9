//! Binary Stream Module
//!
//! A seekable, endianness-aware byte stream ([`BinaryStream`]) over
//! interchangeable backing storages ([`StreamDevice`]). The stream knows
//! nothing about asset semantics; the MDL and ANM writers in
//! [`crate::assets`] are generic over the device they write to.
//!
//! ```rust,ignore
//! use rigport::io::{BinaryStream, Endianness, MemoryDevice};
//!
//! let mut stream = BinaryStream::new(MemoryDevice::new()).with_endianness(Endianness::Little);
//! stream.begin_sized_block()?;
//! stream.write_sized_string("payload")?;
//! stream.end_sized_block()?;
//! let bytes = stream.finish()?.into_inner();
//! ```

pub mod device;
pub mod stream;

pub use device::{FileDevice, FixedBuffer, MemoryDevice, OpenMode, StreamDevice};
pub use stream::{BinaryStream, Endianness, latin1_bytes, latin1_string};
