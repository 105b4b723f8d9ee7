//! Wire-level protocol: frame layout, checksum and the media key table.

pub mod frame;
pub mod media;

pub use frame::{build_packet, checksum, CommandCode, Frame, DEVICE_ADDRESS, SYNC_HEADER};
pub use media::MediaKey;
