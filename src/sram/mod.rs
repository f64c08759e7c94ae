/// Protocol for Microchip 23LC1024-style serial SRAM (1 Mbit, 24-bit addresses)
///
/// Every command is framed by the chip-select line:
/// - 1-byte opcode
/// - 3-byte address, most significant byte first
/// - payload, any length; the address auto-increments (sequential mode)
///
/// Opcodes:
/// - 0x03: READ, payload is clocked out by the chip (we send 0xff filler)
/// - 0x02: WRITE, payload is clocked in
///
/// There is no acknowledgement; a failed write looks exactly like a
/// successful one.

mod cache;
mod protocol;

pub use self::cache::{
	CacheSlot,
	CachedStore,
	StoreError,
};

pub use self::protocol::SramOperations;

pub const READ_OPCODE: u8 = 0x03;
pub const WRITE_OPCODE: u8 = 0x02;
// sent while clocking in read data
pub const FILLER: u8 = 0xff;

pub const ADDRESS_WIDTH: usize = 24;
pub const ADDRESS_LIMIT: u32 = 1u32 << ADDRESS_WIDTH;

/// bits [23:16], [15:8], [7:0]; anything above bit 23 is dropped
pub fn encode_address(address: u32) -> [u8; 3] {
	[
		(address >> 16) as u8,
		(address >> 8) as u8,
		address as u8,
	]
}
