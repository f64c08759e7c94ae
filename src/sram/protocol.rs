use crate::bus::{
	Bus,
	Device,
	ScopedSelect,
	Transaction,
};

use super::{
	FILLER,
	READ_OPCODE,
	WRITE_OPCODE,
	encode_address,
};

fn start_command<B: Bus+?Sized>(bus: &mut B, device: Device, opcode: u8, address: u32) -> Transaction<B> {
	let mut tx = bus.transaction(device);
	tx.send(&[opcode]);
	tx.send(&encode_address(address));
	tx
}

pub trait SramOperations: Bus {
	/// fill `target` from `[address, address + target.len())`
	fn read(&mut self, device: Device, address: u32, target: &mut [u8]) {
		trace!("{}: READ @{:06x} ({} bytes)", device, address, target.len());
		let mut tx = start_command(self, device, READ_OPCODE, address);
		tx.receive(FILLER, target);
	}

	fn write(&mut self, device: Device, address: u32, data: &[u8]) {
		trace!("{}: WRITE @{:06x} ({} bytes)", device, address, data.len());
		let mut tx = start_command(self, device, WRITE_OPCODE, address);
		tx.send(data);
	}
}

impl<B: ?Sized+Bus> SramOperations for B {
}
