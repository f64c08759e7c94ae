/// Shared synchronous serial bus (SPI) with one chip-select line per device.
///
/// Only a single device may be selected at a time; use
/// `ScopedSelect::transaction` instead of calling `select`/`deselect`
/// directly so the select line is released on every exit path.

mod bitbang;
mod poll;
mod registers;
mod transaction;

use std::fmt;

pub use self::bitbang::{
	BitBangBus,
	OutPins,
	Pins,
	reliable_sleep,
};

pub use self::poll::wait_until;

pub use self::registers::{
	RegisterBus,
	SpiRegisters,
	ALL_DESELECTED,
};

pub use self::transaction::{
	ScopedSelect,
	Transaction,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Device {
	Bank0,
	Bank1,
	Bank2,
}

impl Device {
	pub const ALL: [Device; 3] = [Device::Bank0, Device::Bank1, Device::Bank2];

	pub fn index(self) -> usize {
		match self {
			Device::Bank0 => 0,
			Device::Bank1 => 1,
			Device::Bank2 => 2,
		}
	}

	pub fn from_index(index: usize) -> Option<Device> {
		Device::ALL.get(index).cloned()
	}

	// bit in the chip-select port
	pub fn select_mask(self) -> u8 {
		1u8 << self.index()
	}
}

impl fmt::Display for Device {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "bank{}", self.index())
	}
}

pub trait Bus {
	/// assert the select line of `device`
	fn select(&mut self, device: Device);

	/// release the select line of `device`
	fn deselect(&mut self, device: Device);

	/// shift out one byte and return the byte shifted in at the same time;
	/// blocks until the shift completed.
	fn exchange(&mut self, data: u8) -> u8;
}

impl<'a, B: ?Sized + Bus> Bus for &'a mut B {
	fn select(&mut self, device: Device) {
		B::select(*self, device)
	}
	fn deselect(&mut self, device: Device) {
		B::deselect(*self, device)
	}
	fn exchange(&mut self, data: u8) -> u8 {
		B::exchange(*self, data)
	}
}
