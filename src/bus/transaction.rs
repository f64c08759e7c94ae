use std::ops::{
	Deref,
	DerefMut,
};

use super::{
	Bus,
	Device,
};

/// Select line of one device held for exactly one command; released on drop.
pub struct Transaction<'a, B: ?Sized+Bus+'a> {
	bus: &'a mut B,
	device: Device,
}

impl<'a, B: ?Sized+Bus> Transaction<'a, B> {
	pub fn device(&self) -> Device {
		self.device
	}

	pub fn send(&mut self, data: &[u8]) {
		for b in data {
			self.bus.exchange(*b);
		}
	}

	// clock in `target.len()` bytes while sending `filler`
	pub fn receive(&mut self, filler: u8, target: &mut [u8]) {
		for t in target.iter_mut() {
			*t = self.bus.exchange(filler);
		}
	}
}

impl<'a, B: ?Sized+Bus> Drop for Transaction<'a, B> {
	fn drop(&mut self) {
		self.bus.deselect(self.device);
	}
}

impl<'a, B: ?Sized+Bus> Deref for Transaction<'a, B> {
	type Target = B;

	fn deref(&self) -> &Self::Target {
		&self.bus
	}
}

impl<'a, B: ?Sized+Bus> DerefMut for Transaction<'a, B> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.bus
	}
}

pub trait ScopedSelect: Bus {
	fn transaction(&mut self, device: Device) -> Transaction<Self> {
		self.select(device);

		Transaction {
			bus: self,
			device,
		}
	}
}

impl<B: Bus+?Sized> ScopedSelect for B {
}
