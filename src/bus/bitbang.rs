use std::thread;
use std::time::{
	Duration,
	Instant,
};

use super::{
	Bus,
	Device,
};

// 500 kHz clock
const CLOCK_EDGE: Duration = Duration::from_nanos(1000);

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OutPins {
	pub select: Option<Device>,
	pub clock: bool,
	pub data: bool,
}

/// GPIO lines of a bit-banged SPI master
pub trait Pins {
	fn set_pins(&mut self, pins: OutPins);
	// MISO
	fn read_pin(&mut self) -> bool;

	// delay for (at least) one clock edge
	fn delay(&mut self) {
		reliable_sleep(CLOCK_EDGE);
	}
}

/// SPI mode 0: clock idles low, both sides sample on the rising edge,
/// most significant bit first.
pub struct BitBangBus<P: Pins> {
	pins: P,
	selected: Option<Device>,
}

impl<P: Pins> BitBangBus<P> {
	pub fn new(mut pins: P) -> Self {
		pins.set_pins(OutPins { select: None, clock: false, data: false });
		BitBangBus {
			pins,
			selected: None,
		}
	}

	pub fn pins(&self) -> &P {
		&self.pins
	}

	fn clock_bit(&mut self, data: bool) -> bool {
		let select = self.selected;

		self.pins.set_pins(OutPins { select, clock: false, data });
		self.pins.delay(); // wait for pins to be stable

		self.pins.set_pins(OutPins { select, clock: true, data });
		self.pins.delay(); // wait for chip reading the pins
		self.pins.read_pin()
	}
}

impl<P: Pins> Bus for BitBangBus<P> {
	fn select(&mut self, device: Device) {
		assert!(self.selected.is_none(), "{} selected while {:?} is still selected", device, self.selected);
		self.selected = Some(device);
		self.pins.set_pins(OutPins { select: self.selected, clock: false, data: false });
		self.pins.delay();
	}

	fn deselect(&mut self, device: Device) {
		debug_assert_eq!(self.selected, Some(device));
		self.selected = None;
		self.pins.set_pins(OutPins { select: None, clock: false, data: false });
		self.pins.delay();
	}

	fn exchange(&mut self, data: u8) -> u8 {
		let mut result = 0u8;
		for bit in (0..8).rev() {
			let bit_mask = 1u8 << bit;
			if self.clock_bit(0 != data & bit_mask) {
				result |= bit_mask;
			}
		}
		// leave clock low between bytes
		let select = self.selected;
		self.pins.set_pins(OutPins { select, clock: false, data: false });
		result
	}
}
