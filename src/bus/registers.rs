use super::{
	Bus,
	Device,
	wait_until,
};

/// chip-select port value with every (active low) select line released
pub const ALL_DESELECTED: u8 = 0b111;

/// Register level view of a hardware SPI master.
pub trait SpiRegisters {
	// one-time board init: select lines and clock/data as outputs, enable
	// the peripheral in master mode, set the clock divider
	fn configure_master(&mut self);

	// writing the data register starts shifting
	fn write_data(&mut self, data: u8);
	fn transfer_complete(&mut self) -> bool;
	fn read_data(&mut self) -> u8;

	// output port driving the select lines; a cleared bit selects the device
	fn set_select_lines(&mut self, port: u8);
}

pub struct RegisterBus<R: SpiRegisters> {
	registers: R,
	port: u8,
}

impl<R: SpiRegisters> RegisterBus<R> {
	pub fn new(mut registers: R) -> Self {
		registers.configure_master();
		registers.set_select_lines(ALL_DESELECTED);
		RegisterBus {
			registers,
			port: ALL_DESELECTED,
		}
	}

	pub fn registers(&self) -> &R {
		&self.registers
	}
}

impl<R: SpiRegisters> Bus for RegisterBus<R> {
	fn select(&mut self, device: Device) {
		assert_eq!(self.port, ALL_DESELECTED, "{} selected while another device is still selected", device);
		self.port &= !device.select_mask();
		self.registers.set_select_lines(self.port);
	}

	fn deselect(&mut self, device: Device) {
		debug_assert_eq!(self.port, ALL_DESELECTED & !device.select_mask());
		self.port |= device.select_mask();
		self.registers.set_select_lines(self.port);
	}

	fn exchange(&mut self, data: u8) -> u8 {
		self.registers.write_data(data);
		let registers = &mut self.registers;
		wait_until(|| registers.transfer_complete());
		self.registers.read_data()
	}
}
