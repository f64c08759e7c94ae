/// Simulated SRAM chips for running without hardware.
///
/// `SimulatedSram` is the chip itself (three banks on one bus) and talks
/// `Bus` directly; `PinSimulator` and `RegisterSimulator` put it behind a
/// pin level or register level interface so the real transports can drive
/// it.

use std::fmt;
use std::mem;
use std::str::FromStr;

use crate::bus::{
	BitBangBus,
	Bus,
	Device,
	OutPins,
	Pins,
	RegisterBus,
	SpiRegisters,
	ALL_DESELECTED,
};
use crate::sram::{
	READ_OPCODE,
	WRITE_OPCODE,
};

// 23LC1024: 1 Mbit
pub const DEFAULT_BANK_SIZE: usize = 128 * 1024;

/// bytes clocked in between select and deselect
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame {
	pub device: Device,
	pub bytes: Vec<u8>,
}

impl Frame {
	pub fn opcode(&self) -> Option<u8> {
		self.bytes.first().cloned()
	}
}

pub struct SimulatedSram {
	banks: Vec<Vec<u8>>,
	selected: Option<Device>,
	command: Vec<u8>,
	// only with `with_frame_log`
	frames: Option<Vec<Frame>>,
	reads: usize,
	writes: usize,
}

impl SimulatedSram {
	/// three zero-filled banks of `bank_size` bytes each
	pub fn new(bank_size: usize) -> Self {
		assert!(bank_size > 0);
		SimulatedSram {
			banks: vec![vec![0u8; bank_size]; Device::ALL.len()],
			selected: None,
			command: Vec::new(),
			frames: None,
			reads: 0,
			writes: 0,
		}
	}

	/// like `new`, but also records every transaction as a `Frame`
	pub fn with_frame_log(bank_size: usize) -> Self {
		let mut sram = Self::new(bank_size);
		sram.frames = Some(Vec::new());
		sram
	}

	pub fn bank(&self, device: Device) -> &[u8] {
		&self.banks[device.index()]
	}

	pub fn bank_mut(&mut self, device: Device) -> &mut [u8] {
		&mut self.banks[device.index()]
	}

	pub fn selected(&self) -> Option<Device> {
		self.selected
	}

	/// recorded transactions; always empty without a frame log
	pub fn frames(&self) -> &[Frame] {
		match &self.frames {
			Some(frames) => &frames[..],
			None => &[],
		}
	}

	/// forget recorded frames and reset the READ/WRITE counters
	pub fn clear_frames(&mut self) {
		if let Some(frames) = &mut self.frames {
			frames.clear();
		}
		self.reads = 0;
		self.writes = 0;
	}

	pub fn reads(&self) -> usize {
		self.reads
	}

	pub fn writes(&self) -> usize {
		self.writes
	}

	// bank and cell for the next payload byte of the current command; the
	// address wraps at the end of the bank
	fn payload_cell(&self) -> Option<(usize, usize)> {
		let device = self.selected?;
		if self.command.len() < 4 {
			return None;
		}
		let address = (self.command[1] as usize) << 16
			| (self.command[2] as usize) << 8
			| self.command[3] as usize;
		let offset = self.command.len() - 4;
		let bank = device.index();
		Some((bank, (address + offset) % self.banks[bank].len()))
	}

	/// byte the chip puts on MISO during the next exchange
	pub fn shift_out(&self) -> u8 {
		match (self.command.first(), self.payload_cell()) {
			(Some(&READ_OPCODE), Some((bank, cell))) => self.banks[bank][cell],
			// not driven, pulled up
			_ => 0xff,
		}
	}

	/// byte the chip received from MOSI
	pub fn shift_in(&mut self, data: u8) {
		if self.selected.is_none() {
			return;
		}
		if let (Some(&WRITE_OPCODE), Some((bank, cell))) = (self.command.first(), self.payload_cell()) {
			self.banks[bank][cell] = data;
		}
		self.command.push(data);
	}
}

impl Bus for SimulatedSram {
	fn select(&mut self, device: Device) {
		assert!(self.selected.is_none(), "{} selected while {:?} is still selected", device, self.selected);
		self.selected = Some(device);
		self.command.clear();
	}

	fn deselect(&mut self, device: Device) {
		assert_eq!(self.selected, Some(device), "deselecting {} which isn't selected", device);
		trace!("{}: frame {:02x?}", device, self.command);
		match self.command.first() {
			Some(&READ_OPCODE) => self.reads += 1,
			Some(&WRITE_OPCODE) => self.writes += 1,
			_ => (),
		}
		if let Some(frames) = &mut self.frames {
			let bytes = mem::replace(&mut self.command, Vec::new());
			frames.push(Frame { device, bytes });
		}
		self.command.clear();
		self.selected = None;
	}

	fn exchange(&mut self, data: u8) -> u8 {
		let result = self.shift_out();
		self.shift_in(data);
		result
	}
}

/// Pin level view of `SimulatedSram` (SPI mode 0)
pub struct PinSimulator {
	sram: SimulatedSram,
	selected: Option<Device>,
	clock: bool,
	bit: u8,
	incoming: u8,
	outgoing: u8,
	miso: bool,
}

impl PinSimulator {
	pub fn new(sram: SimulatedSram) -> Self {
		PinSimulator {
			sram,
			selected: None,
			clock: false,
			bit: 0,
			incoming: 0,
			outgoing: 0xff,
			miso: true,
		}
	}

	pub fn sram(&self) -> &SimulatedSram {
		&self.sram
	}
}

impl Pins for PinSimulator {
	fn set_pins(&mut self, pins: OutPins) {
		if pins.select != self.selected {
			if let Some(device) = self.selected {
				self.sram.deselect(device);
			}
			if let Some(device) = pins.select {
				self.sram.select(device);
			}
			self.selected = pins.select;
			self.bit = 0;
			self.incoming = 0;
		}

		if self.selected.is_some() && pins.clock && !self.clock {
			if 0 == self.bit {
				self.outgoing = self.sram.shift_out();
			}
			self.miso = 0 != self.outgoing & (0x80 >> self.bit);
			self.incoming = (self.incoming << 1) | (pins.data as u8);
			self.bit += 1;
			if 8 == self.bit {
				self.sram.shift_in(self.incoming);
				self.bit = 0;
				self.incoming = 0;
			}
		}
		self.clock = pins.clock;
	}

	fn read_pin(&mut self) -> bool {
		self.selected.is_none() || self.miso
	}

	fn delay(&mut self) {
	}
}

/// Register level view of `SimulatedSram`; every transfer reports busy
/// for `BUSY_POLLS` polls.
pub struct RegisterSimulator {
	sram: SimulatedSram,
	configured: bool,
	port: u8,
	data: u8,
	busy: usize,
	polls: usize,
}

impl RegisterSimulator {
	pub const BUSY_POLLS: usize = 3;

	pub fn new(sram: SimulatedSram) -> Self {
		RegisterSimulator {
			sram,
			configured: false,
			port: ALL_DESELECTED,
			data: 0,
			busy: 0,
			polls: 0,
		}
	}

	pub fn sram(&self) -> &SimulatedSram {
		&self.sram
	}

	pub fn is_configured(&self) -> bool {
		self.configured
	}

	pub fn port(&self) -> u8 {
		self.port
	}

	pub fn polls(&self) -> usize {
		self.polls
	}
}

impl SpiRegisters for RegisterSimulator {
	fn configure_master(&mut self) {
		self.configured = true;
	}

	fn write_data(&mut self, data: u8) {
		assert!(self.configured, "SPI used before configure_master");
		assert_eq!(self.busy, 0, "data register written during a transfer");
		self.data = self.sram.exchange(data);
		self.busy = Self::BUSY_POLLS;
	}

	fn transfer_complete(&mut self) -> bool {
		self.polls += 1;
		if self.busy > 0 {
			self.busy -= 1;
			false
		} else {
			true
		}
	}

	fn read_data(&mut self) -> u8 {
		self.data
	}

	fn set_select_lines(&mut self, port: u8) {
		for &device in &Device::ALL {
			let mask = device.select_mask();
			if 0 == self.port & mask && 0 != port & mask {
				self.sram.deselect(device);
			}
		}
		for &device in &Device::ALL {
			let mask = device.select_mask();
			if 0 != self.port & mask && 0 == port & mask {
				self.sram.select(device);
			}
		}
		self.port = port;
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TransportKind {
	Direct,
	BitBang,
	Registers,
}

impl FromStr for TransportKind {
	type Err = failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"direct" => Ok(TransportKind::Direct),
			"bitbang" => Ok(TransportKind::BitBang),
			"registers" => Ok(TransportKind::Registers),
			_ => bail!("unknown transport {:?} (expected direct, bitbang or registers)", s),
		}
	}
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			TransportKind::Direct => write!(f, "direct"),
			TransportKind::BitBang => write!(f, "bitbang"),
			TransportKind::Registers => write!(f, "registers"),
		}
	}
}

/// `SimulatedSram` behind the selected transport
pub enum SimulatedTransport {
	Direct(SimulatedSram),
	BitBang(BitBangBus<PinSimulator>),
	Registers(RegisterBus<RegisterSimulator>),
}

impl SimulatedTransport {
	pub fn new(kind: TransportKind, bank_size: usize) -> Self {
		let sram = SimulatedSram::new(bank_size);
		match kind {
			TransportKind::Direct => SimulatedTransport::Direct(sram),
			TransportKind::BitBang => SimulatedTransport::BitBang(BitBangBus::new(PinSimulator::new(sram))),
			TransportKind::Registers => SimulatedTransport::Registers(RegisterBus::new(RegisterSimulator::new(sram))),
		}
	}

	pub fn sram(&self) -> &SimulatedSram {
		match self {
			SimulatedTransport::Direct(sram) => sram,
			SimulatedTransport::BitBang(bus) => bus.pins().sram(),
			SimulatedTransport::Registers(bus) => bus.registers().sram(),
		}
	}
}

impl Bus for SimulatedTransport {
	fn select(&mut self, device: Device) {
		match self {
			SimulatedTransport::Direct(sram) => sram.select(device),
			SimulatedTransport::BitBang(bus) => bus.select(device),
			SimulatedTransport::Registers(bus) => bus.select(device),
		}
	}

	fn deselect(&mut self, device: Device) {
		match self {
			SimulatedTransport::Direct(sram) => sram.deselect(device),
			SimulatedTransport::BitBang(bus) => bus.deselect(device),
			SimulatedTransport::Registers(bus) => bus.deselect(device),
		}
	}

	fn exchange(&mut self, data: u8) -> u8 {
		match self {
			SimulatedTransport::Direct(sram) => sram.exchange(data),
			SimulatedTransport::BitBang(bus) => bus.exchange(data),
			SimulatedTransport::Registers(bus) => bus.exchange(data),
		}
	}
}
