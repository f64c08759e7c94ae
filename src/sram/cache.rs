use failure::Fail;

use crate::bus::{
	Bus,
	Device,
};

use super::{
	ADDRESS_LIMIT,
	SramOperations,
};

#[derive(Debug, Fail, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
	#[fail(display = "address 0x{:x} out of range (limit 0x{:x})", address, limit)]
	AddressOutOfRange {
		address: u32,
		limit: u32,
	},
}

/// The one byte held by a `CachedStore`.
///
/// `value` is only meaningful while `resident_address` is set; `dirty`
/// marks a value that still needs to be written to the chip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct CacheSlot {
	pub resident_address: Option<u32>,
	pub value: u8,
	pub dirty: bool,
}

/// Byte addressable view of one SRAM device with a single-byte write-back
/// cache.
///
/// Repeated accesses to the same address don't touch the bus; switching to
/// another address writes the cached byte back (if modified) and reads the
/// new one. A write to a new address also reads it first.
///
/// The store assumes it is the only writer of its device: nothing detects
/// changes made to the chip behind its back, so never keep two stores (or
/// other raw accesses) for the same device alive at once.
///
/// The dirty byte is written back on `flush` and on drop.
pub struct CachedStore<B: Bus> {
	bus: B,
	device: Device,
	capacity: u32,
	slot: CacheSlot,
}

impl<B: Bus> CachedStore<B> {
	pub fn new(bus: B, device: Device) -> Self {
		Self::with_capacity(bus, device, ADDRESS_LIMIT)
	}

	/// limit addresses to `[0, capacity)`
	pub fn with_capacity(bus: B, device: Device, capacity: u32) -> Self {
		assert!(capacity <= ADDRESS_LIMIT, "capacity 0x{:x} exceeds 24-bit addressing", capacity);
		CachedStore {
			bus,
			device,
			capacity,
			slot: CacheSlot::default(),
		}
	}

	pub fn device(&self) -> Device {
		self.device
	}

	pub fn capacity(&self) -> u32 {
		self.capacity
	}

	pub fn slot(&self) -> CacheSlot {
		self.slot
	}

	pub fn bus(&self) -> &B {
		&self.bus
	}

	/// Raw bus access; writes through it to this store's device are not
	/// seen by the cache. Call `flush` first.
	pub fn bus_mut(&mut self) -> &mut B {
		&mut self.bus
	}

	fn check_address(&self, address: u32) -> crate::AResult<()> {
		if address >= self.capacity {
			return Err(StoreError::AddressOutOfRange {
				address,
				limit: self.capacity,
			}.into());
		}
		Ok(())
	}

	// make `address` the resident byte, writing back the old one if needed
	fn load(&mut self, address: u32) {
		if self.slot.resident_address == Some(address) {
			return;
		}

		self.flush();

		let mut data = [0u8; 1];
		self.bus.read(self.device, address, &mut data);
		debug!("{}: cache load @{:06x} = {:02x}", self.device, address, data[0]);
		self.slot = CacheSlot {
			resident_address: Some(address),
			value: data[0],
			dirty: false,
		};
	}

	pub fn read_byte(&mut self, address: u32) -> crate::AResult<u8> {
		self.check_address(address)?;
		self.load(address);
		Ok(self.slot.value)
	}

	pub fn write_byte(&mut self, address: u32, value: u8) -> crate::AResult<()> {
		self.check_address(address)?;
		// TODO: a write miss could skip the read and just claim the slot
		self.load(address);
		self.slot.value = value;
		self.slot.dirty = true;
		Ok(())
	}

	pub fn flush(&mut self) {
		if !self.slot.dirty {
			return;
		}
		if let Some(address) = self.slot.resident_address {
			debug!("{}: cache flush @{:06x} = {:02x}", self.device, address, self.slot.value);
			self.bus.write(self.device, address, &[self.slot.value]);
		}
		self.slot.dirty = false;
	}
}

impl<B: Bus> Drop for CachedStore<B> {
	fn drop(&mut self) {
		self.flush();
	}
}

#[cfg(test)]
mod test {
	use super::{
		CacheSlot,
		CachedStore,
		StoreError,
	};
	use crate::bus::Device;
	use crate::sim::SimulatedSram;
	use crate::sram::{
		ADDRESS_LIMIT,
		SramOperations,
	};

	fn store_error(e: failure::Error) -> StoreError {
		match e.downcast::<StoreError>() {
			Ok(e) => e,
			Err(e) => panic!("unexpected error: {}", e),
		}
	}

	#[test]
	fn starts_empty() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let store = CachedStore::new(&mut sim, Device::Bank0);
		assert_eq!(store.slot(), CacheSlot::default());
		assert_eq!(store.slot().resident_address, None);
		assert_eq!(store.capacity(), ADDRESS_LIMIT);
		drop(store);
		assert!(sim.frames().is_empty());
	}

	#[test]
	fn first_access_misses() {
		let mut sim = SimulatedSram::with_frame_log(512);
		sim.bank_mut(Device::Bank0)[0] = 0x5a;
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		assert_eq!(store.read_byte(0).unwrap(), 0x5a);
		assert_eq!(store.bus().reads(), 1);
	}

	#[test]
	fn write_then_read_hits() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		for &(address, value) in &[(0u32, 0u8), (1, 0xff), (0x1ff, 0x80), (0xff_ffff, 0x42)] {
			store.write_byte(address, value).unwrap();
			let frames = store.bus().frames().len();
			assert_eq!(store.read_byte(address).unwrap(), value);
			assert_eq!(store.bus().frames().len(), frames, "read after write must not touch the bus");
		}
	}

	#[test]
	fn repeated_reads_hit() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		for _ in 0..10 {
			store.read_byte(17).unwrap();
		}
		assert_eq!(store.bus().reads(), 1);
		assert_eq!(store.bus().writes(), 0);
	}

	#[test]
	fn eviction_flushes_dirty_byte() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		store.write_byte(10, 0x11).unwrap();
		assert_eq!(store.bus().bank(Device::Bank0)[10], 0, "write-back must be deferred");
		store.bus_mut().clear_frames();

		store.read_byte(20).unwrap();
		let frames = store.bus().frames();
		assert_eq!(frames.len(), 2);
		assert_eq!(frames[0].bytes, vec![0x02, 0x00, 0x00, 10, 0x11]);
		assert_eq!(frames[1].bytes, vec![0x03, 0x00, 0x00, 20, 0xff]);
		store.bus_mut().clear_frames();

		assert_eq!(store.read_byte(10).unwrap(), 0x11);
		assert_eq!(store.bus().reads(), 1);
		assert_eq!(store.bus().writes(), 0);
	}

	#[test]
	fn clean_eviction_does_not_write() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		store.read_byte(1).unwrap();
		store.bus_mut().clear_frames();
		store.read_byte(2).unwrap();
		assert_eq!(store.bus().writes(), 0);
		assert_eq!(store.bus().reads(), 1);
	}

	#[test]
	fn write_hit_stays_in_cache() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		store.write_byte(5, 1).unwrap();
		store.write_byte(5, 2).unwrap();
		store.write_byte(5, 3).unwrap();
		assert_eq!(store.bus().reads(), 1);
		assert_eq!(store.bus().writes(), 0);
		assert_eq!(store.slot(), CacheSlot { resident_address: Some(5), value: 3, dirty: true });
		store.flush();
		assert_eq!(store.bus().bank(Device::Bank0)[5], 3);
		assert_eq!(store.bus().writes(), 1);
	}

	#[test]
	fn flush_is_idempotent() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		store.write_byte(3, 9).unwrap();
		store.flush();
		store.flush();
		assert_eq!(store.bus().writes(), 1);
		assert!(!store.slot().dirty);
		assert_eq!(store.slot().resident_address, Some(3));
		// still resident after the flush
		assert_eq!(store.read_byte(3).unwrap(), 9);
		assert_eq!(store.bus().reads(), 1);
	}

	#[test]
	fn flush_on_empty_cache() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		store.flush();
		assert!(store.bus().frames().is_empty());
	}

	#[test]
	fn drop_flushes() {
		let mut sim = SimulatedSram::with_frame_log(512);
		{
			let mut store = CachedStore::new(&mut sim, Device::Bank1);
			store.write_byte(42, b'x').unwrap();
		}
		assert_eq!(sim.bank(Device::Bank1)[42], b'x');
		assert_eq!(sim.writes(), 1);
		assert_eq!(sim.frames()[1].device, Device::Bank1);
	}

	#[test]
	fn out_of_range() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		let e = store_error(store.read_byte(ADDRESS_LIMIT).unwrap_err());
		assert_eq!(e, StoreError::AddressOutOfRange { address: ADDRESS_LIMIT, limit: ADDRESS_LIMIT });
		assert!(store.write_byte(u32::max_value(), 0).is_err());
		assert!(store.bus().frames().is_empty());
		assert_eq!(store.slot(), CacheSlot::default());
	}

	#[test]
	fn out_of_range_keeps_dirty_byte() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::with_capacity(&mut sim, Device::Bank0, 512);
		store.write_byte(511, 7).unwrap();
		let e = store_error(store.write_byte(512, 8).unwrap_err());
		assert_eq!(e, StoreError::AddressOutOfRange { address: 512, limit: 512 });
		assert_eq!(store.slot(), CacheSlot { resident_address: Some(511), value: 7, dirty: true });
		drop(store);
		assert_eq!(sim.bank(Device::Bank0)[511], 7);
	}

	#[test]
	#[should_panic]
	fn capacity_above_24_bits() {
		let mut sim = SimulatedSram::with_frame_log(16);
		CachedStore::with_capacity(&mut sim, Device::Bank0, ADDRESS_LIMIT + 1);
	}

	#[test]
	fn sees_chip_contents_after_eviction() {
		let mut sim = SimulatedSram::with_frame_log(512);
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		store.write_byte(0, 1).unwrap();
		store.read_byte(1).unwrap();
		// someone else changes address 0 while it isn't resident
		store.bus_mut().write(Device::Bank0, 0, &[0x77]);
		assert_eq!(store.read_byte(0).unwrap(), 0x77);
	}

	#[test]
	fn write_two_bytes_read_back() {
		let mut sim = SimulatedSram::with_frame_log(512);
		{
			let mut store = CachedStore::new(&mut sim, Device::Bank0);
			store.write_byte(0, b'A').unwrap();
			store.write_byte(1, b'B').unwrap();
			// one load before each write to a new address
			assert_eq!(store.bus().reads(), 2);
			assert_eq!(store.bus().writes(), 1);
			assert_eq!(store.read_byte(0).unwrap(), b'A');
			assert_eq!(store.read_byte(1).unwrap(), b'B');
			assert_eq!(store.bus().writes(), 2);
			assert_eq!(store.bus().reads(), 4);
		}
		assert_eq!(&sim.bank(Device::Bank0)[..2], b"AB");
	}
}
