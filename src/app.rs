use crate::bus::{
	Bus,
	Device,
};
use crate::console::Console;
use crate::sram::{
	CachedStore,
	SramOperations,
};

pub const ECHO_MARKER: &str = "HERE\r\n";

pub const MEMORY_TEST_BANNER: &str = "23LC1024 Memory Test\r\n";
pub const MEMORY_TEST_DONE: &str = "Test Complete\r\n";
pub const MEMORY_TEST_STRING: &[u8] = b"Hello World! This is a Memory Test String that is being copied three times (once to every sram bank).\r\n\0";

fn is_line_end(c: u8) -> bool {
	c == b'\n' || c == b'\r'
}

/// Store one console line at address 0 (terminated by "\n\0") and send it
/// back, read from the store.
///
/// Returns the number of bytes echoed.
pub fn echo_line<C, B>(console: &mut C, store: &mut CachedStore<B>) -> crate::AResult<u32>
where
	C: Console + ?Sized,
	B: Bus,
{
	let mut address = 0u32;
	loop {
		let c = console.receive_byte()?;
		if is_line_end(c) {
			break;
		}
		store.write_byte(address, c)?;
		address += 1;
	}
	store.write_byte(address, b'\n')?;
	store.write_byte(address + 1, 0)?;

	console.transmit_string(ECHO_MARKER)?;

	let mut address = 0u32;
	loop {
		let c = store.read_byte(address)?;
		if 0 == c {
			break;
		}
		console.transmit_byte(c)?;
		address += 1;
	}

	Ok(address)
}

/// Write the test string to address 0 of every bank, read it back and send
/// it to the console.
pub fn memory_test<C, B>(console: &mut C, bus: &mut B) -> crate::AResult<()>
where
	C: Console + ?Sized,
	B: Bus + ?Sized,
{
	console.transmit_string(MEMORY_TEST_BANNER)?;

	let mut buf = vec![0u8; MEMORY_TEST_STRING.len()];
	for &device in &Device::ALL {
		bus.write(device, 0, MEMORY_TEST_STRING);
		bus.read(device, 0, &mut buf);
		ensure!(&buf[..] == MEMORY_TEST_STRING, "{}: read back {:?}", device, String::from_utf8_lossy(&buf));
		info!("{}: verified {} bytes", device, buf.len());

		for &c in buf.iter().take_while(|c| **c != 0) {
			console.transmit_byte(c)?;
		}
	}

	console.transmit_string(MEMORY_TEST_DONE)
}

#[cfg(test)]
mod test {
	use std::io::Cursor;

	use super::{
		MEMORY_TEST_STRING,
		echo_line,
		memory_test,
	};
	use crate::bus::Device;
	use crate::console::{
		ConsoleError,
		StreamConsole,
	};
	use crate::sim::SimulatedSram;
	use crate::sram::CachedStore;

	fn console(input: &[u8]) -> StreamConsole<Cursor<Vec<u8>>, Vec<u8>> {
		StreamConsole::new(Cursor::new(input.to_vec()), Vec::new())
	}

	#[test]
	fn echoes_lines() {
		let mut sim = SimulatedSram::new(512);
		let mut con = console(b"hello\rab\n");
		{
			let mut store = CachedStore::new(&mut sim, Device::Bank0);
			assert_eq!(echo_line(&mut con, &mut store).unwrap(), 6);
			assert_eq!(echo_line(&mut con, &mut store).unwrap(), 3);
			let e = echo_line(&mut con, &mut store).unwrap_err();
			assert_eq!(e.downcast_ref::<ConsoleError>(), Some(&ConsoleError::Closed));
		}
		let (_, output) = con.into_inner();
		assert_eq!(output, b"HERE\r\nhello\nHERE\r\nab\n".to_vec());
		// the second line overwrote the start of the first one
		assert_eq!(&sim.bank(Device::Bank0)[..7], b"ab\n\0o\n\0");
	}

	#[test]
	fn empty_line() {
		let mut sim = SimulatedSram::new(512);
		let mut con = console(b"\n");
		let mut store = CachedStore::new(&mut sim, Device::Bank0);
		assert_eq!(echo_line(&mut con, &mut store).unwrap(), 1);
		drop(store);
		assert_eq!(con.into_inner().1, b"HERE\r\n\n".to_vec());
	}

	#[test]
	fn line_longer_than_store() {
		let mut sim = SimulatedSram::new(512);
		let mut con = console(b"abcdef\n");
		let mut store = CachedStore::with_capacity(&mut sim, Device::Bank0, 4);
		assert!(echo_line(&mut con, &mut store).is_err());
		drop(store);
		assert_eq!(&sim.bank(Device::Bank0)[..4], b"abcd");
	}

	#[test]
	fn long_session_keeps_only_counters() {
		let mut sim = SimulatedSram::new(512);
		let mut con = console(&b"abcdefgh\n".repeat(1000));
		{
			let mut store = CachedStore::new(&mut sim, Device::Bank0);
			for _ in 0..1000 {
				assert_eq!(echo_line(&mut con, &mut store).unwrap(), 9);
			}
		}
		assert!(sim.frames().is_empty());
		// per line: 10 write misses each load once, 9 of them flush the
		// previous byte, the read back flushes the NUL and loads 10 bytes
		assert_eq!(sim.reads(), 1000 * 20);
		assert_eq!(sim.writes(), 1000 * 10);
	}

	#[test]
	fn memory_test_fills_every_bank() {
		let mut sim = SimulatedSram::new(512);
		let mut con = console(b"");
		memory_test(&mut con, &mut sim).unwrap();

		for &device in &Device::ALL {
			assert_eq!(&sim.bank(device)[..MEMORY_TEST_STRING.len()], MEMORY_TEST_STRING);
		}
		assert_eq!(sim.writes(), 3);
		assert_eq!(sim.reads(), 3);

		let output = String::from_utf8(con.into_inner().1).unwrap();
		assert!(output.starts_with("23LC1024 Memory Test\r\n"));
		assert!(output.ends_with("bank).\r\nTest Complete\r\n"));
		assert_eq!(output.matches("Hello World!").count(), 3);
	}
}
