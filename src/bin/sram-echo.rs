#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate serial_sram;
use serial_sram::*;

use std::process::exit;

use serial_sram::cli::{
	get_param_or,
};

use serial_sram::bus::Device;
use serial_sram::console::{
	self,
	Console,
	ConsoleError,
};
use serial_sram::sim::{
	DEFAULT_BANK_SIZE,
	SimulatedTransport,
	TransportKind,
};
use serial_sram::sram::{
	ADDRESS_LIMIT,
	CachedStore,
};

fn echo_loop<C>(console: &mut C, transport: &mut SimulatedTransport, device: Device, capacity: u32) -> AResult<()>
where
	C: Console + ?Sized,
{
	let mut store = CachedStore::with_capacity(transport, device, capacity);
	let mut lines = 0usize;
	loop {
		match app::echo_line(console, &mut store) {
			Ok(len) => {
				lines += 1;
				debug!("line {}: echoed {} bytes", lines, len);
			},
			Err(e) => {
				if e.downcast_ref::<ConsoleError>() == Some(&ConsoleError::Closed) {
					info!("console closed after {} lines", lines);
					return Ok(());
				}
				return Err(e);
			},
		}
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(about: "echo console lines through a byte cached serial SRAM (simulated chip)")
		(@arg transport: -t --transport +takes_value "SPI transport to the chip: direct, bitbang or registers (default: direct)")
		(@arg size: -s --size +takes_value "bank size in bytes (default: 131072)")
		(@arg bank: -b --bank +takes_value "bank to store lines in: 0, 1 or 2 (default: 0)")
		(@arg tty: --tty +takes_value "serial port to use as console instead of stdin/stdout")
		(@arg baud: --baud +takes_value "baud rate of the serial port (default: 9600)")
	).get_matches();

	let kind: TransportKind = get_param_or(&matches, "transport", TransportKind::Direct)?;
	let size: usize = get_param_or(&matches, "size", DEFAULT_BANK_SIZE)?;
	ensure!(size > 0 && size <= ADDRESS_LIMIT as usize, "bank size must be between 1 and {} bytes", ADDRESS_LIMIT);
	let bank: usize = get_param_or(&matches, "bank", 0)?;
	let device = match Device::from_index(bank) {
		Some(d) => d,
		None => bail!("invalid bank {} (expected 0, 1 or 2)", bank),
	};
	let baud: u32 = get_param_or(&matches, "baud", 9600)?;

	let mut transport = SimulatedTransport::new(kind, size);
	info!("{} over {} transport, {} bytes", device, kind, size);

	match matches.value_of("tty") {
		Some(path) => {
			let mut con = console::open_tty(path, baud)?;
			echo_loop(&mut con, &mut transport, device, size as u32)?;
		},
		None => {
			let mut con = console::stdio();
			echo_loop(&mut con, &mut transport, device, size as u32)?;
		},
	}

	let sram = transport.sram();
	info!("{} READ and {} WRITE transactions", sram.reads(), sram.writes());

	Ok(())
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
