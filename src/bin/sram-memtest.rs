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

use serial_sram::sim::{
	DEFAULT_BANK_SIZE,
	SimulatedTransport,
	TransportKind,
};

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(about: "write, read back and print a test string on every serial SRAM bank (simulated chip)")
		(@arg transport: -t --transport +takes_value "SPI transport to the chip: direct, bitbang or registers (default: direct)")
		(@arg size: -s --size +takes_value "bank size in bytes (default: 131072)")
		(@arg tty: --tty +takes_value "serial port to use as console instead of stdout")
		(@arg baud: --baud +takes_value "baud rate of the serial port (default: 9600)")
	).get_matches();

	let kind: TransportKind = get_param_or(&matches, "transport", TransportKind::Direct)?;
	let size: usize = get_param_or(&matches, "size", DEFAULT_BANK_SIZE)?;
	ensure!(size >= app::MEMORY_TEST_STRING.len(), "bank size must be at least {} bytes", app::MEMORY_TEST_STRING.len());
	let baud: u32 = get_param_or(&matches, "baud", 9600)?;

	let mut transport = SimulatedTransport::new(kind, size);

	match matches.value_of("tty") {
		Some(path) => {
			let mut con = console::open_tty(path, baud)?;
			app::memory_test(&mut con, &mut transport)?;
		},
		None => {
			let mut con = console::stdio();
			app::memory_test(&mut con, &mut transport)?;
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
