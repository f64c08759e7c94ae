use std::io::{
	self,
	Read,
	Write,
};

use failure::Fail;

mod tty;

pub use self::tty::{
	open_tty,
	baud_rate,
};

#[derive(Debug, Fail, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
	#[fail(display = "console input closed")]
	Closed,
}

/// Blocking byte console (UART)
pub trait Console {
	fn receive_byte(&mut self) -> crate::AResult<u8>;
	fn transmit_byte(&mut self, data: u8) -> crate::AResult<()>;

	fn transmit_string(&mut self, s: &str) -> crate::AResult<()> {
		for b in s.bytes() {
			self.transmit_byte(b)?;
		}
		Ok(())
	}
}

pub struct StreamConsole<R, W> {
	input: R,
	output: W,
}

impl<R: Read, W: Write> StreamConsole<R, W> {
	pub fn new(input: R, output: W) -> Self {
		StreamConsole {
			input,
			output,
		}
	}

	pub fn into_inner(self) -> (R, W) {
		(self.input, self.output)
	}
}

impl<R: Read, W: Write> Console for StreamConsole<R, W> {
	fn receive_byte(&mut self) -> crate::AResult<u8> {
		let mut buf = [0u8];
		match self.input.read_exact(&mut buf) {
			Ok(()) => Ok(buf[0]),
			Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ConsoleError::Closed.into()),
			Err(e) => Err(e.into()),
		}
	}

	fn transmit_byte(&mut self, data: u8) -> crate::AResult<()> {
		self.output.write_all(&[data])?;
		self.output.flush()?;
		Ok(())
	}
}

pub fn stdio() -> StreamConsole<io::Stdin, io::Stdout> {
	StreamConsole::new(io::stdin(), io::stdout())
}
