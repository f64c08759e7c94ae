use std::fs;
use std::io;
use std::mem;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use libc::{
	CLOCAL,
	CREAD,
	CS8,
	CSIZE,
	CSTOPB,
	PARENB,
	TCSANOW,
	VMIN,
	VTIME,
	cfmakeraw,
	cfsetispeed,
	cfsetospeed,
	speed_t,
	tcgetattr,
	tcsetattr,
	termios,
};

use super::StreamConsole;

pub fn baud_rate(baud: u32) -> Option<speed_t> {
	Some(match baud {
		1200 => libc::B1200,
		2400 => libc::B2400,
		4800 => libc::B4800,
		9600 => libc::B9600,
		19200 => libc::B19200,
		38400 => libc::B38400,
		57600 => libc::B57600,
		115200 => libc::B115200,
		_ => return None,
	})
}

// raw 8N1, blocking reads of at least one byte
fn configure(file: &fs::File, speed: speed_t) -> io::Result<()> {
	let fd = file.as_raw_fd();
	unsafe {
		let mut tio: termios = mem::zeroed();
		if 0 != tcgetattr(fd, &mut tio) {
			return Err(io::Error::last_os_error());
		}
		cfmakeraw(&mut tio);
		tio.c_cflag &= !(CSIZE | PARENB | CSTOPB);
		tio.c_cflag |= CS8 | CREAD | CLOCAL;
		tio.c_cc[VMIN] = 1;
		tio.c_cc[VTIME] = 0;
		if 0 != cfsetispeed(&mut tio, speed) || 0 != cfsetospeed(&mut tio, speed) {
			return Err(io::Error::last_os_error());
		}
		if 0 != tcsetattr(fd, TCSANOW, &tio) {
			return Err(io::Error::last_os_error());
		}
	}
	Ok(())
}

/// Open a serial port as console at a fixed symbol rate.
pub fn open_tty<P: AsRef<Path>>(path: P, baud: u32) -> crate::AResult<StreamConsole<fs::File, fs::File>> {
	let path = path.as_ref();
	with_context!(("open console {}", path.display()), {
		let speed = match baud_rate(baud) {
			Some(s) => s,
			None => bail!("unsupported baud rate {}", baud),
		};

		let file = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(path)?;
		configure(&file, speed)?;
		info!("console {} at {} baud", path.display(), baud);

		let output = file.try_clone()?;
		Ok(StreamConsole::new(file, output))
	})
}
