//! Terminal backed by the process's stdin/stdout file descriptors.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::core::terminal::Terminal;
use crate::error::{Result, TuiError};

#[cfg(unix)]
use crate::core::sequence::StdinBuffer;
#[cfg(unix)]
use libc::{self, c_int};

type InputHandler = Box<dyn FnMut(String) + Send>;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

#[cfg(unix)]
fn wait_writable(fd: c_int) -> std::io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }

        return Err(std::io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

#[cfg(unix)]
fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> std::io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> std::io::Result<usize>,
    FWait: FnMut(c_int) -> std::io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write returned 0",
                ));
            }
            Ok(count) => {
                if count > bytes.len() - written {
                    return Err(std::io::Error::other(
                        "write returned more bytes than requested",
                    ));
                }
                written += count;
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                wait_writable(fd)?;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) -> std::io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    write_all_fd_with(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if result < 0 {
                Err(std::io::Error::last_os_error())
            } else {
                Ok(result as usize)
            }
        },
        wait_writable,
    )
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & libc::POLLIN) != 0
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> std::io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> std::io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
struct StopTestHooks {
    before_flush_ready: std::sync::mpsc::Sender<()>,
    before_flush_go: std::sync::mpsc::Receiver<()>,
}

#[cfg(test)]
impl StopTestHooks {
    fn before_flush(&self) {
        let _ = self.before_flush_ready.send(());
        let _ = self.before_flush_go.recv();
    }
}

/// Raw-mode terminal on stdin/stdout.
///
/// `start` switches stdin to raw mode and spawns an input thread that splits
/// the byte stream into complete sequences; `stop` joins that thread, drops
/// pending input and restores the saved termios.
#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    escape_timeout_ms: u64,
    original_termios: Option<libc::termios>,
    input_handler: Arc<Mutex<Option<InputHandler>>>,
    input_thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    drain_mode: Arc<AtomicBool>,
    last_input_time: Arc<AtomicU64>,
    #[cfg(test)]
    stop_test_hooks: Option<StopTestHooks>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            escape_timeout_ms: 10,
            original_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            input_thread: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            drain_mode: Arc::new(AtomicBool::new(false)),
            last_input_time: Arc::new(AtomicU64::new(now_ms())),
            #[cfg(test)]
            stop_test_hooks: None,
        }
    }

    /// Like [`ProcessTerminal::new`], but fails when stdin is not a tty.
    pub fn open() -> Result<Self> {
        if unsafe { libc::isatty(libc::STDIN_FILENO) } != 1 {
            return Err(TuiError::NotATerminal);
        }
        Ok(Self::new())
    }

    /// How long an incomplete escape sequence waits for its tail.
    pub fn with_escape_timeout(mut self, timeout_ms: u64) -> Self {
        self.escape_timeout_ms = timeout_ms;
        self
    }

    fn enable_raw_mode(&mut self) -> std::io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> std::io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn set_handler(&self, handler: Option<InputHandler>) {
        *self
            .input_handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = handler;
    }

    fn start_input_thread(&mut self) -> std::io::Result<()> {
        let stdin_fd = self.stdin_fd;
        let escape_timeout_ms = self.escape_timeout_ms;
        let input_handler = Arc::clone(&self.input_handler);
        let stop_flag = Arc::clone(&self.stop_flag);
        let drain_mode = Arc::clone(&self.drain_mode);
        let last_input_time = Arc::clone(&self.last_input_time);

        let handle = thread::Builder::new()
            .name("strata-tui-input".to_string())
            .spawn(move || {
                let mut buffer = [0u8; 4096];
                let mut stdin_buffer = StdinBuffer::new(escape_timeout_ms);

                while !stop_flag.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    let timeout_ms = stdin_buffer.next_timeout_ms(now, 50);
                    let sequences = if poll_readable(stdin_fd, timeout_ms) {
                        let read_len = unsafe {
                            libc::read(stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len())
                        };
                        if read_len <= 0 {
                            Vec::new()
                        } else {
                            last_input_time.store(now_ms(), Ordering::SeqCst);
                            stdin_buffer.process(&buffer[..read_len as usize])
                        }
                    } else {
                        stdin_buffer.flush_due(now)
                    };

                    if sequences.is_empty() || drain_mode.load(Ordering::SeqCst) {
                        continue;
                    }

                    let mut handler = input_handler
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    if let Some(handler) = handler.as_mut() {
                        for sequence in sequences {
                            handler(sequence);
                        }
                    }
                }
            })?;
        self.input_thread = Some(handle);
        Ok(())
    }

    fn stop_input_thread(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            if handle.join().is_err() {
                tracing::warn!("input thread panicked");
            }
        }
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(&mut self, on_input: Box<dyn FnMut(String) + Send>) -> std::io::Result<()> {
        self.set_handler(Some(on_input));
        self.stop_flag.store(false, Ordering::SeqCst);
        self.drain_mode.store(false, Ordering::SeqCst);
        self.last_input_time.store(now_ms(), Ordering::SeqCst);

        if let Err(err) = self.enable_raw_mode() {
            self.set_handler(None);
            return Err(err);
        }
        if let Err(err) = self.start_input_thread() {
            self.set_handler(None);
            let _ = self.restore_raw_mode();
            return Err(err);
        }
        tracing::debug!(fd = self.stdin_fd, "raw mode enabled");
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        self.stop_input_thread();
        self.set_handler(None);

        #[cfg(test)]
        if let Some(hooks) = self.stop_test_hooks.as_ref() {
            hooks.before_flush();
        }

        // Pending input must not leak to the shell once cooked mode is back.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.restore_raw_mode()?;
        tracing::debug!(fd = self.stdin_fd, "raw mode restored");
        Ok(())
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.drain_mode.store(true, Ordering::SeqCst);
        self.last_input_time.store(now_ms(), Ordering::SeqCst);

        let end_time = now_ms().saturating_add(max_ms);
        loop {
            let now = now_ms();
            if now >= end_time {
                break;
            }
            let last_input = self.last_input_time.load(Ordering::SeqCst);
            if now.saturating_sub(last_input) >= idle_ms {
                break;
            }

            let remaining = end_time.saturating_sub(now);
            thread::sleep(Duration::from_millis(idle_ms.min(remaining).max(1)));
        }

        self.drain_mode.store(false, Ordering::SeqCst);
    }

    fn write(&mut self, data: &str) -> std::io::Result<()> {
        write_fd(self.stdout_fd, data)
    }

    fn size(&self) -> Option<(u16, u16)> {
        read_winsize(self.stdout_fd)
    }
}

#[cfg(not(unix))]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }

    pub fn open() -> Result<Self> {
        Err(TuiError::NotATerminal)
    }

    pub fn with_escape_timeout(self, _timeout_ms: u64) -> Self {
        self
    }
}

#[cfg(not(unix))]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(&mut self, _on_input: Box<dyn FnMut(String) + Send>) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "raw terminal mode requires a unix platform",
        ))
    }

    fn stop(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn write(&mut self, _data: &str) -> std::io::Result<()> {
        Ok(())
    }

    fn size(&self) -> Option<(u16, u16)> {
        None
    }
}
