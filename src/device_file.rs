use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Raw access to one log device node.
///
/// This module supplies the OS primitives the reader and writer are built
/// on: opening a device in the right mode, reading with a deadline,
/// vectored writes, the facility's out-of-band control requests, and a
/// shutdown path that interrupts a blocked reader instead of leaving it
/// hanging.

// Control request numbers of the logging facility, _IO(0xAE, n).
const IOCTL_GET_LOG_BUF_SIZE: libc::c_ulong = 0xAE01; // total size of the log
const IOCTL_GET_NEXT_ENTRY_LEN: libc::c_ulong = 0xAE03; // length of the next entry
const IOCTL_FLUSH_LOG: libc::c_ulong = 0xAE04; // discard all buffered entries
const IOCTL_SET_VERSION: libc::c_ulong = 0xAE06; // select the wire revision

/// Selects the wire revision the facility uses for records on `fd`.
///
/// This is the negotiation step extensions use from their `prepare` hook.
pub fn set_abi_version(fd: RawFd, version: i32) -> Result<()> {
    let rc = unsafe { libc::ioctl(fd, IOCTL_SET_VERSION, &version as *const i32) };
    if rc < 0 {
        return Err(Error::ControlRequestFailed(io::Error::last_os_error()));
    }
    trace!(fd, version, "negotiated log wire revision");
    Ok(())
}

/// An open handle to a log device node.
///
/// The handle pairs the device descriptor with a wake pipe. Shutting the
/// handle down writes one byte into the pipe, which unblocks any thread
/// waiting in [`DeviceFile::read_deadline`] so it can fail with
/// [`Error::Closed`] instead of hanging. A DeviceFile is shared between a
/// reader and its close handles through an `Arc`.
pub struct DeviceFile {
    fd: RawFd,
    wake_read: RawFd,
    wake_write: RawFd,
    closed: AtomicBool,
}

impl DeviceFile {
    /// Opens a device node for reading.
    ///
    /// The descriptor is non-blocking; all waiting happens in
    /// [`read_deadline`](DeviceFile::read_deadline) where it can be bounded
    /// and interrupted.
    pub fn open_read(path: &Path) -> Result<DeviceFile> {
        Self::open(path, libc::O_RDONLY | libc::O_NONBLOCK | libc::O_CLOEXEC)
    }

    /// Opens a device node for writing.
    ///
    /// The facility's devices are opened read-write for writing. Writes
    /// are always accepted immediately, so no non-blocking flag is needed.
    pub fn open_write(path: &Path) -> Result<DeviceFile> {
        Self::open(path, libc::O_RDWR | libc::O_CLOEXEC)
    }

    fn open(path: &Path, flags: libc::c_int) -> Result<DeviceFile> {
        let cpath = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            Error::StreamUnavailable {
                path: path.to_owned(),
                source: io::Error::from(io::ErrorKind::InvalidInput),
            }
        })?;

        let fd = unsafe { libc::open(cpath.as_ptr(), flags) };
        if fd < 0 {
            return Err(Error::StreamUnavailable {
                path: path.to_owned(),
                source: io::Error::last_os_error(),
            });
        }

        let mut pipe_fds = [0 as libc::c_int; 2];
        let rc = unsafe { libc::pipe2(pipe_fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) };
        if rc < 0 {
            let source = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(Error::StreamUnavailable {
                path: path.to_owned(),
                source,
            });
        }

        trace!(path = %path.display(), fd, "opened log device");

        Ok(DeviceFile {
            fd,
            wake_read: pipe_fds[0],
            wake_write: pipe_fds[1],
            closed: AtomicBool::new(false),
        })
    }

    /// True once [`shutdown`](DeviceFile::shutdown) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Reads one record into `buf`, waiting until data arrives, `deadline`
    /// passes, or the handle is shut down.
    ///
    /// A deadline that already passed fails with [`Error::ReadTimeout`]
    /// without blocking or consuming data, even if a record is available.
    /// `None` waits indefinitely. A zero-length read means the device went
    /// away and is reported as [`Error::Closed`].
    pub fn read_deadline(&self, buf: &mut [u8], deadline: Option<Instant>) -> Result<usize> {
        loop {
            if self.is_closed() {
                return Err(Error::Closed);
            }

            let timeout_ms: libc::c_int = match deadline {
                None => -1,
                Some(d) => {
                    let now = Instant::now();
                    if d <= now {
                        return Err(Error::ReadTimeout);
                    }
                    d.duration_since(now)
                        .as_millis()
                        .min(libc::c_int::MAX as u128)
                        .max(1) as libc::c_int
                }
            };

            let mut fds = [
                libc::pollfd {
                    fd: self.fd,
                    events: libc::POLLIN,
                    revents: 0,
                },
                libc::pollfd {
                    fd: self.wake_read,
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];

            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(Error::Io(err));
            }
            if rc == 0 {
                return Err(Error::ReadTimeout);
            }
            if fds[1].revents != 0 {
                return Err(Error::Closed);
            }
            if fds[0].revents == 0 {
                continue;
            }

            let n = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
            if n < 0 {
                let err = io::Error::last_os_error();
                match err.kind() {
                    // Someone else drained the record between poll and read
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => continue,
                    _ => return Err(Error::Io(err)),
                }
            }
            if n == 0 {
                return Err(Error::Closed);
            }
            return Ok(n as usize);
        }
    }

    /// Writes all segments with a single vectored write.
    ///
    /// The facility treats the concatenation as one atomic record.
    pub fn write_vectored(&self, segments: &[&[u8]]) -> Result<usize> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let iov: Vec<libc::iovec> = segments
            .iter()
            .map(|s| libc::iovec {
                iov_base: s.as_ptr() as *mut libc::c_void,
                iov_len: s.len(),
            })
            .collect();

        let n = unsafe { libc::writev(self.fd, iov.as_ptr(), iov.len() as libc::c_int) };
        if n < 0 {
            return Err(Error::WriteFailed(io::Error::last_os_error()));
        }
        Ok(n as usize)
    }

    /// Queries the total size of the device's log buffer.
    pub fn log_buffer_size(&self) -> Result<usize> {
        self.control_query(IOCTL_GET_LOG_BUF_SIZE)
    }

    /// Queries the length of the next unread entry.
    pub fn next_entry_len(&self) -> Result<usize> {
        self.control_query(IOCTL_GET_NEXT_ENTRY_LEN)
    }

    /// Discards every buffered entry in the stream.
    pub fn flush_log(&self) -> Result<()> {
        let rc = unsafe { libc::ioctl(self.fd, IOCTL_FLUSH_LOG) };
        if rc < 0 {
            return Err(Error::ControlRequestFailed(io::Error::last_os_error()));
        }
        Ok(())
    }

    fn control_query(&self, request: libc::c_ulong) -> Result<usize> {
        let rc = unsafe { libc::ioctl(self.fd, request) };
        if rc < 0 {
            return Err(Error::ControlRequestFailed(io::Error::last_os_error()));
        }
        Ok(rc as usize)
    }

    /// Marks the handle closed and wakes any blocked reader.
    ///
    /// A handle is closed exactly once by its owner; the second and every
    /// later call fails with [`Error::Closed`].
    pub fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }
        let wake = [1u8];
        unsafe { libc::write(self.wake_write, wake.as_ptr() as *const libc::c_void, 1) };
        debug!(fd = self.fd, "log device handle shut down");
        Ok(())
    }
}

impl AsRawFd for DeviceFile {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for DeviceFile {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
            libc::close(self.wake_read);
            libc::close(self.wake_write);
        }
    }
}
