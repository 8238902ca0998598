use std::collections::HashMap;
use std::ffi::CString;
use std::fs::OpenOptions;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use devlog::wire_format::WireCursor;
use devlog::{AbiExtension, ChainedAbiExtension, DeviceReader, Error, FieldValue, LogId};

fn make_fifo(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let cpath = CString::new(path.as_os_str().as_bytes()).unwrap();
    let rc = unsafe { libc::mkfifo(cpath.as_ptr(), 0o600) };
    assert_eq!(rc, 0, "mkfifo({}) failed", path.display());
    path
}

struct RecordingExtension {
    name: &'static str,
    prepared: Arc<Mutex<Vec<&'static str>>>,
}

impl AbiExtension for RecordingExtension {
    fn prepare(&self, _fd: RawFd) -> devlog::Result<()> {
        self.prepared.lock().unwrap().push(self.name);
        Ok(())
    }

    fn read(&self, _cursor: &mut WireCursor<'_>) -> devlog::Result<HashMap<String, FieldValue>> {
        Ok(HashMap::new())
    }
}

struct FailingPrepare;

impl AbiExtension for FailingPrepare {
    fn prepare(&self, _fd: RawFd) -> devlog::Result<()> {
        Err(Error::ControlRequestFailed(std::io::Error::from_raw_os_error(
            libc::ENOTTY,
        )))
    }

    fn read(&self, _cursor: &mut WireCursor<'_>) -> devlog::Result<HashMap<String, FieldValue>> {
        Ok(HashMap::new())
    }
}

#[test]
fn test_negotiation_runs_every_extension_in_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let fifo = make_fifo(dir.path(), "main");
    let _sink = OpenOptions::new().read(true).write(true).open(&fifo).unwrap();

    let prepared = Arc::new(Mutex::new(Vec::new()));
    let chain = ChainedAbiExtension::new()
        .with(RecordingExtension {
            name: "first",
            prepared: Arc::clone(&prepared),
        })
        .with(RecordingExtension {
            name: "second",
            prepared: Arc::clone(&prepared),
        });

    let reader = DeviceReader::open(&fifo, LogId::Main, chain).unwrap();
    assert_eq!(*prepared.lock().unwrap(), ["first", "second"]);
    drop(reader);
}

#[test]
fn test_failed_negotiation_aborts_construction_and_later_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let fifo = make_fifo(dir.path(), "main");
    let _sink = OpenOptions::new().read(true).write(true).open(&fifo).unwrap();

    let prepared = Arc::new(Mutex::new(Vec::new()));
    let chain = ChainedAbiExtension::new()
        .with(FailingPrepare)
        .with(RecordingExtension {
            name: "after-the-failure",
            prepared: Arc::clone(&prepared),
        });

    let result = DeviceReader::open(&fifo, LogId::Main, chain);
    assert!(matches!(result, Err(Error::ControlRequestFailed(_))));

    // The chain stopped at the failing extension.
    assert!(prepared.lock().unwrap().is_empty());
}

#[test]
fn test_empty_chain_skips_negotiation_entirely() {
    // No extensions requested means no control request is issued, so
    // construction succeeds even on streams that reject them.
    let dir = tempfile::tempdir().unwrap();
    let fifo = make_fifo(dir.path(), "main");
    let _sink = OpenOptions::new().read(true).write(true).open(&fifo).unwrap();

    let reader = DeviceReader::open(&fifo, LogId::Main, ChainedAbiExtension::new());
    assert!(reader.is_ok());
}
