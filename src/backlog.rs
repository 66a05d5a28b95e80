//! Deferred symbol resolution for async mode.
//!
//! Resolving names on every call can slow the target considerably. In async
//! mode only raw addresses are printed while the program runs; each ENTER
//! address is also appended to an anonymous scratch file, and at process
//! exit the whole backlog is resolved once into a `SYMTAB:` translation
//! table that the post-processor merges back into the log.
//!
//! The scratch file is created with a unique name in the temporary
//! directory and immediately unlinked, so it disappears with the process;
//! only the descriptor stays around. Records are raw machine pointers.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::mem;

use crate::filter::{FunctionFilter, LibraryFilter};
use crate::resolve::{resolve, DsoCache, Resolution};
use crate::sink;

/// The scratch file of raw ENTER addresses.
#[derive(Debug)]
pub struct Backlog {
    file: File,
}

impl Backlog {
    /// Create the unlinked scratch file.
    pub fn create() -> io::Result<Backlog> {
        Ok(Backlog {
            file: tempfile::tempfile()?,
        })
    }

    /// Append one raw address. Write errors are swallowed; a short backlog
    /// only costs resolution table entries.
    pub fn record(&mut self, addr: usize) {
        let _ = self.file.write_all(&addr.to_ne_bytes());
    }

    /// All recorded addresses in write order. Duplicates are preserved;
    /// the post-processor tolerates them.
    pub fn addresses(&mut self) -> Vec<usize> {
        let mut addresses = Vec::new();
        if self.file.seek(SeekFrom::Start(0)).is_err() {
            return addresses;
        }
        let mut record = [0u8; mem::size_of::<usize>()];
        while self.file.read_exact(&mut record).is_ok() {
            addresses.push(usize::from_ne_bytes(record));
        }
        addresses
    }

    /// Emit the `SYMTAB:` table, one resolution per record, and close the
    /// file.
    pub fn resolve_all(
        mut self,
        cache: &mut DsoCache,
        libraries: &LibraryFilter,
        functions: &FunctionFilter,
    ) {
        sink::logit(format_args!("SYMTAB:"));
        for addr in self.addresses() {
            match resolve(cache, libraries, functions, addr) {
                Resolution::Reported {
                    dso,
                    name: Some(name),
                } => sink::logit(format_args!("0x{addr:x} = {dso}:{name}()")),
                Resolution::Reported { dso, name: None } => {
                    sink::logit(format_args!("0x{addr:x} = {dso}:[0x{addr:x}]"))
                }
                Resolution::Suppressed => {}
            }
        }
    }
}
