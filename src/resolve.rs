//! Instruction-pointer to function-name resolution.
//!
//! The dynamic loader is asked first: `dladdr` names the defining object and
//! its load base, and for exported symbols the function too. When it cannot
//! name the symbol, the static symbol table of the object's ELF image is
//! scanned for the nearest preceding definition. Parsed images are cached
//! for the life of the process, keyed by the *pointer* the loader hands out
//! for the filename - it points into the object's own headers and is stable
//! across calls, so no string comparison is needed.
//!
//! The library filter runs before any file is opened; the function filter
//! runs on whatever name came out, including none at all.

use std::ffi::{c_void, CStr, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::elf::ElfImage;
use crate::filter::{FunctionFilter, LibraryFilter};

/// Placeholder DSO name when the dynamic loader cannot place an address.
const UNKNOWN_DSO: &str = "[???]";

/// Outcome of resolving one instruction pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The event is to be reported, with the DSO basename and, when one
    /// could be found, the function name.
    Reported {
        dso: String,
        name: Option<String>,
    },
    /// A filter decided this event is not reported.
    Suppressed,
}

/// Cache of parsed ELF images, one per distinct shared object.
///
/// Entries are keyed by the identity of the loader's filename pointer.
/// Nothing is ever evicted and the mappings stay in place until process
/// exit. A failed open is not recorded; the next call retries it.
#[derive(Debug, Default)]
pub struct DsoCache {
    entries: Vec<(usize, ElfImage)>,
}

impl DsoCache {
    pub fn new() -> DsoCache {
        DsoCache::default()
    }

    fn lookup(&mut self, key: usize, path: &Path) -> Option<&ElfImage> {
        if let Some(index) = self.entries.iter().position(|(k, _)| *k == key) {
            return Some(&self.entries[index].1);
        }
        let image = ElfImage::open(path).ok()?;
        self.entries.push((key, image));
        self.entries.last().map(|(_, image)| image)
    }
}

/// Resolve `pc` and apply both filters.
pub fn resolve(
    cache: &mut DsoCache,
    libraries: &LibraryFilter,
    functions: &FunctionFilter,
    pc: usize,
) -> Resolution {
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    if unsafe { libc::dladdr(pc as *const c_void, &mut info) } == 0 || info.dli_fname.is_null() {
        // The loader cannot place this address at all.
        return if functions.should_report(None) {
            Resolution::Reported {
                dso: UNKNOWN_DSO.to_string(),
                name: None,
            }
        } else {
            Resolution::Suppressed
        };
    }

    let fname_cstr = unsafe { CStr::from_ptr(info.dli_fname) };
    let fname = fname_cstr.to_string_lossy();

    // Decide on the DSO before opening anything.
    let Some(dso) = libraries.should_report(&fname) else {
        return Resolution::Suppressed;
    };
    let dso = dso.to_string();

    if !info.dli_sname.is_null() {
        // The loader did the hard work already.
        let name = unsafe { CStr::from_ptr(info.dli_sname) }
            .to_string_lossy()
            .into_owned();
        return if functions.should_report(Some(&name)) {
            Resolution::Reported {
                dso,
                name: Some(name),
            }
        } else {
            Resolution::Suppressed
        };
    }

    // The loader may know a tighter address for the containing symbol.
    let pc = if info.dli_saddr.is_null() {
        pc
    } else {
        info.dli_saddr as usize
    };
    let load_base = info.dli_fbase as usize as u64;

    let path = Path::new(OsStr::from_bytes(fname_cstr.to_bytes()));
    let name = cache
        .lookup(info.dli_fname as usize, path)
        .and_then(|image| image.find_function(load_base, pc as u64));

    if functions.should_report(name.as_deref()) {
        Resolution::Reported { dso, name }
    } else {
        Resolution::Suppressed
    }
}
