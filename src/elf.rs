//! Memory-mapped view of one ELF image and its symbol tables.
//!
//! When the dynamic loader cannot name a symbol, the name has to come
//! straight out of the image's static symbol table. An [`ElfImage`] maps the
//! file read-only, locates the *last* string-table section (the one likely
//! to hold function names) and the symbol-table section, and keeps the
//! mapping alive for the rest of the process; the cache built on top of it
//! never evicts, so every stored offset stays valid.
//!
//! Both ELF32 and ELF64 images are accepted, picked apart with the typed
//! headers from the `object` crate. The class is detected from the ident
//! byte and the symbol table must use the matching record size.

use std::fs::File;
use std::io;
use std::mem;
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use object::elf;
use object::read::elf::{FileHeader, SectionHeader, Sym};
use object::Endianness;
use thiserror::Error;

/// Why an image could not be used for symbol resolution.
#[derive(Debug, Error)]
pub enum ElfError {
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot map {}: {source}", path.display())]
    Map { path: PathBuf, source: io::Error },
    #[error("not an ELF image")]
    BadMagic,
    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),
    #[error("malformed ELF image: {0}")]
    Malformed(#[from] object::read::Error),
    #[error("no string table section")]
    MissingStrtab,
    #[error("no symbol table section")]
    MissingSymtab,
    #[error("symbol table entry size {got}, expected {expected}")]
    BadSymtabEntsize { got: u64, expected: u64 },
    #[error("section data outside the image")]
    TruncatedSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Elf32,
    Elf64,
}

/// A mapped ELF image with its chosen string and symbol tables.
pub struct ElfImage {
    /// Keeps the descriptor open for the life of the process, like the
    /// mapping itself.
    #[allow(dead_code)]
    file: File,
    mmap: Mmap,
    class: Class,
    endian: Endianness,
    strtab: Range<usize>,
    symtab: Range<usize>,
}

impl std::fmt::Debug for ElfImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElfImage")
            .field("class", &self.class)
            .field("strtab", &self.strtab)
            .field("symtab", &self.symtab)
            .finish()
    }
}

impl ElfImage {
    /// Open and map `path` read-only and locate its tables.
    ///
    /// A relative path that cannot be opened is retried as
    /// `/proc/self/exe`: the main program frequently shows up under its
    /// `argv[0]` spelling.
    pub fn open(path: &Path) -> Result<ElfImage, ElfError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if path.is_absolute() => {
                return Err(ElfError::Open {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
            Err(_) => File::open("/proc/self/exe").map_err(|err| ElfError::Open {
                path: path.to_path_buf(),
                source: err,
            })?,
        };
        let mmap = unsafe { Mmap::map(&file) }.map_err(|err| ElfError::Map {
            path: path.to_path_buf(),
            source: err,
        })?;

        let ident = mmap
            .get(..mem::size_of::<elf::Ident>())
            .ok_or(ElfError::BadMagic)?;
        if &ident[..4] != b"\x7fELF" {
            return Err(ElfError::BadMagic);
        }
        // Offset of `Ident::class`, i.e. the byte right after the 4-byte magic.
        let (class, endian, strtab, symtab) = match ident[4] {
            elf::ELFCLASS32 => {
                let (endian, strtab, symtab) =
                    locate_tables::<elf::FileHeader32<Endianness>>(&mmap)?;
                (Class::Elf32, endian, strtab, symtab)
            }
            elf::ELFCLASS64 => {
                let (endian, strtab, symtab) =
                    locate_tables::<elf::FileHeader64<Endianness>>(&mmap)?;
                (Class::Elf64, endian, strtab, symtab)
            }
            other => return Err(ElfError::UnsupportedClass(other)),
        };

        Ok(ElfImage {
            file,
            mmap,
            class,
            endian,
            strtab,
            symtab,
        })
    }

    /// Name of the function containing `pc`, per the static symbol table.
    ///
    /// `pc` may point anywhere inside the function; the symbol defined
    /// closest at or below the biased address wins. Mapping symbols
    /// (`$`-prefixed) and records whose name offset falls outside the
    /// string table are skipped.
    pub fn find_function(&self, load_base: u64, pc: u64) -> Option<String> {
        match self.class {
            Class::Elf32 => self.scan_symbols::<elf::FileHeader32<Endianness>>(load_base, pc),
            Class::Elf64 => self.scan_symbols::<elf::FileHeader64<Endianness>>(load_base, pc),
        }
    }

    fn scan_symbols<Elf>(&self, load_base: u64, pc: u64) -> Option<String>
    where
        Elf: FileHeader<Endian = Endianness>,
    {
        let symtab = &self.mmap[self.symtab.clone()];
        let strtab = &self.mmap[self.strtab.clone()];
        let count = symtab.len() / mem::size_of::<Elf::Sym>();
        let (syms, _) = object::pod::slice_from_bytes::<Elf::Sym>(symtab, count).ok()?;

        let mut best: Option<(u64, usize)> = None;
        for sym in syms {
            let value: u64 = sym.st_value(self.endian).into();
            let target = comparable_address(value, load_base, pc);
            if target < value {
                continue;
            }
            let gap = target - value;
            if best.map_or(true, |(closest, _)| gap < closest) {
                let name_offset = sym.st_name(self.endian) as usize;
                if name_offset >= strtab.len() {
                    continue;
                }
                if strtab[name_offset] == b'$' {
                    continue;
                }
                best = Some((gap, name_offset));
                if gap == 0 {
                    break;
                }
            }
        }

        let (_, offset) = best?;
        let tail = &strtab[offset..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Some(String::from_utf8_lossy(&tail[..end]).into_owned())
    }
}

/// Bias `pc` into the symbol table's address convention.
///
/// Shared objects store load-base-relative offsets, the main executable
/// stores absolute addresses. A symbol value above the load base marks the
/// absolute convention.
pub fn comparable_address(st_value: u64, load_base: u64, pc: u64) -> u64 {
    if st_value > load_base {
        pc
    } else {
        pc.wrapping_sub(load_base)
    }
}

/// Walk the section headers, keeping the last STRTAB and the SYMTAB.
fn locate_tables<Elf>(data: &[u8]) -> Result<(Endianness, Range<usize>, Range<usize>), ElfError>
where
    Elf: FileHeader<Endian = Endianness>,
{
    let header = Elf::parse(data)?;
    let endian = header.endian()?;

    let mut strtab = None;
    let mut symtab = None;
    for section in header.section_headers(endian, data)? {
        match section.sh_type(endian) {
            elf::SHT_STRTAB => strtab = Some(section_range(section, endian, data)?),
            elf::SHT_SYMTAB => {
                let entsize: u64 = section.sh_entsize(endian).into();
                let expected = mem::size_of::<Elf::Sym>() as u64;
                if entsize != expected {
                    return Err(ElfError::BadSymtabEntsize {
                        got: entsize,
                        expected,
                    });
                }
                symtab = Some(section_range(section, endian, data)?);
            }
            _ => {}
        }
    }

    let strtab = strtab.ok_or(ElfError::MissingStrtab)?;
    let symtab = symtab.ok_or(ElfError::MissingSymtab)?;
    Ok((endian, strtab, symtab))
}

fn section_range<Sh>(section: &Sh, endian: Sh::Endian, data: &[u8]) -> Result<Range<usize>, ElfError>
where
    Sh: SectionHeader,
{
    let (offset, size) = section
        .file_range(endian)
        .ok_or(ElfError::TruncatedSection)?;
    let start = usize::try_from(offset).map_err(|_| ElfError::TruncatedSection)?;
    let len = usize::try_from(size).map_err(|_| ElfError::TruncatedSection)?;
    let end = start.checked_add(len).ok_or(ElfError::TruncatedSection)?;
    if end > data.len() {
        return Err(ElfError::TruncatedSection);
    }
    Ok(start..end)
}
