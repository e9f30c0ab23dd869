//! Memory mapping utilities for process address space analysis
//!
//! Parses /proc/pid/maps so that raw instruction pointers can be attributed
//! to the binary or library they were executed from, together with the
//! address relative to that module's file.

use crate::domain::{Frame, Pid, SessionError};
use log::debug;
use std::fs;
use std::io;

/// One file-backed mapping from /proc/pid/maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMapping {
    pub start: u64,
    pub end: u64,
    /// File offset the mapping starts at
    pub offset: u64,
    pub path: String,
}

impl MemoryMapping {
    /// Check if an address falls within this mapping
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Translate a virtual address into an offset within the mapped file
    #[must_use]
    pub fn module_relative(&self, addr: u64) -> u64 {
        addr - self.start + self.offset
    }

    /// Parse one line: "start-end perms offset dev inode pathname"
    ///
    /// Anonymous mappings (no pathname) yield `None`.
    fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let (start, end) = parts.next()?.split_once('-')?;
        let _perms = parts.next()?;
        let offset = parts.next()?;
        let _dev = parts.next()?;
        let _inode = parts.next()?;
        // Paths may contain spaces; keep the remainder verbatim
        let path = parts.collect::<Vec<_>>().join(" ");
        if path.is_empty() {
            return None;
        }

        Some(Self {
            start: u64::from_str_radix(start, 16).ok()?,
            end: u64::from_str_radix(end, 16).ok()?,
            offset: u64::from_str_radix(offset, 16).ok()?,
            path,
        })
    }
}

/// File-backed mappings of one process, ordered by start address
#[derive(Debug, Clone, Default)]
pub struct ModuleMap {
    mappings: Vec<MemoryMapping>,
}

impl ModuleMap {
    /// Build from the text of a maps file. Malformed lines are skipped.
    #[must_use]
    pub fn parse(maps: &str) -> Self {
        let mut mappings: Vec<MemoryMapping> = maps.lines().filter_map(MemoryMapping::parse_line).collect();
        mappings.sort_by_key(|m| m.start);
        Self { mappings }
    }

    /// Read /proc/<pid>/maps
    ///
    /// # Errors
    /// `ProcessGone` if the process no longer exists, `Io` for other read failures
    pub fn for_pid(pid: Pid) -> Result<Self, SessionError> {
        let maps_path = format!("/proc/{}/maps", pid.0);
        let maps = fs::read_to_string(&maps_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SessionError::ProcessGone(pid),
            _ => SessionError::Io(e),
        })?;
        let map = Self::parse(&maps);
        debug!("Read {} file-backed mappings from {maps_path}", map.len());
        Ok(map)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mapping containing `addr`, if any
    #[must_use]
    pub fn lookup(&self, addr: u64) -> Option<&MemoryMapping> {
        let idx = self.mappings.partition_point(|m| m.start <= addr);
        idx.checked_sub(1).map(|i| &self.mappings[i]).filter(|m| m.contains(addr))
    }

    /// Frame for a raw instruction pointer, annotated with module and
    /// module-relative address when the address is mapped
    #[must_use]
    pub fn annotate(&self, addr: u64) -> Frame {
        match self.lookup(addr) {
            Some(mapping) => Frame {
                symbol_name: None,
                module_relative_addr: mapping.module_relative(addr),
                absolute_addr: addr,
                module_name: Some(mapping.path.clone()),
            },
            None => Frame::from_address(addr),
        }
    }
}
