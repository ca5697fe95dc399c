use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Which audience an entry is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// Operational message for monitoring staff. Never gated.
    #[default]
    Ops,
    /// Developer diagnostic, gated by its context.
    Dev,
}

impl EntryKind {
    /// Line tag used on both the console and in log files.
    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::Ops => "OPS",
            EntryKind::Dev => "DEV",
        }
    }
}

/// A single pending log line.
///
/// Entries are pooled: the string buffers keep their capacity between uses,
/// so a warmed-up logger allocates nothing on the producer path for messages
/// that fit in what the previous occupant left behind. `fill` overwrites
/// every field, nothing is ever read before it is written.
#[derive(Debug, Default)]
pub struct LogEntry {
    kind: EntryKind,
    context: String,
    source: String,
    message: String,
    args: Vec<String>,
}

impl LogEntry {
    /// Overwrites every field of the entry. The source is cleared; Dev
    /// entries set it afterwards with [`LogEntry::set_source`].
    ///
    /// Arguments are rendered with their `Display` impl right away; the
    /// dispatch loop only ever sees plain strings.
    pub fn fill(
        &mut self,
        kind: EntryKind,
        context: &str,
        message: &str,
        args: &[&dyn fmt::Display],
    ) {
        self.kind = kind;
        overwrite(&mut self.context, context);
        self.source.clear();
        overwrite(&mut self.message, message);
        self.args.resize_with(args.len(), String::new);
        for (slot, arg) in self.args.iter_mut().zip(args) {
            slot.clear();
            // Writing into a String cannot fail.
            let _ = write!(slot, "{}", arg);
        }
    }

    pub fn set_source(&mut self, source: &dyn fmt::Display) {
        self.source.clear();
        let _ = write!(self.source, "{}", source);
    }

    /// Makes `self` an independent copy of `other`, reusing its own buffers.
    pub fn copy_from(&mut self, other: &LogEntry) {
        self.kind = other.kind;
        overwrite(&mut self.context, &other.context);
        overwrite(&mut self.source, &other.source);
        overwrite(&mut self.message, &other.message);
        self.args.resize_with(other.args.len(), String::new);
        for (slot, arg) in self.args.iter_mut().zip(&other.args) {
            overwrite(slot, arg);
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dev(&self) -> bool {
        self.kind == EntryKind::Dev
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

fn overwrite(dst: &mut String, src: &str) {
    dst.clear();
    dst.push_str(src);
}

/// Default number of idle entries the pool holds on to.
pub const DEFAULT_MAX_IDLE: usize = 512;

/// Snapshot of pool activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Entries created by the factory because the free list was empty.
    pub allocated: usize,
    /// Entries currently waiting on the free list.
    pub idle: usize,
}

/// Free list of boxed entries shared by all producers and the dispatch loop.
///
/// `acquire` pops an idle entry or falls back to the factory; `release`
/// pushes it back unless the free list is already holding `max_idle`
/// entries, in which case the entry is simply dropped.
pub struct EntryPool {
    free: Mutex<Vec<Box<LogEntry>>>,
    max_idle: usize,
    allocated: AtomicUsize,
}

impl EntryPool {
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle.min(DEFAULT_MAX_IDLE))),
            max_idle,
            allocated: AtomicUsize::new(0),
        }
    }

    pub fn acquire(&self) -> Box<LogEntry> {
        if let Some(entry) = self.free.lock().pop() {
            return entry;
        }
        self.allocated.fetch_add(1, Ordering::Relaxed);
        Box::default()
    }

    pub fn release(&self, entry: Box<LogEntry>) {
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(entry);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            idle: self.free.lock().len(),
        }
    }
}

impl Default for EntryPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}
