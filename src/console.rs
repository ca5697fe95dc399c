use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

const BANNER_START: &str = "\x1b[0;42m";
const RESET: &str = "\x1b[0m";

/// The console stream shared by the dispatch loop and the config store.
///
/// Log lines are written by the dispatch loop only. Lifecycle banners can
/// also come from the thread that calls `configure`, hence the lock.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Writes an already rendered line in one call.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self.out.lock();
        out.write_all(line.as_bytes())?;
        out.flush()
    }

    /// Bright-green lifecycle diagnostic (init, config load, file rotation,
    /// errors). Failures to reach the console are ignored, there is nowhere
    /// left to report them.
    pub fn banner(&self, text: fmt::Arguments<'_>) {
        let line = format!("{BANNER_START}{text}{RESET}\n");
        let _ = self.write_line(&line);
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}
