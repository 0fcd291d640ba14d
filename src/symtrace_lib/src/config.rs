//! Analysis options: the one configuration record passed into the
//! evaluator. There is no global/ambient configuration; every tunable is a
//! field on this struct, matching the full spec's "Options as a struct"
//! design note.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use regex::Regex;

use crate::prelude::*;

/// Tuning knobs for one analysis run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// If set, processing of every `(instruction, event)` pair while
    /// `current_ip` equals this value is mirrored to the debug log (§4.4).
    pub debug_ip: Option<u64>,
    /// Regular expressions matched against function names; a function is
    /// "interesting" (its blocks are emitted rather than discarded, see
    /// §4.3) if its name matches any entry, or if the list is empty (in
    /// which case every function is interesting).
    pub interesting_functions: Vec<String>,
    /// Directory the CLI front end writes operational logs into, if set.
    pub log_dir: Option<PathBuf>,
    /// How often, in percent, progress should be reported: emit once every
    /// `funcs_total / progress_granularity` functions processed (§5).
    #[serde(default = "default_progress_granularity")]
    pub progress_granularity: u32,
}

fn default_progress_granularity() -> u32 {
    100
}

impl AnalysisOptions {
    /// Load options from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<AnalysisOptions> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("failed to open config file {:?}", path.as_ref()))?;
        let options: AnalysisOptions =
            serde_yaml::from_reader(file).context("failed to parse config YAML")?;
        Ok(options)
    }

    /// The default config file location, following this platform's
    /// conventions via the `directories` crate, mirroring the way the
    /// teacher locates its own configuration directory.
    pub fn default_config_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "symtrace")?;
        Some(dirs.config_dir().join("symtrace.yaml"))
    }

    /// Compile `interesting_functions` into matchers once, for repeated use
    /// by the associator while it walks the call tree.
    pub fn interesting_function_matchers(&self) -> Result<Vec<Regex>> {
        self.interesting_functions
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("invalid interesting-function pattern {:?}", pattern))
            })
            .collect()
    }

    /// `true` if `name` should be treated as interesting: an empty pattern
    /// list means everything is interesting, otherwise `name` must match at
    /// least one pattern.
    pub fn is_interesting_function(&self, name: &str, matchers: &[Regex]) -> bool {
        matchers.is_empty() || matchers.iter().any(|re| re.is_match(name))
    }

    /// How often progress should be reported, in absolute function count,
    /// given the total number of functions this run will process. Returns
    /// `None` if `funcs_total` is too small to usefully subdivide.
    pub fn progress_step(&self, funcs_total: usize) -> Option<usize> {
        let step = funcs_total / (self.progress_granularity.max(1) as usize);
        if step == 0 {
            None
        } else {
            Some(step)
        }
    }
}
