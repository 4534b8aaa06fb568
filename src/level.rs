// Severity levels, threshold masks and sink selection

use serde::{Deserialize, Serialize};

/// Log severity levels, least to most severe.
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Level {
    /// Most verbose tracing output
    Verbose = 0,
    /// Developer diagnostics, gated by the debug switch
    Debug = 1,
    /// Normal operational messages
    Info = 2,
    /// Something unexpected but recoverable
    Warn = 3,
    /// An operation failed
    Error = 4,
    /// The process cannot continue
    Fatal = 5,
}

impl Level {
    /// All levels in ascending severity order.
    pub const ALL: [Level; 6] = [
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Get level name as static string
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
        }
    }

    /// Single-letter tag used in the record prefix
    pub const fn initial(self) -> char {
        match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warn => 'W',
            Level::Error => 'E',
            Level::Fatal => 'F',
        }
    }

    /// Bit assigned to this level in a [`LevelMask`]
    #[inline]
    pub const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of admitted levels, derived from an inclusive threshold.
///
/// Enabling a threshold level admits that level and everything more
/// severe. The empty mask admits nothing and is what producers observe
/// between teardown and the next setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelMask(u32);

impl LevelMask {
    /// Mask admitting no level at all.
    pub const EMPTY: LevelMask = LevelMask(0);

    /// Mask admitting `threshold` and every level above it.
    pub fn from_threshold(threshold: Level) -> Self {
        let mut bits = 0;
        for level in Level::ALL {
            if level >= threshold {
                bits |= level.bit();
            }
        }
        LevelMask(bits)
    }

    pub const fn from_bits(bits: u32) -> Self {
        LevelMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when `level` passes this mask.
    #[inline]
    pub const fn admits(self, level: Level) -> bool {
        self.0 & level.bit() != 0
    }

    pub const fn union(self, other: LevelMask) -> Self {
        LevelMask(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Which sink implementation the manager builds at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SinkKind {
    /// Synchronous writes to standard output
    Stdout,
    /// Synchronous level-partitioned files
    File,
    /// The file sink behind the pooled queue and worker threads
    AsyncFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Verbose < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_level_bits_are_distinct() {
        let mut seen = 0u32;
        for level in Level::ALL {
            assert_eq!(seen & level.bit(), 0);
            seen |= level.bit();
        }
        assert_eq!(seen.count_ones(), 6);
    }

    #[test]
    fn test_level_initial() {
        assert_eq!(Level::Verbose.initial(), 'V');
        assert_eq!(Level::Warn.initial(), 'W');
        assert_eq!(Level::Fatal.initial(), 'F');
    }

    #[test]
    fn test_mask_from_threshold() {
        let mask = LevelMask::from_threshold(Level::Warn);
        assert!(!mask.admits(Level::Verbose));
        assert!(!mask.admits(Level::Debug));
        assert!(!mask.admits(Level::Info));
        assert!(mask.admits(Level::Warn));
        assert!(mask.admits(Level::Error));
        assert!(mask.admits(Level::Fatal));
    }

    #[test]
    fn test_mask_verbose_admits_everything() {
        let mask = LevelMask::from_threshold(Level::Verbose);
        for level in Level::ALL {
            assert!(mask.admits(level));
        }
    }

    #[test]
    fn test_empty_mask_admits_nothing() {
        for level in Level::ALL {
            assert!(!LevelMask::EMPTY.admits(level));
        }
        assert!(LevelMask::EMPTY.is_empty());
    }

    #[test]
    fn test_mask_union() {
        let mask = LevelMask::from_threshold(Level::Error).union(LevelMask::from_threshold(Level::Info));
        assert!(mask.admits(Level::Info));
        assert!(!mask.admits(Level::Debug));
    }

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Info), "Info");
        assert_eq!(format!("{}", Level::Fatal), "Fatal");
    }
}
