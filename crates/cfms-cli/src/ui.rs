use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{ColorMode, GlobalFlags, OutputFormat};

/// Narrower `COLUMNS` values are ignored.
const MIN_TERM_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiPrefs {
    pub table_color: bool,
    pub term_width: Option<usize>,
}

impl UiPrefs {
    /// Only table output is ever colored. `Auto` colors a terminal unless
    /// `--quiet` or `NO_COLOR` is set.
    fn resolve(flags: &GlobalFlags, is_tty: bool, no_color: bool, columns: Option<&str>) -> Self {
        let table = flags.format == OutputFormat::Table;
        let table_color = table
            && match flags.color {
                ColorMode::Always => true,
                ColorMode::Never => false,
                ColorMode::Auto => is_tty && !flags.quiet && !no_color,
            };
        let term_width = columns
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|width| *width >= MIN_TERM_WIDTH);
        Self {
            table_color,
            term_width,
        }
    }
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

pub fn init(flags: &GlobalFlags) {
    let columns = std::env::var("COLUMNS").ok();
    let prefs = UiPrefs::resolve(
        flags,
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
        columns.as_deref(),
    );
    let _ = UI_PREFS.set(prefs);
}

/// Preferences set by [`init`], or plain output when `init` never ran (tests).
#[must_use]
pub fn prefs() -> UiPrefs {
    UI_PREFS.get().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::UiPrefs;
    use crate::cli::{ColorMode, GlobalFlags, OutputFormat};

    fn flags(format: OutputFormat, color: ColorMode) -> GlobalFlags {
        GlobalFlags {
            format,
            limit: None,
            quiet: false,
            verbose: false,
            project: None,
            color,
            acting_user: None,
        }
    }

    #[test]
    fn json_is_never_colored() {
        let prefs = UiPrefs::resolve(&flags(OutputFormat::Json, ColorMode::Always), true, false, None);
        assert!(!prefs.table_color);
    }

    #[test]
    fn auto_respects_tty_and_no_color() {
        let table = flags(OutputFormat::Table, ColorMode::Auto);
        assert!(UiPrefs::resolve(&table, true, false, None).table_color);
        assert!(!UiPrefs::resolve(&table, false, false, None).table_color);
        assert!(!UiPrefs::resolve(&table, true, true, None).table_color);
    }

    #[test]
    fn tiny_column_counts_are_ignored() {
        let table = flags(OutputFormat::Table, ColorMode::Never);
        assert_eq!(UiPrefs::resolve(&table, false, false, Some("120")).term_width, Some(120));
        assert_eq!(UiPrefs::resolve(&table, false, false, Some("20")).term_width, None);
        assert_eq!(UiPrefs::resolve(&table, false, false, Some("wide")).term_width, None);
    }
}
