//! Report decisions for DSOs and function names.
//!
//! Both filters are tri-state: report everything, whitelist, or blacklist.
//! At most one of the include/exclude variables is honored; the include list
//! wins when both are set. An empty list or pattern counts as unset.

use crate::config::Config;
use crate::eglob::match_eglob;
use crate::wordlist::{basename, WordList};

/// Which DSOs to report calls into, matched by basename.
#[derive(Debug, Clone)]
pub enum LibraryFilter {
    ReportAll,
    Include(WordList),
    Exclude(WordList),
}

impl LibraryFilter {
    pub fn from_config(config: &Config) -> LibraryFilter {
        if let Some(list) = parse_list(config.include_libs.as_deref()) {
            LibraryFilter::Include(list)
        } else if let Some(list) = parse_list(config.exclude_libs.as_deref()) {
            LibraryFilter::Exclude(list)
        } else {
            LibraryFilter::ReportAll
        }
    }

    /// The basename of `path` if calls into it are to be reported.
    pub fn should_report<'a>(&self, path: &'a str) -> Option<&'a str> {
        match self {
            LibraryFilter::ReportAll => Some(basename(path)),
            LibraryFilter::Include(list) => list.find(path),
            LibraryFilter::Exclude(list) => {
                if list.find(path).is_some() {
                    None
                } else {
                    Some(basename(path))
                }
            }
        }
    }
}

/// Which function names to report, matched by extended glob.
#[derive(Debug, Clone)]
pub enum FunctionFilter {
    ReportAll,
    Include(String),
    Exclude(String),
}

impl FunctionFilter {
    pub fn from_config(config: &Config) -> FunctionFilter {
        if let Some(pattern) = nonempty(config.include_funs.as_deref()) {
            FunctionFilter::Include(pattern)
        } else if let Some(pattern) = nonempty(config.exclude_funs.as_deref()) {
            FunctionFilter::Exclude(pattern)
        } else {
            FunctionFilter::ReportAll
        }
    }

    /// Whether a call to `name` is to be reported. `None` means resolution
    /// failed entirely: a whitelist suppresses it, anything else reports.
    pub fn should_report(&self, name: Option<&str>) -> bool {
        match self {
            FunctionFilter::ReportAll => true,
            FunctionFilter::Include(pattern) => {
                name.is_some_and(|name| match_eglob(pattern, name))
            }
            FunctionFilter::Exclude(pattern) => {
                !name.is_some_and(|name| match_eglob(pattern, name))
            }
        }
    }
}

fn parse_list(value: Option<&str>) -> Option<WordList> {
    let list = WordList::parse(value?);
    (!list.is_empty()).then_some(list)
}

fn nonempty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_no_lists_reports_everything() {
        let filter = LibraryFilter::from_config(&config_from(&[]));
        assert_eq!(filter.should_report("/lib/libc.so"), Some("libc.so"));
    }

    #[test]
    fn test_library_whitelist() {
        let config = config_from(&[("TRAZAR_INLIBS", "libalpha.so:libbeta.so")]);
        let filter = LibraryFilter::from_config(&config);
        assert_eq!(
            filter.should_report("/usr/lib/libalpha.so"),
            Some("libalpha.so")
        );
        assert_eq!(filter.should_report("/usr/lib/libgamma.so"), None);
    }

    #[test]
    fn test_library_blacklist() {
        let config = config_from(&[("TRAZAR_EXLIBS", "libm.so:libc.so")]);
        let filter = LibraryFilter::from_config(&config);
        assert_eq!(filter.should_report("/lib/libm.so"), None);
        assert_eq!(filter.should_report("/lib/libc.so"), None);
        assert_eq!(filter.should_report("/lib/libdl.so"), Some("libdl.so"));
    }

    #[test]
    fn test_include_wins_over_exclude() {
        let config = config_from(&[
            ("TRAZAR_INLIBS", "liba.so"),
            ("TRAZAR_EXLIBS", "liba.so:libb.so"),
        ]);
        let filter = LibraryFilter::from_config(&config);
        assert_eq!(filter.should_report("liba.so"), Some("liba.so"));
        // The exclude list is ignored outright, not merged.
        assert_eq!(filter.should_report("libb.so"), None);
        assert!(matches!(filter, LibraryFilter::Include(_)));
    }

    #[test]
    fn test_function_whitelist() {
        let config = config_from(&[("TRAZAR_INFUNS", "foo_*:bar_(alpha:beta)")]);
        let filter = FunctionFilter::from_config(&config);
        assert!(filter.should_report(Some("foo_x")));
        assert!(filter.should_report(Some("bar_alpha")));
        assert!(!filter.should_report(Some("bar_gamma")));
        assert!(!filter.should_report(Some("foo")));
    }

    #[test]
    fn test_function_blacklist() {
        let config = config_from(&[("TRAZAR_EXFUNS", "internal_*")]);
        let filter = FunctionFilter::from_config(&config);
        assert!(!filter.should_report(Some("internal_tick")));
        assert!(filter.should_report(Some("main")));
    }

    #[test]
    fn test_unresolved_name_vs_whitelist() {
        let include = FunctionFilter::from_config(&config_from(&[("TRAZAR_INFUNS", "foo")]));
        let exclude = FunctionFilter::from_config(&config_from(&[("TRAZAR_EXFUNS", "foo")]));
        let all = FunctionFilter::from_config(&config_from(&[]));
        // A name that could not be resolved is suppressed only by a
        // whitelist.
        assert!(!include.should_report(None));
        assert!(exclude.should_report(None));
        assert!(all.should_report(None));
    }
}
