//! Minimal getopt-style argument tokenizer and binder.
//!
//! Given an argument vector and an [`OptionTable`], [`resolve`] classifies each
//! token as a short option (`-v`, clusters like `-abc`, attached values like
//! `-oFILE`), a long option (`--verbose`, exact names only), or a positional
//! argument, and binds the declared number of values to every matched option.
//!
//! Scanning stops at the first problem. The error carries the offending token
//! and everything matched before it.

pub use optbind_table::{OptionDef, OptionTable, TableError};

pub use matches::{Matches, OptionMatch};
pub use resolve::{ErrorKind, ResolveError, Status, resolve};

pub mod matches {
    use optbind_table::{OptionDef, OptionTable};
    use std::num::NonZeroUsize;

    /// Match state of one table entry.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct OptionMatch<'a> {
        /// Set once the option is matched; stays set on later matches.
        pub is_set: bool,
        /// 1-based position among matched options, of the *last* occurrence.
        pub order: Option<NonZeroUsize>,
        /// Values bound by the last occurrence, in command-line order.
        pub args: Vec<&'a str>,
    }

    /// Result of scanning an argument vector against an option table.
    ///
    /// Lookups by name resolve to the first table entry with that name.
    #[derive(Debug, Clone)]
    pub struct Matches<'a> {
        table: &'a OptionTable,
        records: Vec<OptionMatch<'a>>,
        positionals: Vec<&'a str>,
        consumed: usize,
    }

    impl<'a> Matches<'a> {
        /// Record for the option called `name`, if the table defines one.
        pub fn get(&self, name: &str) -> Option<&OptionMatch<'a>> {
            self.table
                .position(name)
                .and_then(|index| self.records.get(index))
        }

        /// Record for the table entry at `index`.
        pub fn record(&self, index: usize) -> Option<&OptionMatch<'a>> {
            self.records.get(index)
        }

        pub fn is_set(&self, name: &str) -> bool {
            self.get(name).is_some_and(|m| m.is_set)
        }

        pub fn order(&self, name: &str) -> Option<usize> {
            self.get(name).and_then(|m| m.order).map(NonZeroUsize::get)
        }

        /// Values bound to `name`; empty when unmatched or unknown.
        pub fn args(&self, name: &str) -> &[&'a str] {
            self.get(name).map(|m| m.args.as_slice()).unwrap_or(&[])
        }

        /// First value bound to `name`.
        pub fn value(&self, name: &str) -> Option<&'a str> {
            self.args(name).first().copied()
        }

        pub fn positionals(&self) -> &[&'a str] {
            self.positionals.as_slice()
        }

        pub fn positional_count(&self) -> usize {
            self.positionals.len()
        }

        /// Number of tokens fully consumed, counting the program name.
        pub fn consumed(&self) -> usize {
            self.consumed
        }

        /// Every table entry with its record, in table order.
        pub fn iter(&self) -> impl Iterator<Item = (&'a OptionDef, &OptionMatch<'a>)> + '_ {
            let table: &'a OptionTable = self.table;
            table.options.iter().zip(self.records.iter())
        }

        /// Matched entries sorted by their order.
        pub fn in_order(&self) -> Vec<(&'a OptionDef, &OptionMatch<'a>)> {
            let mut matched: Vec<_> = self.iter().filter(|(_, m)| m.is_set).collect();
            matched.sort_by_key(|(_, m)| m.order);
            matched
        }
    }

    impl<'a> Matches<'a> {
        pub(crate) fn new(table: &'a OptionTable) -> Self {
            Self {
                table,
                records: vec![OptionMatch::default(); table.len()],
                positionals: Vec::new(),
                consumed: 0,
            }
        }

        pub(crate) fn mark(&mut self, index: usize, order: NonZeroUsize) {
            if let Some(record) = self.records.get_mut(index) {
                record.is_set = true;
                record.order = Some(order);
                record.args.clear();
            }
        }

        pub(crate) fn push_arg(&mut self, index: usize, value: &'a str) {
            if let Some(record) = self.records.get_mut(index) {
                record.args.push(value);
            }
        }

        pub(crate) fn push_positional(&mut self, value: &'a str) {
            self.positionals.push(value);
        }

        pub(crate) fn set_consumed(&mut self, consumed: usize) {
            self.consumed = consumed;
        }
    }
}

pub mod resolve {
    use super::matches::Matches;
    use optbind_table::OptionTable;
    use std::fmt;
    use std::num::NonZeroUsize;

    /// Integer status contract: `0` success, `1` unrecognized, `2` missing argument.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Status {
        Success = 0,
        UnrecognizedOption = 1,
        MissingArgument = 2,
    }

    impl Status {
        pub fn code(self) -> i32 {
            self as i32
        }

        pub fn of<T>(result: &Result<T, ResolveError<'_>>) -> Self {
            match result {
                Ok(_) => Self::Success,
                Err(err) => err.kind.status(),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ErrorKind {
        /// Unknown option, bare `-` or `--`, or a positional past capacity.
        UnrecognizedOption,
        /// Input ended before an option received all of its values.
        MissingArgument,
    }

    impl ErrorKind {
        pub fn status(self) -> Status {
            match self {
                Self::UnrecognizedOption => Status::UnrecognizedOption,
                Self::MissingArgument => Status::MissingArgument,
            }
        }
    }

    impl fmt::Display for ErrorKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::UnrecognizedOption => f.write_str("unrecognized option"),
                Self::MissingArgument => f.write_str("missing argument for option"),
            }
        }
    }

    /// First failure of a scan.
    #[derive(Debug, Clone, thiserror::Error)]
    #[error("{kind}: {token}")]
    pub struct ResolveError<'a> {
        pub kind: ErrorKind,
        /// Whole token being processed when the failure was detected.
        pub token: &'a str,
        /// Matches recorded before the failure. Nothing is rolled back.
        pub partial: Matches<'a>,
    }

    impl ResolveError<'_> {
        pub fn status(&self) -> Status {
            self.kind.status()
        }
    }

    /// Position inside the token slice: a token index plus a byte offset into it.
    struct Cursor<'a, S> {
        tokens: &'a [S],
        index: usize,
        offset: usize,
    }

    impl<'a, S: AsRef<str>> Cursor<'a, S> {
        fn new(tokens: &'a [S]) -> Self {
            // tokens[0] is the program name
            Self {
                tokens,
                index: tokens.len().min(1),
                offset: 0,
            }
        }

        fn token(&self) -> Option<&'a str> {
            self.tokens.get(self.index).map(AsRef::as_ref)
        }

        /// Unread part of the current token.
        fn rest(&self) -> &'a str {
            self.token()
                .and_then(|t| t.get(self.offset..))
                .unwrap_or("")
        }

        /// Tokens left, the current one included.
        fn remaining(&self) -> usize {
            self.tokens.len() - self.index
        }

        fn skip(&mut self, bytes: usize) {
            self.offset += bytes;
        }

        fn advance(&mut self) {
            self.index += 1;
            self.offset = 0;
        }

        /// Consume the rest of the current token as one value.
        fn take(&mut self) -> Option<&'a str> {
            if self.remaining() == 0 {
                return None;
            }
            let value = self.rest();
            self.advance();
            Some(value)
        }
    }

    struct Scan<'a, S> {
        table: &'a OptionTable,
        cursor: Cursor<'a, S>,
        current: &'a str,
        next_order: NonZeroUsize,
        matches: Matches<'a>,
    }

    impl<'a, S: AsRef<str>> Scan<'a, S> {
        fn run(&mut self) -> Result<(), ErrorKind> {
            while let Some(token) = self.cursor.token() {
                self.current = token;
                if let Some(name) = token.strip_prefix("--") {
                    self.long(name)?;
                } else if token.starts_with('-') {
                    self.short()?;
                } else {
                    self.positional(token)?;
                }
                self.matches.set_consumed(self.cursor.index);
            }
            Ok(())
        }

        fn long(&mut self, name: &'a str) -> Result<(), ErrorKind> {
            if name.is_empty() {
                return Err(ErrorKind::UnrecognizedOption);
            }
            let table = self.table;
            let (index, def) = table
                .find_long(name)
                .ok_or(ErrorKind::UnrecognizedOption)?;
            self.mark(index, &def.name);
            self.cursor.advance();
            self.take_args(index, def.arity)
        }

        /// Walk one `-xyz` token. A character whose option takes values ends
        /// the cluster: whatever follows it is the first value.
        fn short(&mut self) -> Result<(), ErrorKind> {
            let table = self.table;
            self.cursor.skip('-'.len_utf8());
            loop {
                let c = self
                    .cursor
                    .rest()
                    .chars()
                    .next()
                    .ok_or(ErrorKind::UnrecognizedOption)?;
                let (index, def) = table
                    .find_short(c)
                    .ok_or(ErrorKind::UnrecognizedOption)?;
                self.mark(index, &def.name);
                self.cursor.skip(c.len_utf8());
                let attached = !self.cursor.rest().is_empty();
                if def.arity > 0 {
                    if !attached {
                        self.cursor.advance();
                    }
                    return self.take_args(index, def.arity);
                }
                if !attached {
                    self.cursor.advance();
                    return Ok(());
                }
            }
        }

        fn positional(&mut self, token: &'a str) -> Result<(), ErrorKind> {
            if self.matches.positional_count() >= self.table.positional_capacity {
                return Err(ErrorKind::UnrecognizedOption);
            }
            tracing::trace!(token, "positional argument");
            self.matches.push_positional(token);
            self.cursor.advance();
            Ok(())
        }

        fn mark(&mut self, index: usize, name: &str) {
            let order = self.next_order;
            tracing::trace!(
                token = self.current,
                option = name,
                order = order.get(),
                "matched option"
            );
            self.matches.mark(index, order);
            self.next_order = order.saturating_add(1);
        }

        /// Values are taken by count and never reclassified, so they may start with `-`.
        fn take_args(&mut self, index: usize, arity: usize) -> Result<(), ErrorKind> {
            for _ in 0..arity {
                let value = self.cursor.take().ok_or(ErrorKind::MissingArgument)?;
                self.matches.push_arg(index, value);
            }
            Ok(())
        }
    }

    /// Scan `tokens` (program name first, always skipped) against `table`.
    pub fn resolve<'a, S: AsRef<str>>(
        table: &'a OptionTable,
        tokens: &'a [S],
    ) -> Result<Matches<'a>, ResolveError<'a>> {
        let cursor = Cursor::new(tokens);
        let mut scan = Scan {
            table,
            current: "",
            next_order: NonZeroUsize::MIN,
            matches: Matches::new(table),
            cursor,
        };
        scan.matches.set_consumed(scan.cursor.index);

        match scan.run() {
            Ok(()) => Ok(scan.matches),
            Err(kind) => {
                tracing::debug!(%kind, token = scan.current, "argument scan failed");
                Err(ResolveError {
                    kind,
                    token: scan.current,
                    partial: scan.matches,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OptionTable {
        OptionTable::new(1)
            .option(OptionDef::new("all").short('a'))
            .option(OptionDef::new("file").short('f').long("file").arity(1))
    }

    #[test]
    fn cluster_ends_at_value_taking_option() {
        let table = table();
        let argv = ["prog", "-afa-b"];
        let m = resolve(&table, &argv).unwrap();
        assert!(m.is_set("all"));
        assert_eq!(m.args("file"), ["a-b"]);
        assert_eq!(m.order("all"), Some(1));
        assert_eq!(m.order("file"), Some(2));
    }

    #[test]
    fn failure_in_cluster_reports_whole_token() {
        let table = table();
        let argv = ["prog", "-ax"];
        let err = resolve(&table, &argv).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnrecognizedOption);
        assert_eq!(err.token, "-ax");
        assert!(err.partial.is_set("all"));
    }

    #[test]
    fn empty_argv_resolves_to_nothing() {
        let table = table();
        let argv: [&str; 0] = [];
        let m = resolve(&table, &argv).unwrap();
        assert_eq!(m.positional_count(), 0);
        assert_eq!(m.consumed(), 0);
        assert!(m.iter().all(|(_, r)| !r.is_set));
    }

    #[test]
    fn non_ascii_short_names() {
        let table = OptionTable::new(0)
            .option(OptionDef::new("lambda").short('λ'))
            .option(OptionDef::new("out").short('ö').arity(1));
        let argv = ["prog", "-λöwert"];
        let m = resolve(&table, &argv).unwrap();
        assert!(m.is_set("lambda"));
        assert_eq!(m.value("out"), Some("wert"));
    }

    #[test]
    fn status_codes_match_integer_contract() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::UnrecognizedOption.code(), 1);
        assert_eq!(Status::MissingArgument.code(), 2);

        let table = table();
        let argv = ["prog", "--file"];
        let result = resolve(&table, &argv);
        assert_eq!(Status::of(&result), Status::MissingArgument);
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "missing argument for option: --file");
    }
}
