//! ⏳ Time fields: turning `(time_from, time_to, time_type)` into comparable index bounds.
//!
//! 🎬 *[a record says it has been valid "seit 2020". since when exactly? forever after?]*
//! *[the normalizer nods, writes t1 = 20200101, and quietly sets t2 = 99999999.]*
//!
//! Bounds are fixed-width `YYYYMMDD` strings so the index can compare them lexically.
//! Nothing checks that the date is on a real calendar. `20201399` sorts fine. 🦆
//!
//! | time_type | writes |
//! |-----------|--------|
//! | `von`     | t1 ← from, t2 ← to |
//! | `seit`    | t1 ← from |
//! | `am`      | t0 ← from |
//! | `bis`     | t2 ← to |
//! | other     | nothing |
//!
//! Open ends are then closed off: t1 alone gets t2 = `99999999`, t2 alone gets
//! t1 = `00000000`. A t0 turns both fallbacks off.

use tracing::debug;

use crate::documents::DocumentSink;

/// 📏 Bounds keep this many leading characters of the source value.
pub const BOUND_WIDTH: usize = 8;
/// ⏮️ The infinite past.
pub const OPEN_START: &str = "00000000";
/// ⏭️ The infinite future.
pub const OPEN_END: &str = "99999999";

pub const FIELD_T0: &str = "t0";
pub const FIELD_T1: &str = "t1";
pub const FIELD_T2: &str = "t2";

/// 🗓️ The bounds one record ended up with, fallbacks included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBounds {
    /// 📍 Point in time ("am").
    pub t0: Option<String>,
    /// 🟢 Start of a range.
    pub t1: Option<String>,
    /// 🔴 End of a range.
    pub t2: Option<String>,
}

impl TimeBounds {
    pub fn is_empty(&self) -> bool {
        self.t0.is_none() && self.t1.is_none() && self.t2.is_none()
    }
}

/// ⏳ Writes t0/t1/t2 fields for one record at a time.
///
/// Owns a scratch [`TimeBounds`] that is filled while one record is processed and
/// emptied before `process_time_fields` returns. Record N never sees record N+1's bounds.
/// One instance per pipeline run, handed around inside the `MappingContext`.
#[derive(Debug, Default)]
pub struct TimeFieldNormalizer {
    scratch: TimeBounds,
}

impl TimeFieldNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🔄 Normalize and emit the time bounds of one record into `document`.
    ///
    /// `None` and empty inputs contribute nothing. Returns what was emitted.
    pub fn process_time_fields(
        &mut self,
        document: &mut dyn DocumentSink,
        time_from: Option<&str>,
        time_to: Option<&str>,
        time_type: Option<&str>,
    ) -> TimeBounds {
        let from = truncate_bound(time_from.unwrap_or_default());
        let to = truncate_bound(time_to.unwrap_or_default());

        match time_type.unwrap_or_default() {
            "von" => {
                self.remember(document, FIELD_T1, from);
                self.remember(document, FIELD_T2, to);
            }
            "seit" => self.remember(document, FIELD_T1, from),
            "am" => self.remember(document, FIELD_T0, from),
            "bis" => self.remember(document, FIELD_T2, to),
            other => debug!("⏳ time_type '{other}' writes no bounds"),
        }

        let written = (
            self.scratch.t0.is_some(),
            self.scratch.t1.is_some(),
            self.scratch.t2.is_some(),
        );
        match written {
            (false, true, false) => {
                debug!("⏭️ t1 is set, t2 and t0 are not: t2 becomes '{OPEN_END}'");
                document.remove_fields(FIELD_T2);
                document.add(FIELD_T2, OPEN_END);
                self.scratch.t2 = Some(OPEN_END.to_string());
            }
            (false, false, true) => {
                debug!("⏮️ t2 is set, t1 and t0 are not: t1 becomes '{OPEN_START}'");
                document.remove_fields(FIELD_T1);
                document.add(FIELD_T1, OPEN_START);
                self.scratch.t1 = Some(OPEN_START.to_string());
            }
            _ => {}
        }

        std::mem::take(&mut self.scratch)
    }

    fn remember(&mut self, document: &mut dyn DocumentSink, field: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        document.add(field, value);
        let slot = match field {
            FIELD_T0 => &mut self.scratch.t0,
            FIELD_T1 => &mut self.scratch.t1,
            _ => &mut self.scratch.t2,
        };
        *slot = Some(value.to_string());
    }
}

// ✂️ Keep the first BOUND_WIDTH characters. Characters, not bytes: no slicing through an umlaut.
fn truncate_bound(value: &str) -> &str {
    match value.char_indices().nth(BOUND_WIDTH) {
        Some((cut, _)) => &value[..cut],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::IndexDocument;

    fn run(from: &str, to: &str, kind: &str) -> (IndexDocument, TimeBounds) {
        let mut normalizer = TimeFieldNormalizer::new();
        let mut doc = IndexDocument::new();
        let bounds = normalizer.process_time_fields(&mut doc, Some(from), Some(to), Some(kind));
        (doc, bounds)
    }

    #[test]
    fn the_one_where_von_without_an_end_runs_forever() {
        let (doc, bounds) = run("20200101", "", "von");
        assert_eq!(doc.get("t1"), Some("20200101"));
        assert_eq!(doc.get_all("t2"), vec!["99999999"]);
        assert_eq!(doc.get("t0"), None);
        assert_eq!(bounds.t2.as_deref(), Some(OPEN_END));
    }

    #[test]
    fn the_one_where_bis_started_at_the_dawn_of_time() {
        let (doc, _) = run("", "20201231", "bis");
        assert_eq!(doc.get_all("t1"), vec!["00000000"]);
        assert_eq!(doc.get("t2"), Some("20201231"));
    }

    #[test]
    fn the_one_where_am_is_a_single_day_and_nobody_fills_in_the_gaps() {
        let (doc, bounds) = run("20200615", "", "am");
        assert_eq!(doc.get("t0"), Some("20200615"));
        assert_eq!(doc.get("t1"), None);
        assert_eq!(doc.get("t2"), None);
        assert_eq!(
            bounds,
            TimeBounds {
                t0: Some("20200615".into()),
                ..TimeBounds::default()
            }
        );
    }

    #[test]
    fn the_one_where_a_closed_range_needs_no_help() {
        let (doc, _) = run("20200101", "20201231", "von");
        assert_eq!(doc.get_all("t1"), vec!["20200101"]);
        assert_eq!(doc.get_all("t2"), vec!["20201231"]);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn the_one_where_an_unknown_type_writes_nothing_at_all() {
        for kind in ["", "VON", "irgendwann", "fromage"] {
            let (doc, bounds) = run("20200101", "20201231", kind);
            assert!(doc.is_empty(), "type '{kind}' wrote {doc:?}");
            assert!(bounds.is_empty());
        }
    }

    #[test]
    fn the_one_where_a_timestamp_loses_its_time() {
        let (doc, _) = run("202001011230", "", "seit");
        assert_eq!(doc.get("t1"), Some("20200101"));
        assert_eq!(doc.get("t2"), Some("99999999"));

        let (doc, _) = run("2020", "", "am");
        assert_eq!(doc.get("t0"), Some("2020"));
    }

    #[test]
    fn the_one_where_record_two_knows_nothing_of_record_one() {
        let mut normalizer = TimeFieldNormalizer::new();

        let mut first = IndexDocument::new();
        normalizer.process_time_fields(&mut first, Some("20200101"), None, Some("seit"));
        assert_eq!(first.get("t2"), Some("99999999"));

        // 🧼 a t1 left over from record one would suppress this fallback
        let mut second = IndexDocument::new();
        let bounds = normalizer.process_time_fields(&mut second, None, Some("20211231"), Some("bis"));
        assert_eq!(second.get("t1"), Some("00000000"));
        assert_eq!(bounds.t1.as_deref(), Some(OPEN_START));

        let mut third = IndexDocument::new();
        let bounds = normalizer.process_time_fields(&mut third, Some("20220202"), None, Some("am"));
        assert_eq!(third.get("t1"), None);
        assert_eq!(third.get("t2"), None);
        assert_eq!(bounds.t0.as_deref(), Some("20220202"));
    }

    #[test]
    fn the_one_where_a_stale_open_end_is_replaced_not_duplicated() {
        let mut normalizer = TimeFieldNormalizer::new();
        let mut doc = IndexDocument::new();
        doc.add("t1", "19990101");
        normalizer.process_time_fields(&mut doc, None, Some("20201231"), Some("bis"));
        assert_eq!(doc.get_all("t1"), vec!["00000000"]);
    }

    #[test]
    fn the_one_where_null_inputs_are_just_empty() {
        let mut normalizer = TimeFieldNormalizer::new();
        let mut doc = IndexDocument::new();
        let bounds = normalizer.process_time_fields(&mut doc, None, None, Some("von"));
        assert!(doc.is_empty());
        assert!(bounds.is_empty());

        let bounds = normalizer.process_time_fields(&mut doc, None, None, None);
        assert!(bounds.is_empty());
    }
}
