use chrono::{DateTime, NaiveDate};
use tally_core::{Entry, EntryFilter, Timestamp, TimePeriod};

fn ts(value: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

/// Thursday.
fn today() -> NaiveDate {
    date("2026-03-12")
}

fn completed(id: &str, project: &str, start: &str, end: &str) -> Entry {
    Entry::with_id(id, project, ts(start))
        .unwrap()
        .with_end_time(ts(end))
        .unwrap()
}

#[test]
fn periods_derive_fixed_bounds_from_today() {
    let cases = [
        (TimePeriod::Today, Some("2026-03-12"), Some("2026-03-12"), false),
        (
            TimePeriod::Yesterday,
            Some("2026-03-11"),
            Some("2026-03-11"),
            false,
        ),
        (TimePeriod::Week, Some("2026-03-09"), None, false),
        (TimePeriod::Month, Some("2026-03-01"), None, false),
        (TimePeriod::All, None, None, false),
        (TimePeriod::Default, Some("2026-03-12"), Some("2026-03-12"), true),
    ];

    for (period, start, end, include_active) in cases {
        let filter = EntryFilter::for_period(period, today());
        assert_eq!(filter.start_date(), start.map(date), "{period:?} start");
        assert_eq!(filter.end_date(), end.map(date), "{period:?} end");
        assert_eq!(filter.include_active(), include_active, "{period:?}");
        assert_eq!(filter.time_period(), Some(period));
    }
}

#[test]
fn week_starting_on_monday_is_bounded_by_today() {
    let monday = date("2026-03-09");
    let filter = EntryFilter::for_period(TimePeriod::Week, monday);
    assert_eq!(filter.start_date(), Some(monday));

    let sunday = date("2026-03-15");
    let filter = EntryFilter::for_period(TimePeriod::Week, sunday);
    assert_eq!(filter.start_date(), Some(monday));
}

#[test]
fn yesterday_and_month_cross_month_boundaries() {
    let first = date("2026-03-01");
    assert_eq!(
        EntryFilter::for_period(TimePeriod::Yesterday, first).start_date(),
        Some(date("2026-02-28"))
    );
    assert_eq!(
        EntryFilter::for_period(TimePeriod::Month, first).start_date(),
        Some(first)
    );
}

#[test]
fn empty_filter_matches_everything() {
    let filter = EntryFilter::all();
    let entry = completed(
        "a1",
        "writing",
        "2020-01-01T09:00:00+00:00",
        "2020-01-01T10:00:00+00:00",
    );
    assert!(filter.matches(&entry));
}

#[test]
fn date_bounds_are_inclusive_on_both_ends() {
    let filter = EntryFilter::between(Some(date("2026-03-10")), Some(date("2026-03-11")));

    let before = completed(
        "a",
        "p",
        "2026-03-09T23:59:00-05:00",
        "2026-03-10T00:30:00-05:00",
    );
    let first_day = completed(
        "b",
        "p",
        "2026-03-10T00:00:00-05:00",
        "2026-03-10T01:00:00-05:00",
    );
    let last_day = completed(
        "c",
        "p",
        "2026-03-11T23:59:59-05:00",
        "2026-03-12T00:30:00-05:00",
    );
    assert!(!filter.matches(&before));
    assert!(filter.matches(&first_day));
    assert!(filter.matches(&last_day));
}

#[test]
fn dates_compare_in_the_entry_offset() {
    let filter = EntryFilter::for_period(TimePeriod::Today, today());

    // Still the 12th locally, already the 13th in UTC.
    let late_local = completed(
        "late",
        "p",
        "2026-03-12T23:30:00-05:00",
        "2026-03-12T23:45:00-05:00",
    );
    // The 12th in UTC, but recorded as the 13th at +09:00.
    let early_east = completed(
        "east",
        "p",
        "2026-03-13T01:00:00+09:00",
        "2026-03-13T02:00:00+09:00",
    );

    assert!(filter.matches(&late_local));
    assert!(!filter.matches(&early_east));
}

#[test]
fn projects_match_exactly_or_by_wildcard_prefix() {
    let entry = completed(
        "a1",
        "client-acme",
        "2026-03-12T09:00:00-05:00",
        "2026-03-12T10:00:00-05:00",
    );

    assert!(EntryFilter::all().with_projects(["client-acme"]).matches(&entry));
    assert!(!EntryFilter::all().with_projects(["client"]).matches(&entry));
    assert!(!EntryFilter::all().with_projects(["CLIENT-*"]).matches(&entry));
    for pattern in ["client-*", "client+", "client."] {
        assert!(
            EntryFilter::all().with_projects([pattern]).matches(&entry),
            "{pattern}"
        );
    }
    assert!(EntryFilter::all()
        .with_projects(["other", "client-acme"])
        .matches(&entry));
}

#[test]
fn tags_match_when_any_tag_is_shared() {
    let entry = completed(
        "a1",
        "writing",
        "2026-03-12T09:00:00-05:00",
        "2026-03-12T10:00:00-05:00",
    )
    .with_tags(["draft", "book"]);

    assert!(EntryFilter::all().with_tags(["book"]).matches(&entry));
    assert!(EntryFilter::all()
        .with_tags(["review", "draft"])
        .matches(&entry));
    assert!(!EntryFilter::all().with_tags(["review"]).matches(&entry));
}

#[test]
fn id_prefix_is_case_sensitive_and_empty_means_unset() {
    let entry = completed(
        "abc123",
        "writing",
        "2026-03-12T09:00:00-05:00",
        "2026-03-12T10:00:00-05:00",
    );

    assert!(EntryFilter::all().with_id_prefix("abc").matches(&entry));
    assert!(!EntryFilter::all().with_id_prefix("ABC").matches(&entry));
    assert_eq!(EntryFilter::all().with_id_prefix("").id_prefix(), None);
}

#[test]
fn dimensions_combine_with_and() {
    let entry = completed(
        "abc123",
        "writing",
        "2026-03-12T09:00:00-05:00",
        "2026-03-12T10:00:00-05:00",
    )
    .with_tags(["draft"]);

    let matching = EntryFilter::for_period(TimePeriod::Today, today())
        .with_projects(["writing"])
        .with_tags(["draft"])
        .with_id_prefix("abc");
    assert!(matching.matches(&entry));

    let wrong_tag = matching.clone().with_tags(["review"]);
    assert!(!wrong_tag.matches(&entry));

    let wrong_day = EntryFilter::for_period(TimePeriod::Yesterday, today())
        .with_projects(["writing"]);
    assert!(!wrong_day.matches(&entry));
}

#[test]
fn default_period_keeps_running_entries_from_earlier_days() {
    let filter = EntryFilter::for_period(TimePeriod::Default, today());
    let running = Entry::with_id("run", "writing", ts("2026-03-11T16:00:00-05:00")).unwrap();
    let stopped = completed(
        "old",
        "writing",
        "2026-03-11T09:00:00-05:00",
        "2026-03-11T10:00:00-05:00",
    );

    assert!(filter.matches(&running));
    assert!(!filter.matches(&stopped));
    assert!(!EntryFilter::for_period(TimePeriod::Today, today()).matches(&running));
}

#[test]
fn default_period_still_applies_other_dimensions_to_running_entries() {
    let running = Entry::with_id("run", "writing", ts("2026-03-11T16:00:00-05:00")).unwrap();
    let filter = EntryFilter::for_period(TimePeriod::Default, today()).with_projects(["other"]);

    assert!(!filter.matches(&running));
}
