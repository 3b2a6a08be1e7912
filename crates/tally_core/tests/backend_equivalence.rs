//! Every backend must return the same entries, in the same order, for the
//! same data and filter.

use chrono::{DateTime, NaiveDate};
use tally_core::{
    open_repository, Entry, EntryFilter, EntryRepository, Timestamp, TimePeriod,
};
use tempfile::TempDir;

const STORE_NAMES: [&str; 5] = [
    "entries.yaml",
    "entries.yml",
    "entries.toml",
    "entries.json",
    "entries.db",
];

fn ts(value: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn today() -> NaiveDate {
    "2026-03-12".parse().unwrap()
}

fn completed(id: &str, project: &str, start: &str, end: &str, tags: &[&str]) -> Entry {
    Entry::with_id(id, project, ts(start))
        .unwrap()
        .with_end_time(ts(end))
        .unwrap()
        .with_tags(tags.iter().copied())
}

fn dataset() -> Vec<Entry> {
    vec![
        completed(
            "a0001",
            "client-acme",
            "2026-02-27T09:00:00-05:00",
            "2026-02-27T11:00:00-05:00",
            &["billable"],
        ),
        completed(
            "a0002",
            "client-beta",
            "2026-03-02T09:00:00-05:00",
            "2026-03-02T12:00:00-05:00",
            &["billable", "urgent"],
        ),
        completed(
            "b0001",
            "writing",
            "2026-03-09T08:00:00-05:00",
            "2026-03-09T09:00:00-05:00",
            &[],
        ),
        completed(
            "b0002",
            "writing.blog",
            "2026-03-11T14:00:00-05:00",
            "2026-03-11T15:00:00-05:00",
            &["draft"],
        ),
        // Late evening locally, next day in UTC.
        completed(
            "c0001",
            "client",
            "2026-03-11T23:30:00-05:00",
            "2026-03-11T23:50:00-05:00",
            &["billable"],
        ),
        // Early morning at +09:00, previous day in UTC.
        completed(
            "c0002",
            "reading",
            "2026-03-12T01:00:00+09:00",
            "2026-03-12T02:00:00+09:00",
            &[],
        ),
        completed(
            "d0001",
            "client-acme",
            "2026-03-12T09:00:00-05:00",
            "2026-03-12T10:00:00-05:00",
            &["urgent"],
        ),
        // Same instant as d0001; the id decides the order.
        completed(
            "d0000",
            "writing",
            "2026-03-12T14:00:00+00:00",
            "2026-03-12T14:30:00+00:00",
            &["draft", "urgent"],
        ),
        Entry::with_id("e0001", "client-beta", ts("2026-03-11T16:00:00-05:00"))
            .unwrap()
            .with_tags(["billable"])
            .with_comment("still going"),
    ]
}

fn filters() -> Vec<(&'static str, EntryFilter)> {
    let mut filters = vec![("all", EntryFilter::all())];
    for period in [
        TimePeriod::Today,
        TimePeriod::Yesterday,
        TimePeriod::Week,
        TimePeriod::Month,
        TimePeriod::All,
        TimePeriod::Default,
    ] {
        filters.push((period_name(period), EntryFilter::for_period(period, today())));
    }
    filters.extend([
        (
            "project exact",
            EntryFilter::all().with_projects(["client"]),
        ),
        (
            "project prefix",
            EntryFilter::all().with_projects(["client*"]),
        ),
        (
            "project dot prefix",
            EntryFilter::all().with_projects(["writing."]),
        ),
        (
            "project mixed",
            EntryFilter::all().with_projects(["reading", "client-a+"]),
        ),
        ("tag single", EntryFilter::all().with_tags(["urgent"])),
        (
            "tag any",
            EntryFilter::all().with_tags(["draft", "billable"]),
        ),
        ("tag unknown", EntryFilter::all().with_tags(["nope"])),
        ("id prefix", EntryFilter::all().with_id_prefix("a000")),
        ("id prefix case", EntryFilter::all().with_id_prefix("A000")),
        (
            "range",
            EntryFilter::between(
                Some("2026-03-02".parse().unwrap()),
                Some("2026-03-11".parse().unwrap()),
            ),
        ),
        (
            "open start",
            EntryFilter::between(None, Some("2026-03-02".parse().unwrap())),
        ),
        (
            "default with tag",
            EntryFilter::for_period(TimePeriod::Default, today()).with_tags(["billable"]),
        ),
        (
            "week client billable",
            EntryFilter::for_period(TimePeriod::Week, today())
                .with_projects(["client*"])
                .with_tags(["billable"]),
        ),
    ]);
    filters
}

fn period_name(period: TimePeriod) -> &'static str {
    match period {
        TimePeriod::Default => "default",
        other => other.as_str(),
    }
}

fn seeded_stores(dir: &TempDir) -> Vec<(&'static str, Box<dyn EntryRepository>)> {
    STORE_NAMES
        .iter()
        .map(|name| {
            let repo = open_repository(dir.path().join(name)).unwrap();
            repo.save_all(&dataset()).unwrap();
            (*name, repo)
        })
        .collect()
}

fn ids(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.id.as_str()).collect()
}

#[test]
fn every_filter_returns_identical_results_on_every_backend() {
    let dir = tempfile::tempdir().unwrap();
    let stores = seeded_stores(&dir);

    for (label, filter) in filters() {
        let (reference_name, reference_repo) = &stores[0];
        let expected = reference_repo.filter(&filter).unwrap();
        for (name, repo) in &stores[1..] {
            let actual = repo.filter(&filter).unwrap();
            assert_eq!(
                actual, expected,
                "filter `{label}`: {name} differs from {reference_name}"
            );
        }
    }
}

#[test]
fn backends_agree_on_known_results() {
    let dir = tempfile::tempdir().unwrap();
    let stores = seeded_stores(&dir);
    let cases: [(&str, EntryFilter, &[&str]); 8] = [
        (
            "all",
            EntryFilter::all(),
            &[
                "a0001", "a0002", "b0001", "c0002", "b0002", "e0001", "c0001", "d0000", "d0001",
            ],
        ),
        (
            "today",
            EntryFilter::for_period(TimePeriod::Today, today()),
            &["c0002", "d0000", "d0001"],
        ),
        (
            "yesterday",
            EntryFilter::for_period(TimePeriod::Yesterday, today()),
            &["b0002", "e0001", "c0001"],
        ),
        (
            "default",
            EntryFilter::for_period(TimePeriod::Default, today()),
            &["c0002", "e0001", "d0000", "d0001"],
        ),
        (
            "week",
            EntryFilter::for_period(TimePeriod::Week, today()),
            &["b0001", "c0002", "b0002", "e0001", "c0001", "d0000", "d0001"],
        ),
        (
            "project prefix",
            EntryFilter::all().with_projects(["client*"]),
            &["a0001", "a0002", "e0001", "c0001", "d0001"],
        ),
        (
            "tag single",
            EntryFilter::all().with_tags(["urgent"]),
            &["a0002", "d0000", "d0001"],
        ),
        (
            "id prefix case",
            EntryFilter::all().with_id_prefix("A000"),
            &[],
        ),
    ];

    for (name, repo) in &stores {
        for (label, filter, expected) in &cases {
            let actual = repo.filter(filter).unwrap();
            assert_eq!(ids(&actual), *expected, "{name}: filter `{label}`");
        }
    }
}

#[test]
fn active_entry_and_projects_agree_across_backends() {
    let dir = tempfile::tempdir().unwrap();
    let stores = seeded_stores(&dir);

    for (name, repo) in &stores {
        assert_eq!(
            repo.get_active_entry().unwrap().map(|entry| entry.id),
            Some("e0001".to_string()),
            "{name}"
        );
        assert_eq!(
            ids(&repo.get_by_project("client-acme").unwrap()),
            ["a0001", "d0001"],
            "{name}"
        );
        assert_eq!(repo.get_by_id("e0001").unwrap().comment, "still going");
    }
}
