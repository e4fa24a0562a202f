#![allow(dead_code)]

use std::path::Path;

use ledger_events::{
    EventId, EventRecord, LegacyEventRepository, ReadSpecification, Stream,
};
use ledger_settings::LedgerSettings;

/// Settings pointing at `events.db` inside `dir`.
pub fn settings_in(dir: &Path) -> LedgerSettings {
    let mut settings = LedgerSettings::default();
    settings.database.path = dir.join("events.db").to_string_lossy().into_owned();
    settings
}

/// File-backed repository with its own pool. Logging follows the settings
/// (and `RUST_LOG`).
pub fn open_repository(dir: &Path) -> LegacyEventRepository {
    let settings = settings_in(dir);
    settings.logging.init_subscriber();
    LegacyEventRepository::open(&settings).unwrap()
}

pub fn record(id: &str) -> EventRecord {
    EventRecord::new(EventId::from(id), "TestDomainEvent", "{}", "{}")
}

pub fn stream(name: &str) -> Stream {
    Stream::named(name).unwrap()
}

pub fn read_ids(repo: &LegacyEventRepository, spec: &ReadSpecification) -> Vec<String> {
    repo.read(spec)
        .unwrap()
        .map(|r| r.unwrap().event_id.into_inner())
        .collect()
}
