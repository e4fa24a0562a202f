//! Domain-level reads and appends through a [`Mapper`].

use ledger_core::EventId;

use crate::errors::Result;
use crate::mapper::Mapper;
use crate::specification::ReadSpecification;
use crate::store::legacy_repository::LegacyEventRepository;
use crate::types::{ExpectedVersion, Stream};

/// Pairs a repository with a mapper so callers work with domain events.
#[derive(Clone)]
pub struct SpecificationReader<M> {
    repository: LegacyEventRepository,
    mapper: M,
}

impl<M: Mapper> SpecificationReader<M> {
    /// Wrap `repository`, converting through `mapper`.
    pub fn new(repository: LegacyEventRepository, mapper: M) -> Self {
        Self { repository, mapper }
    }

    /// The wrapped repository.
    pub fn repository(&self) -> &LegacyEventRepository {
        &self.repository
    }

    /// Map and append domain events.
    pub fn append(
        &self,
        events: &[M::Event],
        stream: &Stream,
        expected_version: ExpectedVersion,
    ) -> Result<()> {
        let records = events
            .iter()
            .map(|event| self.mapper.event_to_record(event))
            .collect::<Result<Vec<_>>>()?;
        self.repository
            .append_to_stream(&records, stream, expected_version)
    }

    /// Lazily yield mapped events for `spec`.
    pub fn each<'a>(
        &'a self,
        spec: &ReadSpecification,
    ) -> Result<impl Iterator<Item = Result<M::Event>> + use<'a, M>> {
        let records = self.repository.read(spec)?;
        let mapper = &self.mapper;
        Ok(records.map(move |record| mapper.record_to_event(record?)))
    }

    /// Lazily yield mapped pages for `spec`.
    pub fn each_batch<'a>(
        &'a self,
        spec: &ReadSpecification,
    ) -> Result<impl Iterator<Item = Result<Vec<M::Event>>> + use<'a, M>> {
        let batches = self.repository.read_batches(spec)?;
        Ok(batches.map(move |batch| {
            batch?
                .into_iter()
                .map(|record| self.mapper.record_to_event(record))
                .collect()
        }))
    }

    /// Collect every mapped event for `spec`.
    pub fn to_vec(&self, spec: &ReadSpecification) -> Result<Vec<M::Event>> {
        self.each(spec)?.collect()
    }

    /// First event of `spec`, if any.
    pub fn first(&self, spec: &ReadSpecification) -> Result<Option<M::Event>> {
        self.each(&spec.clone().limit(1))?.next().transpose()
    }

    /// Last event of `spec`, if any. Pages through the whole result.
    pub fn last(&self, spec: &ReadSpecification) -> Result<Option<M::Event>> {
        let mut last = None;
        for event in self.each(spec)? {
            last = Some(event?);
        }
        Ok(last)
    }

    /// Number of events `spec` yields.
    pub fn count(&self, spec: &ReadSpecification) -> Result<u64> {
        self.repository.count(spec)
    }

    /// Fetch and map a single event.
    pub fn read_event(&self, event_id: &EventId) -> Result<M::Event> {
        self.mapper
            .record_to_event(self.repository.read_event(event_id)?)
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::mapper::{DomainEvent, EventPayload, JsonMapper, NullMapper};
    use crate::types::EventRecord;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Deposited {
        amount: i64,
    }

    impl EventPayload for Deposited {
        fn event_type(&self) -> &str {
            "Deposited"
        }
    }

    fn reader() -> SpecificationReader<JsonMapper<Deposited>> {
        let repository = LegacyEventRepository::in_memory().unwrap();
        SpecificationReader::new(repository, JsonMapper::new())
    }

    fn deposits(amounts: &[i64]) -> Vec<DomainEvent<Deposited>> {
        amounts
            .iter()
            .map(|&amount| DomainEvent::new(Deposited { amount }))
            .collect()
    }

    #[test]
    fn append_then_read_mapped_events() {
        let reader = reader();
        let account = Stream::named("Account$1").unwrap();
        let events = deposits(&[10, 20, 30]);
        reader
            .append(&events, &account, ExpectedVersion::None)
            .unwrap();

        let spec = ReadSpecification::new().stream(account);
        assert_eq!(reader.to_vec(&spec).unwrap(), events);
        assert_eq!(reader.first(&spec).unwrap().unwrap().data.amount, 10);
        assert_eq!(reader.last(&spec).unwrap().unwrap().data.amount, 30);
        assert_eq!(reader.count(&spec).unwrap(), 3);
        assert_eq!(
            reader.read_event(&events[1].event_id).unwrap().data.amount,
            20
        );
    }

    #[test]
    fn batches_are_mapped() {
        let reader = reader();
        let account = Stream::named("Account$1").unwrap();
        reader
            .append(&deposits(&[1, 2, 3, 4, 5]), &account, ExpectedVersion::Any)
            .unwrap();

        let sizes: Vec<usize> = reader
            .each_batch(&ReadSpecification::new().in_batches(2))
            .unwrap()
            .map(|batch| batch.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn empty_read() {
        let reader = reader();
        let spec = ReadSpecification::new();
        assert!(reader.first(&spec).unwrap().is_none());
        assert!(reader.last(&spec).unwrap().is_none());
    }

    #[test]
    fn null_mapper_yields_records() {
        let repository = LegacyEventRepository::in_memory().unwrap();
        let reader = SpecificationReader::new(repository, NullMapper);
        let record = EventRecord::new(EventId::from("e1"), "T", "x", "y");
        let records = std::slice::from_ref(&record);
        reader
            .append(records, &Stream::Global, ExpectedVersion::Any)
            .unwrap();
        let all = reader.to_vec(&ReadSpecification::new()).unwrap();
        assert_eq!(all, vec![record]);
    }
}
