//! Main Alchemist struct and public API.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::advisor::{AdvisorConfig, HeaderAdvisor};
use crate::error::{AlchemistError, Result};
use crate::inference::{
    required_field_coverage, Classification, ClassificationMethod, EntityClassifier, HeaderMapper,
    MapperConfig, MappingResult,
};
use crate::input::{Parser, ParserConfig, RawTable, SourceMetadata};
use crate::schema::{schema_for, EntityType};
use crate::session::Session;
use crate::transform::remap_rows;

/// Configuration for ingest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlchemistConfig {
    /// Header mapping configuration.
    pub mapper: MapperConfig,
    /// Settings for building an advisor (model, timeout).
    pub advisor: AdvisorConfig,
    /// Upload parser configuration.
    pub parser: ParserConfig,
}

impl AlchemistConfig {
    /// Parse a configuration from JSON text. Missing keys take defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| AlchemistError::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AlchemistError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text)
    }
}

/// What happened to an ingested table.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Classified and mapped with enough confidence; rows are loaded.
    Applied {
        entity: EntityType,
        rows: usize,
        mapping: MappingResult,
    },
    /// Parked for review; resolve it through the session.
    Pending {
        id: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        candidate: Option<MappingResult>,
    },
}

impl IngestOutcome {
    /// Entity the rows were loaded as, if applied.
    pub fn entity(&self) -> Option<EntityType> {
        match self {
            IngestOutcome::Applied { entity, .. } => Some(*entity),
            IngestOutcome::Pending { .. } => None,
        }
    }

    /// Returns true if the table was parked for review.
    pub fn is_pending(&self) -> bool {
        matches!(self, IngestOutcome::Pending { .. })
    }
}

/// The main Alchemist engine: classifies uploads, maps their headers and
/// loads them into a [`Session`].
pub struct Alchemist {
    config: AlchemistConfig,
    parser: Parser,
    mapper: HeaderMapper,
    classifier: EntityClassifier,
    advisor: Option<Arc<dyn HeaderAdvisor>>,
}

impl Default for Alchemist {
    fn default() -> Self {
        Self::new()
    }
}

impl Alchemist {
    /// Create an Alchemist with default configuration and no advisor.
    pub fn new() -> Self {
        Self::with_config(AlchemistConfig::default())
    }

    /// Create an Alchemist with custom configuration.
    pub fn with_config(config: AlchemistConfig) -> Self {
        let mapper = HeaderMapper::with_config(config.mapper);
        Self {
            parser: Parser::with_config(config.parser.clone()),
            classifier: EntityClassifier::with_mapper(mapper.clone()),
            mapper,
            config,
            advisor: None,
        }
    }

    /// Add an advisor consulted while mapping headers.
    ///
    /// Without one, every decision is made by the deterministic mapper.
    pub fn with_advisor(self, advisor: impl HeaderAdvisor + 'static) -> Self {
        self.with_shared_advisor(Arc::new(advisor))
    }

    /// Add an advisor that is shared with other owners.
    pub fn with_shared_advisor(mut self, advisor: Arc<dyn HeaderAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Check if an advisor is configured.
    pub fn has_advisor(&self) -> bool {
        self.advisor.is_some()
    }

    /// Get the configuration.
    pub fn config(&self) -> &AlchemistConfig {
        &self.config
    }

    /// Parse an upload without ingesting it.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        self.parser.parse_file(path)
    }

    /// Decide which entity a header set represents.
    pub fn classify<S: AsRef<str>>(&self, headers: &[S]) -> Classification {
        self.classifier.classify_detailed(headers)
    }

    /// Map headers onto `entity`, consulting the advisor when one is set.
    pub fn map_headers<S: AsRef<str>>(&self, headers: &[S], entity: EntityType) -> MappingResult {
        match &self.advisor {
            Some(advisor) => self.mapper.map_with_advisor(headers, entity, advisor),
            None => self.mapper.map_headers(headers, entity),
        }
    }

    /// Parse a file and ingest it into `session`.
    pub fn ingest_file(&self, session: &mut Session, path: impl AsRef<Path>) -> Result<IngestOutcome> {
        let path = path.as_ref();
        let (table, source) = self.parser.parse_file(path)?;
        self.ingest_from(session, table, Some(source.file))
    }

    /// Classify, map and load one table.
    ///
    /// A table whose entity is clear is mapped and loaded straight away.
    /// Otherwise the advisor, if any, gets one chance to produce a convincing
    /// mapping; failing that the table is parked as a pending mapping with the
    /// best candidate found.
    pub fn ingest(&self, session: &mut Session, table: RawTable) -> Result<IngestOutcome> {
        self.ingest_from(session, table, None)
    }

    fn ingest_from(
        &self,
        session: &mut Session,
        table: RawTable,
        source: Option<String>,
    ) -> Result<IngestOutcome> {
        if table.is_empty() {
            return Err(AlchemistError::EmptyData(format!(
                "{} has no data rows",
                source.as_deref().unwrap_or("table")
            )));
        }

        let classification = self.classifier.classify_detailed(&table.headers);
        let mapping = match classification.method {
            ClassificationMethod::Keyword | ClassificationMethod::Similarity => {
                self.mapping_for(&table, classification)
            }
            ClassificationMethod::Unresolved => match self.advised_mapping(&table) {
                Ok(mapping) => mapping,
                Err(candidate) => {
                    let candidate = candidate.or(classification.candidate);
                    let id = session.add_pending(table, candidate.clone(), source);
                    info!("table parked for review as pending mapping {}", id);
                    return Ok(IngestOutcome::Pending { id, candidate });
                }
            },
        };

        let rows = remap_rows(&table.rows, &mapping.mapping);
        let count = rows.len();
        session.load_table(mapping.entity, rows);
        Ok(IngestOutcome::Applied {
            entity: mapping.entity,
            rows: count,
            mapping,
        })
    }

    /// Mapping for a table whose entity was decided by the classifier.
    fn mapping_for(&self, table: &RawTable, classification: Classification) -> MappingResult {
        let entity = classification.entity;
        match (&self.advisor, classification.candidate) {
            (None, Some(candidate)) if candidate.entity == entity => candidate,
            _ => self.map_headers(&table.headers, entity),
        }
    }

    /// Ask the advisor to rescue an unresolved table.
    ///
    /// Returns the best convincing mapping, or the best candidate seen when
    /// none convinces (`None` without an advisor).
    fn advised_mapping(
        &self,
        table: &RawTable,
    ) -> std::result::Result<MappingResult, Option<MappingResult>> {
        let Some(advisor) = &self.advisor else {
            return Err(None);
        };

        let best = EntityType::KNOWN
            .iter()
            .map(|entity| self.mapper.map_with_advisor(&table.headers, *entity, advisor))
            .fold(None, |best: Option<MappingResult>, result| match best {
                Some(b) if result.average_score <= b.average_score => Some(b),
                _ => Some(result),
            });
        let Some(best) = best else {
            return Err(None);
        };

        let needed = required_field_coverage(table.headers.len(), schema_for(best.entity).field_count());
        let convincing = best.average_score >= self.mapper.config().similarity_floor
            && best.distinct_fields() >= needed;
        debug!(
            "advised mapping: best {} avg {:.2}, {} fields (need {})",
            best.entity,
            best.average_score,
            best.distinct_fields(),
            needed
        );
        if convincing { Ok(best) } else { Err(Some(best)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::MockAdvisor;
    use crate::inference::{HeaderMapping, MappingSource};
    use crate::schema::Row;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn table(headers: &[&str], rows: &[&[Value]]) -> RawTable {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .iter()
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect::<Row>()
            })
            .collect();
        RawTable::new(headers, rows)
    }

    #[test]
    fn test_ingest_keyword_table() {
        let alchemist = Alchemist::new();
        let mut session = Session::new();
        let upload = table(
            &["Client ID", "Priority Level", "customer"],
            &[&[json!("C1"), json!("4"), json!("Acme")]],
        );
        let outcome = alchemist.ingest(&mut session, upload).unwrap();
        assert_eq!(outcome.entity(), Some(EntityType::Clients));
        let row = &session.data().clients()[0];
        assert_eq!(row["ClientID"], json!("C1"));
        assert_eq!(row["ClientName"], json!("Acme"));
    }

    #[test]
    fn test_ingest_similarity_table() {
        let alchemist = Alchemist::new();
        let mut session = Session::new();
        let upload = table(
            &["wid", "skillset", "phases"],
            &[&[json!("W1"), json!("coding"), json!("[1,2]")]],
        );
        let outcome = alchemist.ingest(&mut session, upload).unwrap();
        let IngestOutcome::Applied { entity, rows, .. } = outcome else {
            panic!("expected applied");
        };
        assert_eq!(entity, EntityType::Workers);
        assert_eq!(rows, 1);
        assert_eq!(session.data().workers()[0]["AvailableSlots"], json!("[1,2]"));
    }

    #[test]
    fn test_ingest_unknown_goes_pending() {
        let alchemist = Alchemist::new();
        let mut session = Session::new();
        let upload = table(&["foo", "bar"], &[&[json!(1), json!(2)]]);
        let outcome = alchemist.ingest(&mut session, upload).unwrap();
        assert!(outcome.is_pending());
        assert!(session.data().is_empty());

        let IngestOutcome::Pending { id, .. } = outcome else {
            unreachable!();
        };
        let assignments = HeaderMapping::from_assignments([("foo", "TaskID"), ("bar", "Duration")]);
        session.resolve_pending(id, EntityType::Tasks, &assignments).unwrap();
        assert_eq!(session.data().tasks()[0]["Duration"], json!(2));
    }

    #[test]
    fn test_advisor_rescues_unresolved_table() {
        let advisor = MockAdvisor::responding([
            ("foo", Some("TaskID")),
            ("bar", Some("Duration")),
            ("baz", Some("Category")),
            ("qux", Some("TaskName")),
        ]);
        let alchemist = Alchemist::new().with_advisor(advisor);
        let mut session = Session::new();
        let upload = table(
            &["foo", "bar", "baz", "qux"],
            &[&[json!("T1"), json!(3), json!("ops"), json!("Deploy")]],
        );

        let outcome = alchemist.ingest(&mut session, upload).unwrap();
        let IngestOutcome::Applied { entity, mapping, .. } = outcome else {
            panic!("expected applied");
        };
        assert_eq!(entity, EntityType::Tasks);
        assert_eq!(mapping.source, MappingSource::Advisor);
        assert_eq!(session.data().tasks()[0]["TaskID"], json!("T1"));
    }

    #[test]
    fn test_unconvincing_advice_stays_pending() {
        // Two of seven task fields: the advisor-only score stays under the floor.
        let advisor = MockAdvisor::responding([("foo", Some("TaskID")), ("bar", Some("Duration"))]);
        let alchemist = Alchemist::new().with_advisor(advisor);
        let mut session = Session::new();
        let upload = table(&["foo", "bar"], &[&[json!("T1"), json!(3)]]);

        let outcome = alchemist.ingest(&mut session, upload).unwrap();
        let IngestOutcome::Pending { candidate: Some(candidate), .. } = outcome else {
            panic!("expected pending with a candidate");
        };
        assert_eq!(candidate.entity, EntityType::Tasks);
        assert_eq!(candidate.source, MappingSource::Advisor);
        assert!(session.data().is_empty());
    }

    #[test]
    fn test_slow_advisor_falls_back() {
        let advisor = MockAdvisor::new()
            .with_config(AdvisorConfig::default().with_timeout(Duration::from_millis(20)))
            .with_delay(Duration::from_secs(2));
        let alchemist = Alchemist::new().with_advisor(advisor);
        let mut session = Session::new();
        let upload = table(&["TaskID", "Category", "Duration"], &[&[json!("T1"), json!("ops"), json!(1)]]);

        let outcome = alchemist.ingest(&mut session, upload).unwrap();
        let IngestOutcome::Applied { mapping, .. } = outcome else {
            panic!("expected applied");
        };
        assert_eq!(mapping.source, MappingSource::Deterministic);
        assert_eq!(mapping.mapped_count, 3);
    }

    #[test]
    fn test_empty_table_rejected() {
        let alchemist = Alchemist::new();
        let mut session = Session::new();
        let upload = RawTable::new(vec!["TaskID".to_string()], Vec::new());
        assert!(matches!(
            alchemist.ingest(&mut session, upload),
            Err(AlchemistError::EmptyData(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = AlchemistConfig::from_json_str(r#"{"mapper": {"similarity_floor": 0.7}}"#).unwrap();
        assert_eq!(config.mapper.similarity_floor, 0.7);
        assert_eq!(config.advisor, AdvisorConfig::default());
        assert!(AlchemistConfig::from_json_str("{not json").is_err());

        let alchemist = Alchemist::with_config(config.clone());
        assert_eq!(alchemist.config(), &config);
        assert!(!alchemist.has_advisor());
        assert!(alchemist.with_advisor(MockAdvisor::new()).has_advisor());
    }
}
