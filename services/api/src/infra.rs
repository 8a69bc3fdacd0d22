use async_trait::async_trait;
use career_roadmap::config::{RecommendationConfig, SessionConfig};
use career_roadmap::error::AppError;
use career_roadmap::recommendations::{
    CandidateFields, CandidateScore, Category, CategoryLookups, DetailLookup, LookupError,
    RecommendationService,
};
use career_roadmap::roadmap::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, RoadmapSession, SessionStore,
    SharedRoadmapSession,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type DynStore = Arc<dyn KeyValueStore>;

pub(crate) fn open_store(config: &SessionConfig) -> Result<DynStore, AppError> {
    match &config.directory {
        Some(directory) => Ok(Arc::new(FileKeyValueStore::open(directory)?)),
        None => Ok(Arc::new(InMemoryKeyValueStore::new())),
    }
}

pub(crate) fn open_session(
    config: &SessionConfig,
) -> Result<SharedRoadmapSession<DynStore>, AppError> {
    let store = open_store(config)?;
    let session = RoadmapSession::open(SessionStore::with_key(store, config.key.clone()));
    Ok(Arc::new(Mutex::new(session)))
}

/// One catalog row as stored in the JSON catalog file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogEntry {
    pub(crate) id: u32,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CandidateCatalog {
    #[serde(default)]
    pub(crate) streams: Vec<CatalogEntry>,
    #[serde(default)]
    pub(crate) exams: Vec<CatalogEntry>,
    #[serde(default)]
    pub(crate) jobs: Vec<CatalogEntry>,
}

impl CandidateCatalog {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub(crate) fn load(config: &RecommendationConfig) -> Result<Self, AppError> {
        match &config.catalog_path {
            Some(path) => Self::from_path(path),
            None => Ok(demo_catalog()),
        }
    }

    fn entries(&self, category: Category) -> &[CatalogEntry] {
        match category {
            Category::Streams => &self.streams,
            Category::Exams => &self.exams,
            Category::Jobs => &self.jobs,
        }
    }

    pub(crate) fn lookups(&self) -> CategoryLookups {
        CategoryLookups {
            streams: Arc::new(StaticCatalogLookup::new(self, Category::Streams)),
            exams: Arc::new(StaticCatalogLookup::new(self, Category::Exams)),
            jobs: Arc::new(StaticCatalogLookup::new(self, Category::Jobs)),
        }
    }
}

/// In-process stand-in for the remote detail endpoints.
#[derive(Debug, Clone, Default)]
pub(crate) struct StaticCatalogLookup {
    entries: HashMap<u32, CandidateFields>,
}

impl StaticCatalogLookup {
    pub(crate) fn new(catalog: &CandidateCatalog, category: Category) -> Self {
        let entries = catalog
            .entries(category)
            .iter()
            .map(|entry| {
                (
                    entry.id,
                    CandidateFields {
                        name: entry.name.clone(),
                        attributes: entry.attributes.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

#[async_trait]
impl DetailLookup for StaticCatalogLookup {
    async fn lookup(&self, id: u32) -> Result<CandidateFields, LookupError> {
        self.entries.get(&id).cloned().ok_or(LookupError::NotFound(id))
    }
}

pub(crate) fn recommendation_service(
    config: &RecommendationConfig,
) -> Result<RecommendationService, AppError> {
    let catalog = CandidateCatalog::load(config)?;
    Ok(RecommendationService::new(catalog.lookups(), config.aggregator()))
}

fn entry(id: u32, name: &str, attributes: &[(&str, &str)]) -> CatalogEntry {
    CatalogEntry {
        id,
        name: name.to_string(),
        attributes: attributes
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    }
}

pub(crate) fn demo_catalog() -> CandidateCatalog {
    CandidateCatalog {
        streams: vec![
            entry(1, "Science (PCM)", &[("subjects", "Physics, Chemistry, Mathematics")]),
            entry(2, "Science (PCB)", &[("subjects", "Physics, Chemistry, Biology")]),
            entry(3, "Commerce", &[("subjects", "Accountancy, Economics, Business Studies")]),
            entry(4, "Humanities", &[("subjects", "History, Political Science, Sociology")]),
        ],
        exams: vec![
            entry(30, "JEE Main", &[("level", "national")]),
            entry(31, "NEET UG", &[("level", "national")]),
            entry(32, "CUET UG", &[("level", "national")]),
            entry(33, "CLAT", &[("level", "national")]),
        ],
        jobs: vec![
            entry(501, "Software Engineer", &[("salary_type", "annual"), ("salary_range", "6-18 LPA")]),
            entry(502, "Chartered Accountant", &[("salary_type", "annual"), ("salary_range", "7-15 LPA")]),
            entry(503, "Civil Services Officer", &[("salary_type", "monthly"), ("salary_range", "56,100-2,50,000")]),
            entry(504, "Doctor (MBBS)", &[("salary_type", "annual"), ("salary_range", "8-20 LPA")]),
        ],
    }
}

pub(crate) fn parse_score(raw: &str) -> Result<CandidateScore, String> {
    let (id, score) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=SCORE, got '{raw}'"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid candidate id in '{raw}' ({err})"))?;
    let score = score
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid score in '{raw}' ({err})"))?;
    Ok(CandidateScore { id, score })
}

pub(crate) fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse::<Category>().map_err(|err| err.to_string())
}
