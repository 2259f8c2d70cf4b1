use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// ImageStrategy is one way of finding an image for a subject (a circuit or a driver name).
/// Ok(None) means the strategy has no image for the subject, Err means the lookup itself failed.
pub trait ImageStrategy {
    fn name(&self) -> &str;
    fn lookup(&self, subject: &str) -> anyhow::Result<Option<String>>;
}

/// CuratedImages maps known subjects to fixed image URLs.
#[derive(Debug, Clone, Default)]
pub struct CuratedImages {
    images: HashMap<String, String>,
}

impl CuratedImages {
    pub fn new(images: HashMap<String, String>) -> CuratedImages {
        CuratedImages { images }
    }
}

impl ImageStrategy for CuratedImages {
    fn name(&self) -> &str {
        "curated"
    }

    fn lookup(&self, subject: &str) -> anyhow::Result<Option<String>> {
        Ok(self.images.get(subject).cloned())
    }
}

/// LocalImages looks for `<slug>.png` or `<slug>.jpg` in a directory, the slug being the subject
/// in lowercase with every run of non-alphanumeric characters replaced by a single '-'.
#[derive(Debug, Clone)]
pub struct LocalImages {
    dirpath: PathBuf,
}

impl LocalImages {
    pub fn new(dirpath: PathBuf) -> LocalImages {
        LocalImages { dirpath }
    }
}

fn slug(subject: &str) -> String {
    let mut out = String::with_capacity(subject.len());
    for ch in subject.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_owned()
}

impl ImageStrategy for LocalImages {
    fn name(&self) -> &str {
        "local"
    }

    fn lookup(&self, subject: &str) -> anyhow::Result<Option<String>> {
        if !self.dirpath.is_dir() {
            anyhow::bail!("Image directory {} does not exist!", self.dirpath.display());
        }
        let stem = slug(subject);
        for ext in ["png", "jpg"] {
            let filepath = self.dirpath.join(format!("{}.{}", stem, ext));
            if filepath.is_file() {
                return Ok(Some(filepath.display().to_string()));
            }
        }
        Ok(None)
    }
}

/// ImageConfig configures the resolver: an optional local image directory searched first, the
/// curated table and the fallback returned when nothing matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub local_dir: Option<PathBuf>,
    pub curated: HashMap<String, String>,
    pub fallback: String,
}

const PEXELS: &str = "https://images.pexels.com/photos";

fn pexels(id: &str, width: u32) -> String {
    format!(
        "{}/{}/pexels-photo-{}.jpeg?auto=compress&cs=tinysrgb&w={}",
        PEXELS, id, id, width
    )
}

impl Default for ImageConfig {
    fn default() -> Self {
        let curated = [
            ("Monaco Grand Prix", "8962877"),
            ("Silverstone Circuit", "163407"),
            ("Spa-Francorchamps", "1007410"),
            ("Suzuka Circuit", "12799780"),
            ("Interlagos", "8813455"),
        ]
        .iter()
        .map(|(name, id)| (name.to_string(), pexels(id, 1200)))
        .collect();

        ImageConfig {
            local_dir: None,
            curated,
            fallback: pexels("8962877", 1200),
        }
    }
}

/// ImageResolver asks its strategies in order and memoizes the answer per subject. It never fails:
/// a subject no strategy can serve resolves to the fallback image.
pub struct ImageResolver {
    strategies: Vec<Box<dyn ImageStrategy + Send + Sync>>,
    fallback: String,
    cache: HashMap<String, String>,
}

impl ImageResolver {
    pub fn new(strategies: Vec<Box<dyn ImageStrategy + Send + Sync>>, fallback: String) -> Self {
        ImageResolver {
            strategies,
            fallback,
            cache: HashMap::new(),
        }
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        let mut strategies: Vec<Box<dyn ImageStrategy + Send + Sync>> = Vec::new();
        if let Some(dirpath) = &config.local_dir {
            strategies.push(Box::new(LocalImages::new(dirpath.clone())));
        }
        strategies.push(Box::new(CuratedImages::new(config.curated.clone())));
        ImageResolver::new(strategies, config.fallback.clone())
    }

    pub fn resolve(&mut self, subject: &str) -> String {
        if let Some(hit) = self.cache.get(subject) {
            return hit.clone();
        }

        let mut found = None;
        for strategy in self.strategies.iter() {
            match strategy.lookup(subject) {
                Ok(Some(image)) => {
                    debug!("Image for {} from {} strategy", subject, strategy.name());
                    found = Some(image);
                    break;
                }
                Ok(None) => {}
                Err(e) => warn!("Image strategy {} failed for {}: {:#}", strategy.name(), subject, e),
            }
        }

        let image = found.unwrap_or_else(|| self.fallback.clone());
        self.cache.insert(subject.to_owned(), image.clone());
        image
    }

    /// preload resolves all subjects so later lookups hit the cache.
    pub fn preload<'a, I: IntoIterator<Item = &'a str>>(&mut self, subjects: I) {
        for subject in subjects {
            self.resolve(subject);
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
