use crate::core::circuit::{Circuit, CircuitDifficulty, CircuitKind};
use anyhow::Context;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

const BUILTIN_CIRCUITS: &str = include_str!("../../data/circuits.json");

/// CircuitSource is the data source the viewer loads circuit geometry from.
pub trait CircuitSource {
    fn fetch(&self, id: &str) -> anyhow::Result<Circuit>;

    /// ids returns the identifiers of all circuits available from the source.
    fn ids(&self) -> Vec<String>;
}

/// Catalog holds validated circuits in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    circuits: Vec<Circuit>,
}

impl Catalog {
    /// builtin returns the catalog of the circuits shipped with the crate.
    pub fn builtin() -> anyhow::Result<Catalog> {
        let circuits: Vec<Circuit> = serde_json::from_str(BUILTIN_CIRCUITS)
            .context("Failed to parse built-in circuit catalog!")?;
        Catalog::from_circuits(circuits)
    }

    /// from_circuits validates the circuits and builds a catalog from them. A circuit with an id
    /// that is already present replaces the earlier one.
    pub fn from_circuits(circuits: Vec<Circuit>) -> anyhow::Result<Catalog> {
        let mut catalog = Catalog::default();
        for circuit in circuits {
            catalog.insert(circuit)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, circuit: Circuit) -> anyhow::Result<()> {
        circuit
            .validate()
            .context(format!("Circuit {} is invalid!", circuit.id))?;

        match self.circuits.iter_mut().find(|c| c.id == circuit.id) {
            Some(existing) => {
                debug!("Replacing circuit {}", circuit.id);
                *existing = circuit;
            }
            None => self.circuits.push(circuit),
        }
        Ok(())
    }

    /// extend_from_dir adds every *.json file in the directory to the catalog. Each file contains
    /// either a single circuit or an array of circuits.
    pub fn extend_from_dir(&mut self, dirpath: &Path) -> anyhow::Result<()> {
        let mut filepaths: Vec<_> = std::fs::read_dir(dirpath)
            .context(format!(
                "Failed to read catalog directory {}!",
                dirpath.display()
            ))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .collect();
        filepaths.sort();

        for filepath in filepaths.iter() {
            for circuit in read_circuit_file(filepath)? {
                self.insert(circuit)
                    .context(format!("Rejected circuit file {}!", filepath.display()))?;
            }
        }

        info!(
            "Loaded {} circuit file(s) from {}",
            filepaths.len(),
            dirpath.display()
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Circuit> {
        self.circuits.iter().find(|c| c.id == id)
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    pub fn by_kind(&self, kind: CircuitKind) -> Vec<&Circuit> {
        self.circuits.iter().filter(|c| c.kind == kind).collect()
    }

    pub fn by_difficulty(&self, difficulty: CircuitDifficulty) -> Vec<&Circuit> {
        self.circuits
            .iter()
            .filter(|c| c.difficulty == difficulty)
            .collect()
    }
}

impl CircuitSource for Catalog {
    fn fetch(&self, id: &str) -> anyhow::Result<Circuit> {
        self.get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Circuit {} is not in the catalog!", id))
    }

    fn ids(&self) -> Vec<String> {
        self.circuits.iter().map(|c| c.id.clone()).collect()
    }
}

/// read_circuit_file reads a JSON file holding one circuit or an array of circuits.
pub fn read_circuit_file(filepath: &Path) -> anyhow::Result<Vec<Circuit>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum CircuitFile {
        Many(Vec<Circuit>),
        One(Box<Circuit>),
    }

    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open circuit file {}!", filepath.display()))?;
    let parsed: CircuitFile = serde_json::from_reader(&fh)
        .context(format!("Failed to parse circuit file {}!", filepath.display()))?;

    Ok(match parsed {
        CircuitFile::Many(circuits) => circuits,
        CircuitFile::One(circuit) => vec![*circuit],
    })
}

/// MemorySource serves circuits from memory and can be told to fail, which is what the loader and
/// session tests need.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    circuits: HashMap<String, Circuit>,
    failure: Option<String>,
}

impl MemorySource {
    pub fn new(circuits: Vec<Circuit>) -> MemorySource {
        MemorySource {
            circuits: circuits.into_iter().map(|c| (c.id.clone(), c)).collect(),
            failure: None,
        }
    }

    /// failing returns a source whose every fetch fails with the given reason.
    pub fn failing(reason: &str) -> MemorySource {
        MemorySource {
            circuits: HashMap::new(),
            failure: Some(reason.to_owned()),
        }
    }
}

impl CircuitSource for MemorySource {
    fn fetch(&self, id: &str) -> anyhow::Result<Circuit> {
        if let Some(reason) = &self.failure {
            anyhow::bail!("{}", reason);
        }
        self.circuits
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Circuit {} is unknown!", id))
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.circuits.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::fixtures::{circuit, corner, monaco_like};

    #[test]
    fn builtin_catalog_loads_five_circuits() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.ids(),
            vec!["monaco", "silverstone", "spa", "suzuka", "interlagos"]
        );
        for c in catalog.circuits() {
            assert_eq!(c.corners.len(), c.corner_count as usize, "{}", c.id);
            assert_eq!(c.drs_zones.len(), c.drs_zone_count as usize, "{}", c.id);
        }
    }

    #[test]
    fn builtin_monaco_drs_wraps() {
        let catalog = Catalog::builtin().unwrap();
        let monaco = catalog.fetch("monaco").unwrap();
        assert_eq!(monaco.corners.len(), 19);
        assert_eq!(monaco.resolve_drs_zone(&monaco.drs_zones[0]), Some((18, 0)));
    }

    #[test]
    fn filters_by_kind_and_difficulty() {
        let catalog = Catalog::builtin().unwrap();
        let street: Vec<&str> = catalog
            .by_kind(CircuitKind::Street)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(street, vec!["monaco"]);
        assert_eq!(catalog.by_difficulty(CircuitDifficulty::Hard).len(), 3);
        assert!(catalog.by_difficulty(CircuitDifficulty::Easy).is_empty());
    }

    #[test]
    fn unknown_id_fails() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.fetch("imola").is_err());
    }

    #[test]
    fn invalid_circuit_is_rejected() {
        let mut c = circuit(vec![corner(2, 0.0, 0.0), corner(1, 1.0, 1.0)]);
        c.id = "broken".to_owned();
        let err = Catalog::from_circuits(vec![c]).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn same_id_replaces_entry() {
        let mut first = monaco_like();
        first.name = "first".to_owned();
        let mut second = monaco_like();
        second.name = "second".to_owned();

        let catalog = Catalog::from_circuits(vec![first, second]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.circuits()[0].name, "second");
    }

    #[test]
    fn reads_extra_circuits_from_dir() {
        let dirpath = std::env::temp_dir().join(format!("trackviz-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dirpath).unwrap();
        let mut extra = monaco_like();
        extra.id = "test_ring".to_owned();
        std::fs::write(
            dirpath.join("test_ring.json"),
            serde_json::to_string(&extra).unwrap(),
        )
        .unwrap();
        std::fs::write(dirpath.join("notes.txt"), "not a circuit").unwrap();

        let mut catalog = Catalog::builtin().unwrap();
        catalog.extend_from_dir(&dirpath).unwrap();
        let _ = std::fs::remove_dir_all(&dirpath);

        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.fetch("test_ring").unwrap().corners.len(), 19);
    }

    #[test]
    fn memory_source_failure() {
        let source = MemorySource::failing("network down");
        let err = source.fetch("monaco").unwrap_err();
        assert_eq!(err.to_string(), "network down");
        assert!(source.ids().is_empty());
    }
}
