use helpers::geometry::Point2d;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    Street,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitDifficulty {
    Easy,
    Medium,
    Hard,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerKind {
    Left,
    Right,
    Chicane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClass {
    Slow,
    Medium,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    Grandstand,
    Pit,
    Paddock,
    Media,
    Safety,
}

/// * `time` - Lap record, e.g. 1:14.260
/// * `holder` - Driver holding the lap record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub time: String,
    pub holder: String,
}

/// * `min` - (m) Lowest point of the circuit
/// * `max` - (m) Highest point of the circuit
/// * `change` - (m) Total elevation change
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSummary {
    pub min: f64,
    pub max: f64,
    pub change: f64,
}

/// * `number` - Corner number, unique and increasing along the lap
/// * `name` - Corner name, e.g. Sainte Devote
/// * `kind` - Turning direction or chicane
/// * `angle` - (deg) Turning angle
/// * `banking` - (deg) Banking angle, 0 for a flat corner
/// * `speed` - Speed classification
/// * `difficulty` - Difficulty rank in [1, 5]
/// * `x`, `y` - Position in the track-local planar coordinate system
/// * `z` - (m) Elevation relative to the start/finish line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CornerKind,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub banking: f64,
    pub speed: SpeedClass,
    pub difficulty: u8,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Corner {
    pub fn position(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }
}

/// * `number` - Sector number
/// * `start`, `end` - First and last corner of the sector (1-based corner positions)
/// * `length` - Display length, e.g. 1.2 km
/// * `tags` - Free-text characteristics of the sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub number: u32,
    pub start: u32,
    pub end: u32,
    pub length: String,
    #[serde(default, alias = "characteristics")]
    pub tags: Vec<String>,
}

/// * `number` - DRS zone number
/// * `start`, `end` - Corner positions (1-based) enclosing the zone, start > end if the zone wraps
/// over the start/finish line
/// * `length` - (m) Length of the zone
/// * `detection` - Corner position (1-based) of the detection point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrsZone {
    pub number: u32,
    pub start: u32,
    pub end: u32,
    pub length: f64,
    pub detection: u32,
}

impl DrsZone {
    pub fn wraps(&self) -> bool {
        self.start > self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    #[serde(rename = "type")]
    pub kind: FacilityKind,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl Facility {
    pub fn position(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }
}

/// Circuit is one race track's full geometric and metadata record. The corner sequence is cyclic:
/// the last corner connects back to the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: String,
    pub name: String,
    pub location: String,
    pub country: String,
    #[serde(default)]
    pub flag: String,
    pub length: String,
    pub corner_count: u32,
    pub sector_count: u32,
    pub drs_zone_count: u32,
    pub lap_record: LapRecord,
    pub first_gp: u32,
    pub kind: CircuitKind,
    pub difficulty: CircuitDifficulty,
    #[serde(default)]
    pub elevation: ElevationSummary,
    #[serde(default)]
    pub corners: Vec<Corner>,
    #[serde(default)]
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub drs_zones: Vec<DrsZone>,
    #[serde(default)]
    pub facilities: Vec<Facility>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CircuitError {
    #[error("circuit id must not be empty")]
    EmptyId,
    #[error("corner numbers must increase along the lap, found {next} after {prev}")]
    CornerOrder { prev: u32, next: u32 },
    #[error("corner {corner} has difficulty {difficulty}, expected a value in [1, 5]")]
    CornerDifficulty { corner: u32, difficulty: u8 },
    #[error("corner {corner} has a non-finite coordinate")]
    NonFiniteCorner { corner: u32 },
    #[error("sector {sector} references corner {reference}, circuit has {corners} corners")]
    SectorReference {
        sector: u32,
        reference: u32,
        corners: usize,
    },
    #[error("sectors must cover the corners without gaps or overlaps, sector {sector} starts at {start} but {expected} was expected")]
    SectorCoverage {
        sector: u32,
        start: u32,
        expected: u32,
    },
    #[error("sectors end at corner {last}, circuit has {corners} corners")]
    SectorTail { last: u32, corners: usize },
    #[error("DRS zone {zone} references corner {reference}, circuit has {corners} corners")]
    DrsReference {
        zone: u32,
        reference: u32,
        corners: usize,
    },
}

impl Circuit {
    /// resolve_corner turns a 1-based corner position as used by sectors and DRS zones into an
    /// index into `corners`. Out-of-range positions resolve to None.
    pub fn resolve_corner(&self, position: u32) -> Option<usize> {
        let idx = (position as usize).checked_sub(1)?;
        if idx < self.corners.len() {
            Some(idx)
        } else {
            None
        }
    }

    /// resolve_drs_zone returns the zero-based [start, end] corner indices of a DRS zone.
    pub fn resolve_drs_zone(&self, zone: &DrsZone) -> Option<(usize, usize)> {
        Some((self.resolve_corner(zone.start)?, self.resolve_corner(zone.end)?))
    }

    pub fn corner_by_number(&self, number: u32) -> Option<&Corner> {
        self.corners.iter().find(|c| c.number == number)
    }

    /// sector_of returns the sector containing the corner at the given zero-based index.
    pub fn sector_of(&self, corner_idx: usize) -> Option<&Sector> {
        let position = corner_idx as u32 + 1;
        self.sectors
            .iter()
            .find(|s| s.start <= position && position <= s.end)
    }

    /// validate checks the load-time invariants of the circuit geometry.
    pub fn validate(&self) -> Result<(), CircuitError> {
        if self.id.trim().is_empty() {
            return Err(CircuitError::EmptyId);
        }

        for pair in self.corners.windows(2) {
            if pair[1].number <= pair[0].number {
                return Err(CircuitError::CornerOrder {
                    prev: pair[0].number,
                    next: pair[1].number,
                });
            }
        }

        for corner in self.corners.iter() {
            if !(1..=5).contains(&corner.difficulty) {
                return Err(CircuitError::CornerDifficulty {
                    corner: corner.number,
                    difficulty: corner.difficulty,
                });
            }
            if !(corner.x.is_finite() && corner.y.is_finite() && corner.z.is_finite()) {
                return Err(CircuitError::NonFiniteCorner {
                    corner: corner.number,
                });
            }
        }

        self.validate_sectors()?;

        for zone in self.drs_zones.iter() {
            for reference in [zone.start, zone.end, zone.detection] {
                if self.resolve_corner(reference).is_none() {
                    return Err(CircuitError::DrsReference {
                        zone: zone.number,
                        reference,
                        corners: self.corners.len(),
                    });
                }
            }
        }

        Ok(())
    }

    fn validate_sectors(&self) -> Result<(), CircuitError> {
        let mut expected_start = 1;

        for sector in self.sectors.iter() {
            for reference in [sector.start, sector.end] {
                if self.resolve_corner(reference).is_none() {
                    return Err(CircuitError::SectorReference {
                        sector: sector.number,
                        reference,
                        corners: self.corners.len(),
                    });
                }
            }
            if sector.start != expected_start || sector.end < sector.start {
                return Err(CircuitError::SectorCoverage {
                    sector: sector.number,
                    start: sector.start,
                    expected: expected_start,
                });
            }
            expected_start = sector.end + 1;
        }

        if let Some(last) = self.sectors.last() {
            if last.end as usize != self.corners.len() {
                return Err(CircuitError::SectorTail {
                    last: last.end,
                    corners: self.corners.len(),
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CircuitKind::Street => write!(f, "Street Circuit"),
            CircuitKind::Permanent => write!(f, "Permanent Circuit"),
        }
    }
}

impl FromStr for CircuitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "street" => Ok(CircuitKind::Street),
            "permanent" => Ok(CircuitKind::Permanent),
            _ => Err(format!("unknown circuit type '{}', use street or permanent", s)),
        }
    }
}

impl fmt::Display for CircuitDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            CircuitDifficulty::Easy => "Easy",
            CircuitDifficulty::Medium => "Medium",
            CircuitDifficulty::Hard => "Hard",
            CircuitDifficulty::Extreme => "Extreme",
        };
        write!(f, "{}", text)
    }
}

impl fmt::Display for CornerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            CornerKind::Left => "left",
            CornerKind::Right => "right",
            CornerKind::Chicane => "chicane",
        };
        write!(f, "{}", text)
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            SpeedClass::Slow => "slow",
            SpeedClass::Medium => "medium",
            SpeedClass::Fast => "fast",
        };
        write!(f, "{}", text)
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            FacilityKind::Grandstand => "grandstand",
            FacilityKind::Pit => "pit",
            FacilityKind::Paddock => "paddock",
            FacilityKind::Media => "media",
            FacilityKind::Safety => "safety",
        };
        write!(f, "{}", text)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn corner(number: u32, x: f64, y: f64) -> Corner {
        Corner {
            number,
            name: format!("Turn {}", number),
            kind: CornerKind::Right,
            angle: 90.0,
            banking: 0.0,
            speed: SpeedClass::Medium,
            difficulty: 3,
            x,
            y,
            z: 0.0,
        }
    }

    pub fn circuit(corners: Vec<Corner>) -> Circuit {
        Circuit {
            id: "test".to_owned(),
            name: "Test Circuit".to_owned(),
            location: "Nowhere".to_owned(),
            country: "Testland".to_owned(),
            flag: String::new(),
            length: "1.000 km".to_owned(),
            corner_count: corners.len() as u32,
            sector_count: 0,
            drs_zone_count: 0,
            lap_record: LapRecord {
                time: "1:00.000".to_owned(),
                holder: "Nobody".to_owned(),
            },
            first_gp: 2000,
            kind: CircuitKind::Permanent,
            difficulty: CircuitDifficulty::Medium,
            elevation: ElevationSummary::default(),
            corners,
            sectors: Vec::new(),
            drs_zones: Vec::new(),
            facilities: Vec::new(),
        }
    }

    /// Monaco-like layout: 19 corners, 3 sectors, one DRS zone wrapping from corner 19 to 1.
    pub fn monaco_like() -> Circuit {
        let corners = (1..=19)
            .map(|n| {
                let angle = n as f64 / 19.0 * std::f64::consts::TAU;
                corner(n, 50.0 * angle.cos(), 50.0 * angle.sin())
            })
            .collect();
        let mut circuit = circuit(corners);
        circuit.sectors = vec![
            Sector {
                number: 1,
                start: 1,
                end: 6,
                length: "1.2 km".to_owned(),
                tags: vec!["Uphill".to_owned()],
            },
            Sector {
                number: 2,
                start: 7,
                end: 12,
                length: "1.1 km".to_owned(),
                tags: Vec::new(),
            },
            Sector {
                number: 3,
                start: 13,
                end: 19,
                length: "1.0 km".to_owned(),
                tags: Vec::new(),
            },
        ];
        circuit.drs_zones = vec![DrsZone {
            number: 1,
            start: 19,
            end: 1,
            length: 650.0,
            detection: 18,
        }];
        circuit.facilities = vec![Facility {
            kind: FacilityKind::Grandstand,
            name: "Casino Grandstand".to_owned(),
            x: 35.0,
            y: 25.0,
            z: 8.0,
            capacity: Some(5000),
        }];
        circuit.sector_count = 3;
        circuit.drs_zone_count = 1;
        circuit
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn wrapping_drs_zone_resolves_to_zero_based_indices() {
        let circuit = monaco_like();
        let zone = &circuit.drs_zones[0];
        assert!(zone.wraps());
        assert_eq!(circuit.resolve_drs_zone(zone), Some((18, 0)));
        assert!(circuit.validate().is_ok());
    }

    #[test]
    fn out_of_range_references_do_not_resolve() {
        let circuit = monaco_like();
        assert_eq!(circuit.resolve_corner(0), None);
        assert_eq!(circuit.resolve_corner(20), None);
    }

    #[test]
    fn validate_rejects_unordered_corners() {
        let circuit = circuit(vec![corner(2, 0.0, 0.0), corner(1, 1.0, 1.0)]);
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::CornerOrder { prev: 2, next: 1 })
        );
    }

    #[test]
    fn validate_rejects_difficulty_outside_range() {
        let mut bad = corner(1, 0.0, 0.0);
        bad.difficulty = 6;
        let circuit = circuit(vec![bad]);
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::CornerDifficulty { corner: 1, difficulty: 6 })
        ));
    }

    #[test]
    fn validate_rejects_sector_gap() {
        let mut circuit = monaco_like();
        circuit.sectors[1].start = 8;
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::SectorCoverage { sector: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_dangling_drs_reference() {
        let mut circuit = monaco_like();
        circuit.drs_zones[0].start = 25;
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::DrsReference { reference: 25, .. })
        ));
    }

    #[test]
    fn single_corner_circuit_is_valid() {
        let circuit = circuit(vec![corner(1, 0.0, 0.0)]);
        assert!(circuit.validate().is_ok());
    }

    #[test]
    fn corner_json_uses_type_key() {
        let json = r#"{ "number": 1, "name": "Sainte Devote", "type": "right", "angle": 90,
            "banking": 0, "speed": "slow", "difficulty": 4, "x": 0, "y": 0, "z": 0 }"#;
        let corner: Corner = serde_json::from_str(json).unwrap();
        assert_eq!(corner.kind, CornerKind::Right);
        assert_eq!(corner.speed, SpeedClass::Slow);
    }

    #[test]
    fn sector_of_finds_containing_sector() {
        let circuit = monaco_like();
        assert_eq!(circuit.sector_of(0).map(|s| s.number), Some(1));
        assert_eq!(circuit.sector_of(18).map(|s| s.number), Some(3));
    }
}
