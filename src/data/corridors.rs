//! Static corridor data for São Paulo traffic monitoring
//!
//! Each zone of the city is represented by one arterial road with a fixed
//! origin, destination and reference length.

use super::{Corridor, Zone};

/// Static array of all monitored corridors, one per zone
pub static CORRIDORS: [Corridor; 5] = [
    Corridor {
        zone: Zone::South,
        name: "Av. 23 de Maio",
        distance_km: 5.5,
        start: (-23.5786, -46.6549),
        end: (-23.5489, -46.6325),
    },
    Corridor {
        zone: Zone::West,
        name: "Marginal Pinheiros",
        distance_km: 8.0,
        start: (-23.5862, -46.7118),
        end: (-23.5559, -46.6908),
    },
    Corridor {
        zone: Zone::East,
        name: "Radial Leste",
        distance_km: 7.0,
        start: (-23.5430, -46.5740),
        end: (-23.5448, -46.6198),
    },
    Corridor {
        zone: Zone::North,
        name: "Marginal Tietê",
        distance_km: 6.5,
        start: (-23.5246, -46.6811),
        end: (-23.5242, -46.6235),
    },
    Corridor {
        zone: Zone::Center,
        name: "Av. Paulista",
        distance_km: 2.8,
        start: (-23.5714, -46.6412),
        end: (-23.5526, -46.6642),
    },
];

/// Returns all monitored corridors
pub fn all_corridors() -> &'static [Corridor] {
    &CORRIDORS
}

/// Get the corridor monitoring a zone
pub fn get_corridor_by_zone(zone: Zone) -> Option<&'static Corridor> {
    CORRIDORS.iter().find(|corridor| corridor.zone == zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_one_corridor_per_zone() {
        let zones: HashSet<Zone> = all_corridors().iter().map(|c| c.zone).collect();
        assert_eq!(zones.len(), 5);
        for zone in [Zone::North, Zone::South, Zone::East, Zone::West, Zone::Center] {
            assert!(get_corridor_by_zone(zone).is_some(), "missing {:?}", zone);
        }
    }

    #[test]
    fn test_reference_distances() {
        assert!((get_corridor_by_zone(Zone::South).unwrap().distance_km - 5.5).abs() < 0.001);
        assert!((get_corridor_by_zone(Zone::Center).unwrap().distance_km - 2.8).abs() < 0.001);
    }

    #[test]
    fn test_coordinates_within_sao_paulo() {
        for corridor in all_corridors() {
            for (lat, lon) in [corridor.start, corridor.end] {
                assert!((-23.8..=-23.3).contains(&lat), "{} lat {}", corridor.name, lat);
                assert!((-46.9..=-46.3).contains(&lon), "{} lon {}", corridor.name, lon);
            }
        }
    }
}
