//! Collection zones and their weekly pickup schedule

use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    Wet,
    Dry,
    Both,
}

/// Weekly pattern shared by every zone
const WEEK: [(&str, WasteType); 6] = [
    ("Monday", WasteType::Wet),
    ("Tuesday", WasteType::Dry),
    ("Wednesday", WasteType::Wet),
    ("Thursday", WasteType::Dry),
    ("Friday", WasteType::Both),
    ("Saturday", WasteType::Wet),
];

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

struct ZoneDef {
    name: &'static str,
    areas: [&'static str; 4],
    window: &'static str,
}

const ZONES: [ZoneDef; 10] = [
    ZoneDef {
        name: "Dharampeth Zone",
        areas: ["Dharampeth", "Seminary Hills", "Law College Square", "Bajaj Nagar"],
        window: "6:00 AM - 9:00 AM",
    },
    ZoneDef {
        name: "Hanuman Nagar Zone",
        areas: ["Hanuman Nagar", "Pratap Nagar", "Manewada", "Trimurti Nagar"],
        window: "7:00 AM - 10:00 AM",
    },
    ZoneDef {
        name: "Dhantoli Zone",
        areas: ["Dhantoli", "Ramdaspeth", "Civil Lines", "Sadar"],
        window: "6:30 AM - 9:30 AM",
    },
    ZoneDef {
        name: "Nehru Nagar Zone",
        areas: ["Nehru Nagar", "Gayatri Nagar", "Rahate Colony", "Wardhaman Nagar"],
        window: "7:30 AM - 10:30 AM",
    },
    ZoneDef {
        name: "Sataranjipura Zone",
        areas: ["Sataranjipura", "Mominpura", "Gandhibagh", "Itwari"],
        window: "6:00 AM - 9:00 AM",
    },
    ZoneDef {
        name: "Lakadganj Zone",
        areas: ["Lakadganj", "Pardi", "Satranjipura", "Tajbagh"],
        window: "6:30 AM - 9:30 AM",
    },
    ZoneDef {
        name: "Ashi Nagar Zone",
        areas: ["Ashi Nagar", "Jaripatka", "Indora", "Kalamna"],
        window: "7:00 AM - 10:00 AM",
    },
    ZoneDef {
        name: "Mangalwari Zone",
        areas: ["Mangalwari", "Mahal", "Punapur", "Sitabuldi"],
        window: "6:00 AM - 9:00 AM",
    },
    ZoneDef {
        name: "Gandhibagh Zone",
        areas: ["Gandhibagh", "Cotton Market", "Maskasath", "Khamla"],
        window: "7:30 AM - 10:30 AM",
    },
    ZoneDef {
        name: "Laxmi Nagar Zone",
        areas: ["Laxmi Nagar", "Mankapur", "Friends Colony", "Narendra Nagar"],
        window: "6:30 AM - 9:30 AM",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct Pickup {
    pub day: &'static str,
    pub time: &'static str,
    #[serde(rename = "type")]
    pub waste_type: WasteType,
}

#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub id: usize,
    pub name: &'static str,
    pub areas: Vec<&'static str>,
    pub schedule: Vec<Pickup>,
}

/// Every zone, optionally narrowed to the pickups of one weekday
///
/// Day names match case-insensitively. Sunday is a valid day with no pickups.
pub fn zones(day: Option<&str>) -> Result<Vec<Zone>, ApiError> {
    let day = match day.map(str::trim).filter(|d| !d.is_empty()) {
        Some(requested) => Some(
            DAYS.iter()
                .copied()
                .find(|d| d.eq_ignore_ascii_case(requested))
                .ok_or_else(|| ApiError::Validation(format!("Unknown day: {}", requested)))?,
        ),
        None => None,
    };

    let zones = ZONES
        .iter()
        .enumerate()
        .map(|(index, zone)| Zone {
            id: index + 1,
            name: zone.name,
            areas: zone.areas.to_vec(),
            schedule: WEEK
                .iter()
                .filter(|(d, _)| day.is_none_or(|wanted| wanted == *d))
                .map(|&(day, waste_type)| Pickup {
                    day,
                    time: zone.window,
                    waste_type,
                })
                .collect(),
        })
        .collect();

    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_week() {
        let zones = zones(None).unwrap();
        assert_eq!(zones.len(), 10);
        assert!(zones.iter().all(|z| z.schedule.len() == 6));
        assert_eq!(zones[0].id, 1);
        assert_eq!(zones[3].schedule[0].time, "7:30 AM - 10:30 AM");
    }

    #[test]
    fn test_filter_by_day() {
        let zones = zones(Some("friday")).unwrap();
        for zone in &zones {
            assert_eq!(zone.schedule.len(), 1);
            assert_eq!(zone.schedule[0].day, "Friday");
            assert_eq!(zone.schedule[0].waste_type, WasteType::Both);
        }

        let sunday = super::zones(Some("Sunday")).unwrap();
        assert!(sunday.iter().all(|z| z.schedule.is_empty()));
    }

    #[test]
    fn test_unknown_day_is_rejected() {
        assert!(matches!(zones(Some("Funday")), Err(ApiError::Validation(_))));
    }
}
