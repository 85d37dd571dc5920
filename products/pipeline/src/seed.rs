//! Demo board shown on first launch.

use chrono::NaiveDate;

use crate::board::PipelineBoard;
use crate::model::{Contact, ContactId, Deal, DealId, Stage, StageId};
use crate::probability::{CLOSED_LOST, CLOSED_WON, LEAD, NEGOTIATION, PROPOSAL, QUALIFIED};

struct SeedDeal {
    id: &'static str,
    title: &'static str,
    value: f64,
    probability: u8,
    contact: (&'static str, &'static str, &'static str),
    due: (i32, u32, u32),
    created: (i32, u32, u32),
    last_activity: (i32, u32, u32),
    description: &'static str,
}

const STAGES: [(&str, &str, &str); 6] = [
    ("1", LEAD, "bg-yellow-500"),
    ("2", QUALIFIED, "bg-blue-500"),
    ("3", PROPOSAL, "bg-indigo-500"),
    ("4", NEGOTIATION, "bg-purple-500"),
    ("5", CLOSED_WON, "bg-green-500"),
    ("6", CLOSED_LOST, "bg-red-500"),
];

fn seed_deals(stage: &str) -> Vec<SeedDeal> {
    match stage {
        LEAD => vec![
            SeedDeal {
                id: "deal1",
                title: "Software License Renewal",
                value: 25_000.0,
                probability: 20,
                contact: ("1", "John Doe", "Acme Inc."),
                due: (2023, 7, 15),
                created: (2023, 6, 1),
                last_activity: (2023, 6, 10),
                description: "Annual software license renewal for enterprise customers.",
            },
            SeedDeal {
                id: "deal2",
                title: "Hardware Upgrade Project",
                value: 45_000.0,
                // hand-set; recomputed only once the deal moves
                probability: 15,
                contact: ("2", "Jane Smith", "Globex Corp"),
                due: (2023, 7, 30),
                created: (2023, 6, 5),
                last_activity: (2023, 6, 12),
                description: "Complete hardware upgrade for their development team.",
            },
        ],
        QUALIFIED => vec![SeedDeal {
            id: "deal3",
            title: "Cloud Migration Services",
            value: 75_000.0,
            probability: 40,
            contact: ("3", "Robert Johnson", "Initech"),
            due: (2023, 8, 10),
            created: (2023, 5, 20),
            last_activity: (2023, 6, 15),
            description: "Migration of on-premise infrastructure to cloud platform.",
        }],
        PROPOSAL => vec![SeedDeal {
            id: "deal4",
            title: "Cybersecurity Assessment",
            value: 35_000.0,
            probability: 60,
            contact: ("4", "Sarah Williams", "Massive Dynamic"),
            due: (2023, 7, 5),
            created: (2023, 5, 15),
            last_activity: (2023, 6, 8),
            description: "Comprehensive security assessment and recommendations.",
        }],
        NEGOTIATION => vec![SeedDeal {
            id: "deal5",
            title: "Enterprise CRM Implementation",
            value: 120_000.0,
            probability: 80,
            contact: ("5", "Michael Brown", "Stark Industries"),
            due: (2023, 6, 30),
            created: (2023, 4, 10),
            last_activity: (2023, 6, 18),
            description: "Full CRM implementation across all departments.",
        }],
        CLOSED_WON => vec![SeedDeal {
            id: "deal6",
            title: "Data Analytics Platform",
            value: 95_000.0,
            probability: 100,
            contact: ("6", "Emily Davis", "Wayne Enterprises"),
            due: (2023, 5, 30),
            created: (2023, 3, 15),
            last_activity: (2023, 5, 25),
            description: "Implementation of enterprise data analytics platform.",
        }],
        _ => Vec::new(),
    }
}

fn date((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date")
}

impl SeedDeal {
    fn into_deal(self, stage: &str) -> Deal {
        let (contact_id, name, company) = self.contact;
        Deal {
            id: DealId::new(self.id),
            title: self.title.to_string(),
            value: self.value,
            stage: stage.to_string(),
            probability: self.probability,
            contact: Contact {
                id: ContactId::new(contact_id),
                name: name.to_string(),
                company: company.to_string(),
            },
            due_date: Some(date(self.due)),
            created_date: date(self.created),
            last_activity: Some(date(self.last_activity)),
            description: Some(self.description.to_string()),
        }
    }
}

impl PipelineBoard {
    /// The six default stages with their sample deals.
    pub fn demo() -> Self {
        let stages = STAGES
            .iter()
            .map(|(id, name, color)| {
                let mut stage = Stage::new(StageId::new(*id), *name, *color);
                stage.deals = seed_deals(name)
                    .into_iter()
                    .map(|seed| seed.into_deal(name))
                    .collect();
                stage
            })
            .collect();
        Self { stages }
    }
}
