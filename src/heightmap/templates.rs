//! Named heightmap templates
//!
//! A template is an ordered list of elevation operations; running one
//! against a fresh grid produces a characteristic map shape. Parameter
//! spans are resolved through the seeded RNG at execution time, so one
//! template yields a family of related maps.

use super::{Axis, HeightRange, Operation, Span};

/// A named, ordered list of heightmap operations
#[derive(Debug, Clone, Copy)]
pub struct Template {
    /// Template name as referenced from the configuration
    pub name: &'static str,
    /// Operations, applied in order
    pub operations: &'static [Operation],
}

/// Template used when the configured name is unknown
pub const DEFAULT_TEMPLATE: &str = "continents";

/// Template whose lagoons are left alone by the lake post-processor
pub const ATOLL_TEMPLATE: &str = "atoll";

const fn hill(count: Span, height: Span, range_x: Span, range_y: Span) -> Operation {
    Operation::Hill {
        count,
        height,
        range_x,
        range_y,
    }
}

const fn pit(count: Span, height: Span, range_x: Span, range_y: Span) -> Operation {
    Operation::Pit {
        count,
        height,
        range_x,
        range_y,
    }
}

const fn range(count: Span, height: Span, range_x: Span, range_y: Span) -> Operation {
    Operation::Range {
        count,
        height,
        range_x,
        range_y,
    }
}

const fn trough(count: Span, height: Span, range_x: Span, range_y: Span) -> Operation {
    Operation::Trough {
        count,
        height,
        range_x,
        range_y,
    }
}

const fn span(min: f64, max: f64) -> Span {
    Span::new(min, max)
}

const fn one(value: f64) -> Span {
    Span::fixed(value)
}

const VOLCANO: Template = Template {
    name: "volcano",
    operations: &[
        hill(one(1.0), span(90.0, 100.0), span(44.0, 56.0), span(40.0, 60.0)),
        Operation::Multiply {
            factor: 0.8,
            range: HeightRange::Between { min: 50, max: 100 },
        },
        range(one(1.5), span(30.0, 55.0), span(45.0, 55.0), span(40.0, 60.0)),
        Operation::Smooth { force: 3.0 },
        hill(one(1.5), span(25.0, 35.0), span(25.0, 30.0), span(20.0, 75.0)),
        hill(one(1.0), span(25.0, 35.0), span(75.0, 80.0), span(25.0, 75.0)),
        hill(one(0.5), span(20.0, 25.0), span(10.0, 15.0), span(20.0, 25.0)),
        Operation::Mask { power: 3.0 },
    ],
};

const HIGH_ISLAND: Template = Template {
    name: "high-island",
    operations: &[
        hill(one(1.0), span(90.0, 100.0), span(65.0, 75.0), span(47.0, 53.0)),
        Operation::Add {
            value: 7.0,
            range: HeightRange::All,
        },
        hill(span(5.0, 6.0), span(20.0, 30.0), span(25.0, 55.0), span(45.0, 55.0)),
        range(one(1.0), span(40.0, 50.0), span(45.0, 60.0), span(45.0, 63.0)),
        Operation::Mask { power: 4.0 },
        Operation::Smooth { force: 2.0 },
        trough(span(2.0, 3.0), span(20.0, 30.0), span(20.0, 30.0), span(20.0, 30.0)),
        trough(span(2.0, 3.0), span(20.0, 30.0), span(60.0, 80.0), span(70.0, 80.0)),
        hill(one(1.0), span(10.0, 15.0), one(60.0), one(50.0)),
        hill(one(1.5), span(13.0, 16.0), span(15.0, 20.0), span(20.0, 75.0)),
        Operation::Multiply {
            factor: 0.8,
            range: HeightRange::Between { min: 20, max: 100 },
        },
        range(one(1.5), span(30.0, 40.0), span(15.0, 85.0), span(30.0, 40.0)),
        range(one(1.5), span(30.0, 40.0), span(15.0, 85.0), span(60.0, 70.0)),
        pit(span(2.0, 3.0), span(10.0, 15.0), span(15.0, 85.0), span(20.0, 80.0)),
    ],
};

const LOW_ISLAND: Template = Template {
    name: "low-island",
    operations: &[
        hill(one(1.0), span(90.0, 99.0), span(60.0, 80.0), span(45.0, 55.0)),
        hill(span(4.0, 5.0), span(25.0, 35.0), span(20.0, 65.0), span(40.0, 60.0)),
        range(one(1.0), span(40.0, 50.0), span(45.0, 55.0), span(45.0, 55.0)),
        Operation::Smooth { force: 3.0 },
        trough(one(1.5), span(20.0, 30.0), span(15.0, 85.0), span(20.0, 30.0)),
        trough(one(1.5), span(20.0, 30.0), span(15.0, 85.0), span(70.0, 80.0)),
        hill(one(1.5), span(10.0, 15.0), span(5.0, 15.0), span(20.0, 80.0)),
        hill(one(1.0), span(10.0, 15.0), span(85.0, 95.0), span(70.0, 80.0)),
        pit(span(3.0, 5.0), span(10.0, 15.0), span(15.0, 85.0), span(20.0, 80.0)),
        Operation::Multiply {
            factor: 0.4,
            range: HeightRange::Between { min: 20, max: 100 },
        },
        Operation::Mask { power: 4.0 },
    ],
};

const CONTINENTS: Template = Template {
    name: "continents",
    operations: &[
        hill(one(1.0), span(80.0, 85.0), span(75.0, 80.0), span(40.0, 60.0)),
        hill(one(1.0), span(80.0, 85.0), span(20.0, 25.0), span(40.0, 60.0)),
        Operation::Multiply {
            factor: 0.22,
            range: HeightRange::Between { min: 20, max: 100 },
        },
        hill(span(5.0, 6.0), span(15.0, 20.0), span(25.0, 75.0), span(20.0, 82.0)),
        range(one(0.8), span(30.0, 60.0), span(5.0, 15.0), span(20.0, 45.0)),
        range(one(0.8), span(30.0, 60.0), span(85.0, 95.0), span(20.0, 45.0)),
        range(span(0.0, 3.0), span(30.0, 60.0), span(80.0, 90.0), span(20.0, 80.0)),
        trough(span(3.0, 4.0), span(15.0, 20.0), span(15.0, 85.0), span(20.0, 80.0)),
        Operation::Strait {
            width: one(2.0),
            vertical: true,
        },
        Operation::Smooth { force: 2.0 },
        trough(span(1.0, 2.0), span(5.0, 10.0), span(45.0, 55.0), span(45.0, 55.0)),
        pit(span(3.0, 4.0), span(10.0, 15.0), span(15.0, 85.0), span(20.0, 80.0)),
        Operation::Mask { power: 4.0 },
    ],
};

const ARCHIPELAGO: Template = Template {
    name: "archipelago",
    operations: &[
        Operation::Add {
            value: 11.0,
            range: HeightRange::All,
        },
        range(span(2.0, 3.0), span(40.0, 60.0), span(20.0, 80.0), span(20.0, 80.0)),
        hill(one(5.0), span(15.0, 20.0), span(10.0, 90.0), span(30.0, 70.0)),
        hill(one(2.0), span(10.0, 15.0), span(10.0, 30.0), span(20.0, 80.0)),
        hill(one(2.0), span(10.0, 15.0), span(60.0, 90.0), span(20.0, 80.0)),
        Operation::Smooth { force: 3.0 },
        trough(one(10.0), span(20.0, 30.0), span(5.0, 95.0), span(5.0, 95.0)),
        Operation::Strait {
            width: one(2.0),
            vertical: true,
        },
        Operation::Strait {
            width: one(2.0),
            vertical: false,
        },
    ],
};

const ATOLL: Template = Template {
    name: "atoll",
    operations: &[
        hill(one(1.0), span(75.0, 80.0), span(50.0, 60.0), span(45.0, 55.0)),
        hill(one(1.5), span(30.0, 50.0), span(25.0, 75.0), span(30.0, 70.0)),
        hill(one(0.5), span(30.0, 50.0), span(25.0, 35.0), span(30.0, 70.0)),
        Operation::Smooth { force: 1.0 },
        Operation::Multiply {
            factor: 0.2,
            range: HeightRange::Between { min: 25, max: 100 },
        },
        hill(one(0.5), span(10.0, 20.0), span(50.0, 55.0), span(48.0, 52.0)),
    ],
};

const MEDITERRANEAN: Template = Template {
    name: "mediterranean",
    operations: &[
        range(span(3.0, 4.0), span(30.0, 50.0), span(0.0, 100.0), span(0.0, 10.0)),
        range(span(3.0, 4.0), span(30.0, 50.0), span(0.0, 100.0), span(90.0, 100.0)),
        hill(span(5.0, 6.0), span(30.0, 70.0), span(0.0, 100.0), span(0.0, 5.0)),
        hill(span(5.0, 6.0), span(30.0, 70.0), span(0.0, 100.0), span(95.0, 100.0)),
        Operation::Smooth { force: 1.0 },
        hill(span(2.0, 3.0), span(30.0, 70.0), span(0.0, 5.0), span(20.0, 80.0)),
        hill(span(2.0, 3.0), span(30.0, 70.0), span(95.0, 100.0), span(20.0, 80.0)),
        Operation::Multiply {
            factor: 0.8,
            range: HeightRange::Land,
        },
        Operation::Mask { power: -2.0 },
    ],
};

const PENINSULA: Template = Template {
    name: "peninsula",
    operations: &[
        range(span(2.0, 3.0), span(20.0, 35.0), span(40.0, 50.0), span(0.0, 15.0)),
        Operation::Add {
            value: 5.0,
            range: HeightRange::All,
        },
        hill(one(1.0), span(90.0, 100.0), span(10.0, 90.0), span(0.0, 5.0)),
        Operation::Add {
            value: 13.0,
            range: HeightRange::All,
        },
        hill(span(3.0, 4.0), span(3.0, 5.0), span(5.0, 95.0), span(80.0, 100.0)),
        hill(span(1.0, 2.0), span(3.0, 5.0), span(5.0, 95.0), span(40.0, 60.0)),
        trough(span(5.0, 6.0), span(10.0, 25.0), span(5.0, 95.0), span(5.0, 95.0)),
        Operation::Smooth { force: 3.0 },
        Operation::Invert {
            probability: 0.4,
            axis: Axis::Both,
        },
    ],
};

const PANGEA: Template = Template {
    name: "pangea",
    operations: &[
        hill(span(1.0, 2.0), span(25.0, 40.0), span(15.0, 50.0), span(0.0, 10.0)),
        hill(span(1.0, 2.0), span(5.0, 40.0), span(50.0, 85.0), span(0.0, 10.0)),
        hill(span(1.0, 2.0), span(25.0, 40.0), span(50.0, 85.0), span(90.0, 100.0)),
        hill(span(1.0, 2.0), span(5.0, 40.0), span(15.0, 50.0), span(90.0, 100.0)),
        hill(span(8.0, 12.0), span(20.0, 40.0), span(20.0, 80.0), span(48.0, 52.0)),
        Operation::Smooth { force: 2.0 },
        Operation::Multiply {
            factor: 0.7,
            range: HeightRange::Land,
        },
        trough(span(3.0, 4.0), span(25.0, 35.0), span(5.0, 95.0), span(10.0, 20.0)),
        trough(span(3.0, 4.0), span(25.0, 35.0), span(5.0, 95.0), span(80.0, 90.0)),
        range(span(5.0, 6.0), span(30.0, 40.0), span(10.0, 90.0), span(35.0, 65.0)),
    ],
};

const ISTHMUS: Template = Template {
    name: "isthmus",
    operations: &[
        hill(span(5.0, 10.0), span(15.0, 30.0), span(0.0, 30.0), span(0.0, 20.0)),
        hill(span(5.0, 10.0), span(15.0, 30.0), span(10.0, 50.0), span(20.0, 40.0)),
        hill(span(5.0, 10.0), span(15.0, 30.0), span(30.0, 70.0), span(40.0, 60.0)),
        hill(span(5.0, 10.0), span(15.0, 30.0), span(50.0, 90.0), span(60.0, 80.0)),
        hill(span(5.0, 10.0), span(15.0, 30.0), span(70.0, 100.0), span(80.0, 100.0)),
        Operation::Smooth { force: 2.0 },
        trough(span(4.0, 8.0), span(15.0, 30.0), span(0.0, 30.0), span(0.0, 20.0)),
        trough(span(4.0, 8.0), span(15.0, 30.0), span(10.0, 50.0), span(20.0, 40.0)),
        trough(span(4.0, 8.0), span(15.0, 30.0), span(30.0, 70.0), span(40.0, 60.0)),
        trough(span(4.0, 8.0), span(15.0, 30.0), span(50.0, 90.0), span(60.0, 80.0)),
        trough(span(4.0, 8.0), span(15.0, 30.0), span(70.0, 100.0), span(80.0, 100.0)),
        Operation::Invert {
            probability: 0.25,
            axis: Axis::X,
        },
    ],
};

const SHATTERED: Template = Template {
    name: "shattered",
    operations: &[
        hill(one(8.0), span(35.0, 40.0), span(15.0, 85.0), span(30.0, 70.0)),
        trough(span(10.0, 20.0), span(40.0, 50.0), span(5.0, 95.0), span(5.0, 95.0)),
        range(span(5.0, 7.0), span(30.0, 40.0), span(10.0, 90.0), span(20.0, 80.0)),
        pit(span(12.0, 20.0), span(30.0, 40.0), span(15.0, 85.0), span(20.0, 80.0)),
    ],
};

const ALL: &[Template] = &[
    VOLCANO,
    HIGH_ISLAND,
    LOW_ISLAND,
    CONTINENTS,
    ARCHIPELAGO,
    ATOLL,
    MEDITERRANEAN,
    PENINSULA,
    PANGEA,
    ISTHMUS,
    SHATTERED,
];

/// All built-in templates
pub fn all() -> &'static [Template] {
    ALL
}

/// Look up a template by name
pub fn by_name(name: &str) -> Option<&'static Template> {
    ALL.iter().find(|t| t.name == name)
}

/// Look up a template, falling back to the default for unknown names
///
/// The fallback is the documented "use default template" path, not an error.
pub fn by_name_or_default(name: &str) -> &'static Template {
    by_name(name).unwrap_or_else(|| {
        log::debug!("unknown template '{}', using '{}'", name, DEFAULT_TEMPLATE);
        by_name(DEFAULT_TEMPLATE).expect("default template exists")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_names() {
        for template in all() {
            assert_eq!(by_name(template.name).unwrap().name, template.name);
        }
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert!(by_name("no-such-template").is_none());
        assert_eq!(by_name_or_default("no-such-template").name, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_templates_are_nonempty() {
        for template in all() {
            assert!(
                !template.operations.is_empty(),
                "template '{}' has no operations",
                template.name
            );
        }
    }
}
