//! The lesson catalogue for keyflow.
//!
//! The curriculum is a static, ordered catalogue of lessons grouped into
//! difficulty levels. Lesson identity is `(level, index)` with indexes
//! contiguous and 0-based within each level. Difficulty is ordinal only;
//! nothing here analyzes the text itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered difficulty tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Home row and basic words.
    #[default]
    Beginner,
    /// Full sentences with capitalization and punctuation.
    Intermediate,
    /// Numbers, symbols, and code-like text.
    Advanced,
}

impl Level {
    /// All levels in curriculum order.
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    /// Human-readable level name.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    /// The next harder level, if any.
    pub fn next(&self) -> Option<Level> {
        match self {
            Level::Beginner => Some(Level::Intermediate),
            Level::Intermediate => Some(Level::Advanced),
            Level::Advanced => None,
        }
    }

    /// The next easier level, if any.
    pub fn prev(&self) -> Option<Level> {
        match self {
            Level::Beginner => None,
            Level::Intermediate => Some(Level::Beginner),
            Level::Advanced => Some(Level::Intermediate),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single practice lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lesson {
    /// Difficulty tier this lesson belongs to.
    pub level: Level,
    /// 0-based position within the level.
    pub index: usize,
    /// Short display title.
    pub title: &'static str,
    /// The literal text to type.
    pub text: &'static str,
}

/// Static lesson table, in catalogue order. Indexes within a level must be
/// contiguous starting at 0.
const LESSONS: &[Lesson] = &[
    Lesson {
        level: Level::Beginner,
        index: 0,
        title: "Home row",
        text: "asdf jkl; asdf jkl; sad lads fall; ask a lad;",
    },
    Lesson {
        level: Level::Beginner,
        index: 1,
        title: "Top row reach",
        text: "the quiet tutor types true words for her pupils",
    },
    Lesson {
        level: Level::Beginner,
        index: 2,
        title: "Bottom row reach",
        text: "zebras vex cabs; mixing numb bones became calm",
    },
    Lesson {
        level: Level::Beginner,
        index: 3,
        title: "Common words",
        text: "that with have this will your from they know want",
    },
    Lesson {
        level: Level::Beginner,
        index: 4,
        title: "Short phrases",
        text: "a bird in hand; time will tell; easy does it now",
    },
    Lesson {
        level: Level::Intermediate,
        index: 0,
        title: "Capitals",
        text: "The Brown Fox jumped while Old Dog Rex slept on.",
    },
    Lesson {
        level: Level::Intermediate,
        index: 1,
        title: "Punctuation",
        text: "Wait, what? Yes: practice, practice, practice!",
    },
    Lesson {
        level: Level::Intermediate,
        index: 2,
        title: "Full sentences",
        text: "Typing well is a habit built one keystroke at a time.",
    },
    Lesson {
        level: Level::Intermediate,
        index: 3,
        title: "Pangram",
        text: "Pack my box with five dozen liquor jugs.",
    },
    Lesson {
        level: Level::Intermediate,
        index: 4,
        title: "Long sentence",
        text: "She sells seashells by the seashore, and the shells she sells are surely seashells.",
    },
    Lesson {
        level: Level::Advanced,
        index: 0,
        title: "Numbers",
        text: "In 1969, 3 crews flew 240000 miles in 76 hours.",
    },
    Lesson {
        level: Level::Advanced,
        index: 1,
        title: "Symbols",
        text: "email me at dev@example.com (before 5pm, ok?) #urgent",
    },
    Lesson {
        level: Level::Advanced,
        index: 2,
        title: "Mixed digits",
        text: "Order #4821 ships 2024-03-15; total $137.50 + 8% tax.",
    },
    Lesson {
        level: Level::Advanced,
        index: 3,
        title: "Code-like",
        text: "let total = items.iter().map(|i| i.price).sum::<u32>();",
    },
    Lesson {
        level: Level::Advanced,
        index: 4,
        title: "Everything",
        text: "Review PR #99: \"fix 3 bugs\" -- merge by 17:00, then relax!",
    },
];

/// The ordered lesson catalogue.
///
/// Read-only and process-wide; use [`Curriculum::standard`] for the built-in
/// catalogue or [`Curriculum::new`] with a custom table in tests.
#[derive(Debug)]
pub struct Curriculum {
    lessons: &'static [Lesson],
}

impl Curriculum {
    /// Build a curriculum over a custom lesson table.
    pub fn new(lessons: &'static [Lesson]) -> Self {
        Self { lessons }
    }

    /// The built-in catalogue.
    pub fn standard() -> Self {
        Self { lessons: LESSONS }
    }

    /// All lessons in catalogue order.
    pub fn lessons(&self) -> &[Lesson] {
        self.lessons
    }

    /// Look up a lesson by identity.
    pub fn lesson(&self, level: Level, index: usize) -> Option<&Lesson> {
        self.lessons
            .iter()
            .find(|l| l.level == level && l.index == index)
    }

    /// Number of lessons in a level.
    pub fn level_len(&self, level: Level) -> usize {
        self.lessons.iter().filter(|l| l.level == level).count()
    }

    /// The first lesson of the easiest non-empty level.
    pub fn first(&self) -> Option<&Lesson> {
        self.lessons.first()
    }

    /// Partition the catalogue by level, preserving catalogue order.
    ///
    /// Levels with no lessons are omitted.
    pub fn grouped(&self) -> Vec<(Level, Vec<&Lesson>)> {
        let mut groups: Vec<(Level, Vec<&Lesson>)> = Vec::new();
        for level in Level::ALL {
            let lessons: Vec<&Lesson> =
                self.lessons.iter().filter(|l| l.level == level).collect();
            if !lessons.is_empty() {
                groups.push((level, lessons));
            }
        }
        groups
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert_eq!(Level::Beginner.next(), Some(Level::Intermediate));
        assert_eq!(Level::Intermediate.next(), Some(Level::Advanced));
        assert_eq!(Level::Advanced.next(), None);

        assert_eq!(Level::Beginner.prev(), None);
        assert_eq!(Level::Advanced.prev(), Some(Level::Intermediate));
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Beginner.to_string(), "Beginner");
        assert_eq!(Level::Advanced.to_string(), "Advanced");
    }

    #[test]
    fn test_catalogue_indexes_are_contiguous() {
        let curriculum = Curriculum::standard();
        for level in Level::ALL {
            let len = curriculum.level_len(level);
            assert!(len > 0, "{level} has no lessons");
            for index in 0..len {
                assert!(
                    curriculum.lesson(level, index).is_some(),
                    "{level} #{index} missing"
                );
            }
            assert!(curriculum.lesson(level, len).is_none());
        }
    }

    #[test]
    fn test_beginner_has_five_lessons() {
        assert_eq!(Curriculum::standard().level_len(Level::Beginner), 5);
    }

    #[test]
    fn test_lesson_lookup() {
        let curriculum = Curriculum::standard();
        let lesson = curriculum.lesson(Level::Beginner, 0).unwrap();
        assert_eq!(lesson.title, "Home row");

        assert!(curriculum.lesson(Level::Beginner, 99).is_none());
    }

    #[test]
    fn test_first_lesson() {
        let curriculum = Curriculum::standard();
        let first = curriculum.first().unwrap();
        assert_eq!((first.level, first.index), (Level::Beginner, 0));
    }

    #[test]
    fn test_grouped_preserves_order() {
        let curriculum = Curriculum::standard();
        let groups = curriculum.grouped();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, Level::Beginner);
        assert_eq!(groups[2].0, Level::Advanced);

        for (level, lessons) in &groups {
            for (i, lesson) in lessons.iter().enumerate() {
                assert_eq!(lesson.level, *level);
                assert_eq!(lesson.index, i);
            }
        }
    }

    #[test]
    fn test_level_serde_round_trip() {
        let json = serde_json::to_string(&Level::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");
        let level: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(level, Level::Intermediate);
    }
}
